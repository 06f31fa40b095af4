//! WASM bindings for the assistant

use crate::document::NoteDocument;
use crate::layout::font::{FontWeight, MeasureError, TextMeasure};
use crate::{Assistant, Chunker, PageGeometry};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WASM-exposed assistant wrapper
#[wasm_bindgen]
pub struct WasmAssistant {
    assistant: Assistant,
}

#[wasm_bindgen]
impl WasmAssistant {
    /// Create an assistant with the default export geometry (US Letter)
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            assistant: Assistant::new(),
        }
    }

    /// Create an assistant with custom export geometry
    #[wasm_bindgen(js_name = withGeometry)]
    pub fn with_geometry(
        width: f32,
        height: f32,
        margin: f32,
        font_size: f32,
    ) -> Result<WasmAssistant, JsValue> {
        let assistant = Assistant::with_geometry(PageGeometry::new(width, height, margin), font_size)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { assistant })
    }

    /// Split text into API-safe chunks (returns a string array)
    #[wasm_bindgen(js_name = chunkText)]
    pub fn chunk_text(&self, text: &str, max_chars: usize) -> JsValue {
        let chunks = Chunker::new(max_chars).chunk(text);
        serde_wasm_bindgen::to_value(&chunks).unwrap_or(JsValue::NULL)
    }

    /// Join chunk responses in request order with a blank line between them
    #[wasm_bindgen(js_name = assembleResponses)]
    pub fn assemble_responses(&self, parts: JsValue) -> Result<String, JsValue> {
        let parts: Vec<String> =
            serde_wasm_bindgen::from_value(parts).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(crate::chunk::assemble(&parts))
    }

    /// Chunk threshold for the summary endpoint
    #[wasm_bindgen(js_name = summaryChunkChars)]
    pub fn summary_chunk_chars(&self) -> usize {
        self.assistant.summary_policy().max_chunk_chars
    }

    /// Chunk threshold for the notes and podcast endpoints
    #[wasm_bindgen(js_name = notesChunkChars)]
    pub fn notes_chunk_chars(&self) -> usize {
        self.assistant.notes_policy().max_chunk_chars
    }

    /// Milliseconds the host should wait between podcast chunk requests
    #[wasm_bindgen(js_name = podcastDelayMs)]
    pub fn podcast_delay_ms(&self) -> u32 {
        self.assistant.podcast_policy().inter_request_delay.as_millis() as u32
    }

    /// Probe the session summary cache
    #[wasm_bindgen(js_name = cachedSummary)]
    pub fn cached_summary(&self, paper_content: &str) -> Option<String> {
        self.assistant.cached_summary(paper_content).map(str::to_string)
    }

    /// Store a fetched summary; the first result wins for the session
    #[wasm_bindgen(js_name = storeSummary)]
    pub fn store_summary(&mut self, paper_content: &str, summary: &str) {
        self.assistant.store_summary(paper_content, summary);
    }

    /// Probe the session podcast cache
    #[wasm_bindgen(js_name = cachedPodcastScript)]
    pub fn cached_podcast_script(&self, paper_content: &str) -> Option<String> {
        self.assistant
            .cached_podcast_script(paper_content)
            .map(str::to_string)
    }

    /// Store a fetched podcast script, normalized for text-to-speech
    #[wasm_bindgen(js_name = storePodcastScript)]
    pub fn store_podcast_script(&mut self, paper_content: &str, script: &str) {
        self.assistant.store_podcast_script(paper_content, script);
    }

    /// Compose editor delta content into positioned pages for the PDF writer.
    ///
    /// `measure` maps (text, fontSize, weightName) to a width in page units,
    /// typically wrapping the embedded font's `widthOfTextAtSize`.
    #[wasm_bindgen(js_name = composeNotes)]
    pub fn compose_notes(&self, delta_json: &str, measure: &js_sys::Function) -> Result<JsValue, JsValue> {
        let document = NoteDocument::from_delta_json(delta_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let measure = JsMeasure {
            func: measure.clone(),
        };
        let pages = self.assistant.export_notes(&document, &measure);

        serde_wasm_bindgen::to_value(&pages).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// File name offered for the export download
    #[wasm_bindgen(js_name = exportFileName)]
    pub fn export_file_name(&self) -> String {
        crate::EXPORT_FILE_NAME.to_string()
    }
}

impl Default for WasmAssistant {
    fn default() -> Self {
        Self::new()
    }
}

/// Host-supplied measurement callback (e.g. pdf-lib's `widthOfTextAtSize`)
struct JsMeasure {
    func: js_sys::Function,
}

impl TextMeasure for JsMeasure {
    fn width(&self, text: &str, font_size: f32, weight: FontWeight) -> Result<f32, MeasureError> {
        let width = self
            .func
            .call3(
                &JsValue::NULL,
                &JsValue::from_str(text),
                &JsValue::from_f64(font_size as f64),
                &JsValue::from_str(weight.css_name()),
            )
            .map_err(|err| MeasureError::new(text, format!("{err:?}")))?;

        width
            .as_f64()
            .filter(|w| w.is_finite())
            .map(|w| w as f32)
            .ok_or_else(|| MeasureError::new(text, "measurement did not return a finite number"))
    }
}
