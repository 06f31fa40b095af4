//! Paper-Desk: research-paper reading assistant core
//!
//! This crate provides the client-side logic of the assistant:
//! - Sentence-aligned chunking of long paper text for a length-limited API
//! - Strictly ordered chunk dispatch with configurable pacing
//! - Session caches for summary and podcast-script results
//! - A composer that re-flows styled notes into paginated, positioned lines
//!   for an external PDF writer

pub mod chunk;
pub mod document;
pub mod layout;
pub mod remote;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmAssistant;

// Re-export primary types
pub use chunk::{assemble, Chunker};
pub use document::{NoteDocument, StyledRun};
pub use layout::{
    CharMetrics, ComposeError, Composer, FontWeight, MeasureError, Page, PageGeometry,
    PositionedLine, TextMeasure,
};
pub use remote::{
    DispatchError, DispatchPolicy, NoopPacer, Pacer, RemoteRequest, ResultCache,
    SequentialDispatcher, Transport, TransportError,
};

/// File name offered for the notes export download
pub const EXPORT_FILE_NAME: &str = "research_notes.pdf";

/// Character budget for chat context taken from the paper body
pub const CHAT_CONTEXT_CHARS: usize = 2_000;

/// Strip leftover speaker markers and collapse whitespace so a script reads
/// as one flowing narrative for text-to-speech.
pub fn normalize_podcast_script(script: &str) -> String {
    let mut cleaned = script.to_string();
    for marker in ["Host A:", "Host B:", "Q:", "A:"] {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Context sent with a question: the selection when one exists, otherwise
/// the head of the paper.
fn chat_context(paper_content: &str, selected_text: Option<&str>) -> String {
    match selected_text {
        Some(selection) if !selection.trim().is_empty() => selection.to_string(),
        _ => paper_content.chars().take(CHAT_CONTEXT_CHARS).collect(),
    }
}

/// The main assistant state combining all components
pub struct Assistant {
    notes_pipeline: SequentialDispatcher,
    summary_pipeline: SequentialDispatcher,
    podcast_pipeline: SequentialDispatcher,
    summary_cache: ResultCache,
    podcast_cache: ResultCache,
    composer: Composer,
}

impl Assistant {
    /// Create an assistant with the default export geometry and policies
    pub fn new() -> Self {
        Self::with_geometry(PageGeometry::default(), layout::FONT_SIZE)
            .expect("default geometry is valid")
    }

    /// Create an assistant exporting with the given geometry and font size
    pub fn with_geometry(geometry: PageGeometry, font_size: f32) -> Result<Self, ComposeError> {
        let composer = Composer::new(geometry, font_size)?;

        Ok(Self {
            notes_pipeline: SequentialDispatcher::new(DispatchPolicy::notes()),
            summary_pipeline: SequentialDispatcher::new(DispatchPolicy::summarize()),
            podcast_pipeline: SequentialDispatcher::new(DispatchPolicy::podcast()),
            summary_cache: ResultCache::new(),
            podcast_cache: ResultCache::new(),
            composer,
        })
    }

    /// Convert selected paper text into study notes (magic select)
    pub fn convert_to_notes(
        &mut self,
        transport: &mut dyn Transport,
        selected_text: &str,
    ) -> Result<String, DispatchError> {
        self.notes_pipeline
            .run(transport, selected_text, |text| RemoteRequest::ConvertToNotes { text })
    }

    /// Summarize the whole paper, serving repeat requests from the cache
    pub fn summarize(
        &mut self,
        transport: &mut dyn Transport,
        paper_content: &str,
    ) -> Result<String, DispatchError> {
        if let Some(hit) = self.summary_cache.get(paper_content) {
            return Ok(hit.to_string());
        }

        let summary = self
            .summary_pipeline
            .run(transport, paper_content, |selected_text| {
                RemoteRequest::Summarize { selected_text }
            })?;

        self.summary_cache.insert(paper_content, summary.clone());
        Ok(summary)
    }

    /// Summarize a selection; selections are never cached
    pub fn summarize_selection(
        &mut self,
        transport: &mut dyn Transport,
        selected_text: &str,
    ) -> Result<String, DispatchError> {
        self.summary_pipeline
            .run(transport, selected_text, |selected_text| {
                RemoteRequest::Summarize { selected_text }
            })
    }

    /// Generate (or recall) the podcast script for the paper
    pub fn podcast_script(
        &mut self,
        transport: &mut dyn Transport,
        paper_content: &str,
    ) -> Result<String, DispatchError> {
        if let Some(hit) = self.podcast_cache.get(paper_content) {
            return Ok(hit.to_string());
        }

        let raw = self
            .podcast_pipeline
            .run(transport, paper_content, |paper_content| {
                RemoteRequest::Podcast { paper_content }
            })?;

        let script = normalize_podcast_script(&raw);
        self.podcast_cache.insert(paper_content, script.clone());
        Ok(script)
    }

    /// Ask a question about the paper, preferring selected text as context
    pub fn chat(
        &mut self,
        transport: &mut dyn Transport,
        paper_content: &str,
        question: &str,
        selected_text: Option<&str>,
    ) -> Result<String, DispatchError> {
        let request = RemoteRequest::Chat {
            paper_content: chat_context(paper_content, selected_text),
            question: question.to_string(),
            selected_text: selected_text.map(str::to_string),
        };

        Ok(transport.send(&request)?)
    }

    /// Compose the notes document into pages for the external PDF writer
    pub fn export_notes(&self, document: &NoteDocument, measure: &dyn TextMeasure) -> Vec<Page> {
        self.composer.compose(document, measure)
    }

    /// Probe the summary cache without issuing a request
    pub fn cached_summary(&self, paper_content: &str) -> Option<&str> {
        self.summary_cache.get(paper_content)
    }

    /// Store a summary fetched by the host; the first result wins
    pub fn store_summary(&mut self, paper_content: &str, summary: &str) {
        self.summary_cache.insert(paper_content, summary);
    }

    /// Probe the podcast cache without issuing a request
    pub fn cached_podcast_script(&self, paper_content: &str) -> Option<&str> {
        self.podcast_cache.get(paper_content)
    }

    /// Store a host-fetched podcast script, normalized, first result wins
    pub fn store_podcast_script(&mut self, paper_content: &str, script: &str) {
        self.podcast_cache
            .insert(paper_content, normalize_podcast_script(script));
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn notes_policy(&self) -> &DispatchPolicy {
        self.notes_pipeline.policy()
    }

    pub fn summary_policy(&self) -> &DispatchPolicy {
        self.summary_pipeline.policy()
    }

    pub fn podcast_policy(&self) -> &DispatchPolicy {
        self.podcast_pipeline.policy()
    }
}

impl Default for Assistant {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockTransport {
        requests: Vec<RemoteRequest>,
        response: Option<String>,
        fail: bool,
    }

    impl MockTransport {
        fn replying(response: &str) -> Self {
            Self {
                response: Some(response.to_string()),
                ..Self::default()
            }
        }
    }

    impl Transport for MockTransport {
        fn send(&mut self, request: &RemoteRequest) -> Result<String, TransportError> {
            self.requests.push(request.clone());
            if self.fail {
                return Err(TransportError::new(request.endpoint(), "unavailable"));
            }
            Ok(self
                .response
                .clone()
                .unwrap_or_else(|| format!("r{}", self.requests.len())))
        }
    }

    #[test]
    fn test_summarize_serves_repeat_requests_from_cache() {
        let mut assistant = Assistant::new();
        let mut transport = MockTransport::replying("a short summary");

        let first = assistant.summarize(&mut transport, "paper text.").unwrap();
        let second = assistant.summarize(&mut transport, "paper text.").unwrap();

        assert_eq!(first, "a short summary");
        assert_eq!(second, first);
        assert_eq!(transport.requests.len(), 1);
    }

    #[test]
    fn test_failed_summary_is_not_cached() {
        let mut assistant = Assistant::new();
        let mut failing = MockTransport {
            fail: true,
            ..MockTransport::default()
        };

        assert!(assistant.summarize(&mut failing, "paper text.").is_err());
        assert!(assistant.cached_summary("paper text.").is_none());

        let mut working = MockTransport::replying("recovered");
        assert_eq!(
            assistant.summarize(&mut working, "paper text.").unwrap(),
            "recovered"
        );
    }

    #[test]
    fn test_podcast_script_is_normalized_before_caching() {
        let mut assistant = Assistant::new();
        let mut transport = MockTransport::replying("Host A: Welcome.  Host B: Thanks   everyone.");

        let script = assistant
            .podcast_script(&mut transport, "paper text.")
            .unwrap();

        assert_eq!(script, "Welcome. Thanks everyone.");
        assert_eq!(
            assistant.cached_podcast_script("paper text."),
            Some("Welcome. Thanks everyone.")
        );
    }

    #[test]
    fn test_chat_prefers_selection_as_context() {
        let mut assistant = Assistant::new();
        let mut transport = MockTransport::replying("an answer");

        assistant
            .chat(&mut transport, "full paper body", "what?", Some("the selection"))
            .unwrap();

        match &transport.requests[0] {
            RemoteRequest::Chat {
                paper_content,
                question,
                selected_text,
            } => {
                assert_eq!(paper_content, "the selection");
                assert_eq!(question, "what?");
                assert_eq!(selected_text.as_deref(), Some("the selection"));
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_chat_truncates_paper_context() {
        let mut assistant = Assistant::new();
        let mut transport = MockTransport::replying("an answer");
        let paper = "x".repeat(CHAT_CONTEXT_CHARS + 500);

        assistant.chat(&mut transport, &paper, "what?", None).unwrap();

        match &transport.requests[0] {
            RemoteRequest::Chat { paper_content, .. } => {
                assert_eq!(paper_content.chars().count(), CHAT_CONTEXT_CHARS);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_normalize_podcast_script() {
        assert_eq!(
            normalize_podcast_script("Host A: Hello. Q: Why?  A: Because."),
            "Hello. Why? Because."
        );
        assert_eq!(normalize_podcast_script("  already   clean  "), "already clean");
    }

    #[test]
    fn test_export_notes_produces_pages() {
        let assistant = Assistant::new();
        let doc = NoteDocument::from_runs(vec![
            StyledRun::bold("Findings\n"),
            StyledRun::plain("The approach works."),
        ]);

        let pages = assistant.export_notes(&doc, &CharMetrics::default());

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines.len(), 2);
        assert!(pages[0].lines[0].bold);
        assert_eq!(EXPORT_FILE_NAME, "research_notes.pdf");
    }

    #[test]
    fn test_invalid_geometry_is_rejected_up_front() {
        assert!(Assistant::with_geometry(PageGeometry::new(40.0, 40.0, 30.0), 12.0).is_err());
    }

    #[test]
    fn test_policies_match_the_endpoints() {
        let assistant = Assistant::new();
        assert_eq!(assistant.summary_policy().max_chunk_chars, 4_000);
        assert_eq!(assistant.notes_policy().max_chunk_chars, 5_000);
        assert_eq!(assistant.podcast_policy().max_chunk_chars, 5_000);
        assert_eq!(
            assistant.podcast_policy().inter_request_delay,
            std::time::Duration::from_secs(1)
        );
    }
}
