//! Styled note content as exchanged with the rich-text editor

use serde::{Deserialize, Serialize};

/// A span of text carrying a closed set of formatting flags.
///
/// Runs may contain embedded `\n` line-break markers; the composer turns
/// those into explicit paragraph breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
}

impl StyledRun {
    /// Create an unformatted run
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    /// Create a bold run
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// The full styled document as an ordered run sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDocument {
    runs: Vec<StyledRun>,
}

impl NoteDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from an existing run sequence
    pub fn from_runs(runs: Vec<StyledRun>) -> Self {
        Self { runs }
    }

    /// Parse a Quill-style delta document.
    ///
    /// Text inserts become runs carrying their bold flag; embed inserts
    /// (images and the like) have no text representation and are skipped.
    pub fn from_delta_json(json: &str) -> Result<Self, serde_json::Error> {
        let delta: Delta = serde_json::from_str(json)?;

        let runs = delta
            .ops
            .into_iter()
            .filter_map(|op| match op.insert {
                serde_json::Value::String(text) => Some(StyledRun {
                    text,
                    bold: op.attributes.map(|a| a.bold).unwrap_or(false),
                }),
                _ => None,
            })
            .collect();

        Ok(Self { runs })
    }

    /// Append a run
    pub fn push(&mut self, run: StyledRun) {
        self.runs.push(run);
    }

    /// Runs in document order
    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    /// Check if the document has no runs
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The document text with formatting stripped
    pub fn visible_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Wire shape of a Quill-style delta document
#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    ops: Vec<DeltaOp>,
}

#[derive(Debug, Deserialize)]
struct DeltaOp {
    insert: serde_json::Value,
    #[serde(default)]
    attributes: Option<DeltaAttributes>,
}

#[derive(Debug, Default, Deserialize)]
struct DeltaAttributes {
    #[serde(default)]
    bold: bool,
}
