//! Paginated output for the PDF writer

use serde::Serialize;

/// A word-wrapped line positioned on a page.
///
/// Coordinates are PDF-style: `x` from the left edge, `y` from the bottom
/// edge of the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub bold: bool,
}

/// A fixed-geometry page of positioned lines
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Page index (0-based)
    pub index: usize,
    pub lines: Vec<PositionedLine>,
}

impl Page {
    /// Create a new empty page
    pub fn new(index: usize) -> Self {
        Self {
            index,
            lines: Vec::new(),
        }
    }

    /// Check if the page has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines on this page
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Number of full lines that fit between the margins
pub fn lines_per_page(content_height: f32, line_height: f32) -> usize {
    if line_height <= 0.0 {
        return 0;
    }
    (content_height / line_height).floor() as usize
}
