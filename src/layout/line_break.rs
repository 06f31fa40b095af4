//! Greedy word wrapping

use crate::layout::font::{FontWeight, TextMeasure};

/// One wrapped line produced from a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedLine {
    pub text: String,
    /// Set when the measurer rejected this text; the line occupies vertical
    /// space but is never drawn.
    pub unmeasurable: bool,
}

impl WrappedLine {
    fn measured(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            unmeasurable: false,
        }
    }

    fn unmeasured(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            unmeasurable: true,
        }
    }
}

/// Line breaker
#[derive(Debug, Default)]
pub struct LineBreaker;

impl LineBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Wrap one break-free segment against `max_width`.
    ///
    /// Words are appended to a candidate line while the measured width stays
    /// within the bound; the overflowing word starts the next line. A single
    /// word wider than the bound is emitted alone, overflowing — words are
    /// never split. A word the measurer rejects is isolated into a flagged
    /// line so the rest of the segment still lays out.
    pub fn wrap_segment(
        &self,
        segment: &str,
        font_size: f32,
        weight: FontWeight,
        max_width: f32,
        measure: &dyn TextMeasure,
    ) -> Vec<WrappedLine> {
        let mut lines = Vec::new();
        let mut candidate = String::new();

        for word in segment.split_whitespace() {
            let test = if candidate.is_empty() {
                word.to_string()
            } else {
                format!("{candidate} {word}")
            };

            match measure.width(&test, font_size, weight) {
                Ok(width) if width <= max_width => candidate = test,
                Ok(_) => {
                    if candidate.is_empty() {
                        lines.push(WrappedLine::measured(word));
                    } else {
                        lines.push(WrappedLine::measured(std::mem::take(&mut candidate)));
                        candidate = word.to_string();
                    }
                }
                Err(err) => {
                    tracing::warn!(word, error = %err, "skipping text the measurer rejected");
                    if !candidate.is_empty() {
                        lines.push(WrappedLine::measured(std::mem::take(&mut candidate)));
                    }
                    lines.push(WrappedLine::unmeasured(word));
                }
            }
        }

        if !candidate.is_empty() {
            lines.push(WrappedLine::measured(candidate));
        }

        lines
    }
}
