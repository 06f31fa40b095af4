//! Text measurement for layout

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Font weight selected by a run's formatting flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

impl FontWeight {
    /// Check if this is the bold weight
    pub fn is_bold(&self) -> bool {
        matches!(self, FontWeight::Bold)
    }

    /// CSS-style name passed to a host measurement function
    pub fn css_name(&self) -> &'static str {
        match self {
            FontWeight::Regular => "normal",
            FontWeight::Bold => "bold",
        }
    }
}

/// Failure to measure a piece of text (unsupported glyph, host error)
#[derive(Debug, Clone, Error)]
#[error("cannot measure {text:?}: {reason}")]
pub struct MeasureError {
    pub text: String,
    pub reason: String,
}

impl MeasureError {
    pub fn new(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reason: reason.into(),
        }
    }
}

/// Capability mapping (text, size, weight) to rendered width in page units.
///
/// The real implementation wraps the PDF font's own measurement; tests and
/// the native fallback use [`CharMetrics`].
pub trait TextMeasure {
    fn width(&self, text: &str, font_size: f32, weight: FontWeight) -> Result<f32, MeasureError>;
}

/// Width table for one face, used when the host supplies no measurer.
///
/// Widths are advance units per glyph at a font size of 1.0.
#[derive(Debug, Clone)]
pub struct CharMetrics {
    /// Advance units for ASCII characters (0-127)
    char_widths: Vec<f32>,
    /// Advance for everything outside the table
    default_width: f32,
    /// Widening applied to the bold weight
    bold_factor: f32,
}

impl Default for CharMetrics {
    fn default() -> Self {
        // Average serif advance of half an em
        let default_width = 0.5;
        Self {
            char_widths: vec![default_width; 128],
            default_width,
            bold_factor: 1.08,
        }
    }
}

impl CharMetrics {
    pub fn new(char_widths: Vec<f32>, default_width: f32, bold_factor: f32) -> Self {
        Self {
            char_widths,
            default_width,
            bold_factor,
        }
    }

    fn advance(&self, c: char) -> f32 {
        if c.is_ascii() {
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        self.default_width
    }
}

impl TextMeasure for CharMetrics {
    fn width(&self, text: &str, font_size: f32, weight: FontWeight) -> Result<f32, MeasureError> {
        // A grapheme cluster renders as one glyph; take its widest scalar.
        let units: f32 = text
            .graphemes(true)
            .map(|g| g.chars().map(|c| self.advance(c)).fold(0.0f32, f32::max))
            .sum();

        let factor = if weight.is_bold() {
            self.bold_factor
        } else {
            1.0
        };

        Ok(units * font_size * factor)
    }
}
