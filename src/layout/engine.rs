//! Composer: styled runs to paginated, positioned lines

use crate::document::NoteDocument;
use crate::layout::font::{FontWeight, TextMeasure};
use crate::layout::line_break::LineBreaker;
use crate::layout::pagination::{Page, PositionedLine};
use smallvec::SmallVec;
use thiserror::Error;

/// Default body size in points
pub const FONT_SIZE: f32 = 12.0;

/// Default line height factor applied to the font size
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Fixed page geometry for one export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 612.0, // US Letter
            height: 792.0,
            margin: 50.0,
        }
    }
}

impl PageGeometry {
    pub fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    /// Get usable content width
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Get usable content height per page
    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    /// Reject geometry that leaves no drawable area
    pub fn validate(&self) -> Result<(), ComposeError> {
        let finite = self.width.is_finite() && self.height.is_finite() && self.margin.is_finite();
        if !finite
            || self.margin < 0.0
            || self.content_width() <= 0.0
            || self.content_height() <= 0.0
        {
            return Err(ComposeError::InvalidGeometry {
                width: self.width,
                height: self.height,
                margin: self.margin,
            });
        }
        Ok(())
    }
}

/// Fatal precondition violations caught before layout begins
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComposeError {
    #[error("page geometry {width}x{height} with margin {margin} leaves no drawable area")]
    InvalidGeometry { width: f32, height: f32, margin: f32 },
    #[error("font size {0} is not a positive number")]
    InvalidFontSize(f32),
}

/// Transient cursor state for one export pass, discarded afterwards
#[derive(Debug)]
struct LayoutState {
    pages: Vec<Page>,
    cursor_y: f32,
}

impl LayoutState {
    fn new(geometry: &PageGeometry) -> Self {
        Self {
            pages: vec![Page::new(0)],
            cursor_y: geometry.height - geometry.margin,
        }
    }

    /// Start a new page when the line about to be placed would cross the
    /// bottom margin.
    fn break_page_if_needed(&mut self, geometry: &PageGeometry, line_height: f32) {
        if self.cursor_y - line_height < geometry.margin {
            self.pages.push(Page::new(self.pages.len()));
            self.cursor_y = geometry.height - geometry.margin;
        }
    }

    /// Place a line at the cursor and advance past it
    fn commit(&mut self, geometry: &PageGeometry, line_height: f32, text: String, bold: bool) {
        self.break_page_if_needed(geometry, line_height);
        let page = self.pages.last_mut().expect("layout always has a page");
        page.lines.push(PositionedLine {
            text,
            x: geometry.margin,
            y: self.cursor_y,
            bold,
        });
        self.cursor_y -= line_height;
    }

    /// Consume a line's vertical space without drawing it
    fn skip(&mut self, geometry: &PageGeometry, line_height: f32) {
        self.break_page_if_needed(geometry, line_height);
        self.cursor_y -= line_height;
    }

    /// Advance the cursor for an explicit break's paragraph spacing
    fn advance(&mut self, line_height: f32) {
        self.cursor_y -= line_height;
    }
}

/// Converts a styled-run document into pages of positioned lines
#[derive(Debug)]
pub struct Composer {
    geometry: PageGeometry,
    font_size: f32,
    line_height: f32,
    breaker: LineBreaker,
}

impl Composer {
    /// Create a composer, validating geometry and font size up front
    pub fn new(geometry: PageGeometry, font_size: f32) -> Result<Self, ComposeError> {
        geometry.validate()?;
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(ComposeError::InvalidFontSize(font_size));
        }

        Ok(Self {
            geometry,
            font_size,
            line_height: font_size * LINE_HEIGHT_FACTOR,
            breaker: LineBreaker::new(),
        })
    }

    /// Override the line height factor, clamped to the 1.2..=1.5 band
    pub fn with_line_height_factor(mut self, factor: f32) -> Self {
        self.line_height = self.font_size * factor.clamp(1.2, 1.5);
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Lay out the document in a single pass.
    ///
    /// Run text is split on embedded `\n` markers; each non-empty segment is
    /// word-wrapped against the content width with the run's weight, and each
    /// internal break adds one line of paragraph spacing beyond the lines'
    /// own advance. Lines the measurer rejects are skipped but still consume
    /// vertical space, so one bad glyph cannot abort an export.
    pub fn compose(&self, document: &NoteDocument, measure: &dyn TextMeasure) -> Vec<Page> {
        let mut state = LayoutState::new(&self.geometry);
        let max_width = self.geometry.content_width();

        for run in document.runs() {
            let weight = if run.bold {
                FontWeight::Bold
            } else {
                FontWeight::Regular
            };

            let segments: SmallVec<[&str; 4]> = run.text.split('\n').collect();
            let last = segments.len() - 1;

            for (idx, segment) in segments.iter().enumerate() {
                if !segment.is_empty() {
                    for line in
                        self.breaker
                            .wrap_segment(segment, self.font_size, weight, max_width, measure)
                    {
                        if line.unmeasurable {
                            state.skip(&self.geometry, self.line_height);
                        } else {
                            state.commit(&self.geometry, self.line_height, line.text, run.bold);
                        }
                    }
                }

                if idx < last {
                    state.advance(self.line_height);
                }
            }
        }

        state.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StyledRun;
    use crate::layout::font::MeasureError;
    use crate::layout::pagination::lines_per_page;

    // Six units per character, the measurement model from the export scenario
    struct FixedMeasure;

    impl TextMeasure for FixedMeasure {
        fn width(&self, text: &str, _size: f32, _weight: FontWeight) -> Result<f32, MeasureError> {
            Ok(text.chars().count() as f32 * 6.0)
        }
    }

    // Rejects any text containing the marker word
    struct RejectingMeasure;

    impl TextMeasure for RejectingMeasure {
        fn width(&self, text: &str, _size: f32, _weight: FontWeight) -> Result<f32, MeasureError> {
            if text.contains("bad") {
                Err(MeasureError::new(text, "unsupported glyph"))
            } else {
                Ok(text.chars().count() as f32 * 6.0)
            }
        }
    }

    fn small_geometry() -> PageGeometry {
        PageGeometry::new(100.0, 100.0, 10.0)
    }

    fn all_lines(pages: &[Page]) -> Vec<&PositionedLine> {
        pages.iter().flat_map(|p| p.lines.iter()).collect()
    }

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-3, "{a} != {b}");
    }

    #[test]
    fn test_geometry_validation() {
        assert!(PageGeometry::new(100.0, 200.0, 10.0).validate().is_ok());
        assert!(PageGeometry::new(100.0, 200.0, 50.0).validate().is_err());
        assert!(PageGeometry::new(-10.0, 200.0, 10.0).validate().is_err());
        assert!(PageGeometry::new(f32::NAN, 200.0, 10.0).validate().is_err());
    }

    #[test]
    fn test_invalid_font_size_is_a_construction_error() {
        assert_eq!(
            Composer::new(PageGeometry::default(), 0.0).unwrap_err(),
            ComposeError::InvalidFontSize(0.0)
        );
        assert!(Composer::new(PageGeometry::default(), -1.0).is_err());
    }

    #[test]
    fn test_single_bold_run_stays_on_one_line() {
        let composer = Composer::new(PageGeometry::new(100.0, 200.0, 10.0), 12.0).unwrap();
        let doc = NoteDocument::from_runs(vec![StyledRun::bold("Hello world")]);

        let pages = composer.compose(&doc, &FixedMeasure);

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines.len(), 1);
        let line = &pages[0].lines[0];
        assert_eq!(line.text, "Hello world");
        assert!(line.bold);
        assert_eq!(line.x, 10.0);
        assert_eq!(line.y, 190.0);
    }

    #[test]
    fn test_empty_document_is_one_empty_page() {
        let composer = Composer::new(PageGeometry::default(), FONT_SIZE).unwrap();
        let pages = composer.compose(&NoteDocument::new(), &FixedMeasure);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn test_page_break_capacity() {
        // Content width 80 fits one seven-char word (42 units) but not two,
        // so every word lands on its own line.
        let geometry = small_geometry();
        let composer = Composer::new(geometry, 10.0).unwrap();
        let words = vec!["worders"; 10].join(" ");
        let doc = NoteDocument::from_runs(vec![StyledRun::plain(words)]);

        let pages = composer.compose(&doc, &FixedMeasure);

        let capacity = lines_per_page(geometry.content_height(), composer.line_height());
        assert_eq!(capacity, 6);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].lines.len(), 6);
        assert_eq!(pages[1].lines.len(), 4);

        for line in all_lines(&pages) {
            assert!(line.y >= geometry.margin);
        }
    }

    #[test]
    fn test_explicit_break_adds_paragraph_spacing() {
        let composer = Composer::new(PageGeometry::new(200.0, 400.0, 10.0), 10.0).unwrap();
        let doc = NoteDocument::from_runs(vec![StyledRun::plain("alpha\nbeta")]);

        let pages = composer.compose(&doc, &FixedMeasure);
        let lines = &pages[0].lines;

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "alpha");
        assert_eq!(lines[1].text, "beta");
        // One advance for the committed line, one for the break itself.
        assert_close(lines[0].y - lines[1].y, 2.0 * composer.line_height());
    }

    #[test]
    fn test_trailing_break_forces_cursor_advance() {
        let composer = Composer::new(PageGeometry::new(200.0, 400.0, 10.0), 10.0).unwrap();
        let doc = NoteDocument::from_runs(vec![
            StyledRun::plain("alpha\n"),
            StyledRun::plain("beta"),
        ]);

        let pages = composer.compose(&doc, &FixedMeasure);
        let lines = &pages[0].lines;

        assert_eq!(lines.len(), 2);
        assert_close(lines[0].y - lines[1].y, 2.0 * composer.line_height());
    }

    #[test]
    fn test_oversized_word_overflows_without_breaking_layout() {
        let geometry = PageGeometry::new(100.0, 200.0, 10.0);
        let composer = Composer::new(geometry, 12.0).unwrap();
        let doc = NoteDocument::from_runs(vec![StyledRun::plain("an unsplittablecompound end")]);

        let pages = composer.compose(&doc, &FixedMeasure);
        let lines = all_lines(&pages);

        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert!(texts.contains(&"unsplittablecompound"));
        // The oversized word sits alone and every other line obeys the bound.
        for line in &lines {
            if line.text != "unsplittablecompound" {
                assert!(line.text.chars().count() as f32 * 6.0 <= geometry.content_width());
            }
        }
    }

    #[test]
    fn test_unmeasurable_word_leaves_a_gap() {
        let composer = Composer::new(small_geometry(), 10.0).unwrap();
        let doc = NoteDocument::from_runs(vec![StyledRun::plain("one bad two")]);

        let pages = composer.compose(&doc, &RejectingMeasure);
        let lines = &pages[0].lines;

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "one");
        assert_eq!(lines[1].text, "two");
        // The skipped line's slot stays open between them.
        assert_close(lines[0].y - lines[1].y, 2.0 * composer.line_height());
    }

    #[test]
    fn test_content_preserved_across_pages() {
        let composer = Composer::new(small_geometry(), 10.0).unwrap();
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let doc = NoteDocument::from_runs(vec![StyledRun::plain(text)]);

        let pages = composer.compose(&doc, &FixedMeasure);

        let rejoined = all_lines(&pages)
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_line_height_factor_is_clamped() {
        let composer = Composer::new(PageGeometry::default(), 10.0)
            .unwrap()
            .with_line_height_factor(3.0);
        assert_close(composer.line_height(), 15.0);

        let composer = Composer::new(PageGeometry::default(), 10.0)
            .unwrap()
            .with_line_height_factor(0.5);
        assert_close(composer.line_height(), 12.0);
    }
}
