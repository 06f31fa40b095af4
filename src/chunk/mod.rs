//! Sentence-aligned chunking for length-limited remote requests

use regex::Regex;

/// Splits long source text into bounded chunks, preferring sentence
/// boundaries so no request cuts a sentence in half.
#[derive(Debug, Clone)]
pub struct Chunker {
    max_chars: usize,
    boundary: Regex,
}

impl Chunker {
    /// Create a chunker emitting chunks of at most `max_chars` characters.
    /// A zero maximum is clamped to 1.
    pub fn new(max_chars: usize) -> Self {
        // Runs of non-terminator characters followed by one or more terminators.
        let boundary = Regex::new(r"[^.!?]+[.!?]+").expect("boundary pattern is valid");
        Self {
            max_chars: max_chars.max(1),
            boundary,
        }
    }

    /// Maximum characters per chunk
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Split `text` into trimmed chunks.
    ///
    /// Sentences are accumulated greedily; a sentence that would push the
    /// buffer past the maximum starts a new chunk instead. A single sentence
    /// longer than the maximum is emitted whole rather than split mid-word.
    /// Empty or whitespace-only input yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_chars = 0usize;

        for unit in self.sentence_units(text) {
            let unit_chars = unit.chars().count();
            if buffer_chars > 0 && buffer_chars + unit_chars > self.max_chars {
                flush(&mut buffer, &mut chunks);
                buffer_chars = 0;
            }
            buffer.push_str(unit);
            buffer_chars += unit_chars;
        }

        flush(&mut buffer, &mut chunks);
        chunks
    }

    /// Cut `text` into contiguous sentence-like units.
    ///
    /// Text after the last terminator is kept as a final unit; input without
    /// any terminator is a single unit.
    fn sentence_units<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut units = Vec::new();
        let mut last_end = 0;

        for found in self.boundary.find_iter(text) {
            units.push(found.as_str());
            last_end = found.end();
        }

        if units.is_empty() {
            if !text.is_empty() {
                units.push(text);
            }
        } else if last_end < text.len() {
            units.push(&text[last_end..]);
        }

        units
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(4_000)
    }
}

fn flush(buffer: &mut String, chunks: &mut Vec<String>) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    buffer.clear();
}

/// Join chunk responses in request order, separated by one blank line.
pub fn assemble(parts: &[String]) -> String {
    parts.join("\n\n")
}
