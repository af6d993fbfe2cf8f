//! Read cursors over a growing text
//!
//! A [`Cursor`] remembers the length of the text at each incremental read.
//! The recorded lengths partition the text into the pages handed out so far,
//! so the full text and the pages always agree without storing copies.

/// History of incremental read boundaries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    marks: Vec<usize>,
}

impl Cursor {
    /// Create a cursor with no reads recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the part of `text` not handed out yet and record its end.
    ///
    /// Calling this again without the text growing returns an empty string
    /// and records the same boundary a second time.
    pub fn advance<'a>(&mut self, text: &'a str) -> &'a str {
        let start = self.position();
        let end = text.len().max(start);
        self.marks.push(end);
        page(text, start, end)
    }

    /// Every page returned by [`advance`](Self::advance), in order, cut from `text`
    pub fn pages<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut start = 0;
        self.marks
            .iter()
            .map(|&end| {
                let slice = page(text, start, end);
                start = end;
                slice
            })
            .collect()
    }

    /// Offset where the next read will start
    pub fn position(&self) -> usize {
        self.marks.last().copied().unwrap_or(0)
    }

    /// Recorded boundaries, one per read
    pub fn marks(&self) -> &[usize] {
        &self.marks
    }
}

fn page(text: &str, start: usize, end: usize) -> &str {
    let end = char_floor(text, end.min(text.len()));
    let start = char_floor(text, start.min(end));
    &text[start..end]
}

fn char_floor(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
