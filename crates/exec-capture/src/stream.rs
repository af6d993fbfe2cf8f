//! Captured output stream with incremental reads

use std::sync::{Mutex, PoisonError};

use crate::buffer::OutputBuffer;
use crate::cursor::Cursor;

/// Which output stream of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl StreamKind {
    /// Short lowercase name of the stream
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// One captured stream of a process together with its read cursor
#[derive(Debug)]
pub struct CapturedStream {
    kind: StreamKind,
    buffer: OutputBuffer,
    cursor: Mutex<Cursor>,
}

impl CapturedStream {
    pub(crate) fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            buffer: OutputBuffer::new(),
            cursor: Mutex::new(Cursor::new()),
        }
    }

    /// Which stream this is
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub(crate) fn buffer(&self) -> &OutputBuffer {
        &self.buffer
    }

    /// Raw bytes captured so far
    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.bytes()
    }

    /// The whole trimmed text captured so far. Never moves the cursor.
    pub fn snapshot(&self) -> String {
        self.buffer.trimmed()
    }

    /// Trimmed text that arrived since the previous call.
    ///
    /// The whole buffer is trimmed before slicing, so whitespace at the end of
    /// one read shows up at the start of the next once more text follows it.
    pub fn next(&self) -> String {
        let text = self.buffer.trimmed();
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        cursor.advance(&text).to_string()
    }

    /// Every piece previously returned by [`next`](Self::next), in order
    pub fn history(&self) -> Vec<String> {
        let text = self.buffer.trimmed();
        let cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        cursor.pages(&text).into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_with(text: &str) -> CapturedStream {
        let stream = CapturedStream::new(StreamKind::Stdout);
        stream.buffer().append(text.as_bytes());
        stream
    }

    #[test]
    fn test_snapshot_is_side_effect_free() {
        let stream = stream_with("  out  \n");
        assert_eq!(stream.snapshot(), "out");
        assert_eq!(stream.snapshot(), "out");
        assert!(stream.history().is_empty());
        assert_eq!(stream.next(), "out");
    }

    #[test]
    fn test_next_follows_writes() {
        let stream = stream_with("a");
        assert_eq!(stream.next(), "a");

        stream.buffer().append(b"b");
        assert_eq!(stream.next(), "b");
        assert_eq!(stream.next(), "");
        assert_eq!(stream.history(), vec!["a", "b", ""]);
        assert_eq!(stream.snapshot(), "ab");
    }

    #[test]
    fn test_trailing_whitespace_moves_to_next_page() {
        let stream = stream_with("a\n");
        assert_eq!(stream.next(), "a");

        stream.buffer().append(b"b\n");
        assert_eq!(stream.next(), "\nb");
        assert_eq!(stream.history().concat(), stream.snapshot());
    }

    #[test]
    fn test_history_concatenates_to_snapshot() {
        let stream = CapturedStream::new(StreamKind::Stderr);
        for chunk in ["first ", "", "second\n", "  third"] {
            stream.buffer().append(chunk.as_bytes());
            stream.next();
        }
        assert_eq!(stream.history().concat(), stream.snapshot());
        assert_eq!(stream.kind().as_str(), "stderr");
    }
}
