//! Source positions
//!
//! A [`Position`] is an immutable snapshot of a cursor location together
//! with the human-readable label of the input it came from. Positions are
//! produced on demand: inputs with eager tracking copy the line and column
//! they already maintain, lazy inputs replay the buffer from its start
//! with [`replay`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in an input source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset from the start of the input
    pub byte: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number in bytes (1-based)
    pub column: usize,
    /// Label of the input, e.g. a file name or `argv[1]`
    pub source: String,
}

impl Position {
    /// Create a new position
    #[inline]
    pub fn new(byte: usize, line: usize, column: usize, source: impl Into<String>) -> Self {
        Self {
            byte,
            line,
            column,
            source: source.into(),
        }
    }

    /// Compute a position by replaying `data` up to `byte`
    pub fn replayed(data: &[u8], byte: usize, marker: u8, source: impl Into<String>) -> Self {
        let (line, column) = replay(data, byte, marker);
        Self::new(byte.min(data.len()), line, column, source)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

/// Count lines and columns in `data[..byte]`.
///
/// Every occurrence of `marker` ends a line. The result is the 1-based
/// `(line, column)` of `byte`. This is O(n) in `byte`.
pub fn replay(data: &[u8], byte: usize, marker: u8) -> (usize, usize) {
    let prefix = &data[..byte.min(data.len())];
    let line = 1 + memchr::memchr_iter(marker, prefix).count();
    let column = match memchr::memrchr(marker, prefix) {
        Some(last) => prefix.len() - last,
        None => prefix.len() + 1,
    };
    (line, column)
}

/// The full line of `data` containing `byte`, without its line terminator.
pub fn line_at(data: &[u8], byte: usize, marker: u8) -> &[u8] {
    let byte = byte.min(data.len());
    let begin = memchr::memrchr(marker, &data[..byte]).map_or(0, |n| n + 1);
    let end = memchr::memchr(marker, &data[byte..]).map_or(data.len(), |n| byte + n);
    let line = &data[begin..end];
    match line.last() {
        Some(b'\r') if marker == b'\n' => &line[..line.len() - 1],
        Some(b'\n') if marker == b'\r' => &line[..line.len() - 1],
        _ => line,
    }
}
