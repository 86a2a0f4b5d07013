//! Input cursor contract
//!
//! Every rule is written against the [`Input`] trait, so the same grammar
//! runs unchanged over in-memory data ([`MemoryInput`](super::MemoryInput))
//! and over streamed data ([`BufferInput`](super::BufferInput)).
//!
//! Backtracking uses [`Iter`] snapshots. Callers that may rewind take a
//! snapshot with [`Input::mark`] and must hand it back exactly once, either
//! to [`Input::restart`] (rewind) or to [`Input::release`] (commit). Marks
//! nest strictly, so inputs can keep them on a stack.

use super::error::InputError;
use super::position::Position;
use serde::{Deserialize, Serialize};

/// A cursor snapshot
///
/// `byte` is always an absolute offset from the start of the input. With
/// lazy tracking `line` and `column` are not maintained and stay at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Iter {
    /// Absolute byte offset
    pub byte: usize,
    /// Line number (1-based), 0 when untracked
    pub line: usize,
    /// Column number in bytes (1-based), 0 when untracked
    pub column: usize,
}

impl Iter {
    /// Snapshot at the start of an input
    pub fn start(tracking: Tracking) -> Self {
        match tracking {
            Tracking::Eager => Self {
                byte: 0,
                line: 1,
                column: 1,
            },
            Tracking::Lazy => Self::default(),
        }
    }

    /// Advance over `consumed`, counting lines ended by `marker`
    #[inline]
    pub fn advance(&mut self, consumed: &[u8], marker: u8) {
        self.byte += consumed.len();
        match memchr::memrchr(marker, consumed) {
            Some(last) => {
                self.line += memchr::memchr_iter(marker, consumed).count();
                self.column = consumed.len() - last;
            }
            None => self.column += consumed.len(),
        }
    }
}

/// How line and column numbers are maintained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tracking {
    /// Update line and column on every bump
    #[default]
    Eager,
    /// Keep only the byte offset; replay from the start when a position is needed
    Lazy,
}

/// End-of-line policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Eol {
    /// `\n`
    Lf,
    /// `\r`
    Cr,
    /// `\r\n`
    Crlf,
    /// `\r` or `\r\n`
    CrCrlf,
    /// `\n` or `\r\n`
    #[default]
    LfCrlf,
}

impl Eol {
    /// The byte that terminates a line for line counting
    #[inline]
    pub fn marker(self) -> u8 {
        match self {
            Eol::Lf | Eol::Crlf | Eol::LfCrlf => b'\n',
            Eol::Cr | Eol::CrCrlf => b'\r',
        }
    }

    /// Length of the end-of-line sequence at the start of `bytes`
    #[inline]
    pub fn match_len(self, bytes: &[u8]) -> Option<usize> {
        match (self, bytes) {
            (Eol::Lf | Eol::LfCrlf, [b'\n', ..]) => Some(1),
            (Eol::Crlf | Eol::CrCrlf | Eol::LfCrlf, [b'\r', b'\n', ..]) => Some(2),
            (Eol::Cr | Eol::CrCrlf, [b'\r', ..]) => Some(1),
            _ => None,
        }
    }
}

/// The cursor contract shared by all input strategies
pub trait Input {
    /// Make up to `amount` bytes available ahead of the cursor.
    ///
    /// Returns the number of bytes available, capped at `amount`. Fewer
    /// than `amount` means the input ends. [`Input::current`] may still
    /// expose more bytes than the returned count.
    fn size(&mut self, amount: usize) -> Result<usize, InputError>;

    /// Guarantee `amount` bytes of lookahead unless the input ends first.
    ///
    /// Fails with [`InputError::CapacityExceeded`] when the request can never
    /// fit in the input's buffer.
    fn require(&mut self, amount: usize) -> Result<(), InputError> {
        self.size(amount).map(|_| ())
    }

    /// The bytes currently available from the cursor onwards
    fn current(&self) -> &[u8];

    /// The byte at `offset` from the cursor, or `None` past the end
    fn peek(&mut self, offset: usize) -> Result<Option<u8>, InputError> {
        let available = self.size(offset + 1)?;
        if available > offset {
            Ok(self.current().get(offset).copied())
        } else {
            Ok(None)
        }
    }

    /// Whether the cursor is at the end of the input
    fn is_empty(&mut self) -> Result<bool, InputError> {
        Ok(self.size(1)? == 0)
    }

    /// Advance over `count` bytes, updating line and column
    fn bump(&mut self, count: usize);

    /// Advance over `count` bytes known not to contain a line end
    fn bump_in_this_line(&mut self, count: usize);

    /// Advance over `count` bytes whose last byte ends the line
    fn bump_to_next_line(&mut self, count: usize);

    /// Snapshot of the cursor
    fn iter(&self) -> Iter;

    /// Take a snapshot that may later be restored
    fn mark(&mut self) -> Iter;

    /// Rewind to `mark` and give the mark back
    fn restart(&mut self, mark: Iter);

    /// Give `mark` back without rewinding
    fn release(&mut self, mark: Iter);

    /// Absolute byte offset of the cursor
    fn byte(&self) -> usize {
        self.iter().byte
    }

    /// Whether the cursor is at the beginning of a line
    fn is_bol(&self) -> bool {
        self.position().column == 1
    }

    /// Bytes between `begin` and the cursor
    fn span(&self, begin: &Iter) -> &[u8];

    /// Position of an arbitrary snapshot
    fn position_at(&self, it: &Iter) -> Position;

    /// Position of the cursor
    fn position(&self) -> Position {
        self.position_at(&self.iter())
    }

    /// Label of this input
    fn source(&self) -> &str;

    /// End-of-line policy of this input
    fn eol(&self) -> Eol;

    /// Drop buffered bytes no live mark can reach.
    ///
    /// Returns the number of bytes dropped. In-memory inputs never drop.
    fn discard(&mut self) -> usize {
        0
    }
}
