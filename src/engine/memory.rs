//! In-memory inputs
//!
//! [`MemoryInput`] holds the complete input up front, either owned (read
//! from a file, built from a `String`) or borrowed from memory owned by the
//! caller. A borrowed region is the [`MappedInput`] strategy: a read-only
//! view over external memory such as a mapped file.

use super::error::InputError;
use super::input::{Eol, Input, Iter, Tracking};
use super::position::Position;
use std::borrow::Cow;
use std::path::Path;

/// Read-only view over externally owned memory
pub type MappedInput<'a> = MemoryInput<'a>;

/// Input backed by a fixed byte range
#[derive(Debug, Clone)]
pub struct MemoryInput<'a> {
    data: Cow<'a, [u8]>,
    cursor: Iter,
    tracking: Tracking,
    eol: Eol,
    source: String,
}

impl<'a> MemoryInput<'a> {
    /// Create an input over `data`
    pub fn new(data: impl Into<Cow<'a, [u8]>>, source: impl Into<String>) -> Self {
        Self::with_options(data, source, Tracking::Eager, Eol::default())
    }

    /// Create an input with explicit tracking and end-of-line policy
    pub fn with_options(
        data: impl Into<Cow<'a, [u8]>>,
        source: impl Into<String>,
        tracking: Tracking,
        eol: Eol,
    ) -> Self {
        Self {
            data: data.into(),
            cursor: Iter::start(tracking),
            tracking,
            eol,
            source: source.into(),
        }
    }

    /// Borrow a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &'a str, source: impl Into<String>) -> Self {
        Self::new(text.as_bytes(), source)
    }

    /// Borrow a byte slice
    pub fn from_bytes(bytes: &'a [u8], source: impl Into<String>) -> Self {
        Self::new(bytes, source)
    }

    /// View an externally owned region with lazy line tracking
    pub fn mapped(region: &'a [u8], source: impl Into<String>) -> MappedInput<'a> {
        Self::with_options(region, source, Tracking::Lazy, Eol::default())
    }

    /// Switch the end-of-line policy
    pub fn with_eol(mut self, eol: Eol) -> Self {
        self.eol = eol;
        self
    }

    /// The whole input, independent of the cursor
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The tracking mode
    pub fn tracking(&self) -> Tracking {
        self.tracking
    }

    /// Rewind to the start of the input
    pub fn reset(&mut self) {
        self.cursor = Iter::start(self.tracking);
    }
}

impl MemoryInput<'static> {
    /// Read a whole file; the source label is the path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Ok(Self::new(data, path.display().to_string()))
    }

    /// Take ownership of a string
    pub fn from_string(text: String, source: impl Into<String>) -> Self {
        Self::new(text.into_bytes(), source)
    }

    /// The process argument at `index`, labelled `argv[index]`
    pub fn from_arg(index: usize) -> Option<Self> {
        std::env::args()
            .nth(index)
            .map(|arg| Self::from_string(arg, format!("argv[{}]", index)))
    }
}

impl Input for MemoryInput<'_> {
    #[inline]
    fn size(&mut self, amount: usize) -> Result<usize, InputError> {
        Ok((self.data.len() - self.cursor.byte).min(amount))
    }

    #[inline]
    fn current(&self) -> &[u8] {
        &self.data[self.cursor.byte..]
    }

    #[inline]
    fn bump(&mut self, count: usize) {
        let end = (self.cursor.byte + count).min(self.data.len());
        match self.tracking {
            Tracking::Eager => {
                let marker = self.eol.marker();
                self.cursor
                    .advance(&self.data[self.cursor.byte..end], marker);
            }
            Tracking::Lazy => self.cursor.byte = end,
        }
    }

    #[inline]
    fn bump_in_this_line(&mut self, count: usize) {
        let end = (self.cursor.byte + count).min(self.data.len());
        if self.tracking == Tracking::Eager {
            self.cursor.column += end - self.cursor.byte;
        }
        self.cursor.byte = end;
    }

    #[inline]
    fn bump_to_next_line(&mut self, count: usize) {
        let end = (self.cursor.byte + count).min(self.data.len());
        if self.tracking == Tracking::Eager {
            self.cursor.line += 1;
            self.cursor.column = 1;
        }
        self.cursor.byte = end;
    }

    #[inline]
    fn iter(&self) -> Iter {
        self.cursor
    }

    #[inline]
    fn mark(&mut self) -> Iter {
        self.cursor
    }

    #[inline]
    fn restart(&mut self, mark: Iter) {
        self.cursor = mark;
    }

    #[inline]
    fn release(&mut self, _mark: Iter) {}

    fn is_bol(&self) -> bool {
        match self.tracking {
            Tracking::Eager => self.cursor.column == 1,
            Tracking::Lazy => {
                self.cursor.byte == 0 || self.data[self.cursor.byte - 1] == self.eol.marker()
            }
        }
    }

    fn span(&self, begin: &Iter) -> &[u8] {
        &self.data[begin.byte.min(self.cursor.byte)..self.cursor.byte]
    }

    fn position_at(&self, it: &Iter) -> Position {
        match self.tracking {
            Tracking::Eager => Position::new(it.byte, it.line, it.column, self.source.clone()),
            Tracking::Lazy => {
                Position::replayed(&self.data, it.byte, self.eol.marker(), self.source.clone())
            }
        }
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn eol(&self) -> Eol {
        self.eol
    }
}
