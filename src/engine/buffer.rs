//! Streaming input
//!
//! [`BufferInput`] pulls bytes from any [`Read`] source into a growable
//! buffer on demand, chunk by chunk. The buffer never holds more than
//! [`BufferConfig::maximum`] bytes. When a request does not fit, the buffer
//! is compacted with [`Input::discard`], which drops only bytes that lie
//! before every live mark.
//!
//! A mark held by an outer rule pins everything read after it, so a long
//! stream is best parsed with the start rule in [`RewindMode::DontCare`]
//! (see [`ParserConfig::with_rewind_mode`]); repetitions still mark and
//! release each iteration.
//!
//! [`RewindMode::DontCare`]: super::RewindMode::DontCare
//! [`ParserConfig::with_rewind_mode`]: super::ParserConfig::with_rewind_mode
//!
//! ```text
//!   base                oldest mark     cursor            buffer end
//!    |--- discardable ---|-------------------|------ ahead -----|
//! ```
//!
//! # Usage
//!
//! ```rust
//! use pegkit::engine::{BufferConfig, BufferInput, Input};
//!
//! let reader: &[u8] = b"streamed data";
//! let mut input = BufferInput::new(reader, BufferConfig::new(4, 16), "stream");
//! input.require(6).unwrap();
//! assert_eq!(&input.current()[..6], b"stream");
//! ```

use super::error::InputError;
use super::input::{Eol, Input, Iter, Tracking};
use super::position::Position;
use std::io::{self, Read};

/// Buffer sizing for [`BufferInput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Bytes requested from the source per read
    pub chunk_size: usize,

    /// Hard cap on buffered bytes
    pub maximum: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4 * 1024,
            maximum: 64 * 1024,
        }
    }
}

impl BufferConfig {
    /// Create a configuration; `maximum` is raised to at least `chunk_size`
    #[inline]
    pub fn new(chunk_size: usize, maximum: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            maximum: maximum.max(chunk_size),
        }
    }

    /// 512 byte chunks, 4 KB maximum
    #[inline]
    pub fn small() -> Self {
        Self::new(512, 4 * 1024)
    }

    /// 64 KB chunks, 1 MB maximum
    #[inline]
    pub fn large() -> Self {
        Self::new(64 * 1024, 1024 * 1024)
    }
}

/// Adapter turning a closure into a byte source
pub struct FnSource<F>(pub F);

impl<F> Read for FnSource<F>
where
    F: FnMut(&mut [u8]) -> io::Result<usize>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (self.0)(buf)
    }
}

/// Input fed incrementally from a byte source
pub struct BufferInput<R> {
    reader: R,
    config: BufferConfig,
    buffer: Vec<u8>,
    /// Absolute offset of `buffer[0]`
    base: usize,
    cursor: Iter,
    /// Live marks, oldest first
    marks: Vec<usize>,
    exhausted: bool,
    eol: Eol,
    source: String,
}

impl<R: Read> BufferInput<R> {
    /// Create an input reading from `reader`
    pub fn new(reader: R, config: BufferConfig, source: impl Into<String>) -> Self {
        let config = BufferConfig::new(config.chunk_size, config.maximum);
        Self {
            reader,
            config,
            buffer: Vec::with_capacity(config.chunk_size),
            base: 0,
            cursor: Iter::start(Tracking::Eager),
            marks: Vec::new(),
            exhausted: false,
            eol: Eol::default(),
            source: source.into(),
        }
    }

    /// Switch the end-of-line policy
    pub fn with_eol(mut self, eol: Eol) -> Self {
        self.eol = eol;
        self
    }

    /// The buffer configuration
    pub fn config(&self) -> BufferConfig {
        self.config
    }

    /// Number of bytes currently held in the buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Number of marks that are still live
    pub fn live_marks(&self) -> usize {
        self.marks.len()
    }

    #[inline]
    fn offset(&self) -> usize {
        self.cursor.byte - self.base
    }

    #[inline]
    fn ahead(&self) -> usize {
        self.buffer.len() - self.offset()
    }

    /// Read until `amount` bytes are ahead of the cursor, the buffer is
    /// full, or the source is exhausted.
    fn fill(&mut self, amount: usize) -> Result<usize, InputError> {
        if self.ahead() >= amount || self.exhausted {
            return Ok(self.ahead());
        }
        if self.offset().saturating_add(amount) > self.config.maximum {
            self.discard();
        }

        while self.ahead() < amount && !self.exhausted {
            let room = self.config.maximum - self.buffer.len();
            if room == 0 {
                break;
            }
            let want = self.config.chunk_size.max(amount - self.ahead()).min(room);
            let old_len = self.buffer.len();
            self.buffer.resize(old_len + want, 0);
            let read = match self.reader.read(&mut self.buffer[old_len..]) {
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    self.buffer.truncate(old_len);
                    continue;
                }
                Err(err) => {
                    self.buffer.truncate(old_len);
                    return Err(err.into());
                }
            };
            self.buffer.truncate(old_len + read);
            if read == 0 {
                self.exhausted = true;
            }
            log_trace!(
                "{}: read {} bytes, {} buffered",
                self.source,
                read,
                self.buffer.len()
            );
        }

        Ok(self.ahead())
    }
}

impl<F> BufferInput<FnSource<F>>
where
    F: FnMut(&mut [u8]) -> io::Result<usize>,
{
    /// Create an input pulling bytes from a closure
    ///
    /// The closure fills the slice it is given and returns the number of
    /// bytes written; returning 0 signals the end of the input.
    pub fn from_fn(f: F, config: BufferConfig, source: impl Into<String>) -> Self {
        Self::new(FnSource(f), config, source)
    }
}

impl<R: Read> Input for BufferInput<R> {
    /// Requests larger than the buffer maximum are served best-effort. A
    /// request that would fit but for live marks pinning the buffer fails
    /// with [`InputError::CapacityExceeded`] instead of reporting a short
    /// read, which would look like the end of the input.
    fn size(&mut self, amount: usize) -> Result<usize, InputError> {
        let ahead = self.fill(amount)?;
        let maximum = self.config.maximum;
        if ahead < amount && !self.exhausted && amount <= maximum {
            return Err(InputError::CapacityExceeded {
                requested: amount,
                maximum,
            });
        }
        Ok(ahead.min(amount))
    }

    fn require(&mut self, amount: usize) -> Result<(), InputError> {
        let maximum = self.config.maximum;
        if amount > maximum {
            return Err(InputError::CapacityExceeded {
                requested: amount,
                maximum,
            });
        }
        self.size(amount).map(|_| ())
    }

    #[inline]
    fn current(&self) -> &[u8] {
        &self.buffer[self.offset()..]
    }

    fn bump(&mut self, count: usize) {
        let begin = self.offset();
        let end = (begin + count).min(self.buffer.len());
        let marker = self.eol.marker();
        self.cursor.advance(&self.buffer[begin..end], marker);
    }

    fn bump_in_this_line(&mut self, count: usize) {
        let count = count.min(self.ahead());
        self.cursor.byte += count;
        self.cursor.column += count;
    }

    fn bump_to_next_line(&mut self, count: usize) {
        let count = count.min(self.ahead());
        self.cursor.byte += count;
        self.cursor.line += 1;
        self.cursor.column = 1;
    }

    #[inline]
    fn iter(&self) -> Iter {
        self.cursor
    }

    #[inline]
    fn mark(&mut self) -> Iter {
        self.marks.push(self.cursor.byte);
        self.cursor
    }

    #[inline]
    fn restart(&mut self, mark: Iter) {
        let popped = self.marks.pop();
        debug_assert_eq!(popped, Some(mark.byte), "marks must be restored in LIFO order");
        self.cursor = mark;
    }

    #[inline]
    fn release(&mut self, mark: Iter) {
        let popped = self.marks.pop();
        debug_assert_eq!(popped, Some(mark.byte), "marks must be released in LIFO order");
    }

    fn is_bol(&self) -> bool {
        self.cursor.column == 1
    }

    fn span(&self, begin: &Iter) -> &[u8] {
        let start = begin.byte.max(self.base) - self.base;
        &self.buffer[start.min(self.offset())..self.offset()]
    }

    fn position_at(&self, it: &Iter) -> Position {
        Position::new(it.byte, it.line, it.column, self.source.clone())
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn eol(&self) -> Eol {
        self.eol
    }

    fn discard(&mut self) -> usize {
        let keep_from = self
            .marks
            .first()
            .copied()
            .unwrap_or(self.cursor.byte)
            .min(self.cursor.byte);
        let dropped = keep_from - self.base;
        if dropped > 0 {
            self.buffer.drain(..dropped);
            self.base = keep_from;
            log_trace!("{}: discarded {} bytes", self.source, dropped);
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(len: usize) -> Vec<u8> {
        (0..len).map(|i| b'a' + (i % 26) as u8).collect()
    }

    #[test]
    fn test_require_compacts_within_cap() {
        let data = source(200);
        let mut input = BufferInput::new(&data[..], BufferConfig::new(64, 128), "stream");

        input.require(50).unwrap();
        input.bump(50);
        input.require(100).unwrap();
        assert!(input.buffered() <= 128);
        assert!(input.current().len() >= 100);
        assert_eq!(input.current()[0], data[50]);

        let err = input.require(200).unwrap_err();
        assert_eq!(
            err,
            InputError::CapacityExceeded {
                requested: 200,
                maximum: 128
            }
        );
    }

    #[test]
    fn test_discard_keeps_live_marks() {
        let data = source(100);
        let mut input = BufferInput::new(&data[..], BufferConfig::new(16, 64), "stream");
        input.require(20).unwrap();
        input.bump(5);
        let mark = input.mark();
        input.bump(10);
        assert_eq!(input.discard(), 5);
        assert_eq!(input.span(&mark), &data[5..15]);
        input.restart(mark);
        assert_eq!(input.current()[0], data[5]);
        assert_eq!(input.discard(), 0);
    }

    #[test]
    fn test_pinned_mark_reports_capacity() {
        let data = source(100);
        let mut input = BufferInput::new(&data[..], BufferConfig::new(8, 16), "stream");
        let _mark = input.mark();
        input.require(10).unwrap();
        input.bump(10);
        assert!(matches!(
            input.require(10),
            Err(InputError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_end_of_source() {
        let mut input = BufferInput::new(&b"abc"[..], BufferConfig::new(2, 8), "stream");
        input.require(8).unwrap();
        assert_eq!(input.size(8).unwrap(), 3);
        input.bump(3);
        assert!(input.is_empty().unwrap());
    }

    #[test]
    fn test_tracks_lines() {
        let mut input = BufferInput::new(&b"ab\ncd"[..], BufferConfig::new(2, 8), "stream");
        input.require(5).unwrap();
        input.bump(4);
        let pos = input.position();
        assert_eq!((pos.byte, pos.line, pos.column), (4, 2, 2));
    }

    #[test]
    fn test_from_fn() {
        let mut remaining = 3;
        let mut input = BufferInput::from_fn(
            move |buf: &mut [u8]| {
                if remaining == 0 || buf.is_empty() {
                    return Ok(0);
                }
                remaining -= 1;
                buf[0] = b'x';
                Ok(1)
            },
            BufferConfig::new(4, 8),
            "fn",
        );
        assert_eq!(input.size(5).unwrap(), 3);
        assert_eq!(input.current(), b"xxx");
    }

    #[test]
    fn test_size_is_capped_at_request() {
        let mut input = BufferInput::new(&b"abcdef"[..], BufferConfig::new(8, 16), "stream");
        assert_eq!(input.size(2).unwrap(), 2);
        assert_eq!(input.current(), b"abcdef");
        assert_eq!(input.size(10).unwrap(), 6);
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        let mut interrupted = false;
        let mut input = BufferInput::from_fn(
            move |buf: &mut [u8]| {
                if !interrupted {
                    interrupted = true;
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
                }
                let n = buf.len().min(2);
                buf[..n].copy_from_slice(&b"ok"[..n]);
                Ok(n)
            },
            BufferConfig::new(4, 8),
            "fn",
        );
        assert_eq!(input.size(2).unwrap(), 2);
        assert_eq!(&input.current()[..2], b"ok");
    }

    #[test]
    fn test_io_error_is_reported() {
        let mut input = BufferInput::from_fn(
            |_buf: &mut [u8]| Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
            BufferConfig::default(),
            "fn",
        );
        match input.size(1) {
            Err(InputError::Io { kind, .. }) => assert_eq!(kind, io::ErrorKind::BrokenPipe),
            other => panic!("unexpected {:?}", other),
        }
    }
}
