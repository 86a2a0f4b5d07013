//! Engine error types
//!
//! Matching has three failure channels:
//!
//! - a recoverable `Ok(false)` returned by every matcher, used for backtracking
//! - [`ParseError`], raised by `must`-style rules and short-circuiting the whole
//!   parse with a message and a stack of positions
//! - [`InputError`], raised by cursors that cannot supply more input
//!
//! [`Error`] wraps the fatal channels together with the configuration errors
//! the engine itself can detect.

use super::position::{line_at, Position};
use std::fmt;
use std::io;

/// Result of a single match attempt: `Ok(true)` on success, `Ok(false)` on
/// a recoverable failure, `Err` for fatal errors.
pub type MatchResult = Result<bool, Error>;

/// A fatal parse error
///
/// `positions` is ordered innermost first: the position where the error was
/// raised comes first, followed by one position per nested parse boundary
/// the error crossed on its way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable message
    pub message: String,
    /// Positions, innermost first
    pub positions: Vec<Position>,
}

impl ParseError {
    /// Create a new error raised at `position`
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            positions: vec![position],
        }
    }

    /// Create an error that carries no position yet
    pub fn without_position(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            positions: Vec::new(),
        }
    }

    /// Append an outer position
    pub fn push_position(&mut self, position: Position) {
        self.positions.push(position);
    }

    /// The innermost position, where the error was raised
    pub fn position(&self) -> Option<&Position> {
        self.positions.first()
    }

    /// Render the error together with its "included from" trace
    pub fn trace(&self) -> String {
        let mut output = self.to_string();
        for outer in self.positions.iter().skip(1) {
            output.push_str("\n  included from ");
            output.push_str(&outer.to_string());
        }
        output
    }

    /// Render the error with the offending source line and a caret
    ///
    /// `input` must be the data the innermost position refers to.
    pub fn format_with_source(&self, input: &[u8], marker: u8) -> String {
        let mut output = String::new();
        output.push_str(&self.to_string());
        output.push('\n');

        if let Some(pos) = self.position() {
            let line = line_at(input, pos.byte, marker);
            output.push_str(&String::from_utf8_lossy(line));
            output.push('\n');
            for _ in 0..pos.column.saturating_sub(1) {
                output.push(' ');
            }
            output.push_str("^\n");
        }

        output
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position() {
            Some(pos) => write!(f, "{}: {}", pos, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors raised by input cursors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A request for more lookahead than the buffer may ever hold
    CapacityExceeded {
        /// Number of bytes requested ahead of the cursor
        requested: usize,
        /// Configured maximum buffer size
        maximum: usize,
    },

    /// The underlying byte source failed
    Io {
        /// Kind of the I/O failure
        kind: io::ErrorKind,
        /// OS error code, when the failure came from the OS
        code: Option<i32>,
        /// Error description
        message: String,
    },
}

impl From<io::Error> for InputError {
    fn from(err: io::Error) -> Self {
        InputError::Io {
            kind: err.kind(),
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::CapacityExceeded { requested, maximum } => write!(
                f,
                "requested {} bytes of lookahead, buffer maximum is {}",
                requested, maximum
            ),
            InputError::Io {
                code: Some(code),
                message,
                ..
            } => write!(f, "read failed (os error {}): {}", code, message),
            InputError::Io { message, .. } => write!(f, "read failed: {}", message),
        }
    }
}

impl std::error::Error for InputError {}

/// Top-level engine error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A `must`-style rule failed
    Parse(ParseError),

    /// The input could not be read
    Input(InputError),

    /// Rule nesting exceeded the configured limit
    RecursionLimitExceeded {
        /// Depth that was reached
        depth: usize,
        /// Configured maximum
        max_depth: usize,
    },

    /// The grammar is malformed
    InvalidGrammar {
        /// Reason why the grammar is invalid
        reason: String,
    },
}

impl Error {
    /// Build an `InvalidGrammar` error
    pub fn invalid_grammar(reason: impl Into<String>) -> Self {
        Error::InvalidGrammar {
            reason: reason.into(),
        }
    }

    /// The parse error, if this is one
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<InputError> for Error {
    fn from(err: InputError) -> Self {
        Error::Input(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Input(err.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "{}", err),
            Error::Input(err) => write!(f, "{}", err),
            Error::RecursionLimitExceeded { depth, max_depth } => write!(
                f,
                "Recursion depth {} exceeds maximum of {}",
                depth, max_depth
            ),
            Error::InvalidGrammar { reason } => write!(f, "Invalid grammar: {}", reason),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Input(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("parse error matching \"{\"", Position::new(0, 1, 1, "mem"));
        assert_eq!(err.to_string(), "mem:1:1: parse error matching \"{\"");
    }

    #[test]
    fn test_trace_lists_outer_positions() {
        let mut err = ParseError::new("bad", Position::new(4, 1, 5, "inner"));
        err.push_position(Position::new(10, 2, 3, "outer"));
        let trace = err.trace();
        assert!(trace.starts_with("inner:1:5: bad"));
        assert!(trace.contains("included from outer:2:3"));
        assert_eq!(err.position().map(|p| p.source.as_str()), Some("inner"));
    }

    #[test]
    fn test_format_with_source() {
        let err = ParseError::new("expected digit", Position::new(6, 2, 3, "mem"));
        let out = err.format_with_source(b"abc\nd x", b'\n');
        assert!(out.contains("d x\n  ^"));
    }

    #[test]
    fn test_input_error_from_io() {
        let io_err = io::Error::from_raw_os_error(2);
        let err = InputError::from(io_err);
        match err {
            InputError::Io { code, .. } => assert_eq!(code, Some(2)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_capacity_display() {
        let err = Error::from(InputError::CapacityExceeded {
            requested: 200,
            maximum: 128,
        });
        assert!(err.to_string().contains("200"));
        assert!(err.to_string().contains("128"));
    }

    #[test]
    fn test_error_source() {
        use std::error::Error as _;
        let err = Error::from(ParseError::without_position("x"));
        assert!(err.source().is_some());
        assert!(err.as_parse().is_some());
        assert!(Error::invalid_grammar("y").source().is_none());
    }
}
