//! PEG matching engine
//!
//! Grammars are built from rules (see [`dsl`] for the builder API), checked
//! by the static analyzer and matched against any [`Input`].
//!
//! # Module Organization
//!
//! ## Inputs
//! - [`input`] - The cursor contract ([`Input`], [`Iter`], [`Eol`])
//! - [`memory`] - In-memory and mapped inputs
//! - [`buffer`] - Bounded streaming input over a reader
//! - [`position`] - Line/column positions and replay
//!
//! ## Rules
//! - [`grammar`] - Rule graph and grammar serialization
//! - [`dsl`] - Parser combinator DSL
//! - [`char_class`] - ASCII character classes
//! - [`view`] - Byte and code-point element views
//!
//! ## Matching
//! - [`matcher`] - Rule matching with rewind modes
//! - [`protocol`] - Action and control hooks
//! - [`parser`] - Parse entry points and configuration
//! - [`parallel`] - Batch parsing (uses rayon with the `parallel` feature)
//!
//! ## Diagnostics
//! - [`error`] - Parse, input and grammar errors
//! - [`grammar_analysis`] - Cycle-without-progress detection and lints
//! - [`debug`] - Tracing control and grammar visualization
//! - [`tree`] - Parse tree building control
//!
//! # Example
//!
//! ```rust
//! use pegkit::engine::dsl::{lit, ref_, GrammarBuilder, ParsletExt};
//! use pegkit::engine::{analyze, MemoryInput, Parser};
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("list", ref_("item").list(lit(",")))
//!     .rule("item", lit("a").or(lit("b")))
//!     .build()
//!     .unwrap();
//! assert_eq!(analyze(&grammar, false), 0);
//!
//! let mut input = MemoryInput::from_str("a,b,a", "mem");
//! assert!(Parser::new(&grammar).parse(&mut input, &mut ()).unwrap());
//! ```

// ============================================================================
// Logging
// ============================================================================

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}

#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}

#[cfg(feature = "logging")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}

// ============================================================================
// Module Declarations
// ============================================================================

pub mod buffer;
pub mod char_class;
pub mod debug;
pub mod dsl;
pub mod error;
pub mod grammar;
pub mod grammar_analysis;
pub mod input;
pub mod matcher;
pub mod memory;
pub mod parser;
pub mod position;
pub mod protocol;
pub mod regex_cache;
pub mod tree;
pub mod view;

// Batch parsing (always available, uses rayon when feature is enabled)
pub mod parallel;

// ============================================================================
// Inputs
// ============================================================================

pub use buffer::{BufferConfig, BufferInput, FnSource};
pub use input::{Eol, Input, Iter, Tracking};
pub use memory::{MappedInput, MemoryInput};
pub use position::Position;

// ============================================================================
// Rules
// ============================================================================

pub use char_class::CharClass;
pub use grammar::{Grammar, Rule, RuleId};
pub use view::View;

// ============================================================================
// Matching
// ============================================================================

pub use matcher::Matcher;
pub use parallel::{parse_batch_parallel, parse_batch_parallel_owned, parse_batch_with};
pub use parser::{Parser, ParserConfig, DEFAULT_MAX_RECURSION_DEPTH};
pub use protocol::{
    Action, ActionInput, ActionMap, ApplyMode, Binding, Control, Normal, Nothing, RewindMode,
    RuleRef, SubMatch,
};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{Error, InputError, MatchResult, ParseError};

// ============================================================================
// Grammar Analysis
// ============================================================================

pub use grammar_analysis::{
    analyze, AnalysisReport, GrammarAnalyzer, GrammarWarning, RuleKind, WarningKind,
};

// ============================================================================
// Developer Tools
// ============================================================================

pub use debug::{Counter, GrammarVisualizer, RuleCounts, TraceEntry, TraceEvent, Tracer};
pub use tree::{Node, TreeBuilder, TreePrinter};
