//! pegkit - PEG matching engine
//!
//! A parsing expression grammar engine built around a rewindable input
//! cursor. It provides:
//! - In-memory, mapped and bounded streaming inputs behind one cursor trait
//! - A rule combinator library (sequences, ordered choice, repetition,
//!   lookahead, `until`, `must` and friends)
//! - Action and control hooks with apply-mode switching and state swapping
//! - Static grammar analysis that finds cycles without progress
//! - Positions with line/column tracking and nested-parse error traces
//! - Developer tools (tracing, counters, parse trees, visualization)
//!
//! ## Quick Start
//!
//! ```rust
//! use pegkit::prelude::*;
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("greeting", lit("hello").then(lit(" ")).then(ref_("name")))
//!     .rule("name", class(CharClass::Alpha).plus())
//!     .build()
//!     .unwrap();
//!
//! let mut input = MemoryInput::from_str("hello world", "greeting.txt");
//! assert!(Parser::new(&grammar).parse(&mut input, &mut ()).unwrap());
//! ```
//!
//! ## Streaming Input
//!
//! ```rust
//! use pegkit::prelude::*;
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("lines", until(eof()).then(eof()))
//!     .build()
//!     .unwrap();
//!
//! let data: &[u8] = b"one\ntwo\nthree\n";
//! let mut input = BufferInput::new(data, BufferConfig::small(), "stdin");
//! assert!(Parser::new(&grammar).parse(&mut input, &mut ()).unwrap());
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate
//! - `parallel` - Parse batches of inputs on a rayon thread pool

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
// Allow some pedantic lints that are too noisy
#![allow(clippy::module_inception)]
#![allow(clippy::redundant_closure)]

// Prelude module for convenient imports
pub mod prelude;

// The matching engine
pub mod engine;

/// Re-export commonly used types for convenience
pub use engine::{
    // Grammar analysis
    analyze,
    // Debug tools
    debug::{Counter, GrammarVisualizer, Tracer},
    // Parser DSL
    dsl::{GrammarBuilder, Parslet, ParsletExt},
    // Parse trees
    tree::{TreeBuilder, TreePrinter},
    Action,
    BufferConfig,
    BufferInput,
    Control,
    Error,
    Grammar,
    Input,
    MemoryInput,
    ParseError,
    Parser,
    ParserConfig,
    Position,
    Rule,
};
