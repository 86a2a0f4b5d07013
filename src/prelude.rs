//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from pegkit.
//! Importing this module with a wildcard import brings the core types into scope:
//!
//! ```
//! use pegkit::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Core Types
//! - [`Grammar`] - Rule graph with a root rule
//! - [`Parser`] - Runs a grammar against an input
//! - [`ParserConfig`] - Recursion limit, apply/rewind modes, start rule
//!
//! ## Inputs
//! - [`Input`] - The cursor contract
//! - [`MemoryInput`] - In-memory input
//! - [`BufferInput`] - Bounded streaming input
//! - [`BufferConfig`] - Chunk size and buffer cap
//!
//! ## Parser DSL
//! - [`lit()`] - Match a literal string
//! - [`class()`] - Match an ASCII character class
//! - [`seq()`] / [`choice()`] - Sequence and ordered choice
//! - [`until()`] - Consume up to a terminator
//! - [`ref_()`] - Reference to another rule
//! - [`GrammarBuilder`] - Builder for constructing grammars
//! - [`ParsletExt`] - Extension trait for parslet combinators
//!
//! ## Hooks
//! - [`Action`] / [`Control`] - Semantic actions and lifecycle hooks
//! - [`Nothing`] / [`Normal`] - The no-op action and control
//!
//! ## Error Handling
//! - [`Error`] - Top-level engine error
//! - [`ParseError`] - Fatal parse error with a position trace

// ============================================================================
// Core Types
// ============================================================================

pub use crate::engine::{Grammar, Parser, ParserConfig, Rule, RuleId};

// ============================================================================
// Inputs
// ============================================================================

pub use crate::engine::{
    BufferConfig, BufferInput, Eol, Input, MappedInput, MemoryInput, Position, Tracking,
};

// ============================================================================
// Parser DSL
// ============================================================================

pub use crate::engine::dsl::{
    any, bof, bol, choice, class, dynamic, eof, eol, eolf, identifier, if_must, if_then_else,
    istr, keyword, lit, not_one_of, one_of, range, re, ref_, seq, until, until_with,
    GrammarBuilder, Parslet, ParsletExt,
};
pub use crate::engine::CharClass;

// ============================================================================
// Hooks
// ============================================================================

pub use crate::engine::{
    Action, ActionInput, ApplyMode, Binding, Control, Normal, Nothing, RewindMode, RuleRef,
};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::engine::{Error, ParseError};

// ============================================================================
// Grammar Analysis
// ============================================================================

pub use crate::engine::analyze;
