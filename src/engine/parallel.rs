//! Batch parsing
//!
//! Independent parses share nothing but the (immutable) grammar, so a batch
//! of inputs can be matched on separate threads.
//!
//! # Feature Flag
//!
//! Work is spread over a rayon thread pool when the `parallel` feature is
//! enabled and runs sequentially otherwise:
//!
//! ```toml
//! [dependencies]
//! pegkit = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use pegkit::engine::dsl::{lit, GrammarBuilder, ParsletExt};
//! use pegkit::engine::parse_batch_parallel;
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("greeting", lit("hello").then(lit(" world").opt()))
//!     .build()
//!     .unwrap();
//!
//! let results = parse_batch_parallel(&grammar, &["hello", "hello world", "bye"]);
//! assert_eq!(results.len(), 3);
//! assert!(matches!(results[2], Ok(false)));
//! ```

use super::error::MatchResult;
use super::grammar::Grammar;
use super::input::Input;
use super::memory::MemoryInput;
use super::parser::{Parser, ParserConfig};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One parse of a batch
///
/// The result is `Ok(true)` only when the start rule matched the whole
/// input.
fn parse_one(grammar: &Grammar, config: &ParserConfig, index: usize, text: &str) -> MatchResult {
    let mut input = MemoryInput::from_str(text, format!("batch[{}]", index));
    let matched = Parser::new(grammar)
        .with_config(config.clone())
        .parse(&mut input, &mut ())?;
    Ok(matched && input.is_empty()?)
}

/// Parse multiple inputs in parallel
///
/// Results are in the same order as `inputs`. Each input is labelled
/// `batch[i]` in error positions.
#[cfg(feature = "parallel")]
pub fn parse_batch_parallel(grammar: &Grammar, inputs: &[&str]) -> Vec<MatchResult> {
    parse_batch_with(grammar, &ParserConfig::default(), inputs)
}

/// Parse multiple inputs sequentially (fallback when rayon is not available)
#[cfg(not(feature = "parallel"))]
pub fn parse_batch_parallel(grammar: &Grammar, inputs: &[&str]) -> Vec<MatchResult> {
    parse_batch_with(grammar, &ParserConfig::default(), inputs)
}

/// Parse multiple inputs in parallel with an explicit configuration
#[cfg(feature = "parallel")]
pub fn parse_batch_with(
    grammar: &Grammar,
    config: &ParserConfig,
    inputs: &[&str],
) -> Vec<MatchResult> {
    inputs
        .par_iter()
        .enumerate()
        .map(|(i, text)| parse_one(grammar, config, i, text))
        .collect()
}

/// Parse multiple inputs sequentially with an explicit configuration
#[cfg(not(feature = "parallel"))]
pub fn parse_batch_with(
    grammar: &Grammar,
    config: &ParserConfig,
    inputs: &[&str],
) -> Vec<MatchResult> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, text)| parse_one(grammar, config, i, text))
        .collect()
}

/// Parse multiple owned inputs in parallel
///
/// This version takes owned strings, which is useful when you have
/// a vector of Strings rather than string slices.
#[cfg(feature = "parallel")]
pub fn parse_batch_parallel_owned(grammar: &Grammar, inputs: Vec<String>) -> Vec<MatchResult> {
    let config = ParserConfig::default();
    inputs
        .into_par_iter()
        .enumerate()
        .map(|(i, text)| parse_one(grammar, &config, i, &text))
        .collect()
}

/// Parse multiple owned inputs sequentially (fallback)
#[cfg(not(feature = "parallel"))]
pub fn parse_batch_parallel_owned(grammar: &Grammar, inputs: Vec<String>) -> Vec<MatchResult> {
    let config = ParserConfig::default();
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, text)| parse_one(grammar, &config, i, &text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dsl::{lit, GrammarBuilder, ParsletExt};
    use crate::engine::error::Error;

    fn hello() -> Grammar {
        GrammarBuilder::new().rule("test", lit("hello")).build().unwrap()
    }

    #[test]
    fn test_parse_batch() {
        let grammar = hello();
        let results = parse_batch_parallel(&grammar, &["hello", "hello", "hello"]);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| matches!(r, Ok(true))));
    }

    #[test]
    fn test_parse_batch_with_failures() {
        let grammar = hello();
        let results = parse_batch_parallel(&grammar, &["hello", "world", "hello!"]);
        assert!(matches!(results[0], Ok(true)));
        assert!(matches!(results[1], Ok(false)));
        assert!(matches!(results[2], Ok(false)));
    }

    #[test]
    fn test_parse_batch_owned() {
        let grammar = hello();
        let results = parse_batch_parallel_owned(&grammar, vec!["hello".into(), "x".into()]);
        assert!(matches!(results[0], Ok(true)));
        assert!(matches!(results[1], Ok(false)));
    }

    #[test]
    fn test_errors_are_labelled_by_index() {
        let grammar = GrammarBuilder::new()
            .rule("test", lit("a").then(lit("b").must()))
            .build()
            .unwrap();
        let config = ParserConfig::new();
        let results = parse_batch_with(&grammar, &config, &["ab", "ax"]);
        assert!(matches!(results[0], Ok(true)));
        match &results[1] {
            Err(Error::Parse(err)) => assert_eq!(err.positions[0].source, "batch[1]"),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }
}
