//! Developer Experience Tools
//!
//! This module provides tracing, counting and visualization tools for
//! developing and debugging grammars.
//!
//! # Features
//! - Parse tracing ([`Tracer`], a step-by-step record of named rules)
//! - Execution counters ([`Counter`])
//! - Grammar visualization (Mermaid/DOT diagrams)

use super::error::ParseError;
use super::grammar::{Grammar, Rule, RuleId};
use super::input::Input;
use super::protocol::{Control, RuleRef};
use ahash::AHashMap;
use std::fmt::Write;

/// What happened to a named rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// Started matching
    Start,
    /// Successfully matched
    Success,
    /// Failed to match
    Failure,
    /// Raised a fatal error
    Raise,
}

/// A single trace entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Rule the event fired for
    pub rule: String,
    /// What happened
    pub event: TraceEvent,
    /// Absolute byte offset of the cursor when the event fired
    pub byte: usize,
    /// Nesting depth of named rules
    pub depth: usize,
}

/// A control that records every named rule's lifecycle
///
/// ```rust
/// use pegkit::engine::dsl::{lit, ref_, GrammarBuilder, ParsletExt};
/// use pegkit::engine::{MemoryInput, Nothing, Parser, Tracer};
///
/// let grammar = GrammarBuilder::new()
///     .rule("pair", ref_("a").then(ref_("b")))
///     .rule("a", lit("a"))
///     .rule("b", lit("b"))
///     .build()
///     .unwrap();
///
/// let mut tracer = Tracer::new();
/// let mut input = MemoryInput::from_str("ab", "mem");
/// Parser::new(&grammar)
///     .parse_with(&mut input, &mut Nothing, &mut tracer, &mut ())
///     .unwrap();
/// assert_eq!(tracer.entries().len(), 6);
/// print!("{}", tracer.render());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Tracer {
    entries: Vec<TraceEntry>,
    depth: usize,
    limit: Option<usize>,
}

impl Tracer {
    /// Create a tracer that keeps every entry
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` entries; later events are dropped
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Recorded entries, in order
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Forget all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.depth = 0;
    }

    fn record(&mut self, rule: RuleRef<'_>, event: TraceEvent, byte: usize) {
        if self.limit.is_some_and(|limit| self.entries.len() >= limit) {
            return;
        }
        self.entries.push(TraceEntry {
            rule: rule.name.to_string(),
            event,
            byte,
            depth: self.depth,
        });
    }

    /// Format as a readable string
    pub fn render(&self) -> String {
        let mut output = String::new();
        for entry in &self.entries {
            let indent = "  ".repeat(entry.depth);
            let _ = match entry.event {
                TraceEvent::Start => {
                    writeln!(output, "{}-> {} at {}", indent, entry.rule, entry.byte)
                }
                TraceEvent::Success => {
                    writeln!(output, "{}<- {} matched to {}", indent, entry.rule, entry.byte)
                }
                TraceEvent::Failure => writeln!(output, "{}<- {} failed", indent, entry.rule),
                TraceEvent::Raise => {
                    writeln!(output, "{}!! {} raised at {}", indent, entry.rule, entry.byte)
                }
            };
        }
        output
    }
}

impl<I: Input> Control<I> for Tracer {
    fn start(&mut self, rule: RuleRef<'_>, input: &I) {
        self.record(rule, TraceEvent::Start, input.byte());
        self.depth += 1;
    }

    fn success(&mut self, rule: RuleRef<'_>, input: &I) {
        self.depth = self.depth.saturating_sub(1);
        self.record(rule, TraceEvent::Success, input.byte());
    }

    fn failure(&mut self, rule: RuleRef<'_>, input: &I) {
        self.depth = self.depth.saturating_sub(1);
        self.record(rule, TraceEvent::Failure, input.byte());
    }

    /// A raise unwinds the whole parse without further hooks, so the depth
    /// starts over for the next parse.
    fn raise(&mut self, rule: RuleRef<'_>, input: &I) -> ParseError {
        self.record(rule, TraceEvent::Raise, input.byte());
        self.depth = 0;
        ParseError::new(format!("parse error matching {}", rule.name), input.position())
    }
}

/// Execution counts of one rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleCounts {
    /// Times the rule was started
    pub start: usize,
    /// Times the rule matched
    pub success: usize,
    /// Times the rule failed
    pub failure: usize,
}

/// A control that counts start/success/failure per named rule
#[derive(Debug, Clone, Default)]
pub struct Counter {
    counts: AHashMap<String, RuleCounts>,
}

impl Counter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts for the rule called `name`
    pub fn get(&self, name: &str) -> RuleCounts {
        self.counts.get(name).copied().unwrap_or_default()
    }

    /// All counts, sorted by rule name
    pub fn sorted(&self) -> Vec<(&str, RuleCounts)> {
        let mut all: Vec<_> = self.counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        all.sort_unstable_by_key(|(name, _)| *name);
        all
    }

    fn entry(&mut self, rule: RuleRef<'_>) -> &mut RuleCounts {
        self.counts.entry(rule.name.to_string()).or_default()
    }
}

impl<I: Input> Control<I> for Counter {
    fn start(&mut self, rule: RuleRef<'_>, _input: &I) {
        self.entry(rule).start += 1;
    }

    fn success(&mut self, rule: RuleRef<'_>, _input: &I) {
        self.entry(rule).success += 1;
    }

    fn failure(&mut self, rule: RuleRef<'_>, _input: &I) {
        self.entry(rule).failure += 1;
    }
}

/// Grammar visualizer
pub struct GrammarVisualizer<'a> {
    grammar: &'a Grammar,
}

impl<'a> GrammarVisualizer<'a> {
    /// Create a new grammar visualizer
    pub fn new(grammar: &'a Grammar) -> Self {
        Self { grammar }
    }

    /// Generate a Mermaid diagram
    pub fn to_mermaid(&self) -> String {
        let mut output = String::new();
        output.push_str("graph TD\n");

        for (i, rule) in self.grammar.rules.iter().enumerate() {
            let label = self.label(i, rule).replace('"', "#quot;");
            let _ = writeln!(output, "  r{}[\"{}: {}\"]", i, i, label);
            for child in rule.children() {
                let _ = writeln!(output, "  r{} --> r{}", i, child);
            }
        }

        if !self.grammar.rules.is_empty() {
            let _ = writeln!(output, "  root((root)) --> r{}", self.grammar.root);
        }
        output
    }

    /// Generate a GraphViz DOT diagram
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph Grammar {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n");

        for (i, rule) in self.grammar.rules.iter().enumerate() {
            let label = self.label(i, rule).replace('\\', "\\\\").replace('"', "\\\"");
            let _ = writeln!(output, "  r{} [label=\"{}: {}\"]", i, i, label);
            for child in rule.children() {
                let _ = writeln!(output, "  r{} -> r{}", i, child);
            }
        }

        if !self.grammar.rules.is_empty() {
            let _ = writeln!(
                output,
                "  r{} [style=filled, fillcolor=lightblue]",
                self.grammar.root
            );
        }
        output.push_str("}\n");
        output
    }

    fn label(&self, id: RuleId, rule: &Rule) -> String {
        match rule {
            Rule::Named { name, .. } => format!("named({})", name),
            Rule::Rep { min, max, .. } => match max {
                Some(max) => format!("rep({}..{})", min, max),
                None => format!("rep({}..)", min),
            },
            rule if rule.is_leaf() => self.grammar.rule_name(id),
            rule => rule.kind_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dsl::{lit, ref_, GrammarBuilder, ParsletExt};
    use crate::engine::memory::MemoryInput;
    use crate::engine::parser::Parser;
    use crate::engine::protocol::Nothing;

    fn grammar() -> Grammar {
        GrammarBuilder::new()
            .rule("pair", ref_("a").then(ref_("b").or(ref_("c"))))
            .rule("a", lit("a"))
            .rule("b", lit("b"))
            .rule("c", lit("c"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_tracer_records_lifecycle() {
        let grammar = grammar();
        let mut tracer = Tracer::new();
        let mut input = MemoryInput::from_str("ac", "mem");
        assert!(Parser::new(&grammar)
            .parse_with(&mut input, &mut Nothing, &mut tracer, &mut ())
            .unwrap());

        let events: Vec<_> = tracer
            .entries()
            .iter()
            .map(|e| (e.rule.as_str(), e.event, e.depth))
            .collect();
        assert_eq!(
            events,
            vec![
                ("pair", TraceEvent::Start, 0),
                ("a", TraceEvent::Start, 1),
                ("a", TraceEvent::Success, 1),
                ("b", TraceEvent::Start, 1),
                ("b", TraceEvent::Failure, 1),
                ("c", TraceEvent::Start, 1),
                ("c", TraceEvent::Success, 1),
                ("pair", TraceEvent::Success, 0),
            ]
        );
        assert_eq!(tracer.entries()[6].byte, 2);

        let rendered = tracer.render();
        assert!(rendered.contains("-> pair at 0"));
        assert!(rendered.contains("  <- b failed"));
    }

    #[test]
    fn test_tracer_records_raise() {
        let grammar = GrammarBuilder::new()
            .rule("x", lit("a").then(ref_("y").must()))
            .rule("y", lit("y"))
            .build()
            .unwrap();
        let mut tracer = Tracer::new();
        let mut input = MemoryInput::from_str("az", "mem");
        let err = Parser::new(&grammar)
            .parse_with(&mut input, &mut Nothing, &mut tracer, &mut ())
            .unwrap_err();
        assert_eq!(err.as_parse().unwrap().message, "parse error matching y");
        let last = tracer.entries().last().unwrap();
        assert_eq!(last.event, TraceEvent::Raise);
        assert_eq!(last.byte, 1);
        assert_eq!(last.depth, 1);

        let recorded = tracer.entries().len();
        let mut input = MemoryInput::from_str("ay", "mem");
        assert!(Parser::new(&grammar)
            .parse_with(&mut input, &mut Nothing, &mut tracer, &mut ())
            .unwrap());
        let next = &tracer.entries()[recorded];
        assert_eq!((next.rule.as_str(), next.event, next.depth), ("x", TraceEvent::Start, 0));
        assert_eq!(tracer.entries().last().map(|e| e.depth), Some(0));
    }

    #[test]
    fn test_tracer_limit() {
        let grammar = grammar();
        let mut tracer = Tracer::new().with_limit(3);
        let mut input = MemoryInput::from_str("ab", "mem");
        Parser::new(&grammar)
            .parse_with(&mut input, &mut Nothing, &mut tracer, &mut ())
            .unwrap();
        assert_eq!(tracer.entries().len(), 3);
        tracer.clear();
        assert!(tracer.entries().is_empty());
    }

    #[test]
    fn test_counter() {
        let grammar = grammar();
        let mut counter = Counter::new();
        for text in ["ab", "ac", "xx"] {
            let mut input = MemoryInput::from_str(text, "mem");
            Parser::new(&grammar)
                .parse_with(&mut input, &mut Nothing, &mut counter, &mut ())
                .unwrap();
        }
        assert_eq!(
            counter.get("pair"),
            RuleCounts {
                start: 3,
                success: 2,
                failure: 1
            }
        );
        assert_eq!(counter.get("b").failure, 1);
        assert_eq!(counter.get("c").start, 1);
        assert_eq!(counter.get("missing"), RuleCounts::default());
        let names: Vec<_> = counter.sorted().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b", "c", "pair"]);
    }

    #[test]
    fn test_grammar_visualizer() {
        let grammar = grammar();
        let viz = GrammarVisualizer::new(&grammar);

        let mermaid = viz.to_mermaid();
        assert!(mermaid.starts_with("graph TD"));
        assert!(mermaid.contains("named(pair)"));
        assert!(mermaid.contains("#quot;a#quot;"));

        let dot = viz.to_dot();
        assert!(dot.contains("digraph"));
        assert!(dot.contains("fillcolor=lightblue"));
        assert!(dot.contains("\\\"b\\\""));
    }

    #[test]
    fn test_empty_grammar_visualizer() {
        let grammar = Grammar::new();
        let viz = GrammarVisualizer::new(&grammar);
        assert_eq!(viz.to_mermaid(), "graph TD\n");
        assert!(!viz.to_dot().contains("lightblue"));
    }
}
