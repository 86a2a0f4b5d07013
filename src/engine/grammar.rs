//! Grammar representation
//!
//! A [`Grammar`] is an arena of [`Rule`]s. Combinators refer to their
//! children by [`RuleId`], the index of the child in the arena, so rules can
//! be shared freely. Recursion is expressed through [`Rule::Ref`], which
//! always points at a [`Rule::Named`] rule; the name is the stable identity
//! that actions, controls, diagnostics and the analyzer work with.
//!
//! Grammars are plain data and can be stored as JSON:
//!
//! ```rust
//! use pegkit::engine::{Grammar, Rule};
//!
//! let mut grammar = Grammar::new();
//! let lit = grammar.add_rule(Rule::Literal { text: "ab".into() });
//! grammar.root = grammar.add_rule(Rule::Named { name: "ab".into(), rule: lit });
//!
//! let json = grammar.to_json().unwrap();
//! assert_eq!(Grammar::from_json(&json).unwrap(), grammar);
//! ```

use super::char_class::CharClass;
use super::error::Error;
use super::grammar_analysis;
use super::input::Input;
use super::memory::MemoryInput;
use super::parser::Parser;
use super::regex_cache;
use super::view::View;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Index of a rule in its grammar
pub type RuleId = usize;

/// Nesting depth after which rule descriptions are abbreviated
const DESCRIBE_DEPTH: usize = 3;

/// A grammar rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    // ------------------------------------------------------------------
    // Leaves
    // ------------------------------------------------------------------
    /// Any single element of the view
    Any {
        /// Element view
        view: View,
    },

    /// Exactly `count` raw bytes
    Bytes {
        /// Number of bytes
        count: usize,
    },

    /// An exact string
    Literal {
        /// The text to match
        text: String,
    },

    /// An ASCII case-insensitive string
    IString {
        /// The text to match
        text: String,
    },

    /// One element from (or, negated, not from) a set
    OneOf {
        /// Allowed elements
        set: Vec<u32>,
        /// Match elements outside the set instead
        negated: bool,
        /// Element view
        view: View,
    },

    /// One element within (or, negated, outside) inclusive ranges
    Range {
        /// Inclusive `(low, high)` ranges
        ranges: Vec<(u32, u32)>,
        /// Match elements outside all ranges instead
        negated: bool,
        /// Element view
        view: View,
    },

    /// One ASCII byte of a character class
    Class {
        /// The class
        class: CharClass,
        /// Match bytes outside the class instead
        negated: bool,
    },

    /// A regular expression anchored at the cursor
    Re {
        /// Pattern in `regex` crate syntax
        pattern: String,
    },

    /// Beginning of the input
    Bof,

    /// Beginning of a line
    Bol,

    /// End of the input
    Eof,

    /// An end-of-line sequence, per the input's policy
    Eol,

    /// An end-of-line sequence or the end of the input
    Eolf,

    /// Always succeeds without consuming
    Success,

    /// Always fails
    Failure,

    /// Succeeds after letting a streaming input drop unreachable bytes
    Discard,

    /// Unconditionally raises a parse error for `rule`
    Raise {
        /// The rule named in the error
        rule: RuleId,
    },

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------
    /// All children in order
    Seq {
        /// Children
        rules: Vec<RuleId>,
    },

    /// The first child that matches
    Sor {
        /// Alternatives, in priority order
        rules: Vec<RuleId>,
    },

    /// Zero or more repetitions
    Star {
        /// Repeated rule
        rule: RuleId,
    },

    /// One or more repetitions
    Plus {
        /// Repeated rule
        rule: RuleId,
    },

    /// Zero or one occurrence
    Opt {
        /// Optional rule
        rule: RuleId,
    },

    /// Between `min` and `max` repetitions, greedy
    Rep {
        /// Repeated rule
        rule: RuleId,
        /// Minimum number of repetitions
        min: usize,
        /// Maximum number of repetitions (None = unlimited)
        max: Option<usize>,
    },

    /// Positive lookahead
    At {
        /// Tested rule
        rule: RuleId,
    },

    /// Negative lookahead
    NotAt {
        /// Tested rule
        rule: RuleId,
    },

    /// Consume `body` (or single bytes) until `cond` matches
    Until {
        /// Terminating condition, consumed on success
        cond: RuleId,
        /// Rule consumed on each iteration, or raw bytes when absent
        body: Option<RuleId>,
    },

    /// `rule` must match, or the parse aborts
    Must {
        /// Required rule
        rule: RuleId,
    },

    /// Once `cond` matches, every one of `rules` must match
    IfMust {
        /// Condition
        cond: RuleId,
        /// Rules required after the condition
        rules: Vec<RuleId>,
    },

    /// `then` after `cond`, otherwise `otherwise`
    IfThenElse {
        /// Condition
        cond: RuleId,
        /// Matched after a successful condition
        then: RuleId,
        /// Matched when the condition fails
        otherwise: RuleId,
    },

    /// Match `rule` with actions enabled
    Enable {
        /// Inner rule
        rule: RuleId,
    },

    /// Match `rule` with actions suppressed
    Disable {
        /// Inner rule
        rule: RuleId,
    },

    /// Match `rule` through the action's scope hook
    Scope {
        /// Name handed to the scope hook
        name: String,
        /// Inner rule
        rule: RuleId,
    },

    /// A rule with a stable name; hooks and actions fire here
    Named {
        /// Stable identifier
        name: String,
        /// Definition
        rule: RuleId,
    },

    /// Reference to a named rule, resolved when the grammar is built
    Ref {
        /// Target, always a `Named` rule
        rule: RuleId,
    },
}

impl Rule {
    /// Short name of the rule variant
    pub fn kind_name(&self) -> &'static str {
        match self {
            Rule::Any { .. } => "any",
            Rule::Bytes { .. } => "bytes",
            Rule::Literal { .. } => "literal",
            Rule::IString { .. } => "istring",
            Rule::OneOf { .. } => "one_of",
            Rule::Range { .. } => "range",
            Rule::Class { .. } => "class",
            Rule::Re { .. } => "re",
            Rule::Bof => "bof",
            Rule::Bol => "bol",
            Rule::Eof => "eof",
            Rule::Eol => "eol",
            Rule::Eolf => "eolf",
            Rule::Success => "success",
            Rule::Failure => "failure",
            Rule::Discard => "discard",
            Rule::Raise { .. } => "raise",
            Rule::Seq { .. } => "seq",
            Rule::Sor { .. } => "sor",
            Rule::Star { .. } => "star",
            Rule::Plus { .. } => "plus",
            Rule::Opt { .. } => "opt",
            Rule::Rep { .. } => "rep",
            Rule::At { .. } => "at",
            Rule::NotAt { .. } => "not_at",
            Rule::Until { .. } => "until",
            Rule::Must { .. } => "must",
            Rule::IfMust { .. } => "if_must",
            Rule::IfThenElse { .. } => "if_then_else",
            Rule::Enable { .. } => "enable",
            Rule::Disable { .. } => "disable",
            Rule::Scope { .. } => "scope",
            Rule::Named { .. } => "named",
            Rule::Ref { .. } => "ref",
        }
    }

    /// Immediate children, in matching order
    pub fn children(&self) -> Vec<RuleId> {
        match self {
            Rule::Seq { rules } | Rule::Sor { rules } => rules.clone(),
            Rule::Raise { rule }
            | Rule::Star { rule }
            | Rule::Plus { rule }
            | Rule::Opt { rule }
            | Rule::Rep { rule, .. }
            | Rule::At { rule }
            | Rule::NotAt { rule }
            | Rule::Must { rule }
            | Rule::Enable { rule }
            | Rule::Disable { rule }
            | Rule::Scope { rule, .. }
            | Rule::Named { rule, .. }
            | Rule::Ref { rule } => vec![*rule],
            Rule::Until { cond, body } => std::iter::once(*cond).chain(*body).collect(),
            Rule::IfMust { cond, rules } => std::iter::once(*cond).chain(rules.iter().copied()).collect(),
            Rule::IfThenElse {
                cond,
                then,
                otherwise,
            } => vec![*cond, *then, *otherwise],
            _ => Vec::new(),
        }
    }

    /// Mutable access to the immediate children, in matching order
    pub fn children_mut(&mut self) -> Vec<&mut RuleId> {
        match self {
            Rule::Seq { rules } | Rule::Sor { rules } => rules.iter_mut().collect(),
            Rule::Raise { rule }
            | Rule::Star { rule }
            | Rule::Plus { rule }
            | Rule::Opt { rule }
            | Rule::Rep { rule, .. }
            | Rule::At { rule }
            | Rule::NotAt { rule }
            | Rule::Must { rule }
            | Rule::Enable { rule }
            | Rule::Disable { rule }
            | Rule::Scope { rule, .. }
            | Rule::Named { rule, .. }
            | Rule::Ref { rule } => vec![rule],
            Rule::Until { cond, body } => std::iter::once(cond).chain(body.as_mut()).collect(),
            Rule::IfMust { cond, rules } => std::iter::once(cond).chain(rules.iter_mut()).collect(),
            Rule::IfThenElse {
                cond,
                then,
                otherwise,
            } => vec![cond, then, otherwise],
            _ => Vec::new(),
        }
    }

    /// Whether this rule has no children
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

/// A complete grammar
///
/// Contains all rules and the root rule index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    /// All rules in the grammar (referenced by index)
    pub rules: Vec<Rule>,

    /// Index of the root rule
    pub root: RuleId,
}

impl Grammar {
    /// Create a new empty grammar
    #[inline]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            root: 0,
        }
    }

    /// Add a rule and return its index
    #[inline]
    pub fn add_rule(&mut self, rule: Rule) -> RuleId {
        let id = self.rules.len();
        self.rules.push(rule);
        id
    }

    /// Get a rule by index
    #[inline]
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id)
    }

    /// Get the root rule
    #[inline]
    pub fn root_rule(&self) -> Option<&Rule> {
        self.rules.get(self.root)
    }

    /// Get total rule count
    #[inline]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Find a named rule
    pub fn lookup(&self, name: &str) -> Option<RuleId> {
        self.rules
            .iter()
            .position(|rule| matches!(rule, Rule::Named { name: n, .. } if n == name))
    }

    /// The stable name of `id`, if it is a named rule
    pub fn name_of(&self, id: RuleId) -> Option<&str> {
        match self.rules.get(id) {
            Some(Rule::Named { name, .. }) => Some(name),
            _ => None,
        }
    }

    /// Iterate over named rules as `(id, name)`
    pub fn named_rules(&self) -> impl Iterator<Item = (RuleId, &str)> + '_ {
        self.rules.iter().enumerate().filter_map(|(id, rule)| match rule {
            Rule::Named { name, .. } => Some((id, name.as_str())),
            _ => None,
        })
    }

    /// Human-readable name of any rule
    ///
    /// Named rules report their name; anonymous rules are described by
    /// their structure, e.g. `"ab"` or `seq("a", digit)`.
    pub fn rule_name(&self, id: RuleId) -> String {
        let mut out = String::new();
        self.describe(id, 0, &mut out);
        out
    }

    fn describe(&self, id: RuleId, depth: usize, out: &mut String) {
        let Some(rule) = self.rules.get(id) else {
            let _ = write!(out, "#{}", id);
            return;
        };
        if depth > DESCRIBE_DEPTH {
            out.push_str("...");
            return;
        }
        match rule {
            Rule::Named { name, .. } => out.push_str(name),
            Rule::Ref { rule } => self.describe(*rule, depth, out),
            Rule::Literal { text } => {
                let _ = write!(out, "{:?}", text);
            }
            Rule::IString { text } => {
                let _ = write!(out, "istring({:?})", text);
            }
            Rule::Bytes { count } => {
                let _ = write!(out, "bytes({})", count);
            }
            Rule::Any { view } => match view {
                View::Byte => out.push_str("any"),
                other => {
                    let _ = write!(out, "any<{:?}>", other);
                }
            },
            Rule::OneOf { set, negated, .. } => {
                out.push_str(if *negated { "not_one_of(" } else { "one_of(" });
                for (i, &c) in set.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_element(out, c);
                }
                out.push(')');
            }
            Rule::Range { ranges, negated, .. } => {
                out.push_str(if *negated { "not_range(" } else { "range(" });
                for (i, &(lo, hi)) in ranges.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_element(out, lo);
                    out.push('-');
                    write_element(out, hi);
                }
                out.push(')');
            }
            Rule::Class { class, negated } => {
                if *negated {
                    out.push('^');
                }
                out.push_str(class.name());
            }
            Rule::Re { pattern } => {
                let _ = write!(out, "re(/{}/)", pattern);
            }
            Rule::Scope { name, rule } => {
                let _ = write!(out, "scope {}(", name);
                self.describe(*rule, depth + 1, out);
                out.push(')');
            }
            Rule::Rep { rule, min, max } => {
                out.push_str("rep(");
                self.describe(*rule, depth + 1, out);
                match max {
                    Some(max) => {
                        let _ = write!(out, ", {}, {})", min, max);
                    }
                    None => {
                        let _ = write!(out, ", {}..)", min);
                    }
                }
            }
            other if other.is_leaf() => out.push_str(other.kind_name()),
            other => {
                out.push_str(other.kind_name());
                out.push('(');
                for (i, child) in other.children().into_iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.describe(child, depth + 1, out);
                }
                out.push(')');
            }
        }
    }

    /// Check that the grammar is well formed
    ///
    /// Rejects dangling indices, references that do not point at named
    /// rules, duplicate names, inverted ranges and repetition bounds, and
    /// invalid regexes.
    pub fn validate(&self) -> Result<(), Error> {
        if self.root >= self.rules.len() {
            return Err(Error::invalid_grammar(format!(
                "root #{} is out of bounds ({} rules)",
                self.root,
                self.rules.len()
            )));
        }

        let mut names = hashbrown::HashSet::new();
        for (id, rule) in self.rules.iter().enumerate() {
            if let Some(child) = rule.children().into_iter().find(|&c| c >= self.rules.len()) {
                return Err(Error::invalid_grammar(format!(
                    "rule #{} refers to missing rule #{}",
                    id, child
                )));
            }
            match rule {
                Rule::Ref { rule: target } if self.name_of(*target).is_none() => {
                    return Err(Error::invalid_grammar(format!(
                        "reference #{} does not point at a named rule",
                        id
                    )));
                }
                Rule::Named { name, .. } if !names.insert(name.as_str()) => {
                    return Err(Error::invalid_grammar(format!(
                        "rule '{}' is defined twice",
                        name
                    )));
                }
                Rule::Range { ranges, .. } => {
                    if let Some((lo, hi)) = ranges.iter().find(|(lo, hi)| lo > hi) {
                        return Err(Error::invalid_grammar(format!(
                            "rule #{} has inverted range {}..{}",
                            id, lo, hi
                        )));
                    }
                }
                Rule::Rep { min, max: Some(max), .. } if min > max => {
                    return Err(Error::invalid_grammar(format!(
                        "rule #{} repeats at least {} but at most {} times",
                        id, min, max
                    )));
                }
                Rule::Re { pattern } => {
                    regex_cache::get_or_compile(pattern).map_err(|err| {
                        Error::invalid_grammar(format!("rule #{}: {}", id, err))
                    })?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Serialize to JSON
    #[inline]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON
    #[inline]
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Count rules that can loop without consuming input
    ///
    /// With `verbose`, every problem is printed to stderr.
    pub fn analyze(&self, verbose: bool) -> usize {
        grammar_analysis::analyze(self, verbose)
    }

    /// One-shot match of the root rule against `text`
    ///
    /// Returns whether the root matched a prefix of `text`.
    ///
    /// ```
    /// use pegkit::engine::dsl::{lit, GrammarBuilder};
    ///
    /// let grammar = GrammarBuilder::new().rule("hello", lit("hello")).build().unwrap();
    /// assert!(grammar.parse_str("hello world").unwrap());
    /// assert!(!grammar.parse_str("goodbye").unwrap());
    /// ```
    pub fn parse_str(&self, text: &str) -> Result<bool, Error> {
        let mut input = MemoryInput::from_str(text, "string");
        Parser::new(self).parse(&mut input, &mut ())
    }

    /// Like [`Grammar::parse_str`], but the root must consume all of `text`
    pub fn parse_all(&self, text: &str) -> Result<bool, Error> {
        let mut input = MemoryInput::from_str(text, "string");
        let matched = Parser::new(self).parse(&mut input, &mut ())?;
        Ok(matched && input.is_empty()?)
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

fn write_element(out: &mut String, element: u32) {
    match char::from_u32(element) {
        Some(c) if !c.is_control() => {
            let _ = write!(out, "'{}'", c);
        }
        _ => {
            let _ = write!(out, "{:#x}", element);
        }
    }
}
