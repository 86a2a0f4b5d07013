//! Action and control hooks
//!
//! Matching is parameterized by two independent customization points, both
//! resolved statically through generics:
//!
//! - an [`Action<S>`] runs semantic code after a named rule succeeds. It sees
//!   the matched span and the caller's state `S`, and can veto the match.
//! - a [`Control<I>`] observes every named rule's lifecycle (start, success,
//!   failure) and builds the error raised when a `must` rule fails.
//!
//! ```rust
//! use pegkit::engine::dsl::{class, GrammarBuilder, ParsletExt};
//! use pegkit::engine::{Action, ActionInput, Binding, Error, Input, MemoryInput, Parser, RuleRef};
//! use pegkit::engine::CharClass;
//!
//! struct Sum;
//!
//! impl Action<u64> for Sum {
//!     fn binding(&self, rule: RuleRef<'_>) -> Binding {
//!         if rule.name == "number" { Binding::Apply } else { Binding::None }
//!     }
//!
//!     fn apply<I: Input>(
//!         &mut self,
//!         _rule: RuleRef<'_>,
//!         input: &ActionInput<'_, I>,
//!         total: &mut u64,
//!     ) -> Result<bool, Error> {
//!         *total += input.string().parse::<u64>().unwrap_or(0);
//!         Ok(true)
//!     }
//! }
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("numbers", pegkit::engine::dsl::ref_("number").list(pegkit::engine::dsl::lit(",")))
//!     .rule("number", class(CharClass::Digit).plus())
//!     .build()
//!     .unwrap();
//!
//! let mut total = 0;
//! let mut input = MemoryInput::from_str("1,20,300", "mem");
//! Parser::new(&grammar)
//!     .parse_with(&mut input, &mut Sum, &mut pegkit::engine::Normal, &mut total)
//!     .unwrap();
//! assert_eq!(total, 321);
//! ```

use super::error::{Error, MatchResult, ParseError};
use super::grammar::RuleId;
use super::input::{Input, Iter};
use super::matcher::Matcher;
use super::position::Position;
use ahash::AHashMap;
use std::borrow::Cow;

/// Whether actions fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    /// Actions fire on success
    #[default]
    Action,
    /// Actions are suppressed
    Nothing,
}

/// Who restores the cursor when a rule fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewindMode {
    /// The rule restores the cursor itself
    #[default]
    Required,
    /// The caller holds a mark and will restore the cursor
    Active,
    /// Nobody restores the cursor; the caller never backtracks
    DontCare,
}

impl RewindMode {
    /// Mode handed to the children of a rule that holds a mark in this mode
    #[inline]
    pub fn next(self) -> Self {
        match self {
            RewindMode::Required => RewindMode::Active,
            other => other,
        }
    }
}

/// Identity of the rule a hook fires for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleRef<'a> {
    /// Index of the rule in the grammar
    pub id: RuleId,
    /// Stable name, or a structural description for anonymous rules
    pub name: &'a str,
}

/// How an action is attached to a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    /// No action
    #[default]
    None,
    /// Call [`Action::apply`] with the matched span
    Apply,
    /// Call [`Action::apply0`] without the matched span
    Apply0,
}

/// The span a rule matched, handed to [`Action::apply`]
pub struct ActionInput<'a, I> {
    input: &'a I,
    begin: Iter,
}

impl<'a, I: Input> ActionInput<'a, I> {
    /// Span from `begin` to the cursor of `input`
    pub fn new(input: &'a I, begin: Iter) -> Self {
        Self { input, begin }
    }

    /// The matched bytes
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.input.span(&self.begin)
    }

    /// The matched bytes as `str`, if valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.bytes()).ok()
    }

    /// The matched text, replacing invalid UTF-8
    pub fn string(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.bytes())
    }

    /// Absolute byte offset where the match began
    pub fn begin(&self) -> usize {
        self.begin.byte
    }

    /// Absolute byte offset where the match ended
    pub fn end(&self) -> usize {
        self.input.byte()
    }

    /// Length of the match in bytes
    pub fn len(&self) -> usize {
        self.end() - self.begin()
    }

    /// Whether the match was empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position where the match began
    pub fn position(&self) -> Position {
        self.input.position_at(&self.begin)
    }

    /// The underlying input
    pub fn input(&self) -> &I {
        self.input
    }
}

/// A pending sub-match handed to [`Action::scope`]
///
/// Running it matches the scoped rule with any action and state, which is
/// how a grammar swaps actions or state for part of the input.
pub struct SubMatch<'m, 'a, I: Input, C> {
    matcher: &'m mut Matcher<'a, I, C>,
    rule: RuleId,
    apply: ApplyMode,
    rewind: RewindMode,
}

impl<'m, 'a, I: Input, C: Control<I>> SubMatch<'m, 'a, I, C> {
    pub(crate) fn new(
        matcher: &'m mut Matcher<'a, I, C>,
        rule: RuleId,
        apply: ApplyMode,
        rewind: RewindMode,
    ) -> Self {
        Self {
            matcher,
            rule,
            apply,
            rewind,
        }
    }

    /// Match the scoped rule with `action` and `state`
    pub fn run<A: Action<S>, S>(self, action: &mut A, state: &mut S) -> MatchResult {
        self.matcher
            .match_rule(self.rule, self.apply, self.rewind, action, state)
    }

    /// The input, positioned where the sub-match will start
    pub fn input(&self) -> &I {
        self.matcher.input()
    }
}

/// Semantic actions over state `S`
///
/// Every method has a default, so an implementation only overrides what it
/// needs. [`Action::binding`] decides, per named rule, which of the apply
/// hooks fire; it is consulted only while actions are enabled.
pub trait Action<S> {
    /// Which hook to call when `rule` succeeds
    fn binding(&self, _rule: RuleRef<'_>) -> Binding {
        Binding::None
    }

    /// Called with the matched span; returning `false` vetoes the match
    fn apply<I: Input>(
        &mut self,
        _rule: RuleRef<'_>,
        _input: &ActionInput<'_, I>,
        _state: &mut S,
    ) -> Result<bool, Error> {
        Ok(true)
    }

    /// Called without the matched span; returning `false` vetoes the match
    fn apply0(&mut self, _rule: RuleRef<'_>, _state: &mut S) -> Result<bool, Error> {
        Ok(true)
    }

    /// Run a scoped rule
    ///
    /// Override to substitute another action or a fresh state for the
    /// duration of the sub-match and fold the result back into `state`.
    fn scope<I: Input, C: Control<I>>(
        &mut self,
        _scope: RuleRef<'_>,
        sub: SubMatch<'_, '_, I, C>,
        state: &mut S,
    ) -> MatchResult
    where
        Self: Sized,
    {
        sub.run(self, state)
    }
}

/// Lifecycle hooks around named rules
pub trait Control<I: Input> {
    /// A named rule is about to be matched
    fn start(&mut self, _rule: RuleRef<'_>, _input: &I) {}

    /// A named rule matched
    fn success(&mut self, _rule: RuleRef<'_>, _input: &I) {}

    /// A named rule failed
    fn failure(&mut self, _rule: RuleRef<'_>, _input: &I) {}

    /// Build the error for a required rule that failed to match
    fn raise(&mut self, rule: RuleRef<'_>, input: &I) -> ParseError {
        ParseError::new(format!("parse error matching {}", rule.name), input.position())
    }
}

/// The action that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct Nothing;

impl<S> Action<S> for Nothing {}

/// The control with no-op hooks and the default error message
#[derive(Debug, Clone, Copy, Default)]
pub struct Normal;

impl<I: Input> Control<I> for Normal {}

type ApplyFn<S> = Box<dyn FnMut(&str, &mut S) -> bool>;
type Apply0Fn<S> = Box<dyn FnMut(&mut S) -> bool>;

/// Actions looked up by rule name at run time
///
/// A convenience for small grammars where a dedicated [`Action`] type is
/// not worth it.
///
/// ```rust
/// use pegkit::engine::dsl::{lit, GrammarBuilder, ParsletExt};
/// use pegkit::engine::{ActionMap, MemoryInput, Normal, Parser};
///
/// let grammar = GrammarBuilder::new()
///     .rule("words", pegkit::engine::dsl::ref_("word").list(lit(" ")))
///     .rule("word", lit("ab").or(lit("cd")))
///     .build()
///     .unwrap();
///
/// let mut words: Vec<String> = Vec::new();
/// let mut actions = ActionMap::new().on("word", |text, words: &mut Vec<String>| {
///     words.push(text.to_string());
///     true
/// });
/// let mut input = MemoryInput::from_str("ab cd", "mem");
/// Parser::new(&grammar)
///     .parse_with(&mut input, &mut actions, &mut Normal, &mut words)
///     .unwrap();
/// assert_eq!(words, ["ab", "cd"]);
/// ```
pub struct ActionMap<S> {
    apply: AHashMap<String, ApplyFn<S>>,
    apply0: AHashMap<String, Apply0Fn<S>>,
}

impl<S> ActionMap<S> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            apply: AHashMap::new(),
            apply0: AHashMap::new(),
        }
    }

    /// Call `f` with the matched text whenever rule `name` succeeds
    pub fn on(mut self, name: &str, f: impl FnMut(&str, &mut S) -> bool + 'static) -> Self {
        self.apply.insert(name.to_string(), Box::new(f));
        self
    }

    /// Call `f` without the matched text whenever rule `name` succeeds
    pub fn on0(mut self, name: &str, f: impl FnMut(&mut S) -> bool + 'static) -> Self {
        self.apply0.insert(name.to_string(), Box::new(f));
        self
    }
}

impl<S> Default for ActionMap<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Action<S> for ActionMap<S> {
    fn binding(&self, rule: RuleRef<'_>) -> Binding {
        if self.apply.contains_key(rule.name) {
            Binding::Apply
        } else if self.apply0.contains_key(rule.name) {
            Binding::Apply0
        } else {
            Binding::None
        }
    }

    fn apply<I: Input>(
        &mut self,
        rule: RuleRef<'_>,
        input: &ActionInput<'_, I>,
        state: &mut S,
    ) -> Result<bool, Error> {
        Ok(match self.apply.get_mut(rule.name) {
            Some(f) => f(&input.string(), state),
            None => true,
        })
    }

    fn apply0(&mut self, rule: RuleRef<'_>, state: &mut S) -> Result<bool, Error> {
        Ok(match self.apply0.get_mut(rule.name) {
            Some(f) => f(state),
            None => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::MemoryInput;

    #[test]
    fn test_next_rewind_mode() {
        assert_eq!(RewindMode::Required.next(), RewindMode::Active);
        assert_eq!(RewindMode::Active.next(), RewindMode::Active);
        assert_eq!(RewindMode::DontCare.next(), RewindMode::DontCare);
    }

    #[test]
    fn test_action_input() {
        let mut input = MemoryInput::from_str("ab\ncd", "mem");
        input.bump(3);
        let begin = input.iter();
        input.bump(2);
        let span = ActionInput::new(&input, begin);
        assert_eq!(span.bytes(), b"cd");
        assert_eq!(span.as_str(), Some("cd"));
        assert_eq!((span.begin(), span.end(), span.len()), (3, 5, 2));
        assert_eq!(span.position().line, 2);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_default_raise_message() {
        let input = MemoryInput::from_str("[", "mem");
        let err = Normal.raise(RuleRef { id: 0, name: "\"{\"" }, &input);
        assert_eq!(err.message, "parse error matching \"{\"");
        assert_eq!(err.position().map(|p| p.byte), Some(0));
    }

    #[test]
    fn test_action_map_binding() {
        let map: ActionMap<u32> = ActionMap::new().on("a", |_, _| true).on0("b", |_| false);
        assert_eq!(map.binding(RuleRef { id: 0, name: "a" }), Binding::Apply);
        assert_eq!(map.binding(RuleRef { id: 1, name: "b" }), Binding::Apply0);
        assert_eq!(map.binding(RuleRef { id: 2, name: "c" }), Binding::None);
    }
}
