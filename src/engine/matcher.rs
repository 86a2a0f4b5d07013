//! Rule matching
//!
//! [`Matcher`] walks a [`Grammar`] against an [`Input`]. Each rule is
//! matched by [`Matcher::match_rule`] under an [`ApplyMode`] and a
//! [`RewindMode`]:
//!
//! - a rule matched with `Required` leaves the cursor untouched on failure
//! - a rule matched with `Active` may leave the cursor anywhere on failure,
//!   because its caller holds a mark and restores it
//! - a rule matched with `DontCare` is never rewound
//!
//! Marks are scoped guards ([`Marker`]) that restore the cursor when dropped
//! unless the match succeeded, so every exit path, including errors, rewinds.

use super::error::{Error, MatchResult};
use super::grammar::{Grammar, Rule, RuleId};
use super::input::{Input, Iter};
use super::protocol::{
    Action, ActionInput, ApplyMode, Binding, Control, RewindMode, RuleRef, SubMatch,
};
use super::regex_cache;
use super::view::View;
use std::ops::{Deref, DerefMut};

/// Matching state for one parse
pub struct Matcher<'a, I, C> {
    grammar: &'a Grammar,
    input: &'a mut I,
    control: &'a mut C,
    depth: usize,
    max_depth: usize,
}

/// Scoped mark on the matcher's input
///
/// Only a `Required` marker holds a real mark. When dropped, it rewinds
/// the input to the mark unless [`Marker::commit`] was called with `true`.
struct Marker<'m, 'a, I: Input, C> {
    matcher: &'m mut Matcher<'a, I, C>,
    mark: Option<Iter>,
    committed: bool,
}

impl<'m, 'a, I: Input, C> Marker<'m, 'a, I, C> {
    fn new(matcher: &'m mut Matcher<'a, I, C>, rewind: RewindMode) -> Self {
        let mark = match rewind {
            RewindMode::Required => Some(matcher.input.mark()),
            RewindMode::Active | RewindMode::DontCare => None,
        };
        Self {
            matcher,
            mark,
            committed: false,
        }
    }

    /// Keep the cursor where it is if `ok`; returns `ok`
    #[inline]
    fn commit(mut self, ok: bool) -> bool {
        self.committed = ok;
        ok
    }

    /// Snapshot taken when the marker was created
    #[inline]
    fn begin(&self) -> Option<Iter> {
        self.mark
    }
}

impl<'a, I: Input, C> Deref for Marker<'_, 'a, I, C> {
    type Target = Matcher<'a, I, C>;

    fn deref(&self) -> &Self::Target {
        self.matcher
    }
}

impl<I: Input, C> DerefMut for Marker<'_, '_, I, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.matcher
    }
}

impl<I: Input, C> Drop for Marker<'_, '_, I, C> {
    fn drop(&mut self) {
        if let Some(mark) = self.mark.take() {
            if self.committed {
                self.matcher.input.release(mark);
            } else {
                self.matcher.input.restart(mark);
            }
        }
    }
}

impl<'a, I: Input, C: Control<I>> Matcher<'a, I, C> {
    /// Create a matcher; `max_depth` of 0 means unlimited rule nesting
    pub fn new(grammar: &'a Grammar, input: &'a mut I, control: &'a mut C, max_depth: usize) -> Self {
        Self {
            grammar,
            input,
            control,
            depth: 0,
            max_depth,
        }
    }

    /// The grammar being matched
    pub fn grammar(&self) -> &'a Grammar {
        self.grammar
    }

    /// The input being matched
    pub fn input(&self) -> &I {
        self.input
    }

    /// Current nesting depth of named rules
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Match rule `id` at the cursor
    pub fn match_rule<A: Action<S>, S>(
        &mut self,
        id: RuleId,
        apply: ApplyMode,
        rewind: RewindMode,
        action: &mut A,
        state: &mut S,
    ) -> MatchResult {
        let grammar = self.grammar;
        let rule = grammar
            .rule(id)
            .ok_or_else(|| Error::invalid_grammar(format!("missing rule #{}", id)))?;

        match rule {
            Rule::Any { view } => self.match_element(*view, |_| true),
            Rule::Bytes { count } => {
                if self.input.size(*count)? >= *count {
                    self.input.bump(*count);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Rule::Literal { text } => {
                let text = text.as_bytes();
                self.input.size(text.len())?;
                if self.input.current().starts_with(text) {
                    self.bump_matched(text.len());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Rule::IString { text } => {
                let text = text.as_bytes();
                self.input.size(text.len())?;
                let current = self.input.current();
                if current.len() >= text.len() && current[..text.len()].eq_ignore_ascii_case(text) {
                    self.bump_matched(text.len());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Rule::OneOf { set, negated, view } => {
                self.match_element(*view, |e| set.contains(&e) != *negated)
            }
            Rule::Range {
                ranges,
                negated,
                view,
            } => self.match_element(*view, |e| {
                ranges.iter().any(|&(lo, hi)| lo <= e && e <= hi) != *negated
            }),
            Rule::Class { class, negated } => {
                self.match_element(View::Byte, |e| class.matches(e as u8) != *negated)
            }
            Rule::Re { pattern } => {
                self.input.size(usize::MAX)?;
                let len = regex_cache::match_len(pattern, self.input.current())
                    .map_err(|err| Error::invalid_grammar(err.to_string()))?;
                match len {
                    Some(len) => {
                        self.input.bump(len);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            Rule::Bof => Ok(self.input.byte() == 0),
            Rule::Bol => Ok(self.input.is_bol()),
            Rule::Eof => Ok(self.input.is_empty()?),
            Rule::Eol => self.match_eol(),
            Rule::Eolf => {
                if self.input.is_empty()? {
                    Ok(true)
                } else {
                    self.match_eol()
                }
            }
            Rule::Success => Ok(true),
            Rule::Failure => Ok(false),
            Rule::Discard => {
                self.input.discard();
                Ok(true)
            }
            Rule::Raise { rule } => Err(self.raise(*rule)),

            Rule::Seq { rules } => {
                let mut m = Marker::new(self, rewind);
                let next = rewind.next();
                for &child in rules {
                    if !m.match_rule(child, apply, next, action, state)? {
                        return Ok(false);
                    }
                }
                Ok(m.commit(true))
            }
            Rule::Sor { rules } => {
                let last = rules.len().saturating_sub(1);
                for (i, &child) in rules.iter().enumerate() {
                    let mode = if i < last { RewindMode::Required } else { rewind };
                    if self.match_rule(child, apply, mode, action, state)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Rule::Star { rule } => {
                while self.match_rule(*rule, apply, RewindMode::Required, action, state)? {}
                Ok(true)
            }
            Rule::Plus { rule } => {
                if !self.match_rule(*rule, apply, rewind, action, state)? {
                    return Ok(false);
                }
                while self.match_rule(*rule, apply, RewindMode::Required, action, state)? {}
                Ok(true)
            }
            Rule::Opt { rule } => {
                self.match_rule(*rule, apply, RewindMode::Required, action, state)?;
                Ok(true)
            }
            Rule::Rep {
                rule,
                min: 0,
                max: Some(0),
            } => self.match_lookahead(*rule, false, action, state),
            Rule::Rep { rule, min, max } => {
                let mut m = Marker::new(self, rewind);
                let next = rewind.next();
                for _ in 0..*min {
                    if !m.match_rule(*rule, apply, next, action, state)? {
                        return Ok(false);
                    }
                }
                let mut count = *min;
                while max.map_or(true, |max| count < max) {
                    if !m.match_rule(*rule, apply, RewindMode::Required, action, state)? {
                        break;
                    }
                    count += 1;
                }
                Ok(m.commit(true))
            }
            Rule::At { rule } => self.match_lookahead(*rule, true, action, state),
            Rule::NotAt { rule } => self.match_lookahead(*rule, false, action, state),
            Rule::Until { cond, body } => {
                let mut m = Marker::new(self, rewind);
                let next = rewind.next();
                while !m.match_rule(*cond, apply, RewindMode::Required, action, state)? {
                    if m.input.is_empty()? {
                        return Ok(false);
                    }
                    match body {
                        Some(body) => {
                            if !m.match_rule(*body, apply, next, action, state)? {
                                return Ok(false);
                            }
                        }
                        None => m.input.bump(1),
                    }
                }
                Ok(m.commit(true))
            }
            Rule::Must { rule } => self.match_must(*rule, apply, action, state),
            Rule::IfMust { cond, rules } => {
                if !self.match_rule(*cond, apply, rewind, action, state)? {
                    return Ok(false);
                }
                for &child in rules {
                    self.match_must(child, apply, action, state)?;
                }
                Ok(true)
            }
            Rule::IfThenElse {
                cond,
                then,
                otherwise,
            } => {
                let mut m = Marker::new(self, rewind);
                let next = rewind.next();
                let branch = if m.match_rule(*cond, apply, RewindMode::Required, action, state)? {
                    *then
                } else {
                    *otherwise
                };
                let ok = m.match_rule(branch, apply, next, action, state)?;
                Ok(m.commit(ok))
            }
            Rule::Enable { rule } => self.match_rule(*rule, ApplyMode::Action, rewind, action, state),
            Rule::Disable { rule } => {
                self.match_rule(*rule, ApplyMode::Nothing, rewind, action, state)
            }
            Rule::Scope { name, rule } => {
                let scope = RuleRef { id, name };
                let sub = SubMatch::new(self, *rule, apply, rewind);
                action.scope(scope, sub, state)
            }
            Rule::Named { name, rule } => {
                self.match_named(RuleRef { id, name }, *rule, apply, rewind, action, state)
            }
            Rule::Ref { rule } => self.match_rule(*rule, apply, rewind, action, state),
        }
    }

    fn match_named<A: Action<S>, S>(
        &mut self,
        rule: RuleRef<'a>,
        body: RuleId,
        apply: ApplyMode,
        rewind: RewindMode,
        action: &mut A,
        state: &mut S,
    ) -> MatchResult {
        self.depth += 1;
        if self.max_depth > 0 && self.depth > self.max_depth {
            let depth = self.depth;
            self.depth -= 1;
            return Err(Error::RecursionLimitExceeded {
                depth,
                max_depth: self.max_depth,
            });
        }

        let binding = match apply {
            ApplyMode::Action => action.binding(rule),
            ApplyMode::Nothing => Binding::None,
        };
        let result = if binding == Binding::None {
            self.start(rule);
            let ok = self.match_rule(body, apply, rewind, action, state);
            self.finish(rule, ok)
        } else {
            let mut m = Marker::new(self, RewindMode::Required);
            m.start(rule);
            let ok = match m.match_rule(body, apply, RewindMode::Active, action, state) {
                Ok(true) => {
                    let begin = m.begin().unwrap_or_default();
                    match binding {
                        Binding::Apply => {
                            let span = ActionInput::new(&*m.input, begin);
                            action.apply(rule, &span, state)
                        }
                        _ => action.apply0(rule, state),
                    }
                }
                other => other,
            };
            let ok = m.finish(rule, ok);
            if let Ok(matched) = ok {
                m.commit(matched);
            }
            ok
        };

        self.depth -= 1;
        result
    }

    #[inline]
    fn start(&mut self, rule: RuleRef<'_>) {
        self.control.start(rule, &*self.input);
    }

    /// Fire the success or failure hook for a finished named rule
    #[inline]
    fn finish(&mut self, rule: RuleRef<'_>, result: MatchResult) -> MatchResult {
        match result {
            Ok(true) => self.control.success(rule, &*self.input),
            Ok(false) => self.control.failure(rule, &*self.input),
            Err(_) => {}
        }
        result
    }

    fn match_must<A: Action<S>, S>(
        &mut self,
        rule: RuleId,
        apply: ApplyMode,
        action: &mut A,
        state: &mut S,
    ) -> MatchResult {
        if self.match_rule(rule, apply, RewindMode::DontCare, action, state)? {
            Ok(true)
        } else {
            Err(self.raise(rule))
        }
    }

    fn match_lookahead<A: Action<S>, S>(
        &mut self,
        rule: RuleId,
        positive: bool,
        action: &mut A,
        state: &mut S,
    ) -> MatchResult {
        let mut m = Marker::new(self, RewindMode::Required);
        let ok = m.match_rule(rule, ApplyMode::Nothing, RewindMode::Active, action, state)?;
        Ok(ok == positive)
    }

    fn match_element(&mut self, view: View, accept: impl Fn(u32) -> bool) -> MatchResult {
        self.input.size(view.max_len())?;
        let len = match view.peek(self.input.current()) {
            Some((element, len)) if accept(element) => len,
            _ => return Ok(false),
        };
        self.input.bump(len);
        Ok(true)
    }

    /// Advance over `len` matched bytes, skipping line tracking when they
    /// hold no line end.
    fn bump_matched(&mut self, len: usize) {
        let marker = self.input.eol().marker();
        let matched = &self.input.current()[..len.min(self.input.current().len())];
        if memchr::memchr(marker, matched).is_none() {
            self.input.bump_in_this_line(len);
        } else {
            self.input.bump(len);
        }
    }

    fn match_eol(&mut self) -> MatchResult {
        self.input.size(2)?;
        match self.input.eol().match_len(self.input.current()) {
            Some(len) => {
                self.input.bump_to_next_line(len);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Build the fatal error for `rule` through the control
    pub fn raise(&mut self, rule: RuleId) -> Error {
        let name = self.grammar.rule_name(rule);
        let err = self.control.raise(RuleRef { id: rule, name: &name }, &*self.input);
        log_debug!("raise: {}", err);
        Error::Parse(err)
    }
}
