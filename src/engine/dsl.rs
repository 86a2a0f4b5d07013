//! Grammar DSL
//!
//! A fluent, composable API for building [`Grammar`]s in Rust. Every
//! combinator implements [`Parslet`]; building a parslet appends its rules
//! to a [`GrammarBuilder`] and returns the id of the outermost one.
//!
//! # Example
//!
//! ```rust
//! use pegkit::engine::dsl::*;
//! use pegkit::engine::CharClass;
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("sum", ref_("number").list(lit("+")).then(eof()))
//!     .rule("number", class(CharClass::Digit).plus())
//!     .build()
//!     .unwrap();
//!
//! assert!(grammar.parse_str("1+22+333").unwrap());
//! assert!(!grammar.parse_str("1+").unwrap());
//! ```
//!
//! Chained `then`/`or` calls flatten into a single sequence or choice, so
//! `a.then(b).then(c)` is one `seq` with three children.

use super::char_class::CharClass;
use super::error::Error;
use super::grammar::{Grammar, Rule, RuleId};
use super::view::View;
use ahash::AHashMap;

/// Parslet trait - implemented by all grammar combinators
pub trait Parslet: Send + Sync {
    /// Append this parslet's rules to `builder`; returns the outermost rule
    fn build(self, builder: &mut GrammarBuilder) -> RuleId;

    /// Append the children this parslet contributes to an enclosing sequence
    fn build_seq_into(self, builder: &mut GrammarBuilder, out: &mut Vec<RuleId>)
    where
        Self: Sized,
    {
        out.push(self.build(builder));
    }

    /// Append the alternatives this parslet contributes to an enclosing choice
    fn build_sor_into(self, builder: &mut GrammarBuilder, out: &mut Vec<RuleId>)
    where
        Self: Sized,
    {
        out.push(self.build(builder));
    }
}

/// Grammar builder for constructing grammars
pub struct GrammarBuilder {
    /// All rules in the grammar
    rules: Vec<Rule>,

    /// Named rules and their indices
    named: AHashMap<String, RuleId>,

    /// Placeholder references waiting for their target
    pending_refs: Vec<(RuleId, String)>,

    /// First rule added becomes the root
    first_rule: Option<RuleId>,

    /// Names defined more than once
    duplicates: Vec<String>,

    /// Last import map (if any)
    last_import: Option<ImportMap>,
}

impl GrammarBuilder {
    /// Create a new grammar builder
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            named: AHashMap::new(),
            pending_refs: Vec::new(),
            first_rule: None,
            duplicates: Vec::new(),
            last_import: None,
        }
    }

    /// Define a named rule
    pub fn rule(mut self, name: &str, parslet: impl Parslet) -> Self {
        self.rule_mut(name, parslet);
        self
    }

    /// Define a named rule (mutable version for chaining with import)
    pub fn rule_mut(&mut self, name: &str, parslet: impl Parslet) -> &mut Self {
        let body = parslet.build(self);
        let id = self.add_rule(Rule::Named {
            name: name.to_string(),
            rule: body,
        });
        self.register(name.to_string(), id);
        if self.first_rule.is_none() {
            self.first_rule = Some(id);
        }
        self
    }

    fn register(&mut self, name: String, id: RuleId) {
        if self.named.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.named.insert(name, id);
        }
    }

    /// Add a rule directly
    pub fn add_rule(&mut self, rule: Rule) -> RuleId {
        let id = self.rules.len();
        self.rules.push(rule);
        id
    }

    /// Register a reference to be resolved when the grammar is built
    pub fn add_forward_ref(&mut self, rule: RuleId, name: String) {
        self.pending_refs.push((rule, name));
    }

    /// Get the current number of rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Build the final grammar
    ///
    /// Resolves references by name, makes the first rule defined the root,
    /// and validates the result.
    pub fn build(self) -> Result<Grammar, Error> {
        if let Some(name) = self.duplicates.first() {
            return Err(Error::invalid_grammar(format!(
                "rule '{}' is defined twice",
                name
            )));
        }

        let mut rules = self.rules;
        for (id, name) in self.pending_refs {
            let target = self
                .named
                .get(&name)
                .copied()
                .ok_or_else(|| Error::invalid_grammar(format!("undefined rule '{}'", name)))?;
            rules[id] = Rule::Ref { rule: target };
        }

        let root = self.first_rule.ok_or_else(|| Error::invalid_grammar("grammar has no rules"))?;
        let grammar = Grammar { rules, root };
        grammar.validate()?;
        Ok(grammar)
    }

    /// Import all rules from another grammar
    ///
    /// Named rules of the imported grammar keep their names, prefixed with
    /// `prefix:` when a prefix is given, and can be referenced with
    /// [`ref_`] like local rules.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pegkit::engine::dsl::*;
    ///
    /// let number = GrammarBuilder::new()
    ///     .rule("digits", re("[0-9]+"))
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut builder = GrammarBuilder::new();
    /// builder.rule_mut("pair", ref_("num:digits").then(lit(",")).then(ref_("num:digits")));
    /// builder.import(&number, Some("num"));
    /// let grammar = builder.build().unwrap();
    /// assert!(grammar.parse_str("12,34").unwrap());
    /// ```
    pub fn import(&mut self, grammar: &Grammar, prefix: Option<&str>) -> &mut Self {
        let offset = self.rules.len();
        for rule in &grammar.rules {
            let mut rule = rule.clone();
            for child in rule.children_mut() {
                *child += offset;
            }
            let name = match &mut rule {
                Rule::Named { name, .. } => {
                    if let Some(prefix) = prefix {
                        *name = format!("{}:{}", prefix, name);
                    }
                    Some(name.clone())
                }
                _ => None,
            };
            let id = self.add_rule(rule);
            if let Some(name) = name {
                self.register(name, id);
            }
        }

        self.last_import = Some(ImportMap {
            offset,
            root: grammar.root + offset,
            rule_count: grammar.rules.len(),
        });
        self
    }

    /// Get the last import map (if any)
    #[inline]
    pub fn last_import(&self) -> Option<&ImportMap> {
        self.last_import.as_ref()
    }
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of importing a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportMap {
    /// The offset added to all rule indices
    pub offset: usize,
    /// The index of the imported grammar's root in the new grammar
    pub root: RuleId,
    /// Number of rules imported
    pub rule_count: usize,
}

impl ImportMap {
    /// Map an old index to the new index
    #[inline]
    pub fn map_index(&self, old: RuleId) -> RuleId {
        old + self.offset
    }
}

// ============================================================================
// Parslets - Fundamental Building Blocks
// ============================================================================

/// A single rule with no children
#[derive(Debug, Clone)]
pub struct Leaf(pub Rule);

impl Parslet for Leaf {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        builder.add_rule(self.0)
    }
}

/// A reference to a named rule (for recursive grammars)
#[derive(Debug, Clone)]
pub struct Ref(pub String);

impl Parslet for Ref {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let id = builder.add_rule(Rule::Ref { rule: 0 }); // Placeholder
        builder.add_forward_ref(id, self.0);
        id
    }
}

/// Sequence of two parslets; nested `Then`s flatten into one `seq`
#[derive(Debug, Clone, Copy)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<A: Parslet, B: Parslet> Parslet for Then<A, B> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let mut rules = Vec::new();
        self.build_seq_into(builder, &mut rules);
        builder.add_rule(Rule::Seq { rules })
    }

    fn build_seq_into(self, builder: &mut GrammarBuilder, out: &mut Vec<RuleId>) {
        self.first.build_seq_into(builder, out);
        self.second.build_seq_into(builder, out);
    }
}

/// Ordered choice of two parslets; nested `Or`s flatten into one `sor`
#[derive(Debug, Clone, Copy)]
pub struct Or<A, B> {
    first: A,
    second: B,
}

impl<A: Parslet, B: Parslet> Parslet for Or<A, B> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let mut rules = Vec::new();
        self.build_sor_into(builder, &mut rules);
        builder.add_rule(Rule::Sor { rules })
    }

    fn build_sor_into(self, builder: &mut GrammarBuilder, out: &mut Vec<RuleId>) {
        self.first.build_sor_into(builder, out);
        self.second.build_sor_into(builder, out);
    }
}

/// A sequence of multiple parslets
pub struct Sequence<P>(pub Vec<P>);

impl<P: Parslet> Parslet for Sequence<P> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let rules = self.0.into_iter().map(|p| p.build(builder)).collect();
        builder.add_rule(Rule::Seq { rules })
    }
}

/// A choice of multiple parslets
pub struct Choice<P>(pub Vec<P>);

impl<P: Parslet> Parslet for Choice<P> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let rules = self.0.into_iter().map(|p| p.build(builder)).collect();
        builder.add_rule(Rule::Sor { rules })
    }
}

/// Single-child combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Zero or more
    Star,
    /// One or more
    Plus,
    /// Zero or one
    Opt,
    /// Positive lookahead
    At,
    /// Negative lookahead
    NotAt,
    /// Required
    Must,
    /// Actions on
    Enable,
    /// Actions off
    Disable,
}

/// A single-child combinator applied to a parslet
#[derive(Debug, Clone, Copy)]
pub struct Unary<P> {
    inner: P,
    op: UnaryOp,
}

impl<P: Parslet> Parslet for Unary<P> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let rule = self.inner.build(builder);
        builder.add_rule(match self.op {
            UnaryOp::Star => Rule::Star { rule },
            UnaryOp::Plus => Rule::Plus { rule },
            UnaryOp::Opt => Rule::Opt { rule },
            UnaryOp::At => Rule::At { rule },
            UnaryOp::NotAt => Rule::NotAt { rule },
            UnaryOp::Must => Rule::Must { rule },
            UnaryOp::Enable => Rule::Enable { rule },
            UnaryOp::Disable => Rule::Disable { rule },
        })
    }
}

/// Bounded repetition
#[derive(Debug, Clone, Copy)]
pub struct Repeat<P> {
    inner: P,
    min: usize,
    max: Option<usize>,
    /// Fail when another occurrence follows the last one
    exact_max: bool,
}

impl<P: Parslet> Parslet for Repeat<P> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let rule = self.inner.build(builder);
        let rep = builder.add_rule(Rule::Rep {
            rule,
            min: self.min,
            max: self.max,
        });
        if !self.exact_max {
            return rep;
        }
        let more = builder.add_rule(Rule::NotAt { rule });
        builder.add_rule(Rule::Seq {
            rules: vec![rep, more],
        })
    }
}

/// How list separators are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `item (sep item)*`
    Plain,
    /// `item (sep must(item))*`
    Must,
    /// `item (sep item)* sep?`
    Tail,
}

/// Separated list
#[derive(Debug, Clone, Copy)]
pub struct List<P, S> {
    item: P,
    sep: S,
    kind: ListKind,
}

impl<P: Parslet, S: Parslet> Parslet for List<P, S> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let item = self.item.build(builder);
        let sep = self.sep.build(builder);
        let next = match self.kind {
            ListKind::Must => builder.add_rule(Rule::Must { rule: item }),
            ListKind::Plain | ListKind::Tail => item,
        };
        let pair = builder.add_rule(Rule::Seq {
            rules: vec![sep, next],
        });
        let more = builder.add_rule(Rule::Star { rule: pair });
        let mut rules = vec![item, more];
        if self.kind == ListKind::Tail {
            rules.push(builder.add_rule(Rule::Opt { rule: sep }));
        }
        builder.add_rule(Rule::Seq { rules })
    }
}

/// A parslet surrounded by padding
#[derive(Debug, Clone, Copy)]
pub struct Pad<P, Q> {
    inner: P,
    pad: Q,
    optional: bool,
}

impl<P: Parslet, Q: Parslet> Parslet for Pad<P, Q> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let pad = self.pad.build(builder);
        let pads = builder.add_rule(Rule::Star { rule: pad });
        let inner = self.inner.build(builder);
        if self.optional {
            let tail = builder.add_rule(Rule::Seq {
                rules: vec![inner, pads],
            });
            let tail = builder.add_rule(Rule::Opt { rule: tail });
            builder.add_rule(Rule::Seq {
                rules: vec![pads, tail],
            })
        } else {
            builder.add_rule(Rule::Seq {
                rules: vec![pads, inner, pads],
            })
        }
    }
}

/// Consume up to and including a terminator
#[derive(Debug, Clone, Copy)]
pub struct Until<C, B> {
    cond: C,
    body: Option<B>,
}

impl<C: Parslet, B: Parslet> Parslet for Until<C, B> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let cond = self.cond.build(builder);
        let body = self.body.map(|body| body.build(builder));
        builder.add_rule(Rule::Until { cond, body })
    }
}

/// Once the condition matches, the rest is required
#[derive(Debug, Clone, Copy)]
pub struct IfMust<C, R> {
    cond: C,
    rest: R,
}

impl<C: Parslet, R: Parslet> Parslet for IfMust<C, R> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let cond = self.cond.build(builder);
        let mut rules = Vec::new();
        self.rest.build_seq_into(builder, &mut rules);
        builder.add_rule(Rule::IfMust { cond, rules })
    }
}

/// Conditional branch
#[derive(Debug, Clone, Copy)]
pub struct IfThenElse<C, T, E> {
    cond: C,
    then: T,
    otherwise: E,
}

impl<C: Parslet, T: Parslet, E: Parslet> Parslet for IfThenElse<C, T, E> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let cond = self.cond.build(builder);
        let then = self.then.build(builder);
        let otherwise = self.otherwise.build(builder);
        builder.add_rule(Rule::IfThenElse {
            cond,
            then,
            otherwise,
        })
    }
}

/// A parslet matched through the action's scope hook
#[derive(Debug, Clone)]
pub struct Scope<P> {
    inner: P,
    name: String,
}

impl<P: Parslet> Parslet for Scope<P> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let rule = self.inner.build(builder);
        builder.add_rule(Rule::Scope {
            name: self.name,
            rule,
        })
    }
}

/// A parslet that raises a parse error naming its inner rule
#[derive(Debug, Clone, Copy)]
pub struct Raise<P>(pub P);

impl<P: Parslet> Parslet for Raise<P> {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let rule = self.0.build(builder);
        builder.add_rule(Rule::Raise { rule })
    }
}

/// A keyword: the text not followed by an identifier character
#[derive(Debug, Clone)]
pub struct Keyword(pub String);

impl Parslet for Keyword {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let text = builder.add_rule(Rule::Literal { text: self.0 });
        let other = builder.add_rule(Rule::Class {
            class: CharClass::IdentifierOther,
            negated: false,
        });
        let end = builder.add_rule(Rule::NotAt { rule: other });
        builder.add_rule(Rule::Seq {
            rules: vec![text, end],
        })
    }
}

/// An ASCII identifier: `[a-zA-Z_][a-zA-Z0-9_]*`
#[derive(Debug, Clone, Copy, Default)]
pub struct Identifier;

impl Parslet for Identifier {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        let first = builder.add_rule(Rule::Class {
            class: CharClass::IdentifierFirst,
            negated: false,
        });
        let other = builder.add_rule(Rule::Class {
            class: CharClass::IdentifierOther,
            negated: false,
        });
        let rest = builder.add_rule(Rule::Star { rule: other });
        builder.add_rule(Rule::Seq {
            rules: vec![first, rest],
        })
    }
}

/// A type-erased parslet (for heterogeneous sequences/choices)
pub struct Dynamic(Box<dyn DynParslet>);

/// Trait for type-erased parslets
pub trait DynParslet: Send + Sync {
    /// Build this parslet into a grammar
    fn build_boxed(self: Box<Self>, builder: &mut GrammarBuilder) -> RuleId;
}

impl<P: Parslet + 'static> DynParslet for P {
    fn build_boxed(self: Box<Self>, builder: &mut GrammarBuilder) -> RuleId {
        (*self).build(builder)
    }
}

impl Parslet for Dynamic {
    fn build(self, builder: &mut GrammarBuilder) -> RuleId {
        self.0.build_boxed(builder)
    }
}

/// Convert any parslet to a dynamic one
pub fn dynamic<P: Parslet + 'static>(p: P) -> Dynamic {
    Dynamic(Box::new(p))
}

// ============================================================================
// Extension trait for Parslet
// ============================================================================

/// Extension trait for Parslet with builder methods
pub trait ParsletExt: Parslet + Sized {
    /// Sequence: self, then `other`
    fn then<B: Parslet>(self, other: B) -> Then<Self, B> {
        Then {
            first: self,
            second: other,
        }
    }

    /// Ordered choice: self, else `other`
    fn or<B: Parslet>(self, other: B) -> Or<Self, B> {
        Or {
            first: self,
            second: other,
        }
    }

    /// Match zero or more times
    fn star(self) -> Unary<Self> {
        Unary {
            inner: self,
            op: UnaryOp::Star,
        }
    }

    /// Match one or more times
    fn plus(self) -> Unary<Self> {
        Unary {
            inner: self,
            op: UnaryOp::Plus,
        }
    }

    /// Match optional (zero or one time)
    fn opt(self) -> Unary<Self> {
        Unary {
            inner: self,
            op: UnaryOp::Opt,
        }
    }

    /// Positive lookahead (must match, doesn't consume)
    fn at(self) -> Unary<Self> {
        Unary {
            inner: self,
            op: UnaryOp::At,
        }
    }

    /// Negative lookahead (must NOT match, doesn't consume)
    fn not_at(self) -> Unary<Self> {
        Unary {
            inner: self,
            op: UnaryOp::NotAt,
        }
    }

    /// Raise a parse error unless this matches
    fn must(self) -> Unary<Self> {
        Unary {
            inner: self,
            op: UnaryOp::Must,
        }
    }

    /// Match with actions enabled
    fn enable(self) -> Unary<Self> {
        Unary {
            inner: self,
            op: UnaryOp::Enable,
        }
    }

    /// Match with actions suppressed
    fn disable(self) -> Unary<Self> {
        Unary {
            inner: self,
            op: UnaryOp::Disable,
        }
    }

    /// Exactly `count` times
    fn rep(self, count: usize) -> Repeat<Self> {
        self.rep_min_max(count, count)
    }

    /// Between `min` and `max` times, greedy
    fn rep_min_max(self, min: usize, max: usize) -> Repeat<Self> {
        Repeat {
            inner: self,
            min,
            max: Some(max),
            exact_max: false,
        }
    }

    /// At least `min` times
    fn rep_min(self, min: usize) -> Repeat<Self> {
        Repeat {
            inner: self,
            min,
            max: None,
            exact_max: false,
        }
    }

    /// At most `max` times, failing if a further occurrence follows
    fn rep_max(self, max: usize) -> Repeat<Self> {
        Repeat {
            inner: self,
            min: 0,
            max: Some(max),
            exact_max: true,
        }
    }

    /// Up to `max` times, greedy
    fn rep_opt(self, max: usize) -> Repeat<Self> {
        self.rep_min_max(0, max)
    }

    /// `self (sep self)*`
    fn list<S: Parslet>(self, sep: S) -> List<Self, S> {
        List {
            item: self,
            sep,
            kind: ListKind::Plain,
        }
    }

    /// Like [`ParsletExt::list`], but an item must follow every separator
    fn list_must<S: Parslet>(self, sep: S) -> List<Self, S> {
        List {
            item: self,
            sep,
            kind: ListKind::Must,
        }
    }

    /// Like [`ParsletExt::list`], allowing a trailing separator
    fn list_tail<S: Parslet>(self, sep: S) -> List<Self, S> {
        List {
            item: self,
            sep,
            kind: ListKind::Tail,
        }
    }

    /// `pad* self pad*`
    fn pad<Q: Parslet>(self, pad: Q) -> Pad<Self, Q> {
        Pad {
            inner: self,
            pad,
            optional: false,
        }
    }

    /// `pad* (self pad*)?`
    fn pad_opt<Q: Parslet>(self, pad: Q) -> Pad<Self, Q> {
        Pad {
            inner: self,
            pad,
            optional: true,
        }
    }

    /// Match through the action's scope hook under `name`
    fn scope(self, name: &str) -> Scope<Self> {
        Scope {
            inner: self,
            name: name.to_string(),
        }
    }
}

impl<T: Parslet + Sized> ParsletExt for T {}

// ============================================================================
// Operator Overloading (>> for sequence, | for alternative)
// ============================================================================

use std::ops::{BitOr, Shr};

impl<A: Parslet, B: Parslet, C: Parslet> Shr<C> for Then<A, B> {
    type Output = Then<Then<A, B>, C>;
    fn shr(self, rhs: C) -> Self::Output {
        self.then(rhs)
    }
}

impl<A: Parslet, B: Parslet, C: Parslet> BitOr<C> for Or<A, B> {
    type Output = Or<Or<A, B>, C>;
    fn bitor(self, rhs: C) -> Self::Output {
        self.or(rhs)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn view_for(max: u32) -> View {
    if max < 0x80 {
        View::Byte
    } else {
        View::Utf8
    }
}

/// Match a literal string
pub fn lit(text: &str) -> Leaf {
    Leaf(Rule::Literal {
        text: text.to_string(),
    })
}

/// Match a string, ignoring ASCII case
pub fn istr(text: &str) -> Leaf {
    Leaf(Rule::IString {
        text: text.to_string(),
    })
}

/// Match any single byte
pub fn any() -> Leaf {
    Leaf(Rule::Any { view: View::Byte })
}

/// Match any single element of `view`
pub fn any_in(view: View) -> Leaf {
    Leaf(Rule::Any { view })
}

/// Match exactly `count` bytes
pub fn bytes(count: usize) -> Leaf {
    Leaf(Rule::Bytes { count })
}

/// Match one of the characters in `chars`
///
/// ASCII sets match single bytes; other sets decode UTF-8.
pub fn one_of(chars: &str) -> Leaf {
    let set: Vec<u32> = chars.chars().map(u32::from).collect();
    let view = view_for(set.iter().copied().max().unwrap_or(0));
    Leaf(Rule::OneOf {
        set,
        negated: false,
        view,
    })
}

/// Match one character not in `chars`
pub fn not_one_of(chars: &str) -> Leaf {
    match one_of(chars) {
        Leaf(Rule::OneOf { set, view, .. }) => Leaf(Rule::OneOf {
            set,
            negated: true,
            view,
        }),
        other => other,
    }
}

/// Match one character in `lo..=hi`
pub fn range(lo: char, hi: char) -> Leaf {
    ranges(&[(lo, hi)])
}

/// Match one character outside `lo..=hi`
pub fn not_range(lo: char, hi: char) -> Leaf {
    let ranges = vec![(u32::from(lo), u32::from(hi))];
    let view = view_for(u32::from(hi));
    Leaf(Rule::Range {
        ranges,
        negated: true,
        view,
    })
}

/// Match one character in any of the inclusive ranges
pub fn ranges(pairs: &[(char, char)]) -> Leaf {
    let ranges: Vec<(u32, u32)> = pairs
        .iter()
        .map(|&(lo, hi)| (u32::from(lo), u32::from(hi)))
        .collect();
    let view = view_for(ranges.iter().map(|&(_, hi)| hi).max().unwrap_or(0));
    Leaf(Rule::Range {
        ranges,
        negated: false,
        view,
    })
}

/// Match one element in `lo..=hi` of an explicit view
pub fn range_in(view: View, lo: u32, hi: u32) -> Leaf {
    Leaf(Rule::Range {
        ranges: vec![(lo, hi)],
        negated: false,
        view,
    })
}

/// Match one byte of a character class
pub fn class(class: CharClass) -> Leaf {
    Leaf(Rule::Class {
        class,
        negated: false,
    })
}

/// Match one byte outside a character class
pub fn not_class(class: CharClass) -> Leaf {
    Leaf(Rule::Class {
        class,
        negated: true,
    })
}

/// Match a regular expression at the cursor
pub fn re(pattern: &str) -> Leaf {
    Leaf(Rule::Re {
        pattern: pattern.to_string(),
    })
}

/// Beginning of the input
pub fn bof() -> Leaf {
    Leaf(Rule::Bof)
}

/// Beginning of a line
pub fn bol() -> Leaf {
    Leaf(Rule::Bol)
}

/// End of the input
pub fn eof() -> Leaf {
    Leaf(Rule::Eof)
}

/// End of a line
pub fn eol() -> Leaf {
    Leaf(Rule::Eol)
}

/// End of a line or of the input
pub fn eolf() -> Leaf {
    Leaf(Rule::Eolf)
}

/// Always succeeds
pub fn success() -> Leaf {
    Leaf(Rule::Success)
}

/// Always fails
pub fn failure() -> Leaf {
    Leaf(Rule::Failure)
}

/// Let a streaming input drop bytes no mark can reach
pub fn discard() -> Leaf {
    Leaf(Rule::Discard)
}

/// Raise a parse error naming `rule`
pub fn raise<P: Parslet>(rule: P) -> Raise<P> {
    Raise(rule)
}

/// Forward reference to a rule
pub fn ref_(name: &str) -> Ref {
    Ref(name.to_string())
}

/// Create a sequence from multiple parslets
pub fn seq<I, P>(items: I) -> Sequence<P>
where
    I: IntoIterator<Item = P>,
{
    Sequence(items.into_iter().collect())
}

/// Create a choice from multiple parslets
pub fn choice<I, P>(items: I) -> Choice<P>
where
    I: IntoIterator<Item = P>,
{
    Choice(items.into_iter().collect())
}

/// Consume bytes up to and including `cond`
pub fn until<C: Parslet>(cond: C) -> Until<C, Leaf> {
    Until { cond, body: None }
}

/// Consume `body` repeatedly up to and including `cond`
pub fn until_with<C: Parslet, B: Parslet>(cond: C, body: B) -> Until<C, B> {
    Until {
        cond,
        body: Some(body),
    }
}

/// Once `cond` matches, every element of `rest` must match
///
/// `rest` may be a chain built with `then`; each link becomes one
/// required rule.
pub fn if_must<C: Parslet, R: Parslet>(cond: C, rest: R) -> IfMust<C, R> {
    IfMust { cond, rest }
}

/// `then` after `cond`, else `otherwise`
pub fn if_then_else<C: Parslet, T: Parslet, E: Parslet>(
    cond: C,
    then: T,
    otherwise: E,
) -> IfThenElse<C, T, E> {
    IfThenElse {
        cond,
        then,
        otherwise,
    }
}

/// Repeat `if_must(cond, rest)` zero or more times
pub fn star_must<C: Parslet, R: Parslet>(cond: C, rest: R) -> Unary<IfMust<C, R>> {
    if_must(cond, rest).star()
}

/// Optionally match `if_must(cond, rest)`
pub fn opt_must<C: Parslet, R: Parslet>(cond: C, rest: R) -> Unary<IfMust<C, R>> {
    if_must(cond, rest).opt()
}

/// A keyword that is not a prefix of a longer identifier
pub fn keyword(text: &str) -> Keyword {
    Keyword(text.to_string())
}

/// An ASCII identifier
pub fn identifier() -> Identifier {
    Identifier
}

// ============================================================================
// Macros for declarative grammar definition
// ============================================================================

/// Macro for building grammars declaratively
///
/// Expands to a [`GrammarBuilder`] chain and returns `Result<Grammar, Error>`.
///
/// # Example
///
/// ```rust
/// use pegkit::grammar;
///
/// let grammar = grammar! {
///     "greeting" => lit("hello").then(ref_("name")),
///     "name" => lit(" world"),
/// }
/// .unwrap();
/// assert!(grammar.parse_str("hello world").unwrap());
/// ```
#[macro_export]
macro_rules! grammar {
    ($($name:expr => $parslet:expr),* $(,)?) => {{
        #[allow(unused_imports)]
        use $crate::engine::dsl::*;
        let mut builder = GrammarBuilder::new();
        $(
            builder = builder.rule($name, $parslet);
        )*
        builder.build()
    }};
}

/// Create a sequence of parslets with dynamic boxing
///
/// Use `.then()` for a few parslets; use this for long or heterogeneous
/// sequences.
///
/// ```
/// use pegkit::engine::dsl::*;
///
/// let grammar = GrammarBuilder::new()
///     .rule("abc", all![lit("a"), re("[0-9]+"), lit("c")])
///     .build()
///     .unwrap();
/// assert!(grammar.parse_str("a42c").unwrap());
/// ```
#[macro_export]
macro_rules! pegkit_all {
    ($($p:expr),+ $(,)?) => {
        $crate::engine::dsl::Sequence(vec![
            $($crate::engine::dsl::dynamic($p)),+
        ])
    };
}

/// Create an ordered choice of parslets with dynamic boxing
///
/// ```
/// use pegkit::engine::dsl::*;
///
/// let grammar = GrammarBuilder::new()
///     .rule("op", oneof![lit("+"), lit("-"), lit("*"), lit("/"), lit("%")])
///     .build()
///     .unwrap();
/// assert!(grammar.parse_str("%").unwrap());
/// ```
#[macro_export]
macro_rules! pegkit_oneof {
    ($($p:expr),+ $(,)?) => {
        $crate::engine::dsl::Choice(vec![
            $($crate::engine::dsl::dynamic($p)),+
        ])
    };
}

/// Alias for `pegkit_all!`
#[macro_export]
macro_rules! all {
    ($($p:expr),+ $(,)?) => {
        $crate::pegkit_all![$($p),+]
    };
}

/// Alias for `pegkit_oneof!`
#[macro_export]
macro_rules! oneof {
    ($($p:expr),+ $(,)?) => {
        $crate::pegkit_oneof![$($p),+]
    };
}

pub use crate::{all, grammar, oneof, pegkit_all, pegkit_oneof};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_rule_is_root() {
        let grammar = GrammarBuilder::new()
            .rule("hello", lit("hello"))
            .rule("world", lit("world"))
            .build()
            .unwrap();
        assert_eq!(grammar.rule_count(), 4);
        assert_eq!(grammar.name_of(grammar.root), Some("hello"));
    }

    #[test]
    fn test_then_flattens() {
        let grammar = GrammarBuilder::new()
            .rule("abc", lit("a").then(lit("b")).then(lit("c")))
            .build()
            .unwrap();
        let body = match grammar.root_rule() {
            Some(Rule::Named { rule, .. }) => *rule,
            other => panic!("unexpected root {:?}", other),
        };
        assert_eq!(grammar.rules[body].children().len(), 3);
        assert!(grammar.parse_str("abc").unwrap());
    }

    #[test]
    fn test_or_flattens() {
        let alt = lit("a").or(lit("b")) | lit("c");
        let grammar = GrammarBuilder::new().rule("abc", alt).build().unwrap();
        assert!(grammar
            .rules
            .iter()
            .any(|r| matches!(r, Rule::Sor { rules } if rules.len() == 3)));
        assert!(grammar.parse_str("c").unwrap());
    }

    #[test]
    fn test_recursive_grammar() {
        let grammar = GrammarBuilder::new()
            .rule(
                "expr",
                ref_("term").then(one_of("+-").then(ref_("term")).star()),
            )
            .rule(
                "term",
                lit("(").then(ref_("expr")).then(lit(")")).or(ref_("number")),
            )
            .rule("number", re("[0-9]+"))
            .build()
            .unwrap();
        assert!(grammar.parse_all("(1+2)-(3-(4))").unwrap());
        assert!(!grammar.parse_all("(1+").unwrap());
    }

    #[test]
    fn test_undefined_reference() {
        let result = GrammarBuilder::new().rule("a", ref_("missing")).build();
        assert!(matches!(result, Err(Error::InvalidGrammar { .. })));
    }

    #[test]
    fn test_duplicate_rule() {
        let result = GrammarBuilder::new()
            .rule("a", lit("x"))
            .rule("a", lit("y"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_builder() {
        assert!(GrammarBuilder::new().build().is_err());
    }

    #[test]
    fn test_list_variants() {
        let plain = grammar! { "l" => lit("a").list(lit(",")) }.unwrap();
        assert!(plain.parse_all("a,a,a").unwrap());
        assert!(!plain.parse_all("a,a,").unwrap());

        let tail = grammar! { "l" => lit("a").list_tail(lit(",")) }.unwrap();
        assert!(tail.parse_all("a,a,").unwrap());

        let must = grammar! { "l" => lit("a").list_must(lit(",")) }.unwrap();
        assert!(must.parse_str("a,b").is_err());
    }

    #[test]
    fn test_pad() {
        let g = grammar! { "p" => lit("x").pad(lit(" ")).then(eof()) }.unwrap();
        assert!(g.parse_str("  x ").unwrap());
        let g = grammar! { "p" => lit("x").pad_opt(lit(" ")).then(eof()) }.unwrap();
        assert!(g.parse_str("   ").unwrap());
    }

    #[test]
    fn test_rep_max_rejects_more() {
        let g = grammar! { "r" => lit("a").rep_max(2) }.unwrap();
        assert!(g.parse_str("aa").unwrap());
        assert!(!g.parse_str("aaa").unwrap());

        let g = grammar! { "r" => lit("a").rep_opt(2) }.unwrap();
        assert!(g.parse_str("aaa").unwrap());
    }

    #[test]
    fn test_keyword_and_identifier() {
        let g = grammar! { "kw" => keyword("if") }.unwrap();
        assert!(g.parse_str("if (x)").unwrap());
        assert!(!g.parse_str("iffy").unwrap());

        let g = grammar! { "id" => identifier().then(eof()) }.unwrap();
        assert!(g.parse_str("_foo42").unwrap());
        assert!(!g.parse_str("42foo").unwrap());
    }

    #[test]
    fn test_if_must_flattens_rest() {
        let g = grammar! { "stmt" => if_must(keyword("let"), lit(" ").then(identifier()).then(lit(";"))) }
            .unwrap();
        assert!(g
            .rules
            .iter()
            .any(|r| matches!(r, Rule::IfMust { rules, .. } if rules.len() == 3)));
        assert!(g.parse_str("let x;").unwrap());
        assert!(!g.parse_str("var x;").unwrap());
        assert!(g.parse_str("let x").is_err());
    }

    #[test]
    fn test_macros() {
        let g = GrammarBuilder::new()
            .rule("s", all![lit("a"), one_of("bc"), range('0', '9')])
            .build()
            .unwrap();
        assert!(g.parse_str("ac7").unwrap());

        let g = GrammarBuilder::new()
            .rule("c", oneof![lit("x"), istr("yes"), class(CharClass::Digit)])
            .build()
            .unwrap();
        assert!(g.parse_str("YES").unwrap());
        assert!(g.parse_str("5").unwrap());
    }

    #[test]
    fn test_utf8_helpers_pick_view() {
        assert!(matches!(one_of("ab"), Leaf(Rule::OneOf { view: View::Byte, .. })));
        assert!(matches!(one_of("aλ"), Leaf(Rule::OneOf { view: View::Utf8, .. })));
        let g = grammar! { "greek" => range('α', 'ω').plus() }.unwrap();
        assert!(g.parse_all("λογος").unwrap());
    }

    #[test]
    fn test_import_prefixes_names() {
        let inner = GrammarBuilder::new().rule("value", lit("null")).build().unwrap();

        let mut builder = GrammarBuilder::new();
        builder.rule_mut("wrapped", lit("[").then(ref_("json:value")).then(lit("]")));
        builder.import(&inner, Some("json"));
        let import = builder.last_import().cloned().unwrap();
        assert_eq!(import.rule_count, inner.rule_count());
        assert_eq!(import.map_index(inner.root), import.root);

        let combined = builder.build().unwrap();
        assert_eq!(combined.name_of(import.root), Some("json:value"));
        assert!(combined.parse_str("[null]").unwrap());
    }

    #[test]
    fn test_import_duplicate_name() {
        let inner = GrammarBuilder::new().rule("a", lit("a")).build().unwrap();
        let mut builder = GrammarBuilder::new();
        builder.rule_mut("a", lit("b"));
        builder.import(&inner, None);
        assert!(builder.build().is_err());
    }
}
