//! Grammar analysis
//!
//! The central check finds rules that can be re-entered without consuming
//! input (left recursion, or a repetition over a rule that can succeed
//! empty). Such rules make the matcher loop forever or overflow its stack,
//! so they are reported as **problems**.
//!
//! Every rule is first reduced to a [`RuleKind`] plus a list of children:
//!
//! - `Any`: always consumes on success
//! - `Opt`: never guaranteed to consume
//! - `Seq`: consumes if any child consumes
//! - `Sor`: consumes if every child consumes
//!
//! A depth-first walk then propagates "has consumed so far" down each path;
//! reaching a rule that is still being visited without having consumed is a
//! cycle without progress.
//!
//! The analyzer also lints for smaller mistakes (unused rules, empty
//! composites, useless repetitions, unreachable alternatives). These are
//! reported as warnings and never counted as problems.
//!
//! # Example
//!
//! ```
//! use pegkit::engine::dsl::*;
//! use pegkit::engine::{GrammarAnalyzer, WarningKind};
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("list", ref_("list").then(lit(",")).or(lit("x")))
//!     .build()
//!     .unwrap();
//!
//! let report = GrammarAnalyzer::new(&grammar).analyze();
//! assert!(report.problem_count() > 0);
//! for problem in &report.problems {
//!     assert_eq!(problem.kind, WarningKind::CycleWithoutProgress);
//! }
//! ```

use super::grammar::{Grammar, Rule, RuleId};
use super::regex_cache;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How a rule relates to input consumption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    /// Consumes at least one element whenever it succeeds
    Any,
    /// May succeed without consuming
    Opt,
    /// Consumes if at least one child consumes
    Seq,
    /// Consumes if every child consumes
    Sor,
}

/// Kind of grammar warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// A rule can be re-entered without consuming input
    ///
    /// The matcher would loop forever. Example: `expr = expr "+" term | term`
    CycleWithoutProgress,

    /// A named rule is never reachable from the root
    UnusedRule,

    /// Empty sequence or choice
    ///
    /// An empty sequence always matches. An empty choice never matches.
    EmptyComposite,

    /// Repetition with min=0 and max=0 (only tests that the rule does not match)
    UselessRepetition,

    /// An alternative can never match because an earlier one matches first
    UnreachableAlternative,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleWithoutProgress => write!(f, "cycle without progress"),
            Self::UnusedRule => write!(f, "unused rule"),
            Self::EmptyComposite => write!(f, "empty composite"),
            Self::UselessRepetition => write!(f, "useless repetition"),
            Self::UnreachableAlternative => write!(f, "unreachable alternative"),
        }
    }
}

/// A grammar warning or problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarWarning {
    /// The kind of warning
    pub kind: WarningKind,
    /// The rule where the warning was detected
    pub rule: RuleId,
    /// Human-readable message
    pub message: String,
    /// Related rules
    pub related: Vec<RuleId>,
}

impl GrammarWarning {
    /// Create a new warning
    pub fn new(kind: WarningKind, rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            kind,
            rule,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Add related rules to the warning
    pub fn with_related(mut self, rules: Vec<RuleId>) -> Self {
        self.related = rules;
        self
    }
}

impl std::fmt::Display for GrammarWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[rule {}] {}: {}", self.rule, self.kind, self.message)?;
        if !self.related.is_empty() {
            write!(f, " (related rules: {:?})", self.related)?;
        }
        Ok(())
    }
}

/// Everything the analyzer found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Cycles without progress; each would hang the matcher
    pub problems: Vec<GrammarWarning>,
    /// For every named rule, whether it consumes input whenever it succeeds
    pub consumes: BTreeMap<String, bool>,
    /// Lints that do not affect termination
    pub warnings: Vec<GrammarWarning>,
}

impl AnalysisReport {
    /// Number of problems
    #[inline]
    pub fn problem_count(&self) -> usize {
        self.problems.len()
    }

    /// Whether no problems were found
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    /// Whether the named rule consumes input whenever it succeeds
    pub fn consumes(&self, name: &str) -> Option<bool> {
        self.consumes.get(name).copied()
    }
}

/// Count rules that can loop without consuming input
///
/// With `verbose`, every problem is printed to stderr.
pub fn analyze(grammar: &Grammar, verbose: bool) -> usize {
    let report = GrammarAnalyzer::new(grammar).analyze();
    if verbose {
        for problem in &report.problems {
            eprintln!("problem: {}", problem.message);
        }
    }
    report.problem_count()
}

/// One node of the analysis graph
///
/// Nodes `0..rule_count` mirror the grammar's rules; further nodes are
/// synthesized for rules whose shape is not a single kind (`until`,
/// `if_then_else`). `origin` is the grammar rule a node stands for.
#[derive(Debug, Clone)]
struct Node {
    kind: RuleKind,
    children: Vec<usize>,
    origin: RuleId,
}

/// Grammar analyzer
pub struct GrammarAnalyzer<'a> {
    grammar: &'a Grammar,
    graph: Vec<Node>,
    /// Nodes on the current walk
    stack: AHashSet<usize>,
    /// Results of the current walk
    results: AHashMap<usize, bool>,
    /// Rules found on a cycle without progress
    problems: BTreeSet<RuleId>,
    /// Cache of rules that succeed on every input
    always: AHashMap<RuleId, bool>,
}

impl<'a> GrammarAnalyzer<'a> {
    /// Create a new analyzer for the given grammar
    pub fn new(grammar: &'a Grammar) -> Self {
        Self {
            grammar,
            graph: build_graph(grammar),
            stack: AHashSet::new(),
            results: AHashMap::new(),
            problems: BTreeSet::new(),
            always: AHashMap::new(),
        }
    }

    /// The kind a rule was reduced to
    pub fn kind(&self, id: RuleId) -> Option<RuleKind> {
        if id < self.grammar.rule_count() {
            self.graph.get(id).map(|node| node.kind)
        } else {
            None
        }
    }

    /// Analyze the grammar
    pub fn analyze(&mut self) -> AnalysisReport {
        let problems = self
            .problem_rules()
            .into_iter()
            .map(|id| {
                GrammarWarning::new(
                    WarningKind::CycleWithoutProgress,
                    id,
                    format!(
                        "cycle without progress detected at rule {}",
                        self.grammar.rule_name(id)
                    ),
                )
            })
            .collect::<Vec<_>>();
        for problem in &problems {
            log_warn!("{}", problem);
        }

        let named: Vec<(RuleId, String)> = self
            .grammar
            .named_rules()
            .map(|(id, name)| (id, name.to_string()))
            .collect();
        let consumes = named
            .into_iter()
            .map(|(id, name)| (name, self.consumes(id)))
            .collect();

        let mut warnings = Vec::new();
        self.detect_unused_rules(&mut warnings);
        self.detect_empty_composites(&mut warnings);
        self.detect_useless_repetitions(&mut warnings);
        self.detect_unreachable_alternatives(&mut warnings);

        AnalysisReport {
            problems,
            consumes,
            warnings,
        }
    }

    /// Rules on a cycle without progress, in index order
    ///
    /// Only rules reachable from the root are walked. Unreachable rules are
    /// left to the [`WarningKind::UnusedRule`] lint.
    pub fn problem_rules(&mut self) -> Vec<RuleId> {
        let mut reachable = AHashSet::new();
        self.collect_reachable(self.grammar.root, &mut reachable);
        let mut starts: Vec<RuleId> = reachable.into_iter().collect();
        starts.sort_unstable();

        self.problems.clear();
        for start in starts {
            self.results.clear();
            self.work(start, false);
        }
        self.problems.iter().copied().collect()
    }

    /// Whether `id` consumes input whenever it succeeds
    pub fn consumes(&mut self, id: RuleId) -> bool {
        if id >= self.grammar.rule_count() {
            return false;
        }
        self.results.clear();
        self.work(id, false)
    }

    fn work(&mut self, node: usize, accum: bool) -> bool {
        if let Some(&done) = self.results.get(&node) {
            return done;
        }
        if self.stack.contains(&node) {
            if !accum {
                self.problems.insert(self.graph[node].origin);
            }
            self.results.insert(node, accum);
            return accum;
        }

        self.stack.insert(node);
        let kind = self.graph[node].kind;
        let count = self.graph[node].children.len();
        let result = if kind == RuleKind::Sor {
            let mut a = true;
            for i in 0..count {
                let child = self.graph[node].children[i];
                a = a && self.work(child, accum);
            }
            a
        } else {
            let mut a = false;
            for i in 0..count {
                let child = self.graph[node].children[i];
                a = a || self.work(child, accum || a);
            }
            match kind {
                RuleKind::Any => true,
                RuleKind::Opt => false,
                _ => a,
            }
        };
        self.stack.remove(&node);
        self.results.insert(node, result);
        result
    }

    /// Detect named rules that are never reachable from the root
    fn detect_unused_rules(&self, warnings: &mut Vec<GrammarWarning>) {
        let mut reachable = AHashSet::new();
        self.collect_reachable(self.grammar.root, &mut reachable);

        for (id, name) in self.grammar.named_rules() {
            if !reachable.contains(&id) {
                warnings.push(GrammarWarning::new(
                    WarningKind::UnusedRule,
                    id,
                    format!("rule {} is never reachable from the root", name),
                ));
            }
        }
    }

    /// Collect all rules reachable from the given rule
    fn collect_reachable(&self, id: RuleId, reachable: &mut AHashSet<RuleId>) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(rule) = self.grammar.rule(id) {
                pending.extend(rule.children());
            }
        }
    }

    /// Detect empty sequences and choices
    fn detect_empty_composites(&self, warnings: &mut Vec<GrammarWarning>) {
        for (id, rule) in self.grammar.rules.iter().enumerate() {
            match rule {
                Rule::Seq { rules } if rules.is_empty() => {
                    warnings.push(GrammarWarning::new(
                        WarningKind::EmptyComposite,
                        id,
                        "empty sequence always matches (matches empty string)",
                    ));
                }
                Rule::Sor { rules } if rules.is_empty() => {
                    warnings.push(GrammarWarning::new(
                        WarningKind::EmptyComposite,
                        id,
                        "empty choice never matches",
                    ));
                }
                _ => {}
            }
        }
    }

    /// Detect useless repetitions (min=0, max=0)
    fn detect_useless_repetitions(&self, warnings: &mut Vec<GrammarWarning>) {
        for (id, rule) in self.grammar.rules.iter().enumerate() {
            if let Rule::Rep {
                rule: inner,
                min: 0,
                max: Some(0),
            } = rule
            {
                warnings.push(
                    GrammarWarning::new(
                        WarningKind::UselessRepetition,
                        id,
                        "repetition with min=0 and max=0 never consumes; it acts as not_at",
                    )
                    .with_related(vec![*inner]),
                );
            }
        }
    }

    /// Detect alternatives that can never be tried or never win
    ///
    /// An alternative is unreachable when an earlier one always matches.
    /// It is likely shadowed when an earlier alternative is a literal that
    /// is a prefix of this alternative's leading literal.
    fn detect_unreachable_alternatives(&mut self, warnings: &mut Vec<GrammarWarning>) {
        let grammar = self.grammar;
        for (id, rule) in grammar.rules.iter().enumerate() {
            let Rule::Sor { rules } = rule else {
                continue;
            };

            let mut always_seen: Option<RuleId> = None;
            for (i, &child) in rules.iter().enumerate() {
                if let Some(earlier) = always_seen {
                    warnings.push(
                        GrammarWarning::new(
                            WarningKind::UnreachableAlternative,
                            id,
                            format!(
                                "alternative {} ({}) is unreachable because {} always matches",
                                i,
                                grammar.rule_name(child),
                                grammar.rule_name(earlier)
                            ),
                        )
                        .with_related(vec![earlier, child]),
                    );
                    continue;
                }

                if let Some(current) = self.first_literal(child) {
                    let shadow = rules[..i].iter().find_map(|&prev| {
                        self.exact_literal(prev)
                            .filter(|text| current.starts_with(text.as_str()))
                            .map(|text| (prev, text))
                    });
                    if let Some((prev, text)) = shadow {
                        warnings.push(
                            GrammarWarning::new(
                                WarningKind::UnreachableAlternative,
                                id,
                                format!(
                                    "alternative {} ({:?}) may be shadowed by earlier alternative {:?}",
                                    i, current, text
                                ),
                            )
                            .with_related(vec![prev, child]),
                        );
                    }
                }

                if self.always_matches(child) {
                    always_seen = Some(child);
                }
            }
        }
    }

    /// Whether a rule succeeds on every input
    fn always_matches(&mut self, id: RuleId) -> bool {
        if let Some(&result) = self.always.get(&id) {
            return result;
        }
        // Cycles are assumed to fail.
        self.always.insert(id, false);
        let result = self.compute_always_matches(id);
        self.always.insert(id, result);
        result
    }

    fn compute_always_matches(&mut self, id: RuleId) -> bool {
        let Some(rule) = self.grammar.rule(id) else {
            return false;
        };

        match rule {
            Rule::Literal { text } | Rule::IString { text } => text.is_empty(),
            Rule::Bytes { count } => *count == 0,
            Rule::Re { pattern } => regex_cache::matches_empty(pattern).unwrap_or(false),
            Rule::Success | Rule::Discard | Rule::Star { .. } | Rule::Opt { .. } => true,
            Rule::Rep { min: 0, max, .. } => *max != Some(0),
            Rule::Rep { rule, .. } | Rule::Plus { rule } => self.always_matches(*rule),
            Rule::Seq { rules } => {
                let rules = rules.clone();
                rules.into_iter().all(|r| self.always_matches(r))
            }
            Rule::Sor { rules } => {
                let rules = rules.clone();
                rules.into_iter().any(|r| self.always_matches(r))
            }
            Rule::At { rule }
            | Rule::Enable { rule }
            | Rule::Disable { rule }
            | Rule::Scope { rule, .. }
            | Rule::Named { rule, .. }
            | Rule::Ref { rule } => self.always_matches(*rule),
            Rule::IfThenElse {
                cond,
                then,
                otherwise,
            } => {
                let (cond, then, otherwise) = (*cond, *then, *otherwise);
                (self.always_matches(then) && self.always_matches(otherwise))
                    || (self.always_matches(cond) && self.always_matches(then))
            }
            _ => false,
        }
    }

    /// The literal an alternative consists of, seen through names
    fn exact_literal(&self, id: RuleId) -> Option<String> {
        match self.grammar.rule(id)? {
            Rule::Literal { text } if !text.is_empty() => Some(text.clone()),
            Rule::Named { rule, .. } | Rule::Ref { rule } => self.exact_literal(*rule),
            _ => None,
        }
    }

    /// Get the leading string literal of a rule (if any)
    fn first_literal(&self, id: RuleId) -> Option<String> {
        match self.grammar.rule(id)? {
            Rule::Literal { text } => Some(text.clone()),
            Rule::Seq { rules } => rules.first().and_then(|&first| self.first_literal(first)),
            Rule::Named { rule, .. }
            | Rule::Ref { rule }
            | Rule::Must { rule }
            | Rule::Plus { rule }
            | Rule::Enable { rule }
            | Rule::Disable { rule }
            | Rule::Scope { rule, .. } => self.first_literal(*rule),
            _ => None,
        }
    }
}

/// Follow reference chains to the rule they name
fn resolve(grammar: &Grammar, mut id: RuleId) -> RuleId {
    for _ in 0..grammar.rule_count() {
        match grammar.rule(id) {
            Some(Rule::Ref { rule }) => id = *rule,
            _ => break,
        }
    }
    id
}

/// Reduce every rule to a kind and children
fn build_graph(grammar: &Grammar) -> Vec<Node> {
    use RuleKind::*;

    let rule_count = grammar.rule_count();
    let mut graph: Vec<Node> = Vec::with_capacity(rule_count);
    let mut extra: Vec<Node> = Vec::new();

    // Synthetic nodes are numbered after all rules.
    let synth = |extra: &mut Vec<Node>, kind: RuleKind, children: Vec<usize>, origin: RuleId| {
        extra.push(Node {
            kind,
            children,
            origin,
        });
        rule_count + extra.len() - 1
    };

    for (id, rule) in grammar.rules.iter().enumerate() {
        let r = |child: &RuleId| resolve(grammar, *child);
        let (kind, children) = match rule {
            Rule::Any { .. }
            | Rule::OneOf { .. }
            | Rule::Range { .. }
            | Rule::Class { .. }
            | Rule::Eol
            | Rule::Failure
            | Rule::Raise { .. } => (Any, vec![]),
            Rule::Bytes { count } => (if *count > 0 { Any } else { Opt }, vec![]),
            Rule::Literal { text } | Rule::IString { text } => {
                (if text.is_empty() { Opt } else { Any }, vec![])
            }
            Rule::Re { pattern } => match regex_cache::matches_empty(pattern) {
                Ok(true) => (Opt, vec![]),
                _ => (Any, vec![]),
            },
            Rule::Bof | Rule::Bol | Rule::Eof | Rule::Eolf | Rule::Success | Rule::Discard => {
                (Opt, vec![])
            }
            Rule::Seq { rules } => (Seq, rules.iter().map(r).collect()),
            Rule::Sor { rules } => (Sor, rules.iter().map(r).collect()),
            Rule::Star { rule } => (Opt, vec![r(rule), id]),
            Rule::Plus { rule } => (Seq, vec![r(rule), id]),
            Rule::Rep {
                rule,
                min,
                max: None,
            } => (if *min > 0 { Seq } else { Opt }, vec![r(rule), id]),
            Rule::Rep { rule, min, .. } => (if *min > 0 { Seq } else { Opt }, vec![r(rule)]),
            Rule::Opt { rule } | Rule::At { rule } | Rule::NotAt { rule } => (Opt, vec![r(rule)]),
            Rule::Must { rule }
            | Rule::Enable { rule }
            | Rule::Disable { rule }
            | Rule::Scope { rule, .. }
            | Rule::Named { rule, .. }
            | Rule::Ref { rule } => (Seq, vec![r(rule)]),
            Rule::IfMust { cond, rules } => (
                Seq,
                std::iter::once(cond).chain(rules.iter()).map(r).collect(),
            ),
            Rule::Until { cond, body } => {
                // seq(star(not_at(cond), body), cond)
                let cond = r(cond);
                let not_cond = synth(&mut extra, Opt, vec![cond], id);
                let body = match body {
                    Some(body) => r(body),
                    None => synth(&mut extra, Any, vec![], id),
                };
                let step = synth(&mut extra, Seq, vec![not_cond, body], id);
                let looped = rule_count + extra.len();
                let looped = synth(&mut extra, Opt, vec![step, looped], id);
                (Seq, vec![looped, cond])
            }
            Rule::IfThenElse {
                cond,
                then,
                otherwise,
            } => {
                // sor(seq(cond, then), seq(not_at(cond), otherwise))
                let cond = r(cond);
                let first = synth(&mut extra, Seq, vec![cond, r(then)], id);
                let not_cond = synth(&mut extra, Opt, vec![cond], id);
                let second = synth(&mut extra, Seq, vec![not_cond, r(otherwise)], id);
                (Sor, vec![first, second])
            }
        };
        graph.push(Node {
            kind,
            children,
            origin: id,
        });
    }

    graph.extend(extra);
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dsl::{lit, ref_, until_with, GrammarBuilder, ParsletExt};

    fn make_simple_grammar() -> Grammar {
        let mut grammar = Grammar::new();
        grammar.add_rule(Rule::Literal {
            text: "hello".to_string(),
        });
        grammar.root = 0;
        grammar
    }

    #[test]
    fn test_no_problems_for_simple_grammar() {
        let grammar = make_simple_grammar();
        let report = GrammarAnalyzer::new(&grammar).analyze();
        assert!(report.is_clean());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_direct_self_reference() {
        let mut grammar = Grammar::new();
        let placeholder = grammar.add_rule(Rule::Ref { rule: 1 });
        grammar.add_rule(Rule::Named {
            name: "R".into(),
            rule: placeholder,
        });
        grammar.root = 1;

        assert_eq!(analyze(&grammar, false), 1);
    }

    #[test]
    fn test_consuming_recursion_is_fine() {
        let grammar = GrammarBuilder::new()
            .rule("R", lit("a").then(ref_("R")))
            .build()
            .unwrap();
        let mut analyzer = GrammarAnalyzer::new(&grammar);
        let report = analyzer.analyze();
        assert_eq!(report.problem_count(), 0);
        assert_eq!(report.consumes("R"), Some(true));
    }

    #[test]
    fn test_mutual_recursion_through_sor() {
        let grammar = GrammarBuilder::new()
            .rule("A", ref_("B").or(lit("x")))
            .rule("B", ref_("A"))
            .build()
            .unwrap();
        let report = GrammarAnalyzer::new(&grammar).analyze();
        assert!(report.problem_count() >= 1);
        assert!(report
            .problems
            .iter()
            .any(|p| p.message.contains("rule A") || p.message.contains("rule B")));
    }

    #[test]
    fn test_star_over_empty() {
        let grammar = GrammarBuilder::new()
            .rule("loop", lit("a").opt().star())
            .build()
            .unwrap();
        assert!(analyze(&grammar, false) > 0);

        let grammar = GrammarBuilder::new()
            .rule("ok", lit("a").star())
            .build()
            .unwrap();
        assert_eq!(analyze(&grammar, false), 0);
    }

    #[test]
    fn test_until_with_empty_body() {
        let grammar = GrammarBuilder::new()
            .rule("u", until_with(lit("end"), lit("x").opt()))
            .build()
            .unwrap();
        assert!(analyze(&grammar, false) > 0);

        let grammar = GrammarBuilder::new()
            .rule("u", until_with(lit("end"), lit("x")))
            .build()
            .unwrap();
        assert_eq!(analyze(&grammar, false), 0);
    }

    #[test]
    fn test_kinds() {
        let grammar = GrammarBuilder::new()
            .rule("r", lit("a").star().then(lit("").or(lit("b"))))
            .build()
            .unwrap();
        let analyzer = GrammarAnalyzer::new(&grammar);
        assert_eq!(analyzer.kind(0), Some(RuleKind::Any));
        assert_eq!(analyzer.kind(1), Some(RuleKind::Opt));
        assert_eq!(analyzer.kind(2), Some(RuleKind::Opt));
        assert_eq!(analyzer.kind(4), Some(RuleKind::Sor));
        assert_eq!(analyzer.kind(99), None);
    }

    #[test]
    fn test_sor_consumes_only_if_all_branches_do() {
        let grammar = GrammarBuilder::new()
            .rule("both", lit("a").or(lit("b")))
            .rule("one", lit("a").or(lit("b").opt()))
            .build()
            .unwrap();
        let report = GrammarAnalyzer::new(&grammar).analyze();
        assert_eq!(report.consumes("both"), Some(true));
        assert_eq!(report.consumes("one"), Some(false));
    }

    #[test]
    fn test_detect_unused_rule() {
        let grammar = GrammarBuilder::new()
            .rule("used", lit("a"))
            .rule("unused", lit("b"))
            .build()
            .unwrap();
        let report = GrammarAnalyzer::new(&grammar).analyze();
        assert!(report
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnusedRule && w.message.contains("unused")));
        assert!(report.is_clean());
    }

    #[test]
    fn test_unreachable_cycle_is_only_a_lint() {
        let grammar = GrammarBuilder::new()
            .rule("ok", lit("a"))
            .rule("bad", ref_("bad").or(lit("x")))
            .build()
            .unwrap();
        let report = GrammarAnalyzer::new(&grammar).analyze();
        assert_eq!(report.problem_count(), 0);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnusedRule && w.message.contains("bad")));
        assert_eq!(analyze(&grammar, false), 0);
    }

    #[test]
    fn test_detect_empty_composites() {
        let mut grammar = Grammar::new();
        grammar.add_rule(Rule::Seq { rules: vec![] });
        grammar.add_rule(Rule::Sor { rules: vec![] });
        let report = GrammarAnalyzer::new(&grammar).analyze();
        assert_eq!(
            report
                .warnings
                .iter()
                .filter(|w| w.kind == WarningKind::EmptyComposite)
                .count(),
            2
        );
    }

    #[test]
    fn test_detect_useless_repetition() {
        let mut grammar = Grammar::new();
        grammar.add_rule(Rule::Literal { text: "a".into() });
        grammar.root = grammar.add_rule(Rule::Rep {
            rule: 0,
            min: 0,
            max: Some(0),
        });
        let report = GrammarAnalyzer::new(&grammar).analyze();
        assert!(report
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UselessRepetition));
    }

    #[test]
    fn test_detect_unreachable_alternatives() {
        let grammar = GrammarBuilder::new()
            .rule("shadow", lit("a").or(lit("ab")))
            .rule("always", lit("x").star().or(lit("y")))
            .rule("fine", lit("ab").or(lit("a")))
            .build()
            .unwrap();
        let report = GrammarAnalyzer::new(&grammar).analyze();
        let unreachable: Vec<_> = report
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::UnreachableAlternative)
            .collect();
        assert_eq!(unreachable.len(), 2);
        assert!(unreachable.iter().any(|w| w.message.contains("\"ab\"")));
        assert!(unreachable.iter().any(|w| w.message.contains("always matches")));
    }

    #[test]
    fn test_warning_display() {
        let warning = GrammarWarning::new(WarningKind::CycleWithoutProgress, 5, "loops")
            .with_related(vec![1, 2, 3]);

        let display = format!("{}", warning);
        assert!(display.contains("cycle without progress"));
        assert!(display.contains("rule 5"));
        assert!(display.contains("related rules: [1, 2, 3]"));
    }

    #[test]
    fn test_report_serializes() {
        let grammar = GrammarBuilder::new().rule("a", lit("a")).build().unwrap();
        let report = GrammarAnalyzer::new(&grammar).analyze();
        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
