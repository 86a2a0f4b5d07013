//! Parse trees
//!
//! [`TreeBuilder`] is a [`Control`] that turns the lifecycle of named rules
//! into a tree: a node is pushed when a rule starts, dropped when it fails
//! and attached to its parent when it succeeds.
//!
//! ```rust
//! use pegkit::engine::dsl::{lit, ref_, GrammarBuilder, ParsletExt};
//! use pegkit::engine::{MemoryInput, Nothing, Parser, TreeBuilder, TreePrinter};
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("sum", ref_("digit").list(lit("+")))
//!     .rule("digit", lit("1").or(lit("2")))
//!     .build()
//!     .unwrap();
//!
//! let mut builder = TreeBuilder::new();
//! let mut input = MemoryInput::from_str("1+2", "mem");
//! Parser::new(&grammar)
//!     .parse_with(&mut input, &mut Nothing, &mut builder, &mut ())
//!     .unwrap();
//!
//! let roots = builder.finish();
//! assert_eq!(roots[0].children.len(), 2);
//! print!("{}", TreePrinter::new().print(&roots, b"1+2"));
//! ```

use super::grammar::RuleId;
use super::input::Input;
use super::protocol::{Control, RuleRef};
use ahash::AHashSet;
use std::fmt::Write;

/// A matched named rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Rule index
    pub rule: RuleId,
    /// Rule name
    pub name: String,
    /// Byte offset where the match starts
    pub begin: usize,
    /// Byte offset where the match ends
    pub end: usize,
    /// Matched named sub-rules, in input order
    pub children: Vec<Node>,
}

impl Node {
    /// The matched bytes within `input`
    pub fn bytes<'i>(&self, input: &'i [u8]) -> &'i [u8] {
        input
            .get(self.begin..self.end.min(input.len()))
            .unwrap_or_default()
    }

    /// Number of nodes in this subtree, including this one
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }

    /// Depth-first search for the first node called `name`
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}

/// A control that builds a tree of named rules
///
/// A child that was matched and then backtracked over by an anonymous
/// combinator (or by a lookahead) is pruned: a node is discarded when its
/// parent later receives a child that starts before it ended, or when the
/// parent ends before it did.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    stack: Vec<Node>,
    roots: Vec<Node>,
    keep: Option<AHashSet<String>>,
}

impl TreeBuilder {
    /// Create a builder that keeps every named rule
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only nodes for the given rule names
    ///
    /// Children of a dropped node are lifted into its parent.
    pub fn selected<'n>(names: impl IntoIterator<Item = &'n str>) -> Self {
        Self {
            keep: Some(names.into_iter().map(str::to_string).collect()),
            ..Self::default()
        }
    }

    /// Completed top-level nodes
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Take the completed top-level nodes, leaving the builder empty
    pub fn finish(&mut self) -> Vec<Node> {
        self.stack.clear();
        std::mem::take(&mut self.roots)
    }

    fn is_kept(&self, name: &str) -> bool {
        self.keep.as_ref().map_or(true, |keep| keep.contains(name))
    }

    fn attach(&mut self, node: Node) {
        let kept = self.is_kept(&node.name);
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        siblings.retain(|sibling| sibling.end <= node.begin);
        if kept {
            siblings.push(node);
        } else {
            siblings.extend(node.children);
        }
    }
}

impl<I: Input> Control<I> for TreeBuilder {
    fn start(&mut self, rule: RuleRef<'_>, input: &I) {
        let begin = input.byte();
        self.stack.push(Node {
            rule: rule.id,
            name: rule.name.to_string(),
            begin,
            end: begin,
            children: Vec::new(),
        });
    }

    fn success(&mut self, _rule: RuleRef<'_>, input: &I) {
        if let Some(mut node) = self.stack.pop() {
            node.end = input.byte();
            let end = node.end;
            node.children.retain(|child| child.end <= end);
            self.attach(node);
        }
    }

    fn failure(&mut self, _rule: RuleRef<'_>, _input: &I) {
        self.stack.pop();
    }
}

/// Parse tree pretty printer
pub struct TreePrinter {
    /// Indentation string
    indent: String,
    /// Maximum depth to print
    max_depth: Option<usize>,
}

impl TreePrinter {
    /// Create a new tree printer
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
        }
    }

    /// Set the indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set the maximum depth to print
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Print a forest of nodes over the input they were matched against
    pub fn print(&self, nodes: &[Node], input: &[u8]) -> String {
        let mut output = String::new();
        for node in nodes {
            self.print_node(node, input, 0, &mut output);
        }
        output
    }

    fn print_node(&self, node: &Node, input: &[u8], depth: usize, output: &mut String) {
        let indent = self.indent.repeat(depth);
        if self.max_depth.is_some_and(|max| depth > max) {
            let _ = writeln!(output, "{}...", indent);
            return;
        }

        let text = String::from_utf8_lossy(node.bytes(input));
        let _ = writeln!(
            output,
            "{}{} {:?} @ {}..{}",
            indent, node.name, text, node.begin, node.end
        );
        for child in &node.children {
            self.print_node(child, input, depth + 1, output);
        }
    }
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}
