//! Parse entry points
//!
//! [`Parser`] binds a [`Grammar`] to a [`ParserConfig`] and runs the root
//! rule (or a configured start rule) against an input. The result is
//! `Ok(true)` when the rule matched a prefix of the input, `Ok(false)` when
//! it did not, and `Err` when a required rule failed or the input could not
//! be read.

use super::error::Error;
use super::grammar::{Grammar, RuleId};
use super::input::Input;
use super::matcher::Matcher;
use super::protocol::{Action, ApplyMode, Control, Normal, Nothing, RewindMode};

/// Default maximum nesting depth of named rules
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// Parser configuration
///
/// # Example
///
/// ```rust
/// use pegkit::engine::{ApplyMode, ParserConfig};
///
/// let config = ParserConfig::new()
///     .with_max_recursion_depth(200)
///     .with_apply_mode(ApplyMode::Nothing)
///     .with_root("value");
/// assert_eq!(config.max_recursion_depth, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum nesting depth of named rules (0 = unlimited)
    pub max_recursion_depth: usize,

    /// Whether actions fire
    pub apply_mode: ApplyMode,

    /// Rewind mode of the start rule
    pub rewind_mode: RewindMode,

    /// Name of the start rule; the grammar's root when `None`
    pub root: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            apply_mode: ApplyMode::Action,
            rewind_mode: RewindMode::Required,
            root: None,
        }
    }
}

impl ParserConfig {
    /// Create a new config with default values
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum recursion depth
    #[inline]
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Set whether actions fire
    #[inline]
    pub fn with_apply_mode(mut self, mode: ApplyMode) -> Self {
        self.apply_mode = mode;
        self
    }

    /// Set the rewind mode of the start rule
    #[inline]
    pub fn with_rewind_mode(mut self, mode: RewindMode) -> Self {
        self.rewind_mode = mode;
        self
    }

    /// Start from the named rule instead of the grammar root
    #[inline]
    pub fn with_root(mut self, name: impl Into<String>) -> Self {
        self.root = Some(name.into());
        self
    }
}

/// Runs a grammar against inputs
pub struct Parser<'g> {
    grammar: &'g Grammar,
    config: ParserConfig,
}

impl<'g> Parser<'g> {
    /// Create a parser with the default configuration
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            config: ParserConfig::default(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The start rule
    pub fn start_rule(&self) -> Result<RuleId, Error> {
        let id = match &self.config.root {
            Some(name) => self
                .grammar
                .lookup(name)
                .ok_or_else(|| Error::invalid_grammar(format!("no rule named '{}'", name)))?,
            None => self.grammar.root,
        };
        if id >= self.grammar.rule_count() {
            return Err(Error::invalid_grammar(format!(
                "start rule #{} is out of bounds ({} rules)",
                id,
                self.grammar.rule_count()
            )));
        }
        Ok(id)
    }

    /// Match without actions and with the default control
    pub fn parse<I: Input, S>(&self, input: &mut I, state: &mut S) -> Result<bool, Error> {
        self.parse_with(input, &mut Nothing, &mut Normal, state)
    }

    /// Match with an action, a control and caller state
    pub fn parse_with<I, A, C, S>(
        &self,
        input: &mut I,
        action: &mut A,
        control: &mut C,
        state: &mut S,
    ) -> Result<bool, Error>
    where
        I: Input,
        A: Action<S>,
        C: Control<I>,
    {
        let start = self.start_rule()?;
        log_debug!(
            "parse {} from {} at byte {}",
            self.grammar.rule_name(start),
            input.source(),
            input.byte()
        );

        let result = Matcher::new(self.grammar, input, control, self.config.max_recursion_depth)
            .match_rule(
                start,
                self.config.apply_mode,
                self.config.rewind_mode,
                action,
                state,
            );

        match &result {
            Ok(matched) => log_debug!("parse finished: matched={} at byte {}", matched, input.byte()),
            Err(err) => log_debug!("parse aborted: {}", err),
        }
        result
    }

    /// Match an input embedded in another one
    ///
    /// A parse error escaping the nested parse gets the position of `outer`
    /// appended, so the error carries an "included from" trace.
    pub fn parse_nested<O, I, A, C, S>(
        &self,
        outer: &O,
        input: &mut I,
        action: &mut A,
        control: &mut C,
        state: &mut S,
    ) -> Result<bool, Error>
    where
        O: Input,
        I: Input,
        A: Action<S>,
        C: Control<I>,
    {
        self.parse_with(input, action, control, state)
            .map_err(|err| match err {
                Error::Parse(mut parse) => {
                    parse.push_position(outer.position());
                    Error::Parse(parse)
                }
                other => other,
            })
    }
}
