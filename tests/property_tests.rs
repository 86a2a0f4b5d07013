//! Property-based tests using proptest
//!
//! These tests check the engine's core guarantees over generated inputs:
//! rewinding on failure, greedy repetition, ordered choice, line tracking
//! and agreement between in-memory and streamed input.

use pegkit::engine::{
    dsl::{choice, class, eof, istr, lit, ref_, until, GrammarBuilder, ParsletExt},
    BufferConfig, BufferInput, CharClass, Grammar, Input, MemoryInput, Parser, ParserConfig,
    RewindMode,
};
use proptest::prelude::*;

fn assignment_grammar() -> Grammar {
    GrammarBuilder::new()
        .rule(
            "assign",
            ref_("name").then(lit("=")).then(ref_("value")).then(lit(";").opt()),
        )
        .rule("name", class(CharClass::Alpha).plus())
        .rule("value", class(CharClass::Digit).plus())
        .build()
        .unwrap()
}

// =============================================================================
// Rewinding
// =============================================================================

proptest! {
    /// A failed match leaves the cursor where it started
    #[test]
    fn test_failure_restores_cursor(text in "[a-z=0-9;]{0,16}") {
        let grammar = assignment_grammar();
        let mut input = MemoryInput::from_str(&text, "prop");
        let matched = Parser::new(&grammar).parse(&mut input, &mut ()).unwrap();
        if matched {
            prop_assert!(input.byte() >= 3);
        } else {
            prop_assert_eq!(input.byte(), 0);
        }
    }

    /// Lookahead never consumes
    #[test]
    fn test_lookahead_never_consumes(text in "[a-z=0-9]{0,16}") {
        let grammar = GrammarBuilder::new()
            .rule("peek", ref_("assign").at().or(ref_("assign").not_at()))
            .rule("assign", class(CharClass::Alpha).plus().then(lit("=")))
            .build()
            .unwrap();
        let mut input = MemoryInput::from_str(&text, "prop");
        prop_assert!(Parser::new(&grammar).parse(&mut input, &mut ()).unwrap());
        prop_assert_eq!(input.byte(), 0);
    }
}

// =============================================================================
// Repetition and Choice
// =============================================================================

proptest! {
    /// Star consumes every leading repetition and nothing more
    #[test]
    fn test_star_is_greedy(text in "(ab){0,10}[a-z]{0,3}") {
        let grammar = GrammarBuilder::new()
            .rule("pairs", lit("ab").star())
            .build()
            .unwrap();

        let mut expected = 0;
        while text[expected..].starts_with("ab") {
            expected += 2;
        }

        let mut input = MemoryInput::from_str(&text, "prop");
        prop_assert!(Parser::new(&grammar).parse(&mut input, &mut ()).unwrap());
        prop_assert_eq!(input.byte(), expected);
    }

    /// The first matching alternative wins
    #[test]
    fn test_ordered_choice(
        first in "[ab]{1,3}",
        second in "[ab]{1,3}",
        text in "[ab]{0,6}",
    ) {
        let grammar = GrammarBuilder::new()
            .rule("alt", choice([lit(&first), lit(&second)]))
            .build()
            .unwrap();

        let expected = if text.starts_with(&first) {
            Some(first.len())
        } else if text.starts_with(&second) {
            Some(second.len())
        } else {
            None
        };

        let mut input = MemoryInput::from_str(&text, "prop");
        let matched = Parser::new(&grammar).parse(&mut input, &mut ()).unwrap();
        prop_assert_eq!(matched, expected.is_some());
        prop_assert_eq!(input.byte(), expected.unwrap_or(0));
    }

    /// Case-insensitive literals accept every casing
    #[test]
    fn test_istr_any_casing(word in "[sS][eE][lL][eE][cC][tT]") {
        let grammar = GrammarBuilder::new()
            .rule("kw", istr("select").then(eof()))
            .build()
            .unwrap();
        prop_assert!(grammar.parse_str(&word).unwrap());
    }
}

// =============================================================================
// Positions
// =============================================================================

proptest! {
    /// Line and column after consuming everything match a direct count
    #[test]
    fn test_position_after_full_match(text in "[a-z\n]{0,60}") {
        let grammar = GrammarBuilder::new()
            .rule("all", until(eof()))
            .build()
            .unwrap();

        let mut input = MemoryInput::from_str(&text, "prop");
        prop_assert!(Parser::new(&grammar).parse(&mut input, &mut ()).unwrap());

        let line = 1 + text.matches('\n').count();
        let column = 1 + text.rsplit('\n').next().map_or(0, str::len);
        let pos = input.position();
        prop_assert_eq!((pos.byte, pos.line, pos.column), (text.len(), line, column));
    }
}

// =============================================================================
// Strategy Equivalence
// =============================================================================

proptest! {
    /// Streamed input in any chunk size agrees with in-memory input
    #[test]
    fn test_stream_agrees_with_memory(
        text in "([a-z]{1,4}=[0-9]{1,3};?\n?){0,8}[a-z=0-9]{0,3}",
        chunk in 1usize..16,
    ) {
        let grammar = GrammarBuilder::new()
            .rule("stmts", ref_("stmt").then(lit("\n").opt()).star())
            .rule("stmt", ref_("name").then(lit("=")).then(ref_("value").must()).then(lit(";").opt()))
            .rule("name", class(CharClass::Alpha).plus())
            .rule("value", class(CharClass::Digit).plus())
            .build()
            .unwrap();
        let parser = Parser::new(&grammar)
            .with_config(ParserConfig::new().with_rewind_mode(RewindMode::DontCare));

        let mut memory = MemoryInput::from_str(&text, "prop");
        let mut streamed = BufferInput::new(text.as_bytes(), BufferConfig::new(chunk, 4096), "prop");

        let a = parser.parse(&mut memory, &mut ());
        let b = parser.parse(&mut streamed, &mut ());
        prop_assert_eq!(&a, &b);
        if a.is_ok() {
            prop_assert_eq!(memory.position(), streamed.position());
        }
    }
}
