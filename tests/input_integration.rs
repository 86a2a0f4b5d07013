//! Integration tests for the input strategies
//!
//! The same grammar must behave identically over in-memory, mapped and
//! streamed input. These tests cover:
//! - Strategy equivalence
//! - Bounded buffers and capacity errors
//! - Line tracking and end-of-line policies
//! - File and closure sources

use pegkit::engine::{
    dsl::{class, eol, eolf, lit, ref_, until, GrammarBuilder, ParsletExt},
    BufferConfig, BufferInput, CharClass, Eol, Error, Grammar, Input, InputError, MemoryInput,
    Parser, ParserConfig, RewindMode, Tracking,
};
use std::io;

fn csv_grammar() -> Grammar {
    GrammarBuilder::new()
        .rule("file", ref_("row").then(eol()).star().then(ref_("row").opt()))
        .rule("row", ref_("cell").list(lit(",")))
        .rule("cell", class(CharClass::Alnum).star())
        .build()
        .unwrap()
}

fn csv_text(rows: usize) -> String {
    (0..rows)
        .map(|i| format!("row{},{},value{}\n", i, i * 7, i % 3))
        .collect()
}

fn parse_fully<I: Input>(grammar: &Grammar, input: &mut I) -> bool {
    let matched = Parser::new(grammar).parse(input, &mut ()).unwrap();
    matched && input.is_empty().unwrap()
}

/// Like `parse_fully`, but the start rule holds no mark that would pin the
/// whole stream in the buffer
fn stream_fully<I: Input>(grammar: &Grammar, input: &mut I) -> bool {
    let config = ParserConfig::new().with_rewind_mode(RewindMode::DontCare);
    let matched = Parser::new(grammar)
        .with_config(config)
        .parse(input, &mut ())
        .unwrap();
    matched && input.is_empty().unwrap()
}

// ============================================================================
// Strategy Equivalence
// ============================================================================

#[test]
fn test_memory_mapped_and_streamed_agree() {
    let grammar = csv_grammar();
    let text = csv_text(200);

    let mut memory = MemoryInput::from_str(&text, "mem");
    let mut mapped = MemoryInput::mapped(text.as_bytes(), "map");
    let mut streamed = BufferInput::new(text.as_bytes(), BufferConfig::new(64, 256), "stream");

    assert!(parse_fully(&grammar, &mut memory));
    assert!(parse_fully(&grammar, &mut mapped));
    assert!(stream_fully(&grammar, &mut streamed));

    assert_eq!(memory.byte(), text.len());
    assert_eq!(memory.position().line, mapped.position().line);
    assert_eq!(memory.position(), {
        let mut p = streamed.position();
        p.source = "mem".into();
        p
    });
    assert!(streamed.buffered() <= 256);
}

#[test]
fn test_streamed_failure_matches_memory_failure() {
    let grammar = GrammarBuilder::new()
        .rule("lines", ref_("line").star().then(lit("END").must()))
        .rule("line", class(CharClass::Alpha).plus().then(eol()))
        .build()
        .unwrap();
    let text = "alpha\nbeta\ngamma\n123";

    let mut memory = MemoryInput::from_str(text, "input");
    let mut streamed = BufferInput::new(text.as_bytes(), BufferConfig::new(4, 32), "input");

    let a = Parser::new(&grammar).parse(&mut memory, &mut ()).unwrap_err();
    let b = Parser::new(&grammar).parse(&mut streamed, &mut ()).unwrap_err();
    assert_eq!(a, b);
    assert_eq!(a.as_parse().unwrap().to_string(), "input:4:1: parse error matching \"END\"");
}

// ============================================================================
// Bounded Buffers
// ============================================================================

#[test]
fn test_require_within_and_beyond_capacity() {
    let data: Vec<u8> = (0..200u8).collect();
    let mut input = BufferInput::new(&data[..], BufferConfig::new(64, 128), "stream");

    input.require(50).unwrap();
    input.bump(50);
    input.require(100).unwrap();
    assert!(input.buffered() <= 128);
    assert_eq!(&input.current()[..100], &data[50..150]);

    assert_eq!(
        input.require(200),
        Err(InputError::CapacityExceeded {
            requested: 200,
            maximum: 128
        })
    );
}

#[test]
fn test_size_never_exceeds_request() {
    let mut memory = MemoryInput::from_str("abcdef", "mem");
    let mut streamed = BufferInput::new(&b"abcdef"[..], BufferConfig::new(8, 16), "stream");

    assert_eq!(memory.size(2).unwrap(), 2);
    assert_eq!(streamed.size(2).unwrap(), 2);
    assert_eq!(memory.size(100).unwrap(), 6);
    assert_eq!(streamed.size(100).unwrap(), 6);
    assert_eq!(memory.size(0).unwrap(), 0);
    assert_eq!(streamed.size(0).unwrap(), 0);
}

#[test]
fn test_long_stream_stays_bounded() {
    let grammar = GrammarBuilder::new()
        .rule("lines", until(lit("\n")).then(pegkit::engine::dsl::discard()).star())
        .build()
        .unwrap();

    let text = "a line of text that repeats\n".repeat(1000);
    let mut input = BufferInput::new(text.as_bytes(), BufferConfig::new(128, 512), "stream");
    assert!(parse_fully(&grammar, &mut input));
    assert!(input.buffered() <= 512);
    assert_eq!(input.live_marks(), 0);
    assert_eq!(input.position().line, 1001);
}

#[test]
fn test_pinned_stream_reports_capacity() {
    let grammar = csv_grammar();
    let text = csv_text(50);
    let mut input = BufferInput::new(text.as_bytes(), BufferConfig::new(16, 64), "stream");
    assert!(matches!(
        Parser::new(&grammar).parse(&mut input, &mut ()),
        Err(Error::Input(InputError::CapacityExceeded { .. }))
    ));
}

#[test]
fn test_capacity_error_surfaces_through_parser() {
    let grammar = GrammarBuilder::new()
        .rule("blob", lit("<").then(until(lit(">"))))
        .build()
        .unwrap();

    // The whole blob stays behind the rule's mark, so it can't be discarded.
    let text = format!("<{}>", "x".repeat(100));
    let mut input = BufferInput::new(text.as_bytes(), BufferConfig::new(8, 32), "stream");
    let result = Parser::new(&grammar).parse(&mut input, &mut ());
    assert!(
        matches!(result, Err(Error::Input(InputError::CapacityExceeded { maximum: 32, .. }))),
        "unexpected {:?}",
        result
    );
    assert_eq!(input.live_marks(), 0);
}

#[test]
fn test_io_error_surfaces_through_parser() {
    let mut calls = 0;
    let mut input = BufferInput::from_fn(
        move |buf: &mut [u8]| {
            calls += 1;
            if calls == 1 {
                buf[..3].copy_from_slice(b"abc");
                Ok(3)
            } else {
                Err(io::Error::from_raw_os_error(5))
            }
        },
        BufferConfig::new(16, 64),
        "device",
    );

    let grammar = GrammarBuilder::new()
        .rule("root", class(CharClass::Alpha).plus().then(lit(";")))
        .build()
        .unwrap();
    match Parser::new(&grammar).parse(&mut input, &mut ()) {
        Err(Error::Input(InputError::Io { code, .. })) => assert_eq!(code, Some(5)),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}

// ============================================================================
// Line Tracking
// ============================================================================

#[test]
fn test_lazy_tracking_replays_positions() {
    let grammar = GrammarBuilder::new()
        .rule("root", until(lit("!")))
        .build()
        .unwrap();
    let text = "one\ntwo\nthree!";

    let mut lazy = MemoryInput::with_options(text.as_bytes(), "lazy", Tracking::Lazy, Eol::Lf);
    assert!(Parser::new(&grammar).parse(&mut lazy, &mut ()).unwrap());
    assert_eq!(lazy.iter().line, 0, "lazy inputs keep only the byte offset");
    let pos = lazy.position();
    assert_eq!((pos.byte, pos.line, pos.column), (14, 3, 7));
}

#[test]
fn test_eol_policies() {
    let grammar = GrammarBuilder::new()
        .rule("lines", ref_("line").star())
        .rule("line", class(CharClass::Alpha).plus().then(eolf()))
        .build()
        .unwrap();

    let cases = [
        (Eol::Lf, "a\nb\n", true),
        (Eol::Lf, "a\r\nb", false),
        (Eol::Cr, "a\rb", true),
        (Eol::Crlf, "a\r\nb", true),
        (Eol::Crlf, "a\nb", false),
        (Eol::CrCrlf, "a\rb\r\nc", true),
        (Eol::LfCrlf, "a\nb\r\nc", true),
    ];
    for (eol_policy, text, expected) in cases {
        let mut input = MemoryInput::from_str(text, "eol").with_eol(eol_policy);
        assert_eq!(
            parse_fully(&grammar, &mut input),
            expected,
            "{:?} on {:?}",
            eol_policy,
            text
        );
    }
}

#[test]
fn test_bol_after_line_end() {
    let grammar = GrammarBuilder::new()
        .rule(
            "root",
            lit("a").then(eol()).then(pegkit::engine::dsl::bol()).then(lit("b")),
        )
        .build()
        .unwrap();
    assert!(grammar.parse_all("a\nb").unwrap());

    let mut lazy = MemoryInput::mapped(b"a\nb", "map");
    assert!(parse_fully(&grammar, &mut lazy));
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn test_from_file() {
    let path = std::env::temp_dir().join(format!("pegkit-input-{}.csv", std::process::id()));
    std::fs::write(&path, csv_text(10)).unwrap();

    let mut input = MemoryInput::from_file(&path).unwrap();
    assert_eq!(input.source(), path.display().to_string());
    assert!(parse_fully(&csv_grammar(), &mut input));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_from_closure_in_small_pieces() {
    let text = csv_text(20).into_bytes();
    let mut offset = 0;
    let mut input = BufferInput::from_fn(
        move |buf: &mut [u8]| {
            // At most 3 bytes per read.
            let n = buf.len().min(3).min(text.len() - offset);
            buf[..n].copy_from_slice(&text[offset..offset + n]);
            offset += n;
            Ok(n)
        },
        BufferConfig::new(16, 64),
        "pieces",
    );
    assert!(stream_fully(&csv_grammar(), &mut input));
    assert_eq!(input.position().line, 21);
    assert!(input.buffered() <= 64);
}
