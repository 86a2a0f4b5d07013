//! Streaming Demo - Word and Line Counts over a Bounded Buffer
//!
//! Reads stdin (or the file named on the command line) through a
//! `BufferInput`, so memory use stays bounded by the buffer maximum no
//! matter how large the input is. The start rule runs with
//! `RewindMode::DontCare`: each line is matched under its own mark, and
//! the buffer can drop a line as soon as it is done. A single line longer
//! than the buffer maximum is reported as a capacity error.
//!
//! Run with: cargo run --example streaming-lines -- Cargo.toml

use pegkit::engine::{
    dsl::{class, eof, eol, eolf, not_one_of, ref_, GrammarBuilder, ParsletExt},
    ActionMap, BufferConfig, BufferInput, CharClass, Error, Grammar, Normal, Parser,
    ParserConfig, RewindMode,
};
use std::fs::File;
use std::io::{self, Read};

#[derive(Debug, Default)]
struct Stats {
    lines: usize,
    words: usize,
    longest_word: String,
}

fn build_grammar() -> Result<Grammar, Error> {
    GrammarBuilder::new()
        .rule("text", ref_("line").star().then(eof().must()))
        .rule("line", ref_("content").plus().then(eolf()).or(eol()))
        .rule("content", ref_("word").or(not_one_of("\n")))
        .rule("word", class(CharClass::Alnum).plus())
        .build()
}

fn count<R: Read>(grammar: &Grammar, reader: R, source: &str) -> Result<(Stats, usize), Error> {
    let mut actions = ActionMap::new()
        .on("word", |text, stats: &mut Stats| {
            stats.words += 1;
            if text.len() > stats.longest_word.len() {
                stats.longest_word = text.to_string();
            }
            true
        })
        .on0("line", |stats: &mut Stats| {
            stats.lines += 1;
            true
        });

    let mut input = BufferInput::new(reader, BufferConfig::small(), source);
    let mut stats = Stats::default();
    Parser::new(grammar)
        .with_config(ParserConfig::new().with_rewind_mode(RewindMode::DontCare))
        .parse_with(&mut input, &mut actions, &mut Normal, &mut stats)?;
    Ok((stats, input.buffered()))
}

fn main() {
    let grammar = match build_grammar() {
        Ok(grammar) => grammar,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    let result = match std::env::args().nth(1) {
        Some(path) => match File::open(&path) {
            Ok(file) => count(&grammar, file, &path),
            Err(err) => Err(err.into()),
        },
        None => count(&grammar, io::stdin().lock(), "stdin"),
    };

    match result {
        Ok((stats, buffered)) => {
            println!("lines:        {}", stats.lines);
            println!("words:        {}", stats.words);
            println!("longest word: {:?}", stats.longest_word);
            println!("buffered:     {} bytes", buffered);
        }
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    }
}
