//! Grammar Lint Demo
//!
//! Runs the static analyzer over a grammar and prints every problem and
//! warning, followed by the consumption table and a Mermaid diagram.
//!
//! With a path argument the grammar is loaded from its JSON form (as written
//! by `Grammar::to_json`); without one, a few built-in grammars are linted.
//!
//! Run with: cargo run --example grammar-lint -- grammar.json

use pegkit::engine::{
    dsl::{class, lit, ref_, until_with, GrammarBuilder, ParsletExt},
    CharClass, Error, Grammar, GrammarAnalyzer, GrammarVisualizer,
};

fn sample_grammars() -> Result<Vec<(&'static str, Grammar)>, Error> {
    let clean = GrammarBuilder::new()
        .rule("sum", ref_("number").list(lit("+")))
        .rule("number", class(CharClass::Digit).plus())
        .build()?;

    let left_recursive = GrammarBuilder::new()
        .rule("expr", ref_("expr").then(lit("+")).then(ref_("number")).or(ref_("number")))
        .rule("number", class(CharClass::Digit).plus())
        .build()?;

    let empty_loop = GrammarBuilder::new()
        .rule("comment", lit("/*").then(until_with(lit("*/"), lit("*").opt())))
        .rule("keyword", lit("in").or(lit("int")))
        .build()?;

    Ok(vec![
        ("clean", clean),
        ("left-recursive", left_recursive),
        ("empty-loop", empty_loop),
    ])
}

fn lint(name: &str, grammar: &Grammar) -> bool {
    println!("== {} ({} rules)", name, grammar.rule_count());

    let report = GrammarAnalyzer::new(grammar).analyze();
    for problem in &report.problems {
        println!("  problem: {}", problem);
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    if report.is_clean() && report.warnings.is_empty() {
        println!("  no findings");
    }

    println!("  consumes:");
    for (rule, consumes) in &report.consumes {
        println!("    {:<12} {}", rule, consumes);
    }

    println!("\n{}", GrammarVisualizer::new(grammar).to_mermaid());
    report.is_clean()
}

fn main() {
    let grammars = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|json| Grammar::from_json(&json).map_err(|err| err.to_string()))
            .and_then(|grammar| {
                grammar.validate().map_err(|err| err.to_string())?;
                Ok(vec![("file", grammar)])
            }),
        None => sample_grammars().map_err(|err| err.to_string()),
    };

    let grammars = match grammars {
        Ok(grammars) => grammars,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    };

    let mut clean = true;
    for (name, grammar) in &grammars {
        clean &= lint(name, grammar);
    }
    if !clean {
        std::process::exit(1);
    }
}
