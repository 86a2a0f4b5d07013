//! Calculator Demo - Evaluating with Actions
//!
//! The grammar has one rule per operator application. Actions run as soon
//! as a rule succeeds, so evaluation is a plain operand stack: numbers are
//! pushed, and `add`/`sub`/`mul`/`div` pop two operands and push the result.
//!
//! Run with: cargo run --example calculator -- "1 + 2 * (3 - 4)"

use pegkit::engine::{
    dsl::{class, eof, lit, one_of, ref_, GrammarBuilder, ParsletExt},
    Action, ActionInput, Binding, CharClass, Error, Grammar, Input, MemoryInput, Normal,
    ParseError, Parser, RuleRef,
};

/// Build the calculator grammar with the usual precedence
fn build_calculator_grammar() -> Result<Grammar, Error> {
    GrammarBuilder::new()
        .rule("calc", ref_("ws").then(ref_("expr")).then(eof().must()))
        .rule("expr", ref_("term").then(ref_("add").or(ref_("sub")).star()))
        .rule("add", lit("+").then(ref_("ws")).then(ref_("term").must()))
        .rule("sub", lit("-").then(ref_("ws")).then(ref_("term").must()))
        .rule("term", ref_("factor").then(ref_("mul").or(ref_("div")).star()))
        .rule("mul", lit("*").then(ref_("ws")).then(ref_("factor").must()))
        .rule("div", lit("/").then(ref_("ws")).then(ref_("factor").must()))
        .rule(
            "factor",
            ref_("number")
                .or(lit("(").then(ref_("ws")).then(ref_("expr")).then(lit(")").must()))
                .then(ref_("ws")),
        )
        .rule("number", class(CharClass::Digit).plus())
        .rule("ws", one_of(" \t").star())
        .build()
}

/// Operand stack evaluator
struct Evaluate;

impl Action<Vec<i64>> for Evaluate {
    fn binding(&self, rule: RuleRef<'_>) -> Binding {
        match rule.name {
            "number" => Binding::Apply,
            "add" | "sub" | "mul" | "div" => Binding::Apply0,
            _ => Binding::None,
        }
    }

    fn apply<I: Input>(
        &mut self,
        _rule: RuleRef<'_>,
        input: &ActionInput<'_, I>,
        stack: &mut Vec<i64>,
    ) -> Result<bool, Error> {
        let value = input.string().parse::<i64>().map_err(|err| {
            ParseError::new(format!("bad number: {}", err), input.position())
        })?;
        stack.push(value);
        Ok(true)
    }

    fn apply0(&mut self, rule: RuleRef<'_>, stack: &mut Vec<i64>) -> Result<bool, Error> {
        let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
            return Err(ParseError::without_position("operand stack underflow").into());
        };
        let result = match rule.name {
            "add" => left.checked_add(right),
            "sub" => left.checked_sub(right),
            "mul" => left.checked_mul(right),
            _ => left.checked_div(right),
        };
        match result {
            Some(value) => {
                stack.push(value);
                Ok(true)
            }
            None => Err(ParseError::without_position(format!(
                "arithmetic error in {} {} {}",
                left, rule.name, right
            ))
            .into()),
        }
    }
}

fn evaluate(grammar: &Grammar, text: &str) -> Result<i64, String> {
    let mut input = MemoryInput::from_str(text, "expr");
    let mut stack = Vec::new();
    match Parser::new(grammar).parse_with(&mut input, &mut Evaluate, &mut Normal, &mut stack) {
        Ok(true) => stack.pop().ok_or_else(|| "empty expression".to_string()),
        Ok(false) => Err(format!("not an expression: {:?}", text)),
        Err(Error::Parse(err)) => Err(err.format_with_source(text.as_bytes(), b'\n')),
        Err(err) => Err(err.to_string()),
    }
}

fn main() {
    println!("Calculator - Evaluating with Actions");
    println!("====================================\n");

    let grammar = match build_calculator_grammar() {
        Ok(grammar) => grammar,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    if grammar.analyze(true) > 0 {
        std::process::exit(1);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let inputs: Vec<String> = if args.is_empty() {
        ["42", "1+2", "1 + 2 * 3", "(1 + 2) * 3", "10 / (5 - 5)", "2 * (3 +"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        args
    };

    for text in &inputs {
        match evaluate(&grammar, text) {
            Ok(value) => println!("{} => {}", text, value),
            Err(err) => println!("{} => error\n{}", text, err),
        }
    }
}
