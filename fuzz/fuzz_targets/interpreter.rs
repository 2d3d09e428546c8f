#![no_main]

use core::fmt;
use std::io;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// Primitives and variable loads
#[derive(Arbitrary, Debug)]
enum LispAtom {
    Add, Sub, Mul, Div,
    Nil, True,
    Greater, Less, Eq, Equal,

    Car, Cdr, Cons, List,
    Atom, IsList, Concat, Length,

    Identifier(String),
    Text(String),
    Number(i64),
}

impl fmt::Display for LispAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            LispAtom::Add => "+",
            LispAtom::Sub => "-",
            LispAtom::Mul => "*",
            LispAtom::Div => "/",
            LispAtom::Nil => "NIL",
            LispAtom::True => "T",
            LispAtom::Greater => ">",
            LispAtom::Less => "<",
            LispAtom::Eq => "EQ",
            LispAtom::Equal => "EQUAL",
            LispAtom::Car => "CAR",
            LispAtom::Cdr => "CDR",
            LispAtom::Cons => "CONS",
            LispAtom::List => "LIST",
            LispAtom::Atom => "ATOM",
            LispAtom::IsList => "LIST?",
            LispAtom::Concat => "CONCAT",
            LispAtom::Length => "LENGTH",
            LispAtom::Identifier(identifier) => identifier,
            LispAtom::Text(text) => return write!(f, "{:?}", text),
            LispAtom::Number(value) => return write!(f, "{}", value),
        })
    }
}

// DEFUN is left out so generated programs always terminate
#[derive(Arbitrary, Debug)]
enum LispCommand {
    Quote(Vec<LispCommand>),
    Set(Vec<LispCommand>),
    Cond(Vec<LispCommand>),
    Apply(Vec<LispCommand>),

    Atom(LispAtom),
}

fn stringify_arguments(values: &[LispCommand]) -> String {
    values.iter()
        .map(LispCommand::to_string)
        .join(" ")
}

impl fmt::Display for LispCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LispCommand::Quote(args) => write!(f, "(QUOTE {})", stringify_arguments(args)),
            LispCommand::Set(args) => write!(f, "(SET {})", stringify_arguments(args)),
            LispCommand::Cond(args) => write!(f, "(COND {})", stringify_arguments(args)),
            LispCommand::Apply(args) => write!(f, "({})", stringify_arguments(args)),
            LispCommand::Atom(atom) => atom.fmt(f),
        }
    }
}

fuzz_target!(|commands: Vec<LispCommand>| {
    let mut context = tinylisp::EvaluationContext::with_output(io::sink());

    for command in commands {
        let command = command.to_string();
        let _ = context.evaluate_str(&command);
    }
});
