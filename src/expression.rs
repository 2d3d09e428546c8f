use core::fmt;
use std::{mem, rc::Rc};

use itertools::Itertools;

use crate::{environment::Environment, symbol::Symbol};


/// A value of the language. Source code and runtime data share this one
/// representation: the reader produces expressions and the evaluator
/// consumes and returns them.
#[derive(Clone)]
pub enum Expression {
    Symbol(Symbol),
    Number(i64),
    String(Rc<str>),
    Pair(Rc<Pair>),
    Function(Rc<Function>),
}

/// A cons cell. Lists are chains of pairs ending in NIL.
pub struct Pair {
    head: Expression,
    tail: Expression,
}

impl Pair {
    pub fn head(&self) -> &Expression {
        &self.head
    }

    pub fn tail(&self) -> &Expression {
        &self.tail
    }
}

// Unlinks the tail chain cell by cell so long lists do not drop recursively
impl Drop for Pair {
    fn drop(&mut self) {
        let mut rest = mem::replace(&mut self.tail, Expression::Number(0));
        while let Expression::Pair(pair) = rest {
            rest = match Rc::try_unwrap(pair) {
                Ok(mut pair) => mem::replace(&mut pair.tail, Expression::Number(0)),
                Err(_) => break,
            };
        }
    }
}

/// A user-defined function closing over the scope it was defined in.
///
/// `parameters` is kept as an expression: a proper list of symbols, or a
/// chain ending in a bare symbol that collects any remaining arguments.
pub struct Function {
    parameters: Expression,
    body: Expression,
    environment: Environment,
}

impl Function {
    pub fn new(parameters: Expression, body: Expression, environment: Environment) -> Self {
        Self { parameters, body, environment }
    }

    pub fn parameters(&self) -> &Expression {
        &self.parameters
    }

    pub fn body(&self) -> &Expression {
        &self.body
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}

impl Expression {
    pub fn cons(head: Expression, tail: Expression) -> Self {
        Self::Pair(Rc::new(Pair { head, tail }))
    }

    pub fn string(text: &str) -> Self {
        Self::String(Rc::from(text))
    }

    /// Right-folds `values` onto `tail`.
    pub fn list_from(values: Vec<Expression>, tail: Expression) -> Self {
        values.into_iter()
            .rev()
            .fold(tail, |rest, value| Self::cons(value, rest))
    }

    pub fn is_atom(&self) -> bool {
        !matches!(self, Self::Pair(_))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Symbol(symbol) if symbol.is_nil())
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Symbol(symbol) => Some(symbol),
            _ => None
        }
    }

    pub fn as_pair(&self) -> Option<&Pair> {
        match self {
            Self::Pair(pair) => Some(pair),
            _ => None
        }
    }

    /// Iterates the elements of the proper-list prefix. The iterator's
    /// [ListIter::terminator] is whatever ended the chain.
    pub fn iter(&self) -> ListIter<'_> {
        ListIter { rest: self }
    }

    /// Elements of a proper list, or `None` for atoms other than NIL and
    /// for dotted chains.
    pub fn to_vec(&self) -> Option<Vec<Expression>> {
        let mut items = self.iter();
        let values = items.by_ref().cloned().collect_vec();
        items.terminator().is_nil().then_some(values)
    }

    pub fn list_length(&self) -> Option<usize> {
        let mut items = self.iter();
        let length = items.by_ref().count();
        items.terminator().is_nil().then_some(length)
    }

    pub fn is_list(&self) -> bool {
        self.list_length().is_some()
    }

    /// Reference equality. Numbers have no identity of their own and compare
    /// by value.
    pub fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => Rc::ptr_eq(a, b),
            (Self::Pair(a), Self::Pair(b)) => Rc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            _ => false
        }
    }

    /// Structural equality: identical values, equal numbers, equal strings,
    /// or pairs whose heads and tails are equal.
    pub fn equal(&self, other: &Self) -> bool {
        let (mut left, mut right) = (self, other);

        // Heads recurse, tails loop
        loop {
            if left.is_identical(right) { return true; }

            match (left, right) {
                (Self::String(a), Self::String(b)) => return a == b,
                (Self::Pair(a), Self::Pair(b)) => {
                    if !a.head.equal(&b.head) { return false; }
                    left = &a.tail;
                    right = &b.tail;
                },
                _ => return false
            }
        }
    }
}

pub struct ListIter<'a> {
    rest: &'a Expression,
}

impl<'a> ListIter<'a> {
    pub fn terminator(&self) -> &'a Expression {
        self.rest
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Expression;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rest {
            Expression::Pair(pair) => {
                self.rest = &pair.tail;
                Some(&pair.head)
            },
            _ => None
        }
    }
}

// Strings print between quotes exactly as stored; escapes accepted by the
// reader are not reproduced.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symbol(symbol) => symbol.fmt(f),
            Self::Number(number) => number.fmt(f),
            Self::String(text) => write!(f, "\"{}\"", text),
            Self::Function(_) => write!(f, "#<FUNCTION>"),
            Self::Pair(_) => {
                let mut items = self.iter();
                write!(f, "({}", items.join(" "))?;
                if !items.terminator().is_nil() {
                    write!(f, " . {}", items.terminator())?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (self as &dyn fmt::Display).fmt(f)
    }
}
