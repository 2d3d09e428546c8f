mod builtin;
mod context;
mod environment;
mod error;
mod expression;
mod interpreter;
mod parser;
pub mod repl;
mod symbol;

#[cfg(test)]
mod test_utils;

pub use error::{ErrorKind, LispError};
pub use context::EvaluationContext;
pub use environment::Environment;
pub use expression::{Expression, Function, ListIter, Pair};
pub use interpreter::EvaluationResult;
pub use parser::{parse, ParseResult, Reader};
pub use symbol::{Symbol, SymbolTable};
