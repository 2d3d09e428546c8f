use thiserror::Error;


/// Coarse classification of a [LispError], one per failure category a
/// caller may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    UndefinedSymbol,
    TypeMismatch,
    ArityMismatch,
    DivideByZero,
    ApplyNonFunction,
    AtomDecomposition,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LispError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("syntax error: unexpected end of input")]
    UnexpectedEof,

    #[error("syntax error: unterminated string literal")]
    UnterminatedString,

    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("arity mismatch: {0}")]
    ArityMismatch(String),

    #[error("division by zero")]
    DivideByZero,

    #[error("cannot apply {0}")]
    ApplyNonFunction(String),

    #[error("cannot decompose atom: {0}")]
    AtomDecomposition(String),
}

impl LispError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax(_) | Self::UnexpectedEof | Self::UnterminatedString => ErrorKind::Syntax,
            Self::UndefinedSymbol(_) => ErrorKind::UndefinedSymbol,
            Self::TypeMismatch(_) => ErrorKind::TypeMismatch,
            Self::ArityMismatch(_) => ErrorKind::ArityMismatch,
            Self::DivideByZero => ErrorKind::DivideByZero,
            Self::ApplyNonFunction(_) => ErrorKind::ApplyNonFunction,
            Self::AtomDecomposition(_) => ErrorKind::AtomDecomposition,
        }
    }

    /// True when more input could still turn the failed read into a valid
    /// expression.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::UnexpectedEof | Self::UnterminatedString)
    }
}
