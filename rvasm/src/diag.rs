use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("illegal character '{0}'")]
    IllegalCharacter(char),
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("malformed expression '{0}'")]
    MalformedExpression(String),
    #[error("division by zero in expression")]
    DivisionByZero,
    #[error("invalid label name '{0}'")]
    BadLabelName(String),
    #[error("'{mnemonic}' expects {expected} operand(s), got {found}")]
    WrongOperandCount {
        mnemonic: String,
        expected: usize,
        found: usize,
    },
    #[error("unexpected argument to directive '{0}'")]
    UnexpectedArgument(String),
    #[error("directive '{0}' requires an argument")]
    MissingArgument(String),
    #[error("expected a string literal, got '{0}'")]
    ExpectedString(String),
    #[error("'{token}' count must be non-negative, got {value}")]
    BadCount { token: String, value: i64 },
    #[error("symbol '{0}' is already defined")]
    DuplicateSymbol(String),
    #[error("undefined symbol '{0}'")]
    UndefinedSymbol(String),
    #[error("unknown register '{0}'")]
    UnknownRegister(String),
    #[error("unknown instruction '{0}'")]
    UnknownInstruction(String),
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),
    #[error(".align exponent {0} is too large")]
    AlignTooLarge(i64),
    #[error(transparent)]
    Immediate(#[from] rvisa::ImmError),
    #[error(transparent)]
    Pseudo(#[from] rvisa::PseudoError),
}

/// One collected error, keyed to the 1-based source line it came from.
/// Synthetic lines produced by pseudo expansion report the line of the
/// pseudo-op the user wrote.
#[derive(Debug, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    pub kind: ErrorKind,
}

impl Diagnostic {
    pub fn new(line: usize, kind: ErrorKind) -> Self {
        Diagnostic { line, kind }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

pub type Diagnostics = Vec<Diagnostic>;
