use std::fmt;
use thiserror::Error;

/// Position in the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Escape forms the reader recognizes but has no semantics for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    /// `\|`
    Formula,
    /// `\:`
    IndexSubentry,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Construct::Formula => write!(f, "formula"),
            Construct::IndexSubentry => write!(f, "index sub-entry"),
        }
    }
}

/// Lexer error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    #[error("Invalid hex digit '{0}' at {1}")]
    InvalidHexDigit(char, Position),

    #[error("Unimplemented {0} escape at {1}")]
    UnimplementedConstruct(Construct, Position),

    #[error("Empty control word at {0}")]
    EmptyKeyword(Position),

    #[error("Invalid parameter '{1}' for control word '{0}' at {2}")]
    InvalidKeywordParameter(String, String, Position),

    #[error("Unexpected end of input at {0}")]
    UnexpectedEof(Position),
}

impl LexerError {
    /// Fatal errors abort the parse; the rest are surfaced as `Event::Error`.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LexerError::InvalidHexDigit(..)
                | LexerError::UnimplementedConstruct(..)
                | LexerError::UnexpectedEof(..)
        )
    }

    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            LexerError::InvalidHexDigit(_, pos)
            | LexerError::UnimplementedConstruct(_, pos)
            | LexerError::EmptyKeyword(pos)
            | LexerError::InvalidKeywordParameter(_, _, pos)
            | LexerError::UnexpectedEof(pos) => *pos,
        }
    }
}
