use crate::lexer::{LexerError, Position};
use std::fmt;
use thiserror::Error;

/// Interpreter error types. All of them abort the conversion.
#[derive(Error, Debug)]
pub enum InterpreterError {
    #[error("Group end without matching group start at {0}")]
    StackUnderflow(Position),

    #[error("Conversion cancelled at {0}")]
    Cancelled(Position),

    #[error("Lexer error: {0}")]
    LexerError(#[from] LexerError),

    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),
}

/// A recoverable problem found during a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub pos: Position,
    pub message: String,
}

impl Diagnostic {
    pub fn new(pos: Position, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }
}

impl From<&LexerError> for Diagnostic {
    fn from(err: &LexerError) -> Self {
        Self::new(err.position(), err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}
