use crate::lexer::{LexerError, Position};
use std::fmt;

/// Semantic events produced by the scanner.
///
/// Adjacent literal bytes are coalesced into a single `Text` event, and any
/// pending text is always delivered before the structural event that ended it.
/// Text stays as raw bytes; decoding needs the codepage known to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    GroupStart,
    GroupEnd,
    Text(Vec<u8>),
    /// The two hex digits of a `\'XX` escape, as written.
    HexChar([u8; 2]),
    Keyword {
        name: String,
        param: Option<i32>,
    },
    /// `\*`
    Ignorable,
    /// A backslash immediately followed by CR or LF.
    ParagraphEnd,
    /// A recoverable lexer error. Parsing continues in the text state.
    Error(LexerError),
}

impl Event {
    pub fn keyword(name: impl Into<String>, param: Option<i32>) -> Self {
        Event::Keyword {
            name: name.into(),
            param,
        }
    }

    pub fn text(value: impl Into<Vec<u8>>) -> Self {
        Event::Text(value.into())
    }
}

/// Byte value of a pair of hex digits. Callers guarantee both are hex digits.
pub(crate) fn hex_value(digits: [u8; 2]) -> Option<u8> {
    let high = (digits[0] as char).to_digit(16)?;
    let low = (digits[1] as char).to_digit(16)?;
    u8::try_from(high * 16 + low).ok()
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Event::GroupStart => write!(f, "{{"),
            Event::GroupEnd => write!(f, "}}"),
            Event::Text(text) => write!(f, "text {:?}", String::from_utf8_lossy(text)),
            Event::HexChar(digits) => {
                write!(f, "hex '{}{}'", digits[0] as char, digits[1] as char)
            }
            Event::Keyword { name, param: Some(param) } => write!(f, "\\{}{}", name, param),
            Event::Keyword { name, param: None } => write!(f, "\\{}", name),
            Event::Ignorable => write!(f, "\\*"),
            Event::ParagraphEnd => write!(f, "paragraph end"),
            Event::Error(err) => write!(f, "error: {}", err),
        }
    }
}

/// An event along with the position of the byte that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub event: Event,
    pub pos: Position,
}

impl Token {
    pub fn new(event: Event, pos: Position) -> Self {
        Self { event, pos }
    }
}

/// What the consumer of an event wants the scanner to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    /// Discard the next N raw bytes without classifying them.
    SkipBytes(usize),
}
