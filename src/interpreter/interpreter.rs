use crate::interpreter::keywords::{self, KeywordDescriptor, SpecialFunction};
use crate::interpreter::{Diagnostic, InterpreterError};
use crate::lexer::{hex_value, Event, EventSink, Flow, Position};
use crate::symbol::{Destination, ScopeStack};
use tracing::{debug, trace, warn};

/// Maps 8-bit text bytes to characters for a given codepage.
pub trait CodepageDecoder {
    /// Decode one byte from a hex escape or from raw text that is not valid
    /// UTF-8. `None` leaves the byte value as the code point.
    fn decode(&self, codepage: i32, byte: u8) -> Option<char>;
}

/// Interpreter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// Group depth at which hex escapes produce text. `None` accepts any depth.
    pub hex_group_level: Option<usize>,
    /// Treat `\*` followed by an unknown control word as a skipped destination.
    pub skip_unknown_ignorable: bool,
    /// Ask the scanner to discard the payload announced by `\binN`.
    pub skip_binary: bool,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            hex_group_level: Some(1),
            skip_unknown_ignorable: false,
            skip_binary: true,
        }
    }
}

/// Final result of a conversion
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversion {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Applies scanner events to a stack of scopes and accumulates the text.
pub struct Interpreter {
    stack: ScopeStack,
    options: InterpreterOptions,
    decoder: Option<Box<dyn CodepageDecoder>>,
    diagnostics: Vec<Diagnostic>,
    /// The next group start opens a suppressed scope.
    pending_ignorable: bool,
    /// The previous event was `\*`.
    after_ignorable: bool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(InterpreterOptions::default())
    }

    #[must_use]
    pub fn with_options(options: InterpreterOptions) -> Self {
        Self {
            stack: ScopeStack::new(),
            options,
            decoder: None,
            diagnostics: Vec::new(),
            pending_ignorable: false,
            after_ignorable: false,
        }
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: Box<dyn CodepageDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    #[must_use]
    pub fn stack(&self) -> &ScopeStack {
        &self.stack
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Apply one event.
    /// # Errors
    /// `StackUnderflow` on an unmatched group end, or a fatal lexer error
    /// delivered as an event.
    pub fn handle(&mut self, event: Event, pos: Position) -> Result<Flow, InterpreterError> {
        let after_ignorable = std::mem::take(&mut self.after_ignorable);
        match event {
            Event::GroupStart => {
                self.stack.push();
                if std::mem::take(&mut self.pending_ignorable) {
                    self.stack.current_mut().suppressed = true;
                }
            }
            Event::GroupEnd => {
                self.pending_ignorable = false;
                self.stack
                    .pop()
                    .map_err(|_| InterpreterError::StackUnderflow(pos))?;
            }
            Event::Text(bytes) => self.add_text_bytes(&bytes),
            Event::HexChar(digits) => {
                if let Some(byte) = hex_value(digits) {
                    self.add_hex_byte(byte);
                }
            }
            Event::Keyword { name, param } => {
                return self.apply_keyword(&name, param, pos, after_ignorable);
            }
            Event::Ignorable => {
                self.pending_ignorable = true;
                self.after_ignorable = true;
            }
            Event::ParagraphEnd => self.stack.add_text("\n"),
            Event::Error(err) => {
                if err.is_fatal() {
                    return Err(err.into());
                }
                self.report(Diagnostic::from(&err));
            }
        }
        Ok(Flow::Continue)
    }

    /// Close any groups left open and return the accumulated text.
    #[must_use]
    pub fn finish(mut self, end: Position) -> Conversion {
        while self.stack.depth() > 0 {
            let depth = self.stack.depth();
            self.report(Diagnostic::new(
                end,
                format!("Group at depth {depth} still open at end of input"),
            ));
            if self.stack.pop().is_err() {
                break;
            }
        }
        Conversion {
            text: self.stack.into_root().text,
            diagnostics: self.diagnostics,
        }
    }

    fn apply_keyword(
        &mut self,
        name: &str,
        param: Option<i32>,
        pos: Position,
        after_ignorable: bool,
    ) -> Result<Flow, InterpreterError> {
        let Some(descriptor) = keywords::lookup(name) else {
            trace!(name, ?param, "unknown control word");
            if after_ignorable && self.options.skip_unknown_ignorable {
                self.set_destination(Destination::Skip);
            }
            self.stack.set_property(name, param.unwrap_or(1));
            return Ok(Flow::Continue);
        };
        trace!(name, ?param, %descriptor, "control word");
        match descriptor {
            KeywordDescriptor::CharLiteral(ch) => self.stack.add_char(ch as u32),
            KeywordDescriptor::DestinationChange(destination) => {
                self.set_destination(destination);
            }
            KeywordDescriptor::PropertySet => {
                self.stack.set_property(name, param.unwrap_or(1));
            }
            KeywordDescriptor::SpecialFunction(func) => {
                return Ok(self.apply_special(func, param, pos));
            }
        }
        Ok(Flow::Continue)
    }

    fn apply_special(&mut self, func: SpecialFunction, param: Option<i32>, pos: Position) -> Flow {
        match func {
            SpecialFunction::Unicode => match param {
                Some(unit @ -32768..=65535) => {
                    let unit = if unit < 0 { unit + 65536 } else { unit };
                    let code = u32::try_from(unit).unwrap_or(char::REPLACEMENT_CHARACTER as u32);
                    self.stack.add_char(code);
                }
                _ => self.report(Diagnostic::new(
                    pos,
                    format!("Unicode control word needs a 16-bit code unit, got {param:?}"),
                )),
            },
            SpecialFunction::Binary => match param {
                Some(length) if length < 0 => {
                    self.report(Diagnostic::new(pos, format!("Negative binary length {length}")));
                }
                Some(length) if self.options.skip_binary => {
                    debug!(length, "skip binary block");
                    return Flow::SkipBytes(usize::try_from(length).unwrap_or(0));
                }
                _ => debug!(?param, "binary block left in input"),
            },
            SpecialFunction::HexPair => match param.and_then(|value| u8::try_from(value).ok()) {
                Some(byte) => self.add_hex_byte(byte),
                None => self.report(Diagnostic::new(pos, format!("Invalid hex pair value {param:?}"))),
            },
        }
        Flow::Continue
    }

    /// Valid UTF-8 passes through; other bytes go to the decoder when the
    /// scope declares a codepage, or become U+FFFD.
    fn add_text_bytes(&mut self, bytes: &[u8]) {
        let codepage = self.stack.codepage();
        let decoder = self.decoder.as_deref();
        let mut text = String::with_capacity(bytes.len());
        for chunk in bytes.utf8_chunks() {
            text.push_str(chunk.valid());
            let invalid = chunk.invalid();
            if invalid.is_empty() {
                continue;
            }
            match (codepage, decoder) {
                (Some(codepage), Some(decoder)) => {
                    for &byte in invalid {
                        text.push(decoder.decode(codepage, byte).unwrap_or(char::from(byte)));
                    }
                }
                _ => text.push(char::REPLACEMENT_CHARACTER),
            }
        }
        self.stack.add_text(&text);
    }

    fn add_hex_byte(&mut self, byte: u8) {
        if let Some(level) = self.options.hex_group_level {
            if self.stack.depth() != level {
                trace!(byte, depth = self.stack.depth(), "hex escape outside document level");
                return;
            }
        }
        let decoded = self.stack.codepage().and_then(|codepage| {
            self.decoder
                .as_ref()
                .and_then(|decoder| decoder.decode(codepage, byte))
        });
        match decoded {
            Some(ch) => self.stack.add_char(ch as u32),
            None => self.stack.add_char(u32::from(byte)),
        }
    }

    fn set_destination(&mut self, destination: Destination) {
        debug!(?destination, depth = self.stack.depth(), "set destination");
        self.stack.current_mut().destination = destination;
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!(pos = %diagnostic.pos, message = %diagnostic.message, "recoverable error");
        self.diagnostics.push(diagnostic);
    }
}

impl EventSink for Interpreter {
    type Error = InterpreterError;

    fn accept(&mut self, event: Event, pos: Position) -> Result<Flow, InterpreterError> {
        self.handle(event, pos)
    }
}
