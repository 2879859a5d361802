use crate::lexer::{Construct, Event, Flow, LexerError, Position, Token};
use tracing::trace;

/// Receiver of scanner events.
///
/// The scanner hands over exactly one event at a time and waits for the
/// returned [`Flow`] before it looks at the next byte.
pub trait EventSink {
    type Error: From<LexerError>;

    /// Handle one event.
    /// # Errors
    /// Any error returned here aborts the scan.
    fn accept(&mut self, event: Event, pos: Position) -> Result<Flow, Self::Error>;
}

/// Collects events for inspection.
impl EventSink for Vec<Token> {
    type Error = LexerError;

    fn accept(&mut self, event: Event, pos: Position) -> Result<Flow, LexerError> {
        self.push(Token::new(event, pos));
        Ok(Flow::Continue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    Escape,
    Symbol,
    Hex,
    Keyword,
    KeywordParam,
    /// Discarding the payload of a binary block.
    Binary,
}

/// Byte-at-a-time tokenizer.
pub struct Scanner {
    state: State,
    line: usize,
    column: usize,
    /// Position of the backslash that started the current escape.
    mark: Position,
    text: Vec<u8>,
    text_start: Position,
    hex: [u8; 2],
    hex_len: usize,
    keyword: String,
    param: String,
    skip: usize,
    depth: isize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Text,
            line: 1,
            column: 1,
            mark: Position::start(),
            text: Vec::new(),
            text_start: Position::start(),
            hex: [0; 2],
            hex_len: 0,
            keyword: String::new(),
            param: String::new(),
            skip: 0,
            depth: 0,
        }
    }

    /// Position of the next byte to be fed.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Group nesting as seen by the scanner: group starts minus group ends.
    #[must_use]
    pub fn depth(&self) -> isize {
        self.depth
    }

    /// Feed one byte through the state machine.
    /// # Errors
    /// Fatal lexer errors, or whatever the sink returns.
    pub fn feed<S: EventSink>(&mut self, ch: u8, sink: &mut S) -> Result<(), S::Error> {
        let pos = self.position();
        if ch == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.dispatch(ch, pos, sink)
    }

    /// Signal end of input: emit whatever is still pending.
    /// # Errors
    /// `UnexpectedEof` if the input stops inside a hex escape or a binary block.
    pub fn finish<S: EventSink>(&mut self, sink: &mut S) -> Result<(), S::Error> {
        let pos = self.position();
        match self.state {
            State::Text => {}
            State::Escape | State::Symbol => {
                self.state = State::Text;
                self.flush_text(sink)?;
                self.emit(Event::Error(LexerError::EmptyKeyword(self.mark)), self.mark, sink)?;
            }
            State::Keyword | State::KeywordParam => {
                self.state = State::Text;
                self.emit_keyword(sink)?;
                // A trailing \binN announces a payload that never arrives.
                if self.state == State::Binary && self.skip > 0 {
                    return Err(LexerError::UnexpectedEof(pos).into());
                }
            }
            State::Hex | State::Binary => {
                return Err(LexerError::UnexpectedEof(pos).into());
            }
        }
        self.flush_text(sink)
    }

    fn dispatch<S: EventSink>(&mut self, ch: u8, pos: Position, sink: &mut S) -> Result<(), S::Error> {
        match self.state {
            State::Text => self.scan_text(ch, pos, sink),
            State::Escape => self.scan_escape(ch, pos, sink),
            State::Symbol => self.scan_symbol(ch, pos, sink),
            State::Hex => self.scan_hex(ch, pos, sink),
            State::Keyword => self.scan_keyword(ch, pos, sink),
            State::KeywordParam => self.scan_keyword_param(ch, pos, sink),
            State::Binary => {
                self.skip -= 1;
                if self.skip == 0 {
                    self.state = State::Text;
                }
                Ok(())
            }
        }
    }

    fn scan_text<S: EventSink>(&mut self, ch: u8, pos: Position, sink: &mut S) -> Result<(), S::Error> {
        match ch {
            b'\r' | b'\n' => {}
            b'\\' => {
                self.mark = pos;
                self.state = State::Escape;
            }
            b'{' => {
                self.flush_text(sink)?;
                self.depth += 1;
                self.emit(Event::GroupStart, pos, sink)?;
            }
            b'}' => {
                self.flush_text(sink)?;
                self.depth -= 1;
                self.emit(Event::GroupEnd, pos, sink)?;
            }
            _ => self.push_text(ch, pos),
        }
        Ok(())
    }

    fn scan_escape<S: EventSink>(&mut self, ch: u8, pos: Position, sink: &mut S) -> Result<(), S::Error> {
        match ch {
            b'\\' | b'{' | b'}' => {
                self.push_text(ch, self.mark);
                self.state = State::Text;
                Ok(())
            }
            _ => {
                self.state = State::Symbol;
                self.scan_symbol(ch, pos, sink)
            }
        }
    }

    fn scan_symbol<S: EventSink>(&mut self, ch: u8, pos: Position, sink: &mut S) -> Result<(), S::Error> {
        match ch {
            b'*' => {
                self.state = State::Text;
                self.flush_text(sink)?;
                self.emit(Event::Ignorable, self.mark, sink)?;
            }
            b':' => {
                self.state = State::Text;
                return Err(LexerError::UnimplementedConstruct(Construct::IndexSubentry, self.mark).into());
            }
            b'|' => {
                self.state = State::Text;
                return Err(LexerError::UnimplementedConstruct(Construct::Formula, self.mark).into());
            }
            // Non-breaking hyphen, non-breaking space, optional hyphen
            b'_' => self.push_symbol(b'_'),
            b'~' => self.push_symbol(b' '),
            b'-' => self.push_symbol(b'-'),
            b'\'' => {
                self.hex_len = 0;
                self.state = State::Hex;
            }
            b'\r' | b'\n' => {
                self.state = State::Text;
                self.flush_text(sink)?;
                self.emit(Event::ParagraphEnd, self.mark, sink)?;
            }
            _ => {
                self.state = State::Keyword;
                return self.scan_keyword(ch, pos, sink);
            }
        }
        Ok(())
    }

    fn scan_hex<S: EventSink>(&mut self, ch: u8, pos: Position, sink: &mut S) -> Result<(), S::Error> {
        if !ch.is_ascii_hexdigit() {
            self.state = State::Text;
            self.hex_len = 0;
            return Err(LexerError::InvalidHexDigit(ch as char, pos).into());
        }
        self.hex[self.hex_len] = ch;
        self.hex_len += 1;
        if self.hex_len == 2 {
            self.hex_len = 0;
            self.state = State::Text;
            self.flush_text(sink)?;
            self.emit(Event::HexChar(self.hex), self.mark, sink)?;
        }
        Ok(())
    }

    fn scan_keyword<S: EventSink>(&mut self, ch: u8, pos: Position, sink: &mut S) -> Result<(), S::Error> {
        if ch == b' ' {
            self.state = State::Text;
            self.emit_keyword(sink)
        } else if ch == b'-' || ch.is_ascii_digit() {
            self.state = State::KeywordParam;
            self.param.push(ch as char);
            Ok(())
        } else if ch.is_ascii_alphabetic() {
            self.keyword.push(ch as char);
            Ok(())
        } else {
            self.state = State::Text;
            self.emit_keyword(sink)?;
            self.dispatch(ch, pos, sink)
        }
    }

    fn scan_keyword_param<S: EventSink>(
        &mut self,
        ch: u8,
        pos: Position,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        if ch.is_ascii_digit() {
            self.param.push(ch as char);
            Ok(())
        } else if ch == b' ' || ch == b'?' {
            self.state = State::Text;
            self.emit_keyword(sink)
        } else {
            self.state = State::Text;
            self.emit_keyword(sink)?;
            self.dispatch(ch, pos, sink)
        }
    }

    fn push_text(&mut self, ch: u8, pos: Position) {
        if self.text.is_empty() {
            self.text_start = pos;
        }
        self.text.push(ch);
    }

    fn push_symbol(&mut self, ch: u8) {
        self.push_text(ch, self.mark);
        self.state = State::Text;
    }

    fn flush_text<S: EventSink>(&mut self, sink: &mut S) -> Result<(), S::Error> {
        if self.text.is_empty() {
            return Ok(());
        }
        let bytes = std::mem::take(&mut self.text);
        self.emit(Event::Text(bytes), self.text_start, sink)
    }

    fn emit_keyword<S: EventSink>(&mut self, sink: &mut S) -> Result<(), S::Error> {
        self.flush_text(sink)?;
        let name = std::mem::take(&mut self.keyword);
        let raw = std::mem::take(&mut self.param);
        let pos = self.mark;

        if name.is_empty() {
            return self.emit(Event::Error(LexerError::EmptyKeyword(pos)), pos, sink);
        }
        let param = if raw.is_empty() {
            None
        } else {
            match raw.parse::<i32>() {
                Ok(value) => Some(value),
                Err(_) => {
                    let err = LexerError::InvalidKeywordParameter(name, raw, pos);
                    return self.emit(Event::Error(err), pos, sink);
                }
            }
        };
        self.emit(Event::Keyword { name, param }, pos, sink)
    }

    fn emit<S: EventSink>(&mut self, event: Event, pos: Position, sink: &mut S) -> Result<(), S::Error> {
        trace!(%pos, %event, "emit");
        match sink.accept(event, pos)? {
            Flow::Continue | Flow::SkipBytes(0) => {}
            Flow::SkipBytes(count) => {
                self.skip = count;
                self.state = State::Binary;
            }
        }
        Ok(())
    }
}

// Convenience function for tokenizing a complete input
/// # Errors
/// The first fatal lexer error.
pub fn tokenize(input: &[u8]) -> Result<Vec<Token>, LexerError> {
    let mut scanner = Scanner::new();
    let mut tokens = Vec::new();
    for &ch in input {
        scanner.feed(ch, &mut tokens)?;
    }
    scanner.finish(&mut tokens)?;
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::hex_value;

    fn events(input: &str) -> Vec<Event> {
        events_of(input.as_bytes())
    }

    fn events_of(input: &[u8]) -> Vec<Event> {
        tokenize(input)
            .expect("tokenize failed")
            .into_iter()
            .map(|token| token.event)
            .collect()
    }

    #[test]
    fn plain_text_is_one_event() {
        assert_eq!(events("Hello, world"), vec![Event::text("Hello, world")]);
    }

    #[test]
    fn bare_line_breaks_are_dropped() {
        assert_eq!(events("one\r\ntwo\nthree"), vec![Event::text("onetwothree")]);
    }

    #[test]
    fn groups_flush_pending_text() {
        assert_eq!(
            events("a{b}c"),
            vec![
                Event::text("a"),
                Event::GroupStart,
                Event::text("b"),
                Event::GroupEnd,
                Event::text("c"),
            ]
        );
    }

    #[test]
    fn escaped_literals_join_surrounding_text() {
        assert_eq!(events(r"a\\b\{c\}d"), vec![Event::text(r"a\b{c}d")]);
    }

    #[test]
    fn keyword_with_and_without_parameter() {
        assert_eq!(
            events(r"\rtf1 \b text\fs-24\par"),
            vec![
                Event::keyword("rtf", Some(1)),
                Event::keyword("b", None),
                Event::text("text"),
                Event::keyword("fs", Some(-24)),
                Event::keyword("par", None),
            ]
        );
    }

    #[test]
    fn keyword_terminator_is_redispatched() {
        assert_eq!(
            events(r"\rtf1{\b}"),
            vec![
                Event::keyword("rtf", Some(1)),
                Event::GroupStart,
                Event::keyword("b", None),
                Event::GroupEnd,
            ]
        );
        assert_eq!(
            events(r"\i;x"),
            vec![Event::keyword("i", None), Event::text(";x")]
        );
    }

    #[test]
    fn question_mark_ends_parameter() {
        assert_eq!(
            events(r"\u8364?x"),
            vec![Event::keyword("u", Some(8364)), Event::text("x")]
        );
    }

    #[test]
    fn symbols() {
        assert_eq!(events(r"a\~b\_c\-d"), vec![Event::text("a b_c-d")]);
        assert_eq!(
            events("x{\\*\\generator}"),
            vec![
                Event::text("x"),
                Event::GroupStart,
                Event::Ignorable,
                Event::keyword("generator", None),
                Event::GroupEnd,
            ]
        );
        assert_eq!(
            events("a\\\r\nb"),
            vec![Event::text("a"), Event::ParagraphEnd, Event::text("b")]
        );
    }

    #[test]
    fn hex_escape() {
        assert_eq!(
            events(r"caf\'e9!"),
            vec![Event::text("caf"), Event::HexChar(*b"e9"), Event::text("!")]
        );
        assert_eq!(hex_value(*b"e9"), Some(0xe9));
        assert_eq!(hex_value(*b"0A"), Some(0x0a));
    }

    #[test]
    fn invalid_hex_digit_is_fatal() {
        for input in [r"\'g0", r"\'0z"] {
            match tokenize(input.as_bytes()) {
                Err(LexerError::InvalidHexDigit(..)) => {}
                other => panic!("expected InvalidHexDigit for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn unimplemented_constructs_are_fatal() {
        assert!(matches!(
            tokenize(br"\|"),
            Err(LexerError::UnimplementedConstruct(Construct::Formula, _))
        ));
        assert!(matches!(
            tokenize(br"\:"),
            Err(LexerError::UnimplementedConstruct(Construct::IndexSubentry, _))
        ));
    }

    #[test]
    fn empty_keyword_is_recoverable() {
        let got = events(r"a\ b");
        assert!(matches!(got[1], Event::Error(LexerError::EmptyKeyword(_))));
        assert_eq!(got[0], Event::text("a"));
        assert_eq!(got[2], Event::text("b"));
    }

    #[test]
    fn invalid_parameter_is_recoverable() {
        let got = events(r"\fs99999999999 x");
        assert!(matches!(
            &got[0],
            Event::Error(LexerError::InvalidKeywordParameter(name, raw, _))
                if name == "fs" && raw == "99999999999"
        ));
        assert_eq!(got[1], Event::text("x"));

        let got = events(r"\f- x");
        assert!(matches!(&got[0], Event::Error(LexerError::InvalidKeywordParameter(..))));
    }

    #[test]
    fn pending_keyword_is_emitted_at_end() {
        assert_eq!(events(r"x\par"), vec![Event::text("x"), Event::keyword("par", None)]);
    }

    #[test]
    fn unfinished_hex_at_end_is_fatal() {
        assert!(matches!(tokenize(br"\'4"), Err(LexerError::UnexpectedEof(_))));
    }

    #[test]
    fn depth_tracks_groups() {
        let mut scanner = Scanner::new();
        let mut tokens = Vec::new();
        for &ch in b"{{}{" {
            scanner.feed(ch, &mut tokens).unwrap();
        }
        assert_eq!(scanner.depth(), 2);
    }

    #[test]
    fn positions_follow_lines() {
        let tokens = tokenize(b"{\n\\b x}").unwrap();
        assert_eq!(tokens[0].pos, Position::new(1, 1));
        assert_eq!(tokens[1].pos, Position::new(2, 1));
        assert_eq!(tokens[2].pos, Position::new(2, 4));
    }

    struct SkipAfterBin(Vec<Event>);

    impl EventSink for SkipAfterBin {
        type Error = LexerError;

        fn accept(&mut self, event: Event, _pos: Position) -> Result<Flow, LexerError> {
            let flow = match &event {
                Event::Keyword { name, param: Some(n) } if name == "bin" => {
                    Flow::SkipBytes(*n as usize)
                }
                _ => Flow::Continue,
            };
            self.0.push(event);
            Ok(flow)
        }
    }

    #[test]
    fn sink_can_skip_raw_bytes() {
        let mut scanner = Scanner::new();
        let mut sink = SkipAfterBin(Vec::new());
        for &ch in br"a\bin3 {}\b\bin2}{x" {
            scanner.feed(ch, &mut sink).unwrap();
        }
        scanner.finish(&mut sink).unwrap();
        assert_eq!(
            sink.0,
            vec![
                Event::text("a"),
                Event::keyword("bin", Some(3)),
                Event::text("b"),
                Event::keyword("bin", Some(2)),
                Event::text("x"),
            ]
        );
    }

    #[test]
    fn binary_keyword_at_end_is_fatal() {
        for input in [&br"a\bin5"[..], &br"a\bin5 "[..]] {
            let mut scanner = Scanner::new();
            let mut sink = SkipAfterBin(Vec::new());
            for &ch in input {
                scanner.feed(ch, &mut sink).unwrap();
            }
            assert!(
                matches!(scanner.finish(&mut sink), Err(LexerError::UnexpectedEof(_))),
                "expected UnexpectedEof for {input:?}"
            );
        }

        // A zero-length block has nothing left to read.
        let mut scanner = Scanner::new();
        let mut sink = SkipAfterBin(Vec::new());
        for &ch in br"a\bin0" {
            scanner.feed(ch, &mut sink).unwrap();
        }
        assert!(scanner.finish(&mut sink).is_ok());
    }

    #[test]
    fn text_keeps_raw_bytes() {
        assert_eq!(
            events_of(b"caf\xe9 \x92"),
            vec![Event::Text(vec![b'c', b'a', b'f', 0xe9, b' ', 0x92])]
        );
    }
}
