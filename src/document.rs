//! Conversion entry points: feed a byte source through the scanner and
//! interpreter and collect the plain text.

use crate::interpreter::{CodepageDecoder, Conversion, Interpreter, InterpreterError, InterpreterOptions};
use crate::lexer::Scanner;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Bytes processed between two cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Caller-controlled stop signal for a conversion.
///
/// A cancelled conversion returns `InterpreterError::Cancelled` and no text.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl Cancellation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop once `flag` is set.
    #[must_use]
    pub fn with_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.flag = Some(flag);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Configurable conversion of one document.
#[derive(Default)]
pub struct Converter {
    options: InterpreterOptions,
    decoder: Option<Box<dyn CodepageDecoder>>,
    cancellation: Cancellation,
    dispatch: Option<tracing::Dispatch>,
}

impl Converter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(mut self, options: InterpreterOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: Box<dyn CodepageDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Log this conversion to `dispatch` instead of the default subscriber.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Convert everything `reader` yields.
    /// # Errors
    /// Read errors, fatal lexer errors, unmatched group ends and cancellation.
    pub fn convert<R: Read>(mut self, reader: R) -> Result<Conversion, InterpreterError> {
        match self.dispatch.take() {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, || self.run(reader)),
            None => self.run(reader),
        }
    }

    /// # Errors
    /// See [`convert`](Self::convert).
    pub fn convert_bytes(self, input: &[u8]) -> Result<Conversion, InterpreterError> {
        self.convert(input)
    }

    /// # Errors
    /// See [`convert`](Self::convert); also fails if the file cannot be opened.
    pub fn convert_file(self, path: impl AsRef<Path>) -> Result<Conversion, InterpreterError> {
        let file = File::open(path)?;
        self.convert(file)
    }

    fn run<R: Read>(self, reader: R) -> Result<Conversion, InterpreterError> {
        let mut interpreter = Interpreter::with_options(self.options);
        if let Some(decoder) = self.decoder {
            interpreter = interpreter.with_decoder(decoder);
        }
        let mut scanner = Scanner::new();
        debug!(options = ?self.options, "conversion started");

        let mut count = 0usize;
        for byte in BufReader::new(reader).bytes() {
            if count % CANCEL_CHECK_INTERVAL == 0 && self.cancellation.is_cancelled() {
                return Err(InterpreterError::Cancelled(scanner.position()));
            }
            count += 1;
            scanner.feed(byte?, &mut interpreter)?;
        }
        scanner.finish(&mut interpreter)?;

        let conversion = interpreter.finish(scanner.position());
        debug!(
            bytes = count,
            chars = conversion.text.chars().count(),
            diagnostics = conversion.diagnostics.len(),
            "conversion finished"
        );
        Ok(conversion)
    }
}

/// Convert a document with default settings and return its text.
/// # Errors
/// See [`Converter::convert`].
pub fn convert<R: Read>(reader: R) -> Result<String, InterpreterError> {
    Converter::new().convert(reader).map(|conversion| conversion.text)
}

/// # Errors
/// See [`Converter::convert`].
pub fn convert_bytes(input: &[u8]) -> Result<String, InterpreterError> {
    Converter::new().convert_bytes(input).map(|conversion| conversion.text)
}

/// # Errors
/// See [`Converter::convert_file`].
pub fn convert_file(path: impl AsRef<Path>) -> Result<String, InterpreterError> {
    Converter::new().convert_file(path).map(|conversion| conversion.text)
}
