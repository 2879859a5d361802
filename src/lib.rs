//! RTF Text Reader
//!
//! Converts RTF documents to plain text with a byte-at-a-time scanner feeding
//! a scope-aware interpreter.

pub mod codepage;
pub mod document;
pub mod interpreter;
pub mod lexer;
pub mod symbol;

pub use document::*;
pub use interpreter::*;
pub use lexer::*;
pub use symbol::*;
