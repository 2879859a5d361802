//! Codepage decoders that can be handed to the interpreter.
//!
//! The interpreter only knows the codepage number recorded by `\ansicpg`;
//! mapping bytes to characters is left to these collaborators.

use crate::interpreter::CodepageDecoder;

/// Treats every byte as ISO-8859-1, whatever the declared codepage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latin1;

impl CodepageDecoder for Latin1 {
    fn decode(&self, _codepage: i32, byte: u8) -> Option<char> {
        Some(char::from(byte))
    }
}

/// Windows-1252 ("ANSI") for documents declaring `\ansicpg1252`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Windows1252;

pub const WINDOWS_1252: i32 = 1252;

// 0x80..=0x9F; the rest of the codepage matches ISO-8859-1.
const WINDOWS_1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

impl CodepageDecoder for Windows1252 {
    fn decode(&self, codepage: i32, byte: u8) -> Option<char> {
        if codepage != WINDOWS_1252 {
            return None;
        }
        match byte {
            0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(byte - 0x80)],
            _ => Some(char::from(byte)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_1252_high_range() {
        let decoder = Windows1252;
        assert_eq!(decoder.decode(1252, 0x80), Some('€'));
        assert_eq!(decoder.decode(1252, 0x92), Some('\u{2019}'));
        assert_eq!(decoder.decode(1252, 0x9F), Some('Ÿ'));
        assert_eq!(decoder.decode(1252, 0x81), None);
        assert_eq!(decoder.decode(1252, 0xE9), Some('é'));
        assert_eq!(decoder.decode(1251, 0x80), None);
    }

    #[test]
    fn latin1_ignores_codepage() {
        assert_eq!(Latin1.decode(1251, 0xE9), Some('é'));
        assert_eq!(Latin1.decode(0, 0x41), Some('A'));
    }
}
