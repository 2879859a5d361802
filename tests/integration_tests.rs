use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

use rtfread_rust::codepage::Windows1252;
use rtfread_rust::lexer::{tokenize, Event, LexerError};
use rtfread_rust::{convert_bytes, convert_file, Converter, InterpreterError};

/// Helper function to convert a fixture document and load its expected text
fn convert_fixture(name: &str) -> Result<(String, String), String> {
    let source_path = format!("tests/documents/{name}.rtf");
    let expected_path = format!("tests/documents/{name}.txt");

    let text = convert_file(&source_path)
        .map_err(|e| format!("Conversion of {source_path} failed: {e}"))?;
    let expected = fs::read_to_string(&expected_path)
        .map_err(|e| format!("Failed to read expected text {expected_path}: {e}"))?;

    Ok((text, expected))
}

#[test]
fn test_hello_document() {
    let (text, expected) = convert_fixture("hello").expect("Failed to convert hello.rtf");
    assert_eq!(text, expected);
}

#[test]
fn test_special_characters_document() {
    let (text, expected) = convert_fixture("special").expect("Failed to convert special.rtf");
    assert_eq!(text, expected);
}

#[test]
fn test_paragraph_breaks_document() {
    let (text, expected) =
        convert_fixture("paragraphs").expect("Failed to convert paragraphs.rtf");
    assert_eq!(text, expected);
}

#[test]
fn test_convert_from_temp_file() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(br"{\rtf1{\stylesheet{\s0 Normal;}}From disk\par}")
        .expect("Failed to write temp file");

    let text = convert_file(file.path()).expect("Failed to convert temp file");
    assert_eq!(text, "From disk\n");
}

#[test]
fn test_missing_file_is_io_error() {
    let result = convert_file("tests/documents/does-not-exist.rtf");
    assert!(matches!(result, Err(InterpreterError::Io(_))), "got {result:?}");
}

#[test]
fn test_plain_text_round_trips() {
    let input = "Just some words, with punctuation: ;.,!?";
    assert_eq!(convert_bytes(input.as_bytes()).unwrap(), input);
}

#[test]
fn test_par_always_yields_one_newline() {
    for input in [r"{\rtf1 a\par b}", r"{\rtf1 a\par  b}", "{\\rtf1 a\\par\r\nb}", r"{\rtf1 a\par}"] {
        let text = convert_bytes(input.as_bytes()).unwrap();
        assert_eq!(
            text.matches('\n').count(),
            1,
            "expected one newline for {input:?}, got {text:?}"
        );
    }
}

#[test]
fn test_skip_destination_hides_everything() {
    let input = br"{\rtf1 a{\fonttbl b{\f1 c\par}{\*\panose d}\u8364 e\'41}z}";
    assert_eq!(convert_bytes(input).unwrap(), "az");
}

#[test]
fn test_unicode_negative_parameter() {
    let text = convert_bytes(br"{\rtf1 \u-42?}").unwrap();
    assert_eq!(text.chars().map(|c| c as u32).collect::<Vec<_>>(), vec![65494]);
}

#[test]
fn test_invalid_hex_digit_fails() {
    for input in [&br"{\rtf1 \'x1}"[..], &br"{\rtf1 \'1x}"[..]] {
        let result = convert_bytes(input);
        assert!(
            matches!(
                result,
                Err(InterpreterError::LexerError(LexerError::InvalidHexDigit(..)))
            ),
            "got {result:?}"
        );
    }
}

#[test]
fn test_unmatched_group_end_fails() {
    let result = convert_bytes(br"{\rtf1 text}}");
    assert!(matches!(result, Err(InterpreterError::StackUnderflow(_))), "got {result:?}");
}

#[test]
fn test_unimplemented_escapes_fail() {
    for input in [&br"{\rtf1 \|}"[..], &br"{\rtf1 \:}"[..]] {
        let result = convert_bytes(input);
        assert!(
            matches!(
                result,
                Err(InterpreterError::LexerError(LexerError::UnimplementedConstruct(..)))
            ),
            "got {result:?}"
        );
    }
}

#[test]
fn test_recoverable_errors_are_reported() {
    let conversion = Converter::new()
        .convert_bytes(br"{\rtf1 a\ b\fs123456789012 c}")
        .expect("Recoverable errors must not abort");
    assert_eq!(conversion.text, "abc");
    assert_eq!(conversion.diagnostics.len(), 2);
}

#[test]
fn test_windows_1252_decoder() {
    let conversion = Converter::new()
        .with_decoder(Box::new(Windows1252))
        .convert_bytes(br"{\rtf1\ansi\ansicpg1252 It\'92s \'80 5}")
        .unwrap();
    assert_eq!(conversion.text, "It\u{2019}s \u{20ac} 5");
}

#[test]
fn test_raw_8bit_text_uses_codepage_decoder() {
    let input = b"{\\rtf1\\ansi\\ansicpg1252 It\x92s caf\xe9}";
    let conversion = Converter::new()
        .with_decoder(Box::new(Windows1252))
        .convert_bytes(input)
        .unwrap();
    assert_eq!(conversion.text, "It\u{2019}s caf\u{e9}");

    // Without a decoder the bytes cannot be interpreted.
    assert_eq!(convert_bytes(input).unwrap(), "It\u{fffd}s caf\u{fffd}");
}

#[test]
fn test_unicode_needs_16_bit_code_unit() {
    let conversion = Converter::new()
        .convert_bytes(br"{\rtf1 a\u?b}")
        .unwrap();
    assert_eq!(conversion.text, "a?b");
    assert_eq!(conversion.diagnostics.len(), 1);

    let conversion = Converter::new()
        .convert_bytes(br"{\rtf1 \u70000?}")
        .unwrap();
    assert_eq!(conversion.text, "");
    assert_eq!(conversion.diagnostics.len(), 1);
}

#[test]
fn test_binary_block_cut_short_fails() {
    for input in [&br"{\rtf1 a\bin5"[..], &br"{\rtf1 a\bin5 "[..], &br"{\rtf1 a\bin5 xy"[..]] {
        let result = convert_bytes(input);
        assert!(
            matches!(
                result,
                Err(InterpreterError::LexerError(LexerError::UnexpectedEof(_)))
            ),
            "got {result:?}"
        );
    }
}

#[test]
fn test_unclosed_group_keeps_text() {
    let conversion = Converter::new()
        .convert_bytes(br"{\rtf1 unfinished")
        .unwrap();
    assert_eq!(conversion.text, "unfinished");
    assert_eq!(conversion.diagnostics.len(), 1);
}

#[test]
fn test_tokenize_fixture_balances_groups() {
    let input = fs::read("tests/documents/hello.rtf").expect("Failed to read hello.rtf");
    let tokens = tokenize(&input).expect("Failed to tokenize hello.rtf");

    let starts = tokens.iter().filter(|t| t.event == Event::GroupStart).count();
    let ends = tokens.iter().filter(|t| t.event == Event::GroupEnd).count();
    assert_eq!(starts, ends);
    assert!(starts > 0);
}
