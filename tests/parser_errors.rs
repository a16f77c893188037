// Error reporting: messages must name the offending token with its file,
// row, and column, or say that input ended early.
use libconfig::{loads, ConfigError};

fn error_message(source: &str) -> String {
    match loads(source) {
        Ok(config) => panic!("expected an error, parsed {config:?}"),
        Err(err) => err.to_string(),
    }
}

#[test]
fn test_bad_lexical_input_names_position_and_context() {
    let message = error_message("a = 1;\n  %broken");
    assert!(message.contains("<string>"), "got: {message}");
    assert!(message.contains("row 2"), "got: {message}");
    assert!(message.contains("column 3"), "got: {message}");
    assert!(message.contains("%broken"), "got: {message}");
}

#[test]
fn test_missing_separator() {
    let message = error_message("a 1;");
    assert!(message.contains("unexpected token"), "got: {message}");
    assert!(message.contains("\"1\""), "got: {message}");
    assert!(message.contains("':' or '='"), "got: {message}");
}

#[test]
fn test_unexpected_end_of_input() {
    let message = error_message("a = {");
    assert!(message.contains("unexpected end of input"), "got: {message}");
}

#[test]
fn test_value_expected() {
    let message = error_message("a = ;");
    assert!(message.contains("expected a value"), "got: {message}");
}

#[test]
fn test_trailing_garbage_after_configuration() {
    let message = error_message("a = 1; ]");
    assert!(message.contains("expected end of input"), "got: {message}");
}

#[test]
fn test_error_is_a_parse_error() {
    assert!(matches!(
        loads("a = ["),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_integer_overflow_is_reported() {
    let message = error_message("a = 123456789123456789123456789;");
    assert!(message.contains("integer out of range"), "got: {message}");
}
