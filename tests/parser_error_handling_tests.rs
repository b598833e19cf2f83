use apexfmt::error::FormatError;
use apexfmt::{format_source, parse, parse_expression, ConfigError, RenderConfig};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_missing_semicolon_reports_location() {
    let source = "public class A {\n    Integer x = 1\n}";
    let error = parse(source).unwrap_err();

    // Points at the token that should have been `;`
    assert_eq!((error.span.line, error.span.column), (3, 1));
    assert!(error.message.contains("expected `;`"));
    assert!(error.message.contains("found `}`"));
}

#[test]
fn test_truncated_source_reports_end_of_input() {
    let error = parse("public class A { void run() {").unwrap_err();
    assert!(error.message.contains("end of input"));
}

#[test]
fn test_trailing_tokens_are_rejected() {
    let error = parse("public class A {} public class B {}").unwrap_err();
    assert!(error.message.starts_with("expected end of input"));
}

#[test]
fn test_reserved_word_is_not_an_identifier() {
    assert!(parse("public class A { Integer while = 1; }").is_err());
    assert!(parse_expression("return").is_err());
}

#[test]
fn test_unbalanced_generics() {
    assert!(parse("public class A { List<String x; }").is_err());
}

#[test]
fn test_format_source_wraps_parse_errors() {
    let result = format_source("class", &RenderConfig::default());
    assert!(matches!(result, Err(FormatError::Parse(_))));
}

#[test]
fn test_invalid_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{"chain_threshold": "two"}"#).unwrap();

    let error = RenderConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(error, ConfigError::Invalid { .. }));
    assert!(error.to_string().starts_with("invalid config file"));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let error = RenderConfig::from_file(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(error, ConfigError::Io { .. }));
}
