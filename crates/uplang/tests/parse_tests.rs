//! Parse cases from tests/fixtures/parse_cases.json, checked through the
//! JSON view of each document.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use uplang::{document_to_json, parse, ParseError, UpError};

#[derive(Debug, Deserialize)]
struct TestSuite {
    description: String,
    tests: Vec<TestCase>,
}

#[derive(Debug, Deserialize)]
struct TestCase {
    name: String,
    source: String,
    #[serde(default)]
    expected: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_test_suite(filename: &str) -> TestSuite {
    let path = fixtures_dir().join(filename);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("Failed to parse {filename}: {e}"))
}

fn error_kind(e: &UpError) -> &'static str {
    match e {
        UpError::ParseError(ParseError::Syntax { .. }) => "Syntax",
        UpError::ParseError(ParseError::Directive { .. }) => "Directive",
        UpError::ParseError(ParseError::TooDeep { .. }) => "TooDeep",
        UpError::ParseError(ParseError::Io { .. }) => "Io",
        _ => "Other",
    }
}

fn run_test_case(case: &TestCase) {
    let result = parse(&case.source);

    if let Some(expected) = &case.expected {
        match result {
            Ok(doc) => assert_eq!(
                &document_to_json(&doc),
                expected,
                "Test '{}' produced the wrong document",
                case.name
            ),
            Err(e) => panic!("Test '{}' should succeed, but got error: {e:?}", case.name),
        }
    } else if let Some(kind) = &case.error {
        match result {
            Ok(doc) => panic!(
                "Test '{}' should fail with {kind}, but parsed {}",
                case.name,
                document_to_json(&doc)
            ),
            Err(e) => assert_eq!(
                error_kind(&e),
                kind,
                "Test '{}' failed with the wrong error: {e:?}",
                case.name
            ),
        }
    } else {
        panic!("Test '{}' has neither expected nor error", case.name);
    }
}

#[test]
fn test_parse_cases() {
    let suite = load_test_suite("parse_cases.json");
    for case in &suite.tests {
        run_test_case(case);
    }
    eprintln!("{}: {} tests passed", suite.description, suite.tests.len());
}

#[test]
fn test_parse_errors_carry_line_numbers() {
    match parse("name a\nserver {\nhost b") {
        Err(UpError::ParseError(e)) => assert_eq!(e.line(), 2),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_depth_limit() {
    let parser = uplang::Parser::new().with_max_depth(2);
    assert!(parser.parse_str("a {\nb {\nc 1\n}\n}").is_ok());
    assert!(matches!(
        parser.parse_str("a {\nb {\nc {\nd 1\n}\n}\n}"),
        Err(ParseError::TooDeep { max_depth: 2, .. })
    ));
}
