//! Boundary cases called out in the testable-properties section: empty
//! input, whitespace-only input, and pathological nesting depth.

use djotters::ast::parse;

#[test]
fn empty_document_yields_empty_forest() {
    assert!(parse("").is_empty());
}

#[test]
fn whitespace_only_document_yields_empty_forest() {
    assert!(parse("   \n\t\n   \n").is_empty());
}

#[test]
fn deep_emphasis_nesting_terminates_without_overflow() {
    let stars = "*".repeat(100);
    let document = format!("{stars}word{stars}");
    let forest = parse(&document);
    assert!(!forest.is_empty());
    let rendered = djotters::parse_to_html(&document);
    assert!(rendered.contains("word"));
}
