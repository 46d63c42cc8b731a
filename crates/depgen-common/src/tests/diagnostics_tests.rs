use crate::diagnostics::*;
use crate::span::Span;
use std::collections::HashSet;

#[test]
fn test_format_message_fills_placeholders() {
    let text = format_message(
        diagnostic_messages::LOADER_PARAMETER_BY_REFERENCE,
        &["audio", "load"],
    );
    assert_eq!(
        text,
        "Parameter 'audio' of dependency loader method 'load' cannot be passed by reference."
    );
}

#[test]
fn test_from_code_uses_table_category() {
    let diag = Diagnostic::from_code(
        diagnostic_codes::RESOLVED_MEMBER_OF_OWN_TYPE,
        "a.cs",
        Span::new(10, 14),
        &["self"],
    );
    assert_eq!(diag.category, DiagnosticCategory::Warning);
    assert_eq!(diag.start, 10);
    assert_eq!(diag.length, 4);
    assert!(!diag.is_error());

    let diag = Diagnostic::from_code(
        diagnostic_codes::MEMBER_RESOLVED_AND_CACHED,
        "a.cs",
        Span::new(0, 1),
        &["x"],
    );
    assert!(diag.is_error());
    assert_eq!(
        diag.message_text,
        "Member 'x' cannot be both resolved and cached."
    );
}

#[test]
fn test_codes_are_unique_and_rendered_with_prefix() {
    let mut seen = HashSet::new();
    for message in DIAGNOSTIC_MESSAGES {
        assert!(seen.insert(message.code), "duplicate code {}", message.code);
    }
    assert_eq!(format_code(101), "DG0101");
    assert_eq!(format_code(2001), "DG2001");
}

#[test]
fn test_with_related_appends_message_entry() {
    let diag = Diagnostic::from_code(
        diagnostic_codes::DUPLICATE_MEMBER,
        "b.cs",
        Span::new(3, 8),
        &["value", "Game.Thing"],
    )
    .with_related("a.cs", Span::new(20, 25), "Previous declaration.".to_string());

    assert_eq!(diag.related_information.len(), 1);
    assert_eq!(diag.related_information[0].file, "a.cs");
    assert_eq!(
        diag.related_information[0].category,
        DiagnosticCategory::Message
    );
}
