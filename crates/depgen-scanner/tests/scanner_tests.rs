use depgen_common::diagnostics::diagnostic_codes;
use depgen_scanner::{ScannerState, SyntaxKind};

fn kinds(source: &str) -> Vec<SyntaxKind> {
    let mut scanner = ScannerState::new(source);
    let mut out = Vec::new();
    loop {
        let kind = scanner.scan();
        if kind == SyntaxKind::EndOfFileToken {
            return out;
        }
        out.push(kind);
    }
}

#[test]
fn test_scan_empty() {
    let mut scanner = ScannerState::new("");
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
}

#[test]
fn test_scan_class_header() {
    assert_eq!(
        kinds("public partial class Player : Drawable, IDependencyInjectionCandidate {}"),
        vec![
            SyntaxKind::PublicKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::ClassKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::ColonToken,
            SyntaxKind::Identifier,
            SyntaxKind::CommaToken,
            SyntaxKind::Identifier,
            SyntaxKind::OpenBraceToken,
            SyntaxKind::CloseBraceToken,
        ]
    );
}

#[test]
fn test_contextual_keywords_are_identifiers() {
    let mut scanner = ScannerState::new("partial get set init global where");
    for expected in ["partial", "get", "set", "init", "global", "where"] {
        assert_eq!(scanner.scan(), SyntaxKind::Identifier);
        assert_eq!(scanner.token_value(), expected);
    }
}

#[test]
fn test_punctuation_pairs() {
    assert_eq!(
        kinds("global::A => x == y ?? z ? ="),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::ColonColonToken,
            SyntaxKind::Identifier,
            SyntaxKind::EqualsGreaterThanToken,
            SyntaxKind::Identifier,
            SyntaxKind::OperatorToken,
            SyntaxKind::Identifier,
            SyntaxKind::OperatorToken,
            SyntaxKind::Identifier,
            SyntaxKind::QuestionToken,
            SyntaxKind::EqualsToken,
        ]
    );
}

#[test]
fn test_nested_generic_closers_are_separate_tokens() {
    assert_eq!(
        kinds("List<List<int>>"),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::LessThanToken,
            SyntaxKind::Identifier,
            SyntaxKind::LessThanToken,
            SyntaxKind::IntKeyword,
            SyntaxKind::GreaterThanToken,
            SyntaxKind::GreaterThanToken,
        ]
    );
}

#[test]
fn test_verbatim_identifier_is_never_keyword() {
    let mut scanner = ScannerState::new("@class");
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.token_value(), "class");
    assert_eq!(scanner.token_text(), "@class");
}

#[test]
fn test_comments_and_preprocessor_are_trivia() {
    let source = "#if DEBUG\n// line comment {\n/* block { */ class\n  #endregion\nA";
    let mut scanner = ScannerState::new(source);
    assert_eq!(scanner.scan(), SyntaxKind::ClassKeyword);
    assert!(scanner.has_preceding_line_break());
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.token_value(), "A");
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
    assert!(scanner.diagnostics().is_empty());
}

#[test]
fn test_hash_mid_line_is_not_preprocessor() {
    assert_eq!(
        kinds("a # b"),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::Unknown,
            SyntaxKind::Identifier
        ]
    );
}

#[test]
fn test_string_value_is_unescaped() {
    let mut scanner = ScannerState::new(r#""a\"b\n" "" @"c""d""#);
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert_eq!(scanner.token_value(), "a\"b\n");
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert_eq!(scanner.token_value(), "");
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert_eq!(scanner.token_value(), "c\"d");
}

#[test]
fn test_braces_inside_strings_do_not_leak() {
    let source = r#"{ var s = "}"; var t = $"{x} }} {{ {(y ? "}" : "{")}"; var c = '}'; }"#;
    let braces: Vec<_> = kinds(source)
        .into_iter()
        .filter(|k| matches!(k, SyntaxKind::OpenBraceToken | SyntaxKind::CloseBraceToken))
        .collect();
    assert_eq!(
        braces,
        vec![SyntaxKind::OpenBraceToken, SyntaxKind::CloseBraceToken]
    );
}

#[test]
fn test_interpolation_format_specifier() {
    assert_eq!(
        kinds(r#"$"{value:N2}" ;"#),
        vec![SyntaxKind::StringLiteral, SyntaxKind::SemicolonToken]
    );
}

#[test]
fn test_verbatim_interpolated_spans_lines() {
    let source = "$@\"line {a}\n}} next\" ;";
    assert_eq!(
        kinds(source),
        vec![SyntaxKind::StringLiteral, SyntaxKind::SemicolonToken]
    );
}

#[test]
fn test_raw_string_literals() {
    let source = "\"\"\"\n  { \"quoted\" }\n  \"\"\" ;";
    let mut scanner = ScannerState::new(source);
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert!(scanner.token_value().contains("\"quoted\""));
    assert_eq!(scanner.scan(), SyntaxKind::SemicolonToken);

    let interpolated = "$$\"\"\"{ {{value}} }\"\"\" }";
    assert_eq!(
        kinds(interpolated),
        vec![SyntaxKind::StringLiteral, SyntaxKind::CloseBraceToken]
    );
}

#[test]
fn test_unterminated_string_reports_and_stops_at_line_end() {
    let mut scanner = ScannerState::new("\"abc\nclass");
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert_eq!(scanner.scan(), SyntaxKind::ClassKeyword);
    let diagnostics = scanner.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].code,
        diagnostic_codes::UNTERMINATED_STRING_LITERAL
    );
    assert_eq!(diagnostics[0].span.start, 0);
}

#[test]
fn test_unterminated_comment() {
    let mut scanner = ScannerState::new("class /* never closed");
    assert_eq!(scanner.scan(), SyntaxKind::ClassKeyword);
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
    assert_eq!(
        scanner.diagnostics()[0].code,
        diagnostic_codes::UNTERMINATED_COMMENT
    );
}

#[test]
fn test_multi_line_block_comment_counts_as_line_break() {
    let source = "a /* one\ntwo */ b /* same line */ c\n#pragma warning disable\n// tail";
    let mut scanner = ScannerState::new(source);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.token_value(), "b");
    assert!(scanner.has_preceding_line_break());
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.token_value(), "c");
    assert!(!scanner.has_preceding_line_break());
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
    assert!(scanner.diagnostics().is_empty());
    assert_eq!(&**scanner.source(), source);
}

#[test]
fn test_numbers() {
    let mut scanner = ScannerState::new("1.5f 0x1F 1_000 2.ToString");
    for expected in ["1.5f", "0x1F", "1_000", "2"] {
        assert_eq!(scanner.scan(), SyntaxKind::NumericLiteral);
        assert_eq!(scanner.token_text(), expected);
    }
    assert_eq!(scanner.scan(), SyntaxKind::DotToken);
}

#[test]
fn test_save_and_restore_state() {
    let mut scanner = ScannerState::new("a \"open\nb c");
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    let snapshot = scanner.save_state();

    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.diagnostics().len(), 1);

    scanner.restore_state(snapshot);
    assert_eq!(scanner.token(), SyntaxKind::Identifier);
    assert_eq!(scanner.token_value(), "a");
    assert!(scanner.diagnostics().is_empty());

    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert_eq!(scanner.diagnostics().len(), 1);
}

#[test]
fn test_token_spans_cover_text() {
    let mut scanner = ScannerState::new("  namespace Game;");
    assert_eq!(scanner.scan(), SyntaxKind::NamespaceKeyword);
    assert_eq!(scanner.token_start(), 2);
    assert_eq!(scanner.token_end(), 11);
    assert_eq!(scanner.token_span().len(), 9);
}

#[test]
fn test_character_literals() {
    let mut scanner = ScannerState::new(r"'\'' 'x'");
    assert_eq!(scanner.scan(), SyntaxKind::CharacterLiteral);
    assert_eq!(scanner.token_value(), "'");
    assert_eq!(scanner.scan(), SyntaxKind::CharacterLiteral);
    assert_eq!(scanner.token_value(), "x");
}
