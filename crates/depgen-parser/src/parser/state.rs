//! Parser state - token cursor, diagnostics and error recovery helpers.

use crate::ast::{FileId, NamespaceBody, SourceFile};
use depgen_common::diagnostics::diagnostic_codes;
use depgen_common::limits::MAX_PARSE_DIAGNOSTICS_PER_FILE;
use depgen_common::{Diagnostic, Span};
use depgen_scanner::{ScannerState, SyntaxKind};
use std::sync::Arc;

/// Recursive-descent parser over one source file.
pub struct ParserState {
    pub(crate) scanner: ScannerState,
    pub(crate) file_id: FileId,
    pub(crate) file_name: Arc<str>,
    pub(crate) current_token: SyntaxKind,
    pub(crate) diagnostics: Vec<Diagnostic>,
    /// Start of the last reported error; suppresses cascades at one position.
    pub(crate) last_error_pos: Option<u32>,
    /// End of the previously consumed token.
    pub(crate) previous_end: u32,
    pub(crate) declaration_depth: usize,
}

impl ParserState {
    #[must_use]
    pub fn new(file_id: FileId, file_name: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> Self {
        Self {
            scanner: ScannerState::new(text),
            file_id,
            file_name: file_name.into(),
            current_token: SyntaxKind::Unknown,
            diagnostics: Vec::new(),
            last_error_pos: None,
            previous_end: 0,
            declaration_depth: 0,
        }
    }

    /// Parse the whole file. Never fails: syntax errors become diagnostics and
    /// the parser resynchronizes at the next declaration or member.
    #[tracing::instrument(level = "trace", skip(self), fields(file = %self.file_name))]
    pub fn parse_source_file(mut self) -> SourceFile {
        self.next_token();
        let body = self.parse_namespace_body(false);

        let mut diagnostics = std::mem::take(&mut self.diagnostics);
        for diag in self.scanner.take_diagnostics() {
            diagnostics.push(Diagnostic::from_code(
                diag.code,
                &self.file_name,
                diag.span,
                &[],
            ));
        }
        diagnostics.sort_by_key(|d| d.start);
        diagnostics.truncate(MAX_PARSE_DIAGNOSTICS_PER_FILE);

        SourceFile {
            id: self.file_id,
            file_name: self.file_name,
            text: Arc::clone(self.scanner.source()),
            body,
            diagnostics,
        }
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    #[inline]
    pub(crate) fn token(&self) -> SyntaxKind {
        self.current_token
    }

    #[inline]
    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.current_token == kind
    }

    #[inline]
    pub(crate) fn token_pos(&self) -> u32 {
        self.scanner.token_start()
    }

    #[inline]
    pub(crate) fn token_span(&self) -> Span {
        self.scanner.token_span()
    }

    pub(crate) fn token_value(&self) -> &str {
        self.scanner.token_value()
    }

    pub(crate) fn next_token(&mut self) -> SyntaxKind {
        self.previous_end = self.scanner.token_end();
        self.current_token = self.scanner.scan();
        self.current_token
    }

    /// Identifier whose text is `text` (contextual keywords).
    pub(crate) fn is_contextual(&self, text: &str) -> bool {
        self.is_token(SyntaxKind::Identifier) && self.token_value() == text
    }

    /// Consume `kind` if present.
    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report `'<text>' expected.`
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind, text: &str) -> bool {
        if self.parse_optional(kind) {
            return true;
        }
        self.error_expected(text);
        false
    }

    /// Run `f` speculatively and rewind afterwards.
    pub(crate) fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let snapshot = self.scanner.save_state();
        let current = self.current_token;
        let previous_end = self.previous_end;
        let diagnostic_count = self.diagnostics.len();
        let last_error_pos = self.last_error_pos;

        let result = f(self);

        self.scanner.restore_state(snapshot);
        self.current_token = current;
        self.previous_end = previous_end;
        self.diagnostics.truncate(diagnostic_count);
        self.last_error_pos = last_error_pos;
        result
    }

    /// Run `f` and keep its progress when it returns `Some`; rewind otherwise.
    pub(crate) fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let snapshot = self.scanner.save_state();
        let current = self.current_token;
        let previous_end = self.previous_end;
        let diagnostic_count = self.diagnostics.len();
        let last_error_pos = self.last_error_pos;

        let result = f(self);
        if result.is_none() {
            self.scanner.restore_state(snapshot);
            self.current_token = current;
            self.previous_end = previous_end;
            self.diagnostics.truncate(diagnostic_count);
            self.last_error_pos = last_error_pos;
        }
        result
    }

    /// Token kind after the current one.
    pub(crate) fn peek_kind(&mut self) -> SyntaxKind {
        self.look_ahead(|p| p.next_token())
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn error_at(&mut self, span: Span, code: u32, args: &[&str]) {
        if self.last_error_pos == Some(span.start) {
            return;
        }
        self.last_error_pos = Some(span.start);
        let diagnostic = Diagnostic::from_code(code, &self.file_name, span, args);
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn error_expected(&mut self, text: &str) {
        let span = if self.is_token(SyntaxKind::EndOfFileToken) {
            Span::at(self.previous_end)
        } else {
            self.token_span()
        };
        self.error_at(span, diagnostic_codes::TOKEN_EXPECTED, &[text]);
    }

    pub(crate) fn error_unexpected(&mut self) {
        let span = self.token_span();
        let text = self.scanner.token_text().to_string();
        self.error_at(span, diagnostic_codes::UNEXPECTED_TOKEN, &[text.as_str()]);
    }

    // =========================================================================
    // Skipping and recovery
    // =========================================================================

    /// Skip a balanced `open ... close` group starting at the current token.
    /// String literals are single tokens, so braces inside them never count.
    pub(crate) fn skip_balanced(&mut self, open: SyntaxKind, close: SyntaxKind) {
        debug_assert!(self.is_token(open));
        let mut depth = 0usize;
        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken => {
                    let text = match close {
                        SyntaxKind::CloseBraceToken => "}",
                        SyntaxKind::CloseParenToken => ")",
                        SyntaxKind::CloseBracketToken => "]",
                        _ => ">",
                    };
                    self.error_expected(text);
                    return;
                }
                kind if kind == open => depth += 1,
                kind if kind == close => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.next_token();
                        return;
                    }
                }
                _ => {}
            }
            self.next_token();
        }
    }

    /// Skip an expression up to (not including) one of `stops` at nesting depth
    /// zero. Parenthesized, bracketed and braced groups are skipped whole.
    pub(crate) fn skip_expression(&mut self, stops: &[SyntaxKind]) {
        loop {
            let kind = self.token();
            if kind == SyntaxKind::EndOfFileToken || stops.contains(&kind) {
                return;
            }
            match kind {
                SyntaxKind::OpenParenToken => {
                    self.skip_balanced(SyntaxKind::OpenParenToken, SyntaxKind::CloseParenToken)
                }
                SyntaxKind::OpenBracketToken => self
                    .skip_balanced(SyntaxKind::OpenBracketToken, SyntaxKind::CloseBracketToken),
                SyntaxKind::OpenBraceToken => {
                    self.skip_balanced(SyntaxKind::OpenBraceToken, SyntaxKind::CloseBraceToken)
                }
                // An unmatched closer ends the expression; the caller reports it.
                SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBracketToken
                | SyntaxKind::CloseBraceToken => return,
                _ => {
                    self.next_token();
                }
            }
        }
    }

    /// Skip a member body: `{ ... }`, `=> expr;`, or `;`.
    pub(crate) fn skip_body(&mut self) {
        match self.token() {
            SyntaxKind::OpenBraceToken => {
                self.skip_balanced(SyntaxKind::OpenBraceToken, SyntaxKind::CloseBraceToken)
            }
            SyntaxKind::EqualsGreaterThanToken => {
                self.next_token();
                self.skip_expression(&[SyntaxKind::SemicolonToken]);
                self.parse_expected(SyntaxKind::SemicolonToken, ";");
            }
            _ => {
                self.parse_expected(SyntaxKind::SemicolonToken, ";");
            }
        }
    }

    /// Resynchronize after a malformed member or declaration: stop after a
    /// `;` or a balanced `{ ... }`, or before a `}` that closes the container.
    pub(crate) fn resync_to_member_boundary(&mut self) {
        let start = self.token_pos();
        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken | SyntaxKind::CloseBraceToken => return,
                SyntaxKind::SemicolonToken => {
                    self.next_token();
                    return;
                }
                SyntaxKind::OpenBraceToken => {
                    self.skip_balanced(SyntaxKind::OpenBraceToken, SyntaxKind::CloseBraceToken);
                    return;
                }
                SyntaxKind::OpenBracketToken if self.token_pos() != start => {
                    // Probably the attribute list of the next member.
                    return;
                }
                kind if self.token_pos() != start
                    && (kind.is_modifier() || kind.is_type_declaration_keyword()) =>
                {
                    return;
                }
                _ => {
                    self.next_token();
                }
            }
        }
    }

    // =========================================================================
    // Namespaces and usings
    // =========================================================================

    /// Parse usings and members until `}` (when `in_block`) or end of file.
    pub(crate) fn parse_namespace_body(&mut self, in_block: bool) -> NamespaceBody {
        let mut body = NamespaceBody::default();
        loop {
            let pos_before = self.token_pos();
            match self.token() {
                SyntaxKind::EndOfFileToken => return body,
                SyntaxKind::CloseBraceToken => {
                    if in_block {
                        return body;
                    }
                    self.error_unexpected();
                    self.next_token();
                }
                SyntaxKind::SemicolonToken => {
                    self.next_token();
                }
                SyntaxKind::ExternKeyword
                    if self.look_ahead(|p| {
                        p.next_token();
                        p.is_contextual("alias")
                    }) =>
                {
                    self.skip_expression(&[SyntaxKind::SemicolonToken]);
                    self.parse_optional(SyntaxKind::SemicolonToken);
                }
                SyntaxKind::UsingKeyword => {
                    if let Some(using) = self.parse_using_directive(false) {
                        body.usings.push(using);
                    }
                }
                SyntaxKind::Identifier
                    if self.is_contextual("global")
                        && self.peek_kind() == SyntaxKind::UsingKeyword =>
                {
                    self.next_token();
                    if let Some(using) = self.parse_using_directive(true) {
                        body.usings.push(using);
                    }
                }
                SyntaxKind::NamespaceKeyword => {
                    let ns = self.parse_namespace_declaration();
                    body.members.push(crate::ast::NamespaceMember::Namespace(ns));
                }
                _ => {
                    if let Some(decl) = self.parse_type_declaration_or_skip() {
                        body.members.push(crate::ast::NamespaceMember::Type(decl));
                    }
                }
            }
            if self.token_pos() == pos_before && !self.is_token(SyntaxKind::EndOfFileToken) {
                // Guarantee progress.
                if self.is_token(SyntaxKind::CloseBraceToken) && in_block {
                    return body;
                }
                self.next_token();
            }
        }
    }
}
