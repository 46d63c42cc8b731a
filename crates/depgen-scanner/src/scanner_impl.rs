//! Scanner implementation.
//!
//! `ScannerState` produces one significant token per `scan()` call. Whitespace,
//! comments and preprocessor lines are trivia and never surface as tokens.
//! String literals of every flavor (regular, verbatim, interpolated, raw) are
//! consumed whole, so a `{` or `}` inside a string never unbalances the brace
//! counting the parser does when it skips method bodies.

use crate::SyntaxKind;
use crate::char_codes::{
    is_identifier_part, is_identifier_start, is_line_break, is_white_space_single_line,
};
use depgen_common::Span;
use depgen_common::diagnostics::diagnostic_codes;
use std::sync::Arc;

/// A lexical error found while scanning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerDiagnostic {
    pub code: u32,
    pub span: Span,
}

/// Saved scanner position for speculative lookahead.
#[derive(Clone, Debug)]
pub struct ScannerSnapshot {
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    token_value: String,
    preceding_line_break: bool,
    diagnostic_count: usize,
}

/// Tokenizer state machine over a shared source text.
pub struct ScannerState {
    source: Arc<str>,
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    /// Decoded token value: identifier text without `@`, unescaped string contents.
    token_value: String,
    preceding_line_break: bool,
    diagnostics: Vec<ScannerDiagnostic>,
}

impl ScannerState {
    #[must_use]
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            pos: 0,
            token: SyntaxKind::Unknown,
            token_start: 0,
            token_value: String::new(),
            preceding_line_break: false,
            diagnostics: Vec::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    #[must_use]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    #[must_use]
    pub fn token_start(&self) -> u32 {
        self.token_start as u32
    }

    #[must_use]
    pub fn token_end(&self) -> u32 {
        self.pos as u32
    }

    #[must_use]
    pub fn token_span(&self) -> Span {
        Span::new(self.token_start as u32, self.pos as u32)
    }

    /// Raw source text of the current token.
    #[must_use]
    pub fn token_text(&self) -> &str {
        &self.source[self.token_start..self.pos]
    }

    #[must_use]
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    #[must_use]
    pub fn has_preceding_line_break(&self) -> bool {
        self.preceding_line_break
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[ScannerDiagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<ScannerDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // =========================================================================
    // Lookahead
    // =========================================================================

    #[must_use]
    pub fn save_state(&self) -> ScannerSnapshot {
        ScannerSnapshot {
            pos: self.pos,
            token: self.token,
            token_start: self.token_start,
            token_value: self.token_value.clone(),
            preceding_line_break: self.preceding_line_break,
            diagnostic_count: self.diagnostics.len(),
        }
    }

    /// Rewind to a snapshot. Diagnostics reported after the snapshot are dropped
    /// so that a rescan does not report them twice.
    pub fn restore_state(&mut self, snapshot: ScannerSnapshot) {
        self.pos = snapshot.pos;
        self.token = snapshot.token;
        self.token_start = snapshot.token_start;
        self.token_value = snapshot.token_value;
        self.preceding_line_break = snapshot.preceding_line_break;
        self.diagnostics.truncate(snapshot.diagnostic_count);
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    pub fn scan(&mut self) -> SyntaxKind {
        self.preceding_line_break = false;
        self.token_value.clear();
        self.skip_trivia();
        self.token_start = self.pos;

        let Some(ch) = self.peek() else {
            self.token = SyntaxKind::EndOfFileToken;
            return self.token;
        };

        self.token = match ch {
            '{' => self.single(SyntaxKind::OpenBraceToken),
            '}' => self.single(SyntaxKind::CloseBraceToken),
            '(' => self.single(SyntaxKind::OpenParenToken),
            ')' => self.single(SyntaxKind::CloseParenToken),
            '[' => self.single(SyntaxKind::OpenBracketToken),
            ']' => self.single(SyntaxKind::CloseBracketToken),
            '<' => self.single(SyntaxKind::LessThanToken),
            '>' => self.single(SyntaxKind::GreaterThanToken),
            ',' => self.single(SyntaxKind::CommaToken),
            ';' => self.single(SyntaxKind::SemicolonToken),
            '*' => self.single(SyntaxKind::AsteriskToken),
            '.' => {
                if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number()
                } else {
                    self.single(SyntaxKind::DotToken)
                }
            }
            '=' => match self.peek_at(1) {
                Some('>') => {
                    self.pos += 2;
                    SyntaxKind::EqualsGreaterThanToken
                }
                Some('=') => {
                    self.pos += 2;
                    SyntaxKind::OperatorToken
                }
                _ => self.single(SyntaxKind::EqualsToken),
            },
            ':' => {
                if self.peek_at(1) == Some(':') {
                    self.pos += 2;
                    SyntaxKind::ColonColonToken
                } else {
                    self.single(SyntaxKind::ColonToken)
                }
            }
            '?' => {
                if self.peek_at(1) == Some('?') {
                    self.pos += 2;
                    SyntaxKind::OperatorToken
                } else {
                    self.single(SyntaxKind::QuestionToken)
                }
            }
            '"' => self.scan_string_token(0, false),
            '\'' => self.scan_character_literal(),
            '@' => match self.peek_at(1) {
                Some('"') => {
                    self.pos += 1;
                    self.scan_verbatim_string(false)
                }
                Some('$') if self.peek_at(2) == Some('"') => {
                    self.pos += 2;
                    self.scan_verbatim_string(true)
                }
                Some(c) if is_identifier_start(c) => {
                    self.pos += 1;
                    self.scan_identifier(true)
                }
                _ => self.single(SyntaxKind::Unknown),
            },
            '$' => self.scan_dollar_string(),
            '0'..='9' => self.scan_number(),
            '+' | '-' | '/' | '%' | '&' | '|' | '^' | '!' | '~' => {
                self.single(SyntaxKind::OperatorToken)
            }
            c if is_identifier_start(c) => self.scan_identifier(false),
            c => {
                self.pos += c.len_utf8();
                SyntaxKind::Unknown
            }
        };
        self.token
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    #[inline]
    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(ahead)
    }

    #[inline]
    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    #[inline]
    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        kind
    }

    fn error(&mut self, code: u32, start: usize) {
        self.diagnostics.push(ScannerDiagnostic {
            code,
            span: Span::new(start as u32, self.pos as u32),
        });
    }

    // =========================================================================
    // Trivia
    // =========================================================================

    fn skip_trivia(&mut self) {
        let source = Arc::clone(&self.source);
        let bytes = source.as_bytes();
        let mut at_line_start = self.pos == 0 || self.preceded_by_line_break_only();
        while let Some(ch) = self.peek() {
            if is_line_break(ch) {
                self.pos += ch.len_utf8();
                self.preceding_line_break = true;
                at_line_start = true;
            } else if is_white_space_single_line(ch) {
                self.pos += ch.len_utf8();
            } else if ch == '/' && bytes.get(self.pos + 1) == Some(&b'/') {
                self.skip_to_line_end();
            } else if ch == '/' && bytes.get(self.pos + 1) == Some(&b'*') {
                let start = self.pos;
                match memchr::memmem::find(&bytes[self.pos + 2..], b"*/") {
                    Some(offset) => {
                        let body = &bytes[self.pos + 2..self.pos + 2 + offset];
                        if memchr::memchr2(b'\n', b'\r', body).is_some() {
                            self.preceding_line_break = true;
                        }
                        self.pos += offset + 4;
                        at_line_start = false;
                    }
                    None => {
                        self.pos = bytes.len();
                        self.error(diagnostic_codes::UNTERMINATED_COMMENT, start);
                    }
                }
            } else if ch == '#' && at_line_start {
                // Preprocessor directive: the rest of the line is trivia.
                self.skip_to_line_end();
            } else {
                break;
            }
        }
    }

    /// True when only single-line whitespace separates `pos` from the previous line break.
    fn preceded_by_line_break_only(&self) -> bool {
        for ch in self.source[..self.pos].chars().rev() {
            if is_line_break(ch) {
                return true;
            }
            if !is_white_space_single_line(ch) {
                return false;
            }
        }
        true
    }

    fn skip_to_line_end(&mut self) {
        let bytes = self.source.as_bytes();
        self.pos = match memchr::memchr2(b'\n', b'\r', &bytes[self.pos..]) {
            Some(offset) => self.pos + offset,
            None => bytes.len(),
        };
    }

    // =========================================================================
    // Identifiers and numbers
    // =========================================================================

    fn scan_identifier(&mut self, verbatim: bool) -> SyntaxKind {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !is_identifier_part(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        let text = &self.source[start..self.pos];
        self.token_value.push_str(text);
        if verbatim {
            return SyntaxKind::Identifier;
        }
        SyntaxKind::keyword(text).unwrap_or(SyntaxKind::Identifier)
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let start = self.pos;
        let mut seen_dot = false;
        while let Some(ch) = self.peek() {
            if ch == '.' {
                // `1.Method()` keeps the dot as member access.
                if seen_dot || !self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    break;
                }
                seen_dot = true;
                self.pos += 1;
            } else if ch.is_ascii_alphanumeric() || ch == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.token_value.push_str(&self.source[start..self.pos]);
        SyntaxKind::NumericLiteral
    }

    fn scan_character_literal(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                None => {
                    self.error(diagnostic_codes::UNTERMINATED_STRING_LITERAL, start);
                    break;
                }
                Some(c) if is_line_break(c) => {
                    self.error(diagnostic_codes::UNTERMINATED_STRING_LITERAL, start);
                    break;
                }
                Some('\'') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    self.pos += 1;
                    if let Some(escaped) = self.scan_escape() {
                        self.token_value.push(escaped);
                    }
                }
                Some(c) => {
                    self.pos += c.len_utf8();
                    self.token_value.push(c);
                }
            }
        }
        SyntaxKind::CharacterLiteral
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// `$"..."`, `$@"..."`, `$"""..."""`, `$$"""..."""`.
    fn scan_dollar_string(&mut self) -> SyntaxKind {
        let mut dollars = 0;
        while self.peek_at(dollars) == Some('$') {
            dollars += 1;
        }
        match self.peek_at(dollars) {
            Some('"') => {
                self.pos += dollars;
                self.scan_string_token(dollars, true)
            }
            Some('@') if dollars == 1 && self.peek_at(2) == Some('"') => {
                self.pos += 2;
                self.scan_verbatim_string(true)
            }
            _ => self.single(SyntaxKind::Unknown),
        }
    }

    /// Scan a string starting at a `"`. Dispatches to raw strings on `"""`.
    fn scan_string_token(&mut self, dollars: usize, interpolated: bool) -> SyntaxKind {
        let start = self.token_start;
        let quotes = self.count_run('"');
        if quotes >= 3 {
            self.pos += quotes;
            if !self.scan_raw_string_body(quotes, dollars) {
                self.error(diagnostic_codes::UNTERMINATED_STRING_LITERAL, start);
            }
            return SyntaxKind::StringLiteral;
        }
        self.pos += 1;
        if quotes == 2 {
            // Empty string.
            self.pos += 1;
            return SyntaxKind::StringLiteral;
        }
        if !self.scan_regular_string_body(interpolated) {
            self.error(diagnostic_codes::UNTERMINATED_STRING_LITERAL, start);
        }
        SyntaxKind::StringLiteral
    }

    /// Body of `"..."` or `$"..."`, positioned after the opening quote.
    /// Returns false when the line or file ends first.
    fn scan_regular_string_body(&mut self, interpolated: bool) -> bool {
        loop {
            match self.peek() {
                None => return false,
                Some(c) if is_line_break(c) => return false,
                Some('"') => {
                    self.pos += 1;
                    return true;
                }
                Some('\\') => {
                    self.pos += 1;
                    if let Some(escaped) = self.scan_escape() {
                        self.token_value.push(escaped);
                    }
                }
                Some('{') if interpolated => {
                    if self.peek_at(1) == Some('{') {
                        self.pos += 2;
                        self.token_value.push('{');
                    } else {
                        self.pos += 1;
                        if !self.skip_interpolation_hole(1) {
                            return false;
                        }
                    }
                }
                Some('}') if interpolated && self.peek_at(1) == Some('}') => {
                    self.pos += 2;
                    self.token_value.push('}');
                }
                Some(c) => {
                    self.pos += c.len_utf8();
                    self.token_value.push(c);
                }
            }
        }
    }

    /// `@"..."` or `@$"..."`, positioned at the opening quote.
    fn scan_verbatim_string(&mut self, interpolated: bool) -> SyntaxKind {
        let start = self.token_start;
        self.pos += 1;
        loop {
            match self.peek() {
                None => {
                    self.error(diagnostic_codes::UNTERMINATED_STRING_LITERAL, start);
                    break;
                }
                Some('"') => {
                    if self.peek_at(1) == Some('"') {
                        self.pos += 2;
                        self.token_value.push('"');
                    } else {
                        self.pos += 1;
                        break;
                    }
                }
                Some('{') if interpolated => {
                    if self.peek_at(1) == Some('{') {
                        self.pos += 2;
                        self.token_value.push('{');
                    } else {
                        self.pos += 1;
                        if !self.skip_interpolation_hole(1) {
                            self.error(diagnostic_codes::UNTERMINATED_STRING_LITERAL, start);
                            break;
                        }
                    }
                }
                Some('}') if interpolated && self.peek_at(1) == Some('}') => {
                    self.pos += 2;
                    self.token_value.push('}');
                }
                Some(c) => {
                    self.pos += c.len_utf8();
                    self.token_value.push(c);
                }
            }
        }
        SyntaxKind::StringLiteral
    }

    /// Raw string body after `quotes` opening quotes. A run of exactly
    /// `quotes` closing quotes ends the literal. With `dollars > 0`, a run of
    /// at least `dollars` braces opens an interpolation hole.
    fn scan_raw_string_body(&mut self, quotes: usize, dollars: usize) -> bool {
        loop {
            match self.peek() {
                None => return false,
                Some('"') => {
                    let run = self.count_run('"');
                    self.pos += run;
                    if run >= quotes {
                        return true;
                    }
                    self.token_value.extend(std::iter::repeat_n('"', run));
                }
                Some('{') if dollars > 0 => {
                    let run = self.count_run('{');
                    if run >= dollars {
                        let literal = run - dollars;
                        self.token_value.extend(std::iter::repeat_n('{', literal));
                        self.pos += run;
                        if !self.skip_interpolation_hole(dollars) {
                            return false;
                        }
                    } else {
                        self.pos += run;
                        self.token_value.extend(std::iter::repeat_n('{', run));
                    }
                }
                Some(c) => {
                    self.pos += c.len_utf8();
                    self.token_value.push(c);
                }
            }
        }
    }

    /// Skip an interpolation hole, positioned after its opening brace(s).
    /// Consumes the closing `closers` braces. Nested strings are scanned
    /// recursively. A top-level `:` starts a format specifier that runs to `}`.
    fn skip_interpolation_hole(&mut self, closers: usize) -> bool {
        let saved_value = std::mem::take(&mut self.token_value);
        let mut depth = 0usize;
        let ok = loop {
            match self.peek() {
                None => break false,
                Some('(' | '[' | '{') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(')' | ']') => {
                    depth = depth.saturating_sub(1);
                    self.pos += 1;
                }
                Some('}') => {
                    if depth == 0 {
                        let run = self.count_run('}').min(closers);
                        self.pos += run;
                        break true;
                    }
                    depth -= 1;
                    self.pos += 1;
                }
                Some(':') if depth == 0 && self.peek_at(1) != Some(':') => {
                    while let Some(c) = self.peek() {
                        if c == '}' || is_line_break(c) {
                            break;
                        }
                        self.pos += c.len_utf8();
                    }
                }
                Some('"') => {
                    let start = self.pos;
                    let quotes = self.count_run('"');
                    let ok = if quotes >= 3 {
                        self.pos += quotes;
                        self.scan_raw_string_body(quotes, 0)
                    } else if quotes == 2 {
                        self.pos += 2;
                        true
                    } else {
                        self.pos += 1;
                        self.scan_regular_string_body(false)
                    };
                    if !ok {
                        self.error(diagnostic_codes::UNTERMINATED_STRING_LITERAL, start);
                        break false;
                    }
                }
                Some('$') => {
                    let mut dollars = 0;
                    while self.peek_at(dollars) == Some('$') {
                        dollars += 1;
                    }
                    self.pos += dollars;
                    match self.peek() {
                        Some('"') => {
                            let quotes = self.count_run('"');
                            let ok = if quotes >= 3 {
                                self.pos += quotes;
                                self.scan_raw_string_body(quotes, dollars)
                            } else {
                                self.pos += 1;
                                self.scan_regular_string_body(true)
                            };
                            if !ok {
                                break false;
                            }
                        }
                        Some('@') => {
                            self.pos += 1;
                            if !self.skip_verbatim_body_in_hole() {
                                break false;
                            }
                        }
                        _ => {}
                    }
                }
                Some('@') if self.peek_at(1) == Some('"') => {
                    self.pos += 1;
                    if !self.skip_verbatim_body_in_hole() {
                        break false;
                    }
                }
                Some('\'') => {
                    self.scan_character_literal();
                }
                Some(c) => {
                    self.pos += c.len_utf8();
                }
            }
        };
        self.token_value = saved_value;
        ok
    }

    fn skip_verbatim_body_in_hole(&mut self) -> bool {
        // Positioned at the opening quote.
        self.pos += 1;
        loop {
            match self.peek() {
                None => return false,
                Some('"') if self.peek_at(1) == Some('"') => self.pos += 2,
                Some('"') => {
                    self.pos += 1;
                    return true;
                }
                Some(c) => self.pos += c.len_utf8(),
            }
        }
    }

    /// Decode one escape sequence after the backslash.
    fn scan_escape(&mut self) -> Option<char> {
        let ch = self.bump()?;
        Some(match ch {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            'u' => return self.scan_hex_escape(4),
            'x' => return self.scan_hex_escape(4),
            'U' => return self.scan_hex_escape(8),
            other => other,
        })
    }

    fn scan_hex_escape(&mut self, max_digits: usize) -> Option<char> {
        let start = self.pos;
        let mut digits = 0;
        while digits < max_digits && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
            digits += 1;
        }
        u32::from_str_radix(&self.source[start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
    }

    fn count_run(&self, ch: char) -> usize {
        self.source[self.pos..]
            .chars()
            .take_while(|&c| c == ch)
            .count()
    }
}
