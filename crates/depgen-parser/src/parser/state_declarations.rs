//! Parser state - namespace, using and type declaration parsing.

use super::state::ParserState;
use crate::ast::{
    Attribute, Ident, MemberDecl, Modifiers, NamespaceBody, NamespaceDecl, TypeDecl, TypeDeclKind,
    UsingDirective, UsingKind,
};
use depgen_common::Span;
use depgen_common::diagnostics::diagnostic_codes;
use depgen_common::limits::MAX_DECLARATION_NESTING;
use depgen_scanner::SyntaxKind;
use smallvec::SmallVec;

impl ParserState {
    /// `using A.B;`, `using static A.B;`, `using X = A.B;` (after an optional `global`).
    pub(crate) fn parse_using_directive(&mut self, global: bool) -> Option<UsingDirective> {
        let start = self.token_pos();
        self.next_token(); // using

        let mut kind = UsingKind::Namespace;
        if self.parse_optional(SyntaxKind::StaticKeyword) {
            kind = UsingKind::Static;
        } else if self.is_token(SyntaxKind::Identifier)
            && self.peek_kind() == SyntaxKind::EqualsToken
        {
            let alias = self.parse_identifier()?;
            self.next_token(); // =
            kind = UsingKind::Alias(alias);
        }

        let Some(target) = self.parse_type() else {
            self.resync_to_member_boundary();
            return None;
        };
        self.parse_expected(SyntaxKind::SemicolonToken, ";");
        Some(UsingDirective {
            kind,
            global,
            target,
            span: Span::new(start, self.previous_end),
        })
    }

    pub(crate) fn parse_namespace_declaration(&mut self) -> NamespaceDecl {
        let start = self.token_pos();
        self.next_token(); // namespace

        let mut name = Vec::new();
        if let Some(first) = self.parse_identifier() {
            name.push(first);
            while self.parse_optional(SyntaxKind::DotToken) {
                match self.parse_identifier() {
                    Some(segment) => name.push(segment),
                    None => break,
                }
            }
        }

        if self.parse_optional(SyntaxKind::SemicolonToken) {
            // File-scoped: the rest of the file belongs to this namespace.
            let body = self.parse_namespace_body(false);
            return NamespaceDecl {
                name,
                file_scoped: true,
                body,
                span: Span::new(start, self.previous_end),
            };
        }

        let body = if self.parse_expected(SyntaxKind::OpenBraceToken, "{") {
            let body = self.parse_namespace_body(true);
            self.parse_expected(SyntaxKind::CloseBraceToken, "}");
            body
        } else {
            self.resync_to_member_boundary();
            NamespaceBody::default()
        };
        self.parse_optional(SyntaxKind::SemicolonToken);

        NamespaceDecl {
            name,
            file_scoped: false,
            body,
            span: Span::new(start, self.previous_end),
        }
    }

    /// Parse attributes + modifiers + a type declaration at namespace level.
    /// Anything that isn't a type declaration is reported and skipped.
    pub(crate) fn parse_type_declaration_or_skip(&mut self) -> Option<TypeDecl> {
        let start = self.token_pos();
        let attributes = self.parse_attribute_lists();
        let modifiers = self.parse_modifiers();

        if self.at_type_declaration_keyword() {
            return self.parse_type_declaration(start, attributes, modifiers);
        }
        if attributes.iter().all(|a| {
            a.target
                .as_ref()
                .is_some_and(|t| t.text == "assembly" || t.text == "module")
        }) && modifiers.is_empty()
            && !attributes.is_empty()
        {
            // Assembly-level attributes stand alone.
            return None;
        }

        self.error_unexpected();
        self.resync_to_member_boundary();
        None
    }

    pub(crate) fn at_type_declaration_keyword(&mut self) -> bool {
        if self.token().is_type_declaration_keyword() {
            return true;
        }
        if self.is_contextual("record") {
            let next = self.peek_kind();
            return matches!(
                next,
                SyntaxKind::Identifier | SyntaxKind::ClassKeyword | SyntaxKind::StructKeyword
            );
        }
        false
    }

    /// Parse modifiers, including contextual ones (`partial`, `async`, ...)
    /// when they are followed by another word.
    pub(crate) fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        loop {
            let flag = match self.token() {
                SyntaxKind::PublicKeyword => Modifiers::PUBLIC,
                SyntaxKind::PrivateKeyword => Modifiers::PRIVATE,
                SyntaxKind::ProtectedKeyword => Modifiers::PROTECTED,
                SyntaxKind::InternalKeyword => Modifiers::INTERNAL,
                SyntaxKind::StaticKeyword => Modifiers::STATIC,
                SyntaxKind::ReadonlyKeyword => Modifiers::READONLY,
                SyntaxKind::AbstractKeyword => Modifiers::ABSTRACT,
                SyntaxKind::SealedKeyword => Modifiers::SEALED,
                SyntaxKind::VirtualKeyword => Modifiers::VIRTUAL,
                SyntaxKind::OverrideKeyword => Modifiers::OVERRIDE,
                SyntaxKind::ExternKeyword => Modifiers::EXTERN,
                SyntaxKind::NewKeyword => Modifiers::NEW,
                SyntaxKind::ConstKeyword => Modifiers::CONST,
                SyntaxKind::VolatileKeyword => Modifiers::VOLATILE,
                SyntaxKind::UnsafeKeyword => Modifiers::UNSAFE,
                SyntaxKind::Identifier => {
                    let Some(flag) = Modifiers::from_contextual(self.token_value()) else {
                        return modifiers;
                    };
                    let next = self.peek_kind();
                    let followed_by_word = next == SyntaxKind::Identifier
                        || next.is_modifier()
                        || next.is_type_declaration_keyword()
                        || next.is_predefined_type();
                    if !followed_by_word {
                        return modifiers;
                    }
                    flag
                }
                _ => return modifiers,
            };
            modifiers |= flag;
            self.next_token();
        }
    }

    /// Parse a class/interface/struct/enum/delegate after its attributes and
    /// modifiers. `start` is the position of the first attribute or modifier.
    pub(crate) fn parse_type_declaration(
        &mut self,
        start: u32,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
    ) -> Option<TypeDecl> {
        let mut is_record = false;
        if self.is_contextual("record") {
            is_record = true;
            self.next_token();
        }
        let kind = match self.token() {
            SyntaxKind::ClassKeyword => TypeDeclKind::Class,
            SyntaxKind::InterfaceKeyword => TypeDeclKind::Interface,
            SyntaxKind::StructKeyword => TypeDeclKind::Struct,
            SyntaxKind::EnumKeyword => TypeDeclKind::Enum,
            SyntaxKind::DelegateKeyword => TypeDeclKind::Delegate,
            _ if is_record => TypeDeclKind::Class,
            _ => {
                self.error_expected("class");
                self.resync_to_member_boundary();
                return None;
            }
        };
        if !(is_record && self.is_token(SyntaxKind::Identifier)) {
            self.next_token();
        }

        if kind == TypeDeclKind::Delegate {
            return self.parse_delegate_declaration(start, attributes, modifiers);
        }

        let Some(name) = self.parse_identifier() else {
            self.resync_to_member_boundary();
            return None;
        };
        let type_parameters = self.parse_type_parameter_list();

        if is_record && self.is_token(SyntaxKind::OpenParenToken) {
            // Positional record parameters.
            self.skip_balanced(SyntaxKind::OpenParenToken, SyntaxKind::CloseParenToken);
        }

        let mut base_list = Vec::new();
        if self.parse_optional(SyntaxKind::ColonToken) {
            loop {
                match self.parse_type() {
                    Some(ty) => base_list.push(ty),
                    None => break,
                }
                if is_record && self.is_token(SyntaxKind::OpenParenToken) {
                    // Base record constructor arguments.
                    self.skip_balanced(SyntaxKind::OpenParenToken, SyntaxKind::CloseParenToken);
                }
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }
        self.skip_constraint_clauses();

        let mut decl = TypeDecl {
            kind,
            is_record,
            name,
            type_parameters,
            modifiers,
            attributes,
            base_list,
            members: Vec::new(),
            nested: Vec::new(),
            span: Span::at(start),
        };

        if kind == TypeDeclKind::Enum {
            if self.is_token(SyntaxKind::OpenBraceToken) {
                self.skip_balanced(SyntaxKind::OpenBraceToken, SyntaxKind::CloseBraceToken);
            } else {
                self.parse_expected(SyntaxKind::OpenBraceToken, "{");
            }
        } else if is_record && self.is_token(SyntaxKind::SemicolonToken) {
            self.next_token();
        } else if self.is_token(SyntaxKind::OpenBraceToken) {
            if self.declaration_depth >= MAX_DECLARATION_NESTING {
                let span = self.token_span();
                self.error_at(span, diagnostic_codes::DECLARATION_NESTING_TOO_DEEP, &[]);
                self.skip_balanced(SyntaxKind::OpenBraceToken, SyntaxKind::CloseBraceToken);
            } else {
                self.next_token();
                self.declaration_depth += 1;
                self.parse_type_members(&mut decl);
                self.declaration_depth -= 1;
                self.parse_expected(SyntaxKind::CloseBraceToken, "}");
            }
        } else {
            self.parse_expected(SyntaxKind::OpenBraceToken, "{");
            self.resync_to_member_boundary();
        }
        self.parse_optional(SyntaxKind::SemicolonToken);

        decl.span = Span::new(start, self.previous_end);
        Some(decl)
    }

    fn parse_delegate_declaration(
        &mut self,
        start: u32,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
    ) -> Option<TypeDecl> {
        self.parse_type()?;
        let name = self.parse_identifier()?;
        let type_parameters = self.parse_type_parameter_list();
        self.skip_expression(&[SyntaxKind::SemicolonToken]);
        self.parse_expected(SyntaxKind::SemicolonToken, ";");
        Some(TypeDecl {
            kind: TypeDeclKind::Delegate,
            is_record: false,
            name,
            type_parameters,
            modifiers,
            attributes,
            base_list: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
            span: Span::new(start, self.previous_end),
        })
    }

    /// `<T, in U, [Attr] out V>`
    pub(crate) fn parse_type_parameter_list(&mut self) -> SmallVec<[Ident; 2]> {
        let mut params = SmallVec::new();
        if !self.parse_optional(SyntaxKind::LessThanToken) {
            return params;
        }
        loop {
            self.parse_attribute_lists();
            if self.is_token(SyntaxKind::InKeyword) || self.is_token(SyntaxKind::OutKeyword) {
                self.next_token();
            }
            match self.parse_identifier() {
                Some(ident) => params.push(ident),
                None => break,
            }
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::GreaterThanToken, ">");
        params
    }

    /// `where T : class, new()` clauses are irrelevant to the engine.
    pub(crate) fn skip_constraint_clauses(&mut self) {
        while self.is_contextual("where") {
            self.next_token();
            loop {
                match self.token() {
                    SyntaxKind::OpenBraceToken
                    | SyntaxKind::SemicolonToken
                    | SyntaxKind::EqualsGreaterThanToken
                    | SyntaxKind::EndOfFileToken => return,
                    SyntaxKind::OpenParenToken => {
                        self.skip_balanced(SyntaxKind::OpenParenToken, SyntaxKind::CloseParenToken)
                    }
                    SyntaxKind::Identifier if self.is_contextual("where") => break,
                    _ => {
                        self.next_token();
                    }
                }
            }
        }
    }

    /// Members of a class, struct, or interface body, up to the closing `}`.
    pub(crate) fn parse_type_members(&mut self, decl: &mut TypeDecl) {
        loop {
            let pos_before = self.token_pos();
            match self.token() {
                SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken => return,
                SyntaxKind::SemicolonToken => {
                    self.next_token();
                    continue;
                }
                _ => {}
            }

            let start = self.token_pos();
            let attributes = self.parse_attribute_lists();
            let modifiers = self.parse_modifiers();

            if self.at_type_declaration_keyword() {
                if let Some(nested) = self.parse_type_declaration(start, attributes, modifiers) {
                    decl.nested.push(nested);
                }
            } else {
                let members: Vec<MemberDecl> =
                    self.parse_member(start, &decl.name.text, attributes, modifiers);
                decl.members.extend(members);
            }

            if self.token_pos() == pos_before {
                self.error_unexpected();
                self.next_token();
            }
        }
    }
}
