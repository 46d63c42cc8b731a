//! Parser state - class member parsing (fields, properties, methods, constructors).

use super::state::ParserState;
use crate::ast::{
    Accessor, AccessorKind, Attribute, Ident, MemberDecl, MemberKind, Modifiers, NameSegment,
    Parameter, ParameterModifier, TypeSyntax,
};
use depgen_common::Span;
use depgen_scanner::SyntaxKind;
use smallvec::SmallVec;

impl ParserState {
    /// Parse one member declaration. Fields with several declarators produce
    /// one `MemberDecl` per declarator, each carrying the shared attributes.
    pub(crate) fn parse_member(
        &mut self,
        start: u32,
        type_name: &str,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
    ) -> Vec<MemberDecl> {
        // Constructor: `Name(`
        if self.is_token(SyntaxKind::Identifier)
            && self.token_value() == type_name
            && self.peek_kind() == SyntaxKind::OpenParenToken
        {
            return self
                .parse_constructor(start, attributes, modifiers)
                .into_iter()
                .collect();
        }

        // Destructor: `~Name()`
        if self.is_token(SyntaxKind::OperatorToken) && self.scanner.token_text() == "~" {
            self.next_token();
            let name = self.parse_identifier();
            self.skip_parameter_list_and_body();
            return name
                .map(|name| self.other_member(start, name, attributes, modifiers, "destructor"))
                .into_iter()
                .collect();
        }

        if self.is_token(SyntaxKind::EventKeyword) {
            self.next_token();
            self.parse_type();
            let name = self.parse_identifier();
            if self.is_token(SyntaxKind::OpenBraceToken) {
                self.skip_balanced(SyntaxKind::OpenBraceToken, SyntaxKind::CloseBraceToken);
            } else {
                self.skip_expression(&[SyntaxKind::SemicolonToken]);
                self.parse_expected(SyntaxKind::SemicolonToken, ";");
            }
            return name
                .map(|name| self.other_member(start, name, attributes, modifiers, "event"))
                .into_iter()
                .collect();
        }

        // Conversion operators: `implicit operator T(...)`
        if self.is_token(SyntaxKind::ImplicitKeyword) || self.is_token(SyntaxKind::ExplicitKeyword)
        {
            let name = Ident::new("operator", self.token_span());
            self.skip_parameter_list_and_body();
            return vec![self.other_member(start, name, attributes, modifiers, "operator")];
        }

        let Some(ty) = self.parse_type() else {
            self.resync_to_member_boundary();
            return Vec::new();
        };

        match self.token() {
            SyntaxKind::OperatorKeyword => {
                let name = Ident::new("operator", self.token_span());
                self.skip_parameter_list_and_body();
                vec![self.other_member(start, name, attributes, modifiers, "operator")]
            }
            SyntaxKind::ThisKeyword => {
                let name = Ident::new("this", self.token_span());
                self.next_token();
                if self.is_token(SyntaxKind::OpenBracketToken) {
                    self.skip_balanced(
                        SyntaxKind::OpenBracketToken,
                        SyntaxKind::CloseBracketToken,
                    );
                }
                self.skip_body();
                vec![self.other_member(start, name, attributes, modifiers, "indexer")]
            }
            SyntaxKind::Identifier => {
                let (explicit_interface, name) = self.parse_member_name();
                let Some(name) = name else {
                    self.resync_to_member_boundary();
                    return Vec::new();
                };
                match self.token() {
                    SyntaxKind::OpenParenToken | SyntaxKind::LessThanToken => self
                        .parse_method(start, attributes, modifiers, ty, explicit_interface, name)
                        .into_iter()
                        .collect(),
                    SyntaxKind::OpenBraceToken | SyntaxKind::EqualsGreaterThanToken => {
                        vec![self.parse_property(
                            start,
                            attributes,
                            modifiers,
                            ty,
                            explicit_interface,
                            name,
                        )]
                    }
                    SyntaxKind::ThisKeyword => {
                        // Explicit interface indexer: `T IFoo.this[int i]`
                        self.next_token();
                        if self.is_token(SyntaxKind::OpenBracketToken) {
                            self.skip_balanced(
                                SyntaxKind::OpenBracketToken,
                                SyntaxKind::CloseBracketToken,
                            );
                        }
                        self.skip_body();
                        vec![self.other_member(start, name, attributes, modifiers, "indexer")]
                    }
                    _ => self.parse_field_declarators(start, attributes, modifiers, ty, name),
                }
            }
            _ => {
                self.error_expected("identifier");
                self.resync_to_member_boundary();
                Vec::new()
            }
        }
    }

    /// `Name` or `IFoo.Name` / `IFoo<T>.Name` for explicit interface implementations.
    /// For `IFoo.this[...]` the returned name is `this` and the current token
    /// is left on the `this` keyword.
    fn parse_member_name(&mut self) -> (Option<TypeSyntax>, Option<Ident>) {
        let start = self.token_pos();
        let mut segments: SmallVec<[NameSegment; 2]> = SmallVec::new();
        let mut interface_end = start;
        loop {
            let Some(name) = self.parse_identifier() else {
                return (None, None);
            };
            let generic_interface = self.is_token(SyntaxKind::LessThanToken)
                && self.look_ahead(|p| {
                    p.parse_type_argument_list().is_some() && p.is_token(SyntaxKind::DotToken)
                });
            let type_arguments = if generic_interface {
                self.parse_type_argument_list().unwrap_or_default()
            } else {
                Vec::new()
            };
            segments.push(NameSegment {
                name,
                type_arguments,
            });
            if !self.is_token(SyntaxKind::DotToken) {
                break;
            }
            interface_end = self.previous_end;
            self.next_token(); // .
            if self.is_token(SyntaxKind::ThisKeyword) {
                let this = Ident::new("this", self.token_span());
                let interface = TypeSyntax::Named {
                    global: false,
                    alias: None,
                    segments,
                    span: Span::new(start, interface_end),
                };
                return (Some(interface), Some(this));
            }
        }
        let Some(last) = segments.pop() else {
            return (None, None);
        };
        let interface = (!segments.is_empty()).then(|| TypeSyntax::Named {
            global: false,
            alias: None,
            segments,
            span: Span::new(start, interface_end),
        });
        (interface, Some(last.name))
    }

    fn other_member(
        &self,
        start: u32,
        name: Ident,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
        description: &'static str,
    ) -> MemberDecl {
        MemberDecl {
            kind: MemberKind::Other { description },
            name,
            explicit_interface: None,
            modifiers,
            attributes,
            span: Span::new(start, self.previous_end),
        }
    }

    fn skip_parameter_list_and_body(&mut self) {
        self.skip_expression(&[
            SyntaxKind::OpenParenToken,
            SyntaxKind::SemicolonToken,
            SyntaxKind::OpenBraceToken,
        ]);
        if self.is_token(SyntaxKind::OpenParenToken) {
            self.skip_balanced(SyntaxKind::OpenParenToken, SyntaxKind::CloseParenToken);
        }
        self.skip_body();
    }

    fn parse_constructor(
        &mut self,
        start: u32,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
    ) -> Option<MemberDecl> {
        let name = self.parse_identifier()?;
        let parameters = self.parse_parameter_list();
        if self.parse_optional(SyntaxKind::ColonToken) {
            // `: base(...)` / `: this(...)`
            self.skip_expression(&[
                SyntaxKind::OpenBraceToken,
                SyntaxKind::EqualsGreaterThanToken,
                SyntaxKind::SemicolonToken,
            ]);
        }
        self.skip_body();
        Some(MemberDecl {
            kind: MemberKind::Constructor { parameters },
            name,
            explicit_interface: None,
            modifiers,
            attributes,
            span: Span::new(start, self.previous_end),
        })
    }

    fn parse_method(
        &mut self,
        start: u32,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
        return_type: TypeSyntax,
        explicit_interface: Option<TypeSyntax>,
        name: Ident,
    ) -> Option<MemberDecl> {
        let type_parameters = self.parse_type_parameter_list();
        if !self.is_token(SyntaxKind::OpenParenToken) {
            self.error_expected("(");
            self.resync_to_member_boundary();
            return None;
        }
        let parameters = self.parse_parameter_list();
        self.skip_constraint_clauses();
        self.skip_body();
        Some(MemberDecl {
            kind: MemberKind::Method {
                return_type,
                type_parameters,
                parameters,
            },
            name,
            explicit_interface,
            modifiers,
            attributes,
            span: Span::new(start, self.previous_end),
        })
    }

    fn parse_property(
        &mut self,
        start: u32,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
        ty: TypeSyntax,
        explicit_interface: Option<TypeSyntax>,
        name: Ident,
    ) -> MemberDecl {
        let mut accessors = Vec::new();
        if self.is_token(SyntaxKind::EqualsGreaterThanToken) {
            // `T Name => expr;` is a get-only property.
            let span = self.token_span();
            self.skip_body();
            accessors.push(Accessor {
                kind: AccessorKind::Get,
                modifiers: Modifiers::empty(),
                span,
            });
        } else {
            self.next_token(); // {
            while !self.is_token(SyntaxKind::CloseBraceToken)
                && !self.is_token(SyntaxKind::EndOfFileToken)
            {
                let accessor_start = self.token_pos();
                self.parse_attribute_lists();
                let accessor_modifiers = self.parse_modifiers();
                let kind = if self.is_contextual("get") {
                    AccessorKind::Get
                } else if self.is_contextual("set") {
                    AccessorKind::Set
                } else if self.is_contextual("init") {
                    AccessorKind::Init
                } else {
                    self.error_expected("get");
                    self.resync_to_member_boundary();
                    continue;
                };
                self.next_token();
                if self.is_token(SyntaxKind::OpenBraceToken)
                    || self.is_token(SyntaxKind::EqualsGreaterThanToken)
                {
                    self.skip_body();
                } else {
                    self.parse_expected(SyntaxKind::SemicolonToken, ";");
                }
                accessors.push(Accessor {
                    kind,
                    modifiers: accessor_modifiers,
                    span: Span::new(accessor_start, self.previous_end),
                });
            }
            self.parse_expected(SyntaxKind::CloseBraceToken, "}");
            if self.parse_optional(SyntaxKind::EqualsToken) {
                self.skip_expression(&[SyntaxKind::SemicolonToken]);
                self.parse_expected(SyntaxKind::SemicolonToken, ";");
            }
        }
        MemberDecl {
            kind: MemberKind::Property { ty, accessors },
            name,
            explicit_interface,
            modifiers,
            attributes,
            span: Span::new(start, self.previous_end),
        }
    }

    /// `T a = init, b, c;` Each declarator becomes its own field member.
    fn parse_field_declarators(
        &mut self,
        start: u32,
        attributes: Vec<Attribute>,
        modifiers: Modifiers,
        ty: TypeSyntax,
        first: Ident,
    ) -> Vec<MemberDecl> {
        let mut names = vec![first];
        loop {
            if self.is_token(SyntaxKind::OpenBracketToken) {
                // Fixed-size buffer: `fixed int x[4];`
                self.skip_balanced(SyntaxKind::OpenBracketToken, SyntaxKind::CloseBracketToken);
            }
            if self.parse_optional(SyntaxKind::EqualsToken) {
                self.skip_field_initializer();
            }
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
            match self.parse_identifier() {
                Some(name) => names.push(name),
                None => break,
            }
        }
        if !self.parse_expected(SyntaxKind::SemicolonToken, ";") {
            self.resync_to_member_boundary();
        }
        let end = self.previous_end;
        names
            .into_iter()
            .map(|name| MemberDecl {
                kind: MemberKind::Field { ty: ty.clone() },
                name,
                explicit_interface: None,
                modifiers,
                attributes: attributes.clone(),
                span: Span::new(start, end),
            })
            .collect()
    }

    /// Skip an initializer up to `;` or a `,` that starts the next declarator.
    /// A `,` inside generic arguments (`new Dictionary<int, string>()`) is not
    /// followed by `identifier (= | , | ;)`, which tells the two apart.
    fn skip_field_initializer(&mut self) {
        loop {
            self.skip_expression(&[SyntaxKind::CommaToken, SyntaxKind::SemicolonToken]);
            if !self.is_token(SyntaxKind::CommaToken) {
                return;
            }
            let starts_declarator = self.look_ahead(|p| {
                p.next_token();
                if !p.is_token(SyntaxKind::Identifier) {
                    return false;
                }
                matches!(
                    p.next_token(),
                    SyntaxKind::EqualsToken | SyntaxKind::CommaToken | SyntaxKind::SemicolonToken
                )
            });
            if starts_declarator {
                return;
            }
            self.next_token();
        }
    }

    /// `(attrs ref T name = default, ...)`
    pub(crate) fn parse_parameter_list(&mut self) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        if !self.parse_expected(SyntaxKind::OpenParenToken, "(") {
            return parameters;
        }
        while !self.is_token(SyntaxKind::CloseParenToken)
            && !self.is_token(SyntaxKind::EndOfFileToken)
        {
            let start = self.token_pos();
            let attributes = self.parse_attribute_lists();
            let modifier = match self.token() {
                SyntaxKind::RefKeyword => ParameterModifier::Ref,
                SyntaxKind::OutKeyword => ParameterModifier::Out,
                SyntaxKind::InKeyword => ParameterModifier::In,
                SyntaxKind::ParamsKeyword => ParameterModifier::Params,
                SyntaxKind::ThisKeyword => ParameterModifier::This,
                _ => ParameterModifier::None,
            };
            if modifier != ParameterModifier::None {
                self.next_token();
                // `ref readonly T x`
                self.parse_optional(SyntaxKind::ReadonlyKeyword);
            }
            let Some(ty) = self.parse_type() else {
                self.skip_expression(&[SyntaxKind::CommaToken, SyntaxKind::CloseParenToken]);
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
                continue;
            };
            let Some(name) = self.parse_identifier() else {
                self.skip_expression(&[SyntaxKind::CommaToken, SyntaxKind::CloseParenToken]);
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
                continue;
            };
            let has_default = self.parse_optional(SyntaxKind::EqualsToken);
            if has_default {
                self.skip_expression(&[SyntaxKind::CommaToken, SyntaxKind::CloseParenToken]);
            }
            parameters.push(Parameter {
                attributes,
                modifier,
                ty,
                name,
                has_default,
                span: Span::new(start, self.previous_end),
            });
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken, ")");
        parameters
    }
}
