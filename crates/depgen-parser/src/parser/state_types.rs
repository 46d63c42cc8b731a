//! Parser state - type syntax, identifiers and attribute lists.

use super::state::ParserState;
use crate::ast::{
    Attribute, AttributeArgument, AttributeValue, Ident, NameSegment, PredefinedType, TypeSyntax,
};
use depgen_common::Span;
use depgen_common::limits::MAX_TYPE_ARGUMENT_DEPTH;
use depgen_scanner::SyntaxKind;
use smallvec::SmallVec;

impl ParserState {
    pub(crate) fn parse_identifier(&mut self) -> Option<Ident> {
        if self.is_token(SyntaxKind::Identifier) {
            let ident = Ident::new(self.token_value(), self.token_span());
            self.next_token();
            return Some(ident);
        }
        self.error_expected("identifier");
        None
    }

    fn predefined_type(kind: SyntaxKind) -> Option<PredefinedType> {
        Some(match kind {
            SyntaxKind::VoidKeyword => PredefinedType::Void,
            SyntaxKind::BoolKeyword => PredefinedType::Bool,
            SyntaxKind::ByteKeyword => PredefinedType::Byte,
            SyntaxKind::SbyteKeyword => PredefinedType::SByte,
            SyntaxKind::CharKeyword => PredefinedType::Char,
            SyntaxKind::DecimalKeyword => PredefinedType::Decimal,
            SyntaxKind::DoubleKeyword => PredefinedType::Double,
            SyntaxKind::FloatKeyword => PredefinedType::Float,
            SyntaxKind::IntKeyword => PredefinedType::Int,
            SyntaxKind::UintKeyword => PredefinedType::UInt,
            SyntaxKind::LongKeyword => PredefinedType::Long,
            SyntaxKind::UlongKeyword => PredefinedType::ULong,
            SyntaxKind::ShortKeyword => PredefinedType::Short,
            SyntaxKind::UshortKeyword => PredefinedType::UShort,
            SyntaxKind::ObjectKeyword => PredefinedType::Object,
            SyntaxKind::StringKeyword => PredefinedType::String,
            _ => return None,
        })
    }

    /// Parse a type, reporting `'type' expected.` on failure.
    pub(crate) fn parse_type(&mut self) -> Option<TypeSyntax> {
        self.parse_type_at_depth(0)
    }

    fn parse_type_at_depth(&mut self, depth: usize) -> Option<TypeSyntax> {
        if depth > MAX_TYPE_ARGUMENT_DEPTH {
            self.error_expected("type");
            return None;
        }
        let start = self.token_pos();
        let mut ty = if let Some(keyword) = Self::predefined_type(self.token()) {
            self.next_token();
            TypeSyntax::Predefined {
                keyword,
                span: Span::new(start, self.previous_end),
            }
        } else if self.is_token(SyntaxKind::OpenParenToken) {
            self.parse_tuple_type(depth)?
        } else if self.is_token(SyntaxKind::Identifier) {
            self.parse_named_type(depth)?
        } else {
            self.error_expected("type");
            return None;
        };

        // Suffixes: `?`, `[]`, `[,]`, `*`
        loop {
            match self.token() {
                SyntaxKind::QuestionToken => {
                    self.next_token();
                    ty = TypeSyntax::Nullable {
                        inner: Box::new(ty),
                        span: Span::new(start, self.previous_end),
                    };
                }
                SyntaxKind::AsteriskToken => {
                    self.next_token();
                    ty = TypeSyntax::Pointer {
                        inner: Box::new(ty),
                        span: Span::new(start, self.previous_end),
                    };
                }
                SyntaxKind::OpenBracketToken if self.is_array_rank_specifier() => {
                    self.next_token();
                    let mut rank = 1u8;
                    while self.parse_optional(SyntaxKind::CommaToken) {
                        rank = rank.saturating_add(1);
                    }
                    self.parse_expected(SyntaxKind::CloseBracketToken, "]");
                    ty = TypeSyntax::Array {
                        element: Box::new(ty),
                        rank,
                        span: Span::new(start, self.previous_end),
                    };
                }
                _ => return Some(ty),
            }
        }
    }

    fn is_array_rank_specifier(&mut self) -> bool {
        self.look_ahead(|p| {
            p.next_token();
            while p.is_token(SyntaxKind::CommaToken) {
                p.next_token();
            }
            p.is_token(SyntaxKind::CloseBracketToken)
        })
    }

    fn parse_tuple_type(&mut self, depth: usize) -> Option<TypeSyntax> {
        let start = self.token_pos();
        self.next_token(); // (
        let mut elements = Vec::new();
        loop {
            elements.push(self.parse_type_at_depth(depth + 1)?);
            // Optional element name.
            if self.is_token(SyntaxKind::Identifier) {
                self.next_token();
            }
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken, ")");
        Some(TypeSyntax::Tuple {
            elements,
            span: Span::new(start, self.previous_end),
        })
    }

    /// `global::A.B<C>.D`, `alias::A`, `A.B`
    fn parse_named_type(&mut self, depth: usize) -> Option<TypeSyntax> {
        let start = self.token_pos();
        let mut global = false;
        let mut alias = None;
        if self.peek_kind() == SyntaxKind::ColonColonToken {
            let qualifier = self.parse_identifier()?;
            self.next_token(); // ::
            if qualifier.text == "global" {
                global = true;
            } else {
                alias = Some(qualifier);
            }
        }

        let mut segments: SmallVec<[NameSegment; 2]> = SmallVec::new();
        loop {
            let name = self.parse_identifier()?;
            let type_arguments = if self.is_token(SyntaxKind::LessThanToken) {
                self.parse_type_argument_list_at_depth(depth + 1)
                    .unwrap_or_default()
            } else {
                Vec::new()
            };
            segments.push(NameSegment {
                name,
                type_arguments,
            });
            // Continue only for `.Identifier`; `.this` and friends belong to the caller.
            let continues = self.is_token(SyntaxKind::DotToken)
                && self.peek_kind() == SyntaxKind::Identifier;
            if !continues {
                break;
            }
            self.next_token();
        }
        Some(TypeSyntax::Named {
            global,
            alias,
            segments,
            span: Span::new(start, self.previous_end),
        })
    }

    /// `<T, U>` after a name. Returns `None` (without consuming) when the
    /// tokens do not form a type argument list.
    pub(crate) fn parse_type_argument_list(&mut self) -> Option<Vec<TypeSyntax>> {
        self.parse_type_argument_list_at_depth(1)
    }

    fn parse_type_argument_list_at_depth(&mut self, depth: usize) -> Option<Vec<TypeSyntax>> {
        // One attempt per nesting level.
        self.try_parse(|p| p.try_type_argument_list(depth))
    }

    fn try_type_argument_list(&mut self, depth: usize) -> Option<Vec<TypeSyntax>> {
        if !self.parse_optional(SyntaxKind::LessThanToken) {
            return None;
        }
        let mut args = Vec::new();
        // Unbound generic in typeof: `typeof(Dictionary<,>)`
        if self.is_token(SyntaxKind::CommaToken) || self.is_token(SyntaxKind::GreaterThanToken) {
            while self.parse_optional(SyntaxKind::CommaToken) {}
            return self.parse_optional(SyntaxKind::GreaterThanToken).then_some(args);
        }
        loop {
            let before = self.diagnostics.len();
            let ty = self.parse_type_at_depth(depth)?;
            if self.diagnostics.len() != before {
                return None;
            }
            args.push(ty);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_optional(SyntaxKind::GreaterThanToken).then_some(args)
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Zero or more `[target: A, B(args)]` lists, flattened.
    pub(crate) fn parse_attribute_lists(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        while self.is_token(SyntaxKind::OpenBracketToken) {
            self.next_token();
            let target = if (self.is_token(SyntaxKind::Identifier)
                || self.is_token(SyntaxKind::EventKeyword))
                && self.peek_kind() == SyntaxKind::ColonToken
            {
                let ident = Ident::new(self.scanner.token_text(), self.token_span());
                self.next_token();
                self.next_token(); // :
                Some(ident)
            } else {
                None
            };
            loop {
                if self.is_token(SyntaxKind::CloseBracketToken) {
                    break;
                }
                match self.parse_attribute(target.clone()) {
                    Some(attribute) => attributes.push(attribute),
                    None => {
                        self.skip_expression(&[SyntaxKind::CloseBracketToken]);
                        break;
                    }
                }
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
            self.parse_expected(SyntaxKind::CloseBracketToken, "]");
        }
        attributes
    }

    fn parse_attribute(&mut self, target: Option<Ident>) -> Option<Attribute> {
        let start = self.token_pos();
        let name = self.parse_type()?;
        let mut arguments = Vec::new();
        if self.parse_optional(SyntaxKind::OpenParenToken) {
            while !self.is_token(SyntaxKind::CloseParenToken)
                && !self.is_token(SyntaxKind::EndOfFileToken)
            {
                arguments.push(self.parse_attribute_argument());
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
            self.parse_expected(SyntaxKind::CloseParenToken, ")");
        }
        Some(Attribute {
            target,
            name,
            arguments,
            span: Span::new(start, self.previous_end),
        })
    }

    fn parse_attribute_argument(&mut self) -> AttributeArgument {
        let start = self.token_pos();
        let name = if self.is_token(SyntaxKind::Identifier)
            && matches!(
                self.peek_kind(),
                SyntaxKind::EqualsToken | SyntaxKind::ColonToken
            ) {
            let ident = Ident::new(self.token_value(), self.token_span());
            self.next_token();
            self.next_token(); // = or :
            Some(ident)
        } else {
            None
        };
        let value = self.parse_attribute_value();
        AttributeArgument {
            name,
            value,
            span: Span::new(start, self.previous_end),
        }
    }

    /// A constant attribute argument. Anything that is not a single literal or
    /// `typeof(T)` is kept as raw text.
    fn parse_attribute_value(&mut self) -> AttributeValue {
        let start = self.token_pos();
        let stops = [SyntaxKind::CommaToken, SyntaxKind::CloseParenToken];

        let simple = match self.token() {
            SyntaxKind::TypeofKeyword => {
                self.next_token();
                if self.parse_expected(SyntaxKind::OpenParenToken, "(") {
                    let ty = self.parse_type();
                    self.parse_expected(SyntaxKind::CloseParenToken, ")");
                    ty.map(AttributeValue::TypeOf)
                } else {
                    None
                }
            }
            SyntaxKind::StringLiteral => {
                let value = AttributeValue::String(self.token_value().to_string());
                self.next_token();
                Some(value)
            }
            SyntaxKind::CharacterLiteral => {
                let value = AttributeValue::Char(self.token_value().to_string());
                self.next_token();
                Some(value)
            }
            SyntaxKind::NumericLiteral => {
                let value = AttributeValue::Number(self.token_value().to_string());
                self.next_token();
                Some(value)
            }
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                let value = AttributeValue::Bool(self.is_token(SyntaxKind::TrueKeyword));
                self.next_token();
                Some(value)
            }
            SyntaxKind::NullKeyword => {
                self.next_token();
                Some(AttributeValue::Null)
            }
            _ => None,
        };

        if let Some(value) = simple {
            if stops.contains(&self.token()) {
                return value;
            }
        }
        self.skip_expression(&stops);
        let text = Span::new(start, self.previous_end)
            .slice(self.scanner.source())
            .trim()
            .to_string();
        AttributeValue::Expression(text)
    }
}
