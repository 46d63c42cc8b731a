use serde::Serialize;

/// Token kinds produced by the scanner.
///
/// Contextual keywords (`partial`, `get`, `set`, `init`, `global`, `where`,
/// `record`, `async`) are scanned as `Identifier`; the parser checks their text
/// where the grammar gives them meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum SyntaxKind {
    Unknown,
    EndOfFileToken,

    // Literals
    Identifier,
    NumericLiteral,
    StringLiteral,
    CharacterLiteral,

    // Punctuation
    OpenBraceToken,
    CloseBraceToken,
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    LessThanToken,
    GreaterThanToken,
    CommaToken,
    SemicolonToken,
    DotToken,
    EqualsToken,
    EqualsGreaterThanToken,
    ColonToken,
    ColonColonToken,
    QuestionToken,
    AsteriskToken,
    /// Any other operator character; only relevant inside skipped expressions.
    OperatorToken,

    // Declaration keywords
    NamespaceKeyword,
    UsingKeyword,
    ClassKeyword,
    InterfaceKeyword,
    StructKeyword,
    EnumKeyword,
    DelegateKeyword,
    EventKeyword,
    OperatorKeyword,
    ImplicitKeyword,
    ExplicitKeyword,

    // Modifier keywords
    PublicKeyword,
    PrivateKeyword,
    ProtectedKeyword,
    InternalKeyword,
    StaticKeyword,
    ReadonlyKeyword,
    AbstractKeyword,
    SealedKeyword,
    VirtualKeyword,
    OverrideKeyword,
    ExternKeyword,
    NewKeyword,
    ConstKeyword,
    VolatileKeyword,
    UnsafeKeyword,

    // Parameter modifier keywords
    RefKeyword,
    OutKeyword,
    InKeyword,
    ParamsKeyword,
    ThisKeyword,

    // Expression keywords
    TypeofKeyword,
    TrueKeyword,
    FalseKeyword,
    NullKeyword,
    DefaultKeyword,

    // Predefined types
    VoidKeyword,
    BoolKeyword,
    ByteKeyword,
    SbyteKeyword,
    CharKeyword,
    DecimalKeyword,
    DoubleKeyword,
    FloatKeyword,
    IntKeyword,
    UintKeyword,
    LongKeyword,
    UlongKeyword,
    ShortKeyword,
    UshortKeyword,
    ObjectKeyword,
    StringKeyword,
}

impl SyntaxKind {
    /// Map reserved-keyword text to its kind.
    pub fn keyword(text: &str) -> Option<SyntaxKind> {
        Some(match text {
            "namespace" => SyntaxKind::NamespaceKeyword,
            "using" => SyntaxKind::UsingKeyword,
            "class" => SyntaxKind::ClassKeyword,
            "interface" => SyntaxKind::InterfaceKeyword,
            "struct" => SyntaxKind::StructKeyword,
            "enum" => SyntaxKind::EnumKeyword,
            "delegate" => SyntaxKind::DelegateKeyword,
            "event" => SyntaxKind::EventKeyword,
            "operator" => SyntaxKind::OperatorKeyword,
            "implicit" => SyntaxKind::ImplicitKeyword,
            "explicit" => SyntaxKind::ExplicitKeyword,
            "public" => SyntaxKind::PublicKeyword,
            "private" => SyntaxKind::PrivateKeyword,
            "protected" => SyntaxKind::ProtectedKeyword,
            "internal" => SyntaxKind::InternalKeyword,
            "static" => SyntaxKind::StaticKeyword,
            "readonly" => SyntaxKind::ReadonlyKeyword,
            "abstract" => SyntaxKind::AbstractKeyword,
            "sealed" => SyntaxKind::SealedKeyword,
            "virtual" => SyntaxKind::VirtualKeyword,
            "override" => SyntaxKind::OverrideKeyword,
            "extern" => SyntaxKind::ExternKeyword,
            "new" => SyntaxKind::NewKeyword,
            "const" => SyntaxKind::ConstKeyword,
            "volatile" => SyntaxKind::VolatileKeyword,
            "unsafe" => SyntaxKind::UnsafeKeyword,
            "ref" => SyntaxKind::RefKeyword,
            "out" => SyntaxKind::OutKeyword,
            "in" => SyntaxKind::InKeyword,
            "params" => SyntaxKind::ParamsKeyword,
            "this" => SyntaxKind::ThisKeyword,
            "typeof" => SyntaxKind::TypeofKeyword,
            "true" => SyntaxKind::TrueKeyword,
            "false" => SyntaxKind::FalseKeyword,
            "null" => SyntaxKind::NullKeyword,
            "default" => SyntaxKind::DefaultKeyword,
            "void" => SyntaxKind::VoidKeyword,
            "bool" => SyntaxKind::BoolKeyword,
            "byte" => SyntaxKind::ByteKeyword,
            "sbyte" => SyntaxKind::SbyteKeyword,
            "char" => SyntaxKind::CharKeyword,
            "decimal" => SyntaxKind::DecimalKeyword,
            "double" => SyntaxKind::DoubleKeyword,
            "float" => SyntaxKind::FloatKeyword,
            "int" => SyntaxKind::IntKeyword,
            "uint" => SyntaxKind::UintKeyword,
            "long" => SyntaxKind::LongKeyword,
            "ulong" => SyntaxKind::UlongKeyword,
            "short" => SyntaxKind::ShortKeyword,
            "ushort" => SyntaxKind::UshortKeyword,
            "object" => SyntaxKind::ObjectKeyword,
            "string" => SyntaxKind::StringKeyword,
            _ => return None,
        })
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            SyntaxKind::PublicKeyword
                | SyntaxKind::PrivateKeyword
                | SyntaxKind::ProtectedKeyword
                | SyntaxKind::InternalKeyword
                | SyntaxKind::StaticKeyword
                | SyntaxKind::ReadonlyKeyword
                | SyntaxKind::AbstractKeyword
                | SyntaxKind::SealedKeyword
                | SyntaxKind::VirtualKeyword
                | SyntaxKind::OverrideKeyword
                | SyntaxKind::ExternKeyword
                | SyntaxKind::NewKeyword
                | SyntaxKind::ConstKeyword
                | SyntaxKind::VolatileKeyword
                | SyntaxKind::UnsafeKeyword
        )
    }

    /// Keywords naming a predefined type (`int`, `string`, `object`, ...).
    pub fn is_predefined_type(self) -> bool {
        matches!(
            self,
            SyntaxKind::VoidKeyword
                | SyntaxKind::BoolKeyword
                | SyntaxKind::ByteKeyword
                | SyntaxKind::SbyteKeyword
                | SyntaxKind::CharKeyword
                | SyntaxKind::DecimalKeyword
                | SyntaxKind::DoubleKeyword
                | SyntaxKind::FloatKeyword
                | SyntaxKind::IntKeyword
                | SyntaxKind::UintKeyword
                | SyntaxKind::LongKeyword
                | SyntaxKind::UlongKeyword
                | SyntaxKind::ShortKeyword
                | SyntaxKind::UshortKeyword
                | SyntaxKind::ObjectKeyword
                | SyntaxKind::StringKeyword
        )
    }

    pub fn is_type_declaration_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassKeyword
                | SyntaxKind::InterfaceKeyword
                | SyntaxKind::StructKeyword
                | SyntaxKind::EnumKeyword
                | SyntaxKind::DelegateKeyword
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::NumericLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::CharacterLiteral
                | SyntaxKind::TrueKeyword
                | SyntaxKind::FalseKeyword
                | SyntaxKind::NullKeyword
        )
    }
}
