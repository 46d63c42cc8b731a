//! Syntax tree for the declaration language.
//!
//! Only declarations are modeled. Method bodies, property accessor bodies and
//! initializers are skipped by the parser and never appear in the tree.

use bitflags::bitflags;
use depgen_common::{Diagnostic, Span};
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Index of a source file within one compilation snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u32);

/// Stable reference to a piece of syntax: a file and a span inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SyntaxRef {
    pub file: FileId,
    pub span: Span,
}

impl SyntaxRef {
    #[must_use]
    pub const fn new(file: FileId, span: Span) -> Self {
        Self { file, span }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

impl Ident {
    #[must_use]
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// =============================================================================
// Source file and namespaces
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SourceFile {
    pub id: FileId,
    pub file_name: Arc<str>,
    #[serde(skip)]
    pub text: Arc<str>,
    /// File-level usings and declarations live in the global namespace body.
    pub body: NamespaceBody,
    pub diagnostics: Vec<Diagnostic>,
}

impl SourceFile {
    #[must_use]
    pub fn syntax_ref(&self, span: Span) -> SyntaxRef {
        SyntaxRef::new(self.id, span)
    }

    /// Iterate every type declaration in the file in source order, outer
    /// declarations before their nested types.
    pub fn type_declarations(&self) -> impl Iterator<Item = &TypeDecl> {
        enum Work<'a> {
            Body(&'a NamespaceBody),
            Type(&'a TypeDecl),
        }
        let mut stack = vec![Work::Body(&self.body)];
        std::iter::from_fn(move || {
            while let Some(work) = stack.pop() {
                match work {
                    Work::Type(decl) => {
                        stack.extend(decl.nested.iter().rev().map(Work::Type));
                        return Some(decl);
                    }
                    Work::Body(body) => {
                        stack.extend(body.members.iter().rev().map(|member| match member {
                            NamespaceMember::Namespace(ns) => Work::Body(&ns.body),
                            NamespaceMember::Type(decl) => Work::Type(decl),
                        }));
                    }
                }
            }
            None
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct NamespaceBody {
    pub usings: Vec<UsingDirective>,
    pub members: Vec<NamespaceMember>,
}

#[derive(Debug, Serialize)]
pub enum NamespaceMember {
    Namespace(NamespaceDecl),
    Type(TypeDecl),
}

#[derive(Debug, Serialize)]
pub struct NamespaceDecl {
    /// Dotted name segments, e.g. `["Game", "Screens"]`.
    pub name: Vec<Ident>,
    pub file_scoped: bool,
    pub body: NamespaceBody,
    pub span: Span,
}

impl NamespaceDecl {
    #[must_use]
    pub fn qualified_name(&self) -> String {
        join_idents(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum UsingKind {
    /// `using A.B;`
    Namespace,
    /// `using static A.B;`
    Static,
    /// `using X = A.B;`
    Alias(Ident),
}

#[derive(Clone, Debug, Serialize)]
pub struct UsingDirective {
    pub kind: UsingKind,
    pub global: bool,
    pub target: TypeSyntax,
    pub span: Span,
}

// =============================================================================
// Modifiers
// =============================================================================

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const PUBLIC    = 1 << 0;
        const PRIVATE   = 1 << 1;
        const PROTECTED = 1 << 2;
        const INTERNAL  = 1 << 3;
        const STATIC    = 1 << 4;
        const READONLY  = 1 << 5;
        const ABSTRACT  = 1 << 6;
        const SEALED    = 1 << 7;
        const VIRTUAL   = 1 << 8;
        const OVERRIDE  = 1 << 9;
        const EXTERN    = 1 << 10;
        const NEW       = 1 << 11;
        const CONST     = 1 << 12;
        const VOLATILE  = 1 << 13;
        const UNSAFE    = 1 << 14;
        const PARTIAL   = 1 << 15;
        const ASYNC     = 1 << 16;
        const REQUIRED  = 1 << 17;
        const FILE      = 1 << 18;
    }
}

impl Modifiers {
    /// Contextual keywords that act as modifiers in declaration position.
    #[must_use]
    pub fn from_contextual(text: &str) -> Option<Modifiers> {
        Some(match text {
            "partial" => Modifiers::PARTIAL,
            "async" => Modifiers::ASYNC,
            "required" => Modifiers::REQUIRED,
            "file" => Modifiers::FILE,
            _ => return None,
        })
    }

    /// Spelled-out accessibility for generated declarations.
    #[must_use]
    pub fn accessibility(self) -> &'static str {
        if self.contains(Modifiers::PROTECTED | Modifiers::INTERNAL) {
            "protected internal"
        } else if self.contains(Modifiers::PRIVATE | Modifiers::PROTECTED) {
            "private protected"
        } else if self.contains(Modifiers::PUBLIC) {
            "public"
        } else if self.contains(Modifiers::PROTECTED) {
            "protected"
        } else if self.contains(Modifiers::PRIVATE) {
            "private"
        } else if self.contains(Modifiers::FILE) {
            "file"
        } else {
            "internal"
        }
    }
}

impl Serialize for Modifiers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeDeclKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

impl TypeDeclKind {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            TypeDeclKind::Class => "class",
            TypeDeclKind::Interface => "interface",
            TypeDeclKind::Struct => "struct",
            TypeDeclKind::Enum => "enum",
            TypeDeclKind::Delegate => "delegate",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TypeDecl {
    pub kind: TypeDeclKind,
    /// `record class` / `record struct`.
    pub is_record: bool,
    pub name: Ident,
    pub type_parameters: SmallVec<[Ident; 2]>,
    pub modifiers: Modifiers,
    pub attributes: Vec<Attribute>,
    pub base_list: Vec<TypeSyntax>,
    pub members: Vec<MemberDecl>,
    pub nested: Vec<TypeDecl>,
    pub span: Span,
}

impl TypeDecl {
    #[must_use]
    pub fn arity(&self) -> u16 {
        self.type_parameters.len() as u16
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.modifiers.contains(Modifiers::PARTIAL)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PredefinedType {
    Void,
    Bool,
    Byte,
    SByte,
    Char,
    Decimal,
    Double,
    Float,
    Int,
    UInt,
    Long,
    ULong,
    Short,
    UShort,
    Object,
    String,
}

impl PredefinedType {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            PredefinedType::Void => "void",
            PredefinedType::Bool => "bool",
            PredefinedType::Byte => "byte",
            PredefinedType::SByte => "sbyte",
            PredefinedType::Char => "char",
            PredefinedType::Decimal => "decimal",
            PredefinedType::Double => "double",
            PredefinedType::Float => "float",
            PredefinedType::Int => "int",
            PredefinedType::UInt => "uint",
            PredefinedType::Long => "long",
            PredefinedType::ULong => "ulong",
            PredefinedType::Short => "short",
            PredefinedType::UShort => "ushort",
            PredefinedType::Object => "object",
            PredefinedType::String => "string",
        }
    }

    /// Name of the `System` type the keyword aliases.
    #[must_use]
    pub fn system_name(self) -> &'static str {
        match self {
            PredefinedType::Void => "Void",
            PredefinedType::Bool => "Boolean",
            PredefinedType::Byte => "Byte",
            PredefinedType::SByte => "SByte",
            PredefinedType::Char => "Char",
            PredefinedType::Decimal => "Decimal",
            PredefinedType::Double => "Double",
            PredefinedType::Float => "Single",
            PredefinedType::Int => "Int32",
            PredefinedType::UInt => "UInt32",
            PredefinedType::Long => "Int64",
            PredefinedType::ULong => "UInt64",
            PredefinedType::Short => "Int16",
            PredefinedType::UShort => "UInt16",
            PredefinedType::Object => "Object",
            PredefinedType::String => "String",
        }
    }
}

/// One dotted segment of a type name, with its own type arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct NameSegment {
    pub name: Ident,
    pub type_arguments: Vec<TypeSyntax>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeSyntax {
    Predefined {
        keyword: PredefinedType,
        span: Span,
    },
    Named {
        /// `global::` prefix.
        global: bool,
        /// `alias::` prefix other than `global`.
        alias: Option<Ident>,
        segments: SmallVec<[NameSegment; 2]>,
        span: Span,
    },
    Array {
        element: Box<TypeSyntax>,
        rank: u8,
        span: Span,
    },
    Nullable {
        inner: Box<TypeSyntax>,
        span: Span,
    },
    Pointer {
        inner: Box<TypeSyntax>,
        span: Span,
    },
    Tuple {
        elements: Vec<TypeSyntax>,
        span: Span,
    },
}

impl TypeSyntax {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            TypeSyntax::Predefined { span, .. }
            | TypeSyntax::Named { span, .. }
            | TypeSyntax::Array { span, .. }
            | TypeSyntax::Nullable { span, .. }
            | TypeSyntax::Pointer { span, .. }
            | TypeSyntax::Tuple { span, .. } => *span,
        }
    }

    /// Last name segment text for named types.
    #[must_use]
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeSyntax::Named { segments, .. } => segments.last().map(|s| s.name.text.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            TypeSyntax::Predefined {
                keyword: PredefinedType::Void,
                ..
            }
        )
    }
}

impl fmt::Display for TypeSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSyntax::Predefined { keyword, .. } => f.write_str(keyword.keyword()),
            TypeSyntax::Named {
                global,
                alias,
                segments,
                ..
            } => {
                if *global {
                    f.write_str("global::")?;
                } else if let Some(alias) = alias {
                    write!(f, "{alias}::")?;
                }
                for (i, segment) in segments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(&segment.name.text)?;
                    if !segment.type_arguments.is_empty() {
                        f.write_str("<")?;
                        for (j, arg) in segment.type_arguments.iter().enumerate() {
                            if j > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{arg}")?;
                        }
                        f.write_str(">")?;
                    }
                }
                Ok(())
            }
            TypeSyntax::Array { element, rank, .. } => {
                write!(f, "{element}[")?;
                for _ in 1..*rank {
                    f.write_str(",")?;
                }
                f.write_str("]")
            }
            TypeSyntax::Nullable { inner, .. } => write!(f, "{inner}?"),
            TypeSyntax::Pointer { inner, .. } => write!(f, "{inner}*"),
            TypeSyntax::Tuple { elements, .. } => {
                f.write_str("(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str(")")
            }
        }
    }
}

// =============================================================================
// Attributes
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum AttributeValue {
    TypeOf(TypeSyntax),
    String(String),
    Char(String),
    Number(String),
    Bool(bool),
    Null,
    /// Any other expression, kept as source text.
    Expression(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct AttributeArgument {
    /// `Name = value` or `name: value`.
    pub name: Option<Ident>,
    pub value: AttributeValue,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct Attribute {
    /// Explicit target such as `field`, `return`, `assembly`.
    pub target: Option<Ident>,
    pub name: TypeSyntax,
    pub arguments: Vec<AttributeArgument>,
    pub span: Span,
}

impl Attribute {
    /// Find an argument by name, ignoring the case of the first letter so that
    /// `permitNulls:` and `PermitNulls =` both match.
    #[must_use]
    pub fn named_argument(&self, name: &str) -> Option<&AttributeArgument> {
        self.arguments.iter().find(|arg| {
            arg.name
                .as_ref()
                .is_some_and(|ident| eq_ignore_first_case(&ident.text, name))
        })
    }

    pub fn positional_arguments(&self) -> impl Iterator<Item = &AttributeArgument> {
        self.arguments.iter().filter(|arg| arg.name.is_none())
    }

    /// Last name segment with any `Attribute` suffix removed.
    #[must_use]
    pub fn short_name(&self) -> &str {
        let name = self.name.simple_name().unwrap_or("");
        name.strip_suffix("Attribute")
            .filter(|s| !s.is_empty())
            .unwrap_or(name)
    }
}

fn eq_ignore_first_case(a: &str, b: &str) -> bool {
    let mut ac = a.chars();
    let mut bc = b.chars();
    match (ac.next(), bc.next()) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(&y) && ac.as_str() == bc.as_str(),
        (None, None) => true,
        _ => false,
    }
}

// =============================================================================
// Members
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterModifier {
    None,
    Ref,
    Out,
    In,
    Params,
    This,
}

#[derive(Debug, Serialize)]
pub struct Parameter {
    pub attributes: Vec<Attribute>,
    pub modifier: ParameterModifier,
    pub ty: TypeSyntax,
    pub name: Ident,
    pub has_default: bool,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AccessorKind {
    Get,
    Set,
    Init,
}

#[derive(Clone, Debug, Serialize)]
pub struct Accessor {
    pub kind: AccessorKind,
    pub modifiers: Modifiers,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub enum MemberKind {
    Field {
        ty: TypeSyntax,
    },
    Property {
        ty: TypeSyntax,
        accessors: Vec<Accessor>,
    },
    Method {
        return_type: TypeSyntax,
        type_parameters: SmallVec<[Ident; 2]>,
        parameters: Vec<Parameter>,
    },
    Constructor {
        parameters: Vec<Parameter>,
    },
    /// Events, indexers, operators, destructors.
    Other {
        description: &'static str,
    },
}

#[derive(Debug, Serialize)]
pub struct MemberDecl {
    pub kind: MemberKind,
    pub name: Ident,
    /// `IFoo.Bar` explicit interface implementations.
    pub explicit_interface: Option<TypeSyntax>,
    pub modifiers: Modifiers,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

impl MemberDecl {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            MemberKind::Field { .. } => "field",
            MemberKind::Property { .. } => "property",
            MemberKind::Method { .. } => "method",
            MemberKind::Constructor { .. } => "constructor",
            MemberKind::Other { description } => description,
        }
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers
            .intersects(Modifiers::STATIC | Modifiers::CONST)
    }

    /// True if the property has a `set` accessor (not `init`).
    #[must_use]
    pub fn has_setter(&self) -> bool {
        match &self.kind {
            MemberKind::Property { accessors, .. } => {
                accessors.iter().any(|a| a.kind == AccessorKind::Set)
            }
            _ => false,
        }
    }
}

#[must_use]
pub fn join_idents(idents: &[Ident]) -> String {
    let mut out = String::new();
    for (i, ident) in idents.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&ident.text);
    }
    out
}
