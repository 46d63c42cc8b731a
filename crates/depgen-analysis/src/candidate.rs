//! The candidate data model.
//!
//! A [`Candidate`] is the analysis result for one class. Its identity is its
//! [`TypeKey`] alone: equality and hashing ignore the member sets, which are
//! the payload computed after the key is known. Candidates own all their data
//! (types are rendered to source text) so they outlive the semantic model of
//! the pass that produced them.

use crate::member_set::{MemberSet, SetMember};
use crate::symbol_key::SymbolKey;
use depgen_binder::TypeKey;
use depgen_common::{Diagnostic, Span};
use depgen_parser::SyntaxRef;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

// =============================================================================
// Members
// =============================================================================

/// Where a member or class is declared, for diagnostics and ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclarationRef {
    pub syntax: SyntaxRef,
    pub file_name: Arc<str>,
    /// Span of the declared name.
    pub name_span: Span,
}

impl DeclarationRef {
    /// Emission order: file order, then position of the declared name. Names
    /// keep declarators of one multi-variable field apart.
    #[must_use]
    pub fn order_key(&self) -> (u32, u32) {
        (self.syntax.file.0, self.name_span.start)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueMemberKind {
    Field,
    Property,
}

impl ValueMemberKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueMemberKind::Field => "field",
            ValueMemberKind::Property => "property",
        }
    }
}

/// A field or property receiving a value from the container.
#[derive(Clone, Debug)]
pub struct ResolvedMember {
    pub key: SymbolKey,
    pub declaration: DeclarationRef,
    pub name: String,
    pub kind: ValueMemberKind,
    /// Declared type, `global::`-qualified.
    pub ty: String,
    /// `Name = "..."` of `[Resolved]`.
    pub dependency_name: Option<String>,
    pub can_be_null: bool,
}

/// One registration made by a `[Cached]` attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheRegistration {
    /// Type the value is published as, `global::`-qualified.
    pub ty: String,
    pub name: Option<String>,
}

/// A field or property whose value is published to descendants.
#[derive(Clone, Debug)]
pub struct CachedMember {
    pub key: SymbolKey,
    pub declaration: DeclarationRef,
    pub name: String,
    pub kind: ValueMemberKind,
    pub ty: String,
    /// One entry per `[Cached]` type; attributes without a type register the
    /// member's declared type.
    pub registrations: SmallVec<[CacheRegistration; 1]>,
}

/// The class instance itself, published because `declaring` (the class or
/// one of its base classes) carries a class-level `[Cached]`.
#[derive(Clone, Debug)]
pub struct CachedClass {
    pub key: SymbolKey,
    pub declaration: DeclarationRef,
    pub declaring: String,
    /// Class types the instance is published as. Interfaces named by the
    /// attribute go to [`Candidate::cached_interfaces`] instead.
    pub registrations: Vec<CacheRegistration>,
}

/// An interface a cached class also publishes itself as.
#[derive(Clone, Debug)]
pub struct CachedInterface {
    pub key: SymbolKey,
    pub ty: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoaderParameter {
    pub name: String,
    pub ty: String,
}

/// A method run once after injection with resolved arguments.
#[derive(Clone, Debug)]
pub struct DependencyLoader {
    pub key: SymbolKey,
    pub declaration: DeclarationRef,
    pub name: String,
    pub parameters: Vec<LoaderParameter>,
    pub permit_nulls: bool,
}

macro_rules! impl_set_member {
    ($($ty:ty),*) => {
        $(impl SetMember for $ty {
            fn key(&self) -> &SymbolKey {
                &self.key
            }
        })*
    };
}

impl_set_member!(
    ResolvedMember,
    CachedMember,
    CachedClass,
    CachedInterface,
    DependencyLoader
);

// =============================================================================
// Emission target
// =============================================================================

/// Header of a type declaration as it must be re-declared by generated code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeHeader {
    /// `class`, `struct`, `interface`, `record`, `record struct`.
    pub keyword: String,
    pub name: String,
    pub type_parameters: Vec<String>,
    pub is_partial: bool,
}

/// Everything besides the member sets that shapes the generated file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitTarget {
    pub namespace: String,
    /// Containing types, outermost first.
    pub containing: Vec<TypeHeader>,
    pub class: TypeHeader,
    pub is_sealed: bool,
    /// Nearest base class that takes part in dependency injection,
    /// `global::`-qualified.
    pub base: Option<String>,
}

impl EmitTarget {
    /// True when the class and every containing type are `partial`.
    #[must_use]
    pub fn is_attachable(&self) -> bool {
        self.class.is_partial && self.containing.iter().all(|c| c.is_partial)
    }
}

// =============================================================================
// Candidate
// =============================================================================

/// Analysis result for one class.
#[derive(Clone, Debug)]
pub struct Candidate {
    /// First fragment of the class in declaration order.
    pub declaration: DeclarationRef,
    pub symbol: TypeKey,
    pub target: EmitTarget,
    pub resolved_members: MemberSet<ResolvedMember>,
    pub cached_members: MemberSet<CachedMember>,
    pub cached_classes: MemberSet<CachedClass>,
    pub cached_interfaces: MemberSet<CachedInterface>,
    pub dependency_loader_members: MemberSet<DependencyLoader>,
    /// Problems found while building this candidate.
    pub diagnostics: Vec<Diagnostic>,
}

impl Candidate {
    #[must_use]
    pub fn new(declaration: DeclarationRef, symbol: TypeKey, target: EmitTarget) -> Self {
        Self {
            declaration,
            symbol,
            target,
            resolved_members: MemberSet::new(),
            cached_members: MemberSet::new(),
            cached_classes: MemberSet::new(),
            cached_interfaces: MemberSet::new(),
            dependency_loader_members: MemberSet::new(),
            diagnostics: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_cached_class(&self) -> bool {
        !self.cached_classes.is_empty()
    }

    /// True when nothing is injected, cached, or loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved_members.is_empty()
            && self.cached_members.is_empty()
            && self.cached_classes.is_empty()
            && self.cached_interfaces.is_empty()
            && self.dependency_loader_members.is_empty()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Code is generated only for error-free classes whose generated partial
    /// declaration can be attached.
    #[must_use]
    pub fn is_emittable(&self) -> bool {
        !self.has_errors() && self.target.is_attachable()
    }

    /// File name of the generated source, e.g. ``Game.Outer`1.Player.g.cs``.
    #[must_use]
    pub fn hint_name(&self) -> String {
        format!("{}.g.cs", self.symbol.metadata_name())
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Candidate {}

impl Hash for Candidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}
