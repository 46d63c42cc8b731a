//! Type symbols, declaration fragments, and name scopes.

use crate::type_key::{TypeId, TypeKey};
use crate::type_ref::TypeRef;
use depgen_common::Diagnostic;
use depgen_parser::ast::{Modifiers, TypeDecl, TypeDeclKind, TypeSyntax};
use depgen_parser::{SourceFile, SyntaxRef};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// Index of a [`Scope`] in the model's scope arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// A namespace declaration (or a file root) with its using directives.
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    /// Fully qualified namespace; empty for the global namespace.
    pub namespace: Arc<str>,
    pub assembly: Arc<str>,
    /// Imported namespaces, in declaration order.
    pub usings: Vec<Arc<str>>,
    pub aliases: FxHashMap<String, TypeSyntax>,
    /// File roots also see the assembly's `global using` directives.
    pub is_file_root: bool,
}

/// One physical declaration of a type.
#[derive(Clone, Copy, Debug)]
pub struct Fragment<'a> {
    pub file: &'a SourceFile,
    pub decl: &'a TypeDecl,
    pub syntax: SyntaxRef,
    /// Innermost namespace scope enclosing the declaration.
    pub scope: ScopeId,
}

/// A declared type, merged across all of its partial declarations.
#[derive(Debug)]
pub struct TypeSymbol<'a> {
    pub key: TypeKey,
    pub name: String,
    pub kind: TypeDeclKind,
    pub namespace: Arc<str>,
    pub containing: Option<TypeId>,
    /// Own type parameters, without the container's.
    pub type_parameters: SmallVec<[Arc<str>; 2]>,
    /// Union of the modifiers of every fragment.
    pub modifiers: Modifiers,
    pub fragments: SmallVec<[Fragment<'a>; 1]>,
    /// Nested types by `(name, arity)`.
    pub nested: FxHashMap<(String, u16), TypeId>,
    pub base_class: Option<TypeRef>,
    /// Directly listed interfaces, deduplicated, in declaration order.
    pub interfaces: Vec<TypeRef>,
    /// Problems found while binding the declaration header, attributed to the
    /// fragment (by index) whose syntax caused them.
    pub header_errors: Vec<(usize, Diagnostic)>,
    pub depth: usize,
}

impl TypeSymbol<'_> {
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.modifiers.contains(Modifiers::PARTIAL)
    }

    #[must_use]
    pub fn is_class(&self) -> bool {
        self.kind == TypeDeclKind::Class
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeDeclKind::Interface
    }

    #[must_use]
    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeDeclKind::Struct | TypeDeclKind::Enum)
    }

    /// Index of the fragment declared at `syntax`.
    #[must_use]
    pub fn fragment_index(&self, syntax: SyntaxRef) -> Option<usize> {
        self.fragments.iter().position(|f| f.syntax == syntax)
    }
}

/// Arena of type symbols addressed by [`TypeId`].
#[derive(Debug, Default)]
pub struct SymbolArena<'a> {
    symbols: Vec<TypeSymbol<'a>>,
}

impl<'a> SymbolArena<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
        }
    }

    pub fn alloc(&mut self, symbol: TypeSymbol<'a>) -> TypeId {
        let id = TypeId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> Option<&TypeSymbol<'a>> {
        self.symbols.get(id.index())
    }

    pub fn get_mut(&mut self, id: TypeId) -> Option<&mut TypeSymbol<'a>> {
        self.symbols.get_mut(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeSymbol<'a>)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (TypeId(i as u32), s))
    }
}

impl<'a> std::ops::Index<TypeId> for SymbolArena<'a> {
    type Output = TypeSymbol<'a>;

    fn index(&self, id: TypeId) -> &Self::Output {
        &self.symbols[id.index()]
    }
}
