//! Resolved type references.

use crate::type_key::TypeId;
use std::sync::Arc;

/// A type after name resolution.
///
/// `Named` carries the full instantiation: for a nested type of a generic
/// container the container's arguments come first, then the type's own.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named { id: TypeId, args: Vec<TypeRef> },
    TypeParameter(Arc<str>),
    Array { element: Box<TypeRef>, rank: u8 },
    /// `T?`. For value types this is `System.Nullable<T>`; for reference types
    /// an annotation only.
    Nullable(Box<TypeRef>),
    Tuple(Vec<TypeRef>),
    Pointer(Box<TypeRef>),
}

impl TypeRef {
    #[must_use]
    pub fn named(id: TypeId) -> Self {
        TypeRef::Named {
            id,
            args: Vec::new(),
        }
    }

    /// Declared type behind the reference, if any.
    #[must_use]
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            TypeRef::Named { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Strip a nullable annotation.
    #[must_use]
    pub fn without_nullable(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner.without_nullable(),
            other => other,
        }
    }

    /// Replace type parameters named in `params` with the matching `args`.
    #[must_use]
    pub fn substitute(&self, params: &[Arc<str>], args: &[TypeRef]) -> TypeRef {
        if params.is_empty() {
            return self.clone();
        }
        match self {
            TypeRef::TypeParameter(name) => params
                .iter()
                .position(|p| p == name)
                .and_then(|i| args.get(i))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeRef::Named { id, args: own } => TypeRef::Named {
                id: *id,
                args: own.iter().map(|a| a.substitute(params, args)).collect(),
            },
            TypeRef::Array { element, rank } => TypeRef::Array {
                element: Box::new(element.substitute(params, args)),
                rank: *rank,
            },
            TypeRef::Nullable(inner) => TypeRef::Nullable(Box::new(inner.substitute(params, args))),
            TypeRef::Pointer(inner) => TypeRef::Pointer(Box::new(inner.substitute(params, args))),
            TypeRef::Tuple(elements) => TypeRef::Tuple(
                elements
                    .iter()
                    .map(|e| e.substitute(params, args))
                    .collect(),
            ),
        }
    }
}
