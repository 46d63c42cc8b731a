//! Stable type identity.
//!
//! A [`TypeKey`] is derived from content only (qualified metadata name, arity,
//! and declaring assembly), so it survives re-parsing and re-binding across
//! passes. [`TypeId`] is a dense index valid within one semantic model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Content-derived identity of a declared type.
///
/// `qualified_name` is the dotted namespace path plus the type name. Nested
/// types append to their container's metadata name, so `Inner` declared in
/// generic `Game.Outer<T>` has the qualified name ``Game.Outer`1.Inner``.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey {
    pub qualified_name: Arc<str>,
    pub arity: u16,
    pub assembly: Arc<str>,
}

impl TypeKey {
    #[must_use]
    pub fn new(qualified_name: impl Into<Arc<str>>, arity: u16, assembly: impl Into<Arc<str>>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            arity,
            assembly: assembly.into(),
        }
    }

    /// Metadata name: qualified name plus the `` `N`` arity suffix.
    #[must_use]
    pub fn metadata_name(&self) -> String {
        if self.arity == 0 {
            self.qualified_name.to_string()
        } else {
            format!("{}`{}", self.qualified_name, self.arity)
        }
    }

    #[must_use]
    pub fn is(&self, qualified_name: &str, assembly: &str) -> bool {
        &*self.qualified_name == qualified_name && &*self.assembly == assembly
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name)?;
        if self.arity > 0 {
            write!(f, "`{}", self.arity)?;
        }
        Ok(())
    }
}

/// Index of a [`crate::TypeSymbol`] in its [`crate::SymbolArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
