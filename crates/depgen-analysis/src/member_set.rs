//! Duplicate-free member collections.

use crate::symbol_key::SymbolKey;
use depgen_common::limits::MEMBER_SET_CAPACITY;
use indexmap::IndexMap;
use indexmap::map::Entry;
use rustc_hash::FxBuildHasher;

/// An element that can live in a [`MemberSet`].
pub trait SetMember {
    fn key(&self) -> &SymbolKey;
}

/// Set of members keyed by [`SymbolKey`].
///
/// Inserting a key that is already present is a no-op: the first insertion
/// wins and keeps its position. Iteration follows insertion order, which the
/// builder makes equal to declaration order. Equality ignores order.
#[derive(Clone, Debug)]
pub struct MemberSet<T> {
    entries: IndexMap<SymbolKey, T, FxBuildHasher>,
}

impl<T: SetMember> MemberSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::with_capacity_and_hasher(MEMBER_SET_CAPACITY, FxBuildHasher),
        }
    }

    /// Insert `member` unless its key is present. Returns `true` if inserted.
    pub fn insert(&mut self, member: T) -> bool {
        match self.entries.entry(member.key().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(member);
                true
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &SymbolKey) -> Option<&T> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &SymbolKey) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &SymbolKey> {
        self.entries.keys()
    }
}

impl<T: SetMember> Default for MemberSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SetMember> PartialEq for MemberSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.keys().all(|key| other.contains(key))
    }
}

impl<T: SetMember> Eq for MemberSet<T> {}

impl<T: SetMember> Extend<T> for MemberSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for member in iter {
            self.insert(member);
        }
    }
}

impl<T: SetMember> FromIterator<T> for MemberSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'s, T: SetMember> IntoIterator for &'s MemberSet<T> {
    type Item = &'s T;
    type IntoIter = indexmap::map::Values<'s, SymbolKey, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
