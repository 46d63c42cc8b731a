//! Order-independent projection of a candidate used for change detection.
//!
//! Two passes that see the same class with the same members produce equal
//! shapes no matter how the declarations are ordered, split across partial
//! fragments, or positioned in their files. Spans never enter a shape.

use crate::candidate::{
    CacheRegistration, Candidate, EmitTarget, LoaderParameter, ValueMemberKind,
};
use crate::symbol_key::SymbolKey;
use depgen_binder::TypeKey;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberShapeKind {
    Value(ValueMemberKind),
    Class,
    Method,
}

/// Order-independent description of one set element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberShape {
    pub key: SymbolKey,
    pub kind: MemberShapeKind,
    pub name: String,
    pub ty: String,
    /// Attribute arguments that change generated code, e.g. `name=audio`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registrations: Vec<CacheRegistration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<LoaderParameter>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateShape {
    pub key: TypeKey,
    pub target: EmitTarget,
    pub resolved_members: BTreeSet<MemberShape>,
    pub cached_members: BTreeSet<MemberShape>,
    pub cached_classes: BTreeSet<MemberShape>,
    pub cached_interfaces: BTreeSet<String>,
    pub dependency_loader_members: BTreeSet<MemberShape>,
}

impl CandidateShape {
    /// Stable digest of the shape. Equal shapes always hash equally because
    /// every collection is sorted.
    #[must_use]
    pub fn shape_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl Candidate {
    #[must_use]
    pub fn shape(&self) -> CandidateShape {
        let resolved_members = self
            .resolved_members
            .iter()
            .map(|m| {
                let mut arguments = Vec::new();
                if let Some(name) = &m.dependency_name {
                    arguments.push(format!("name={name}"));
                }
                if m.can_be_null {
                    arguments.push("canBeNull".to_string());
                }
                MemberShape {
                    key: m.key.clone(),
                    kind: MemberShapeKind::Value(m.kind),
                    name: m.name.clone(),
                    ty: m.ty.clone(),
                    arguments,
                    registrations: Vec::new(),
                    parameters: Vec::new(),
                }
            })
            .collect();

        let cached_members = self
            .cached_members
            .iter()
            .map(|m| {
                let mut registrations = m.registrations.to_vec();
                registrations.sort();
                MemberShape {
                    key: m.key.clone(),
                    kind: MemberShapeKind::Value(m.kind),
                    name: m.name.clone(),
                    ty: m.ty.clone(),
                    arguments: Vec::new(),
                    registrations,
                    parameters: Vec::new(),
                }
            })
            .collect();

        let cached_classes = self
            .cached_classes
            .iter()
            .map(|c| {
                let mut registrations = c.registrations.clone();
                registrations.sort();
                MemberShape {
                    key: c.key.clone(),
                    kind: MemberShapeKind::Class,
                    name: c.declaring.clone(),
                    ty: c.declaring.clone(),
                    arguments: Vec::new(),
                    registrations,
                    parameters: Vec::new(),
                }
            })
            .collect();

        let dependency_loader_members = self
            .dependency_loader_members
            .iter()
            .map(|l| MemberShape {
                key: l.key.clone(),
                kind: MemberShapeKind::Method,
                name: l.name.clone(),
                ty: String::new(),
                arguments: if l.permit_nulls {
                    vec!["permitNulls".to_string()]
                } else {
                    Vec::new()
                },
                registrations: Vec::new(),
                // Parameter order is part of the signature.
                parameters: l.parameters.clone(),
            })
            .collect();

        CandidateShape {
            key: self.symbol.clone(),
            target: self.target.clone(),
            resolved_members,
            cached_members,
            cached_classes,
            cached_interfaces: self.cached_interfaces.iter().map(|i| i.ty.clone()).collect(),
            dependency_loader_members,
        }
    }
}
