//! Candidate data model and candidate builder.
//!
//! This crate turns resolved class fragments into [`Candidate`] records:
//! - `candidate` - The candidate record and its member types
//! - `member_set` - Duplicate-free, insertion-ordered member sets
//! - `symbol_key` - Semantic member identity
//! - `builder` - Parallel classification and the per-class fragment join
//! - `shape` - The order-independent projection used for change detection

pub mod builder;
mod builder_join;
mod builder_members;
pub mod candidate;
pub mod member_set;
pub mod shape;
pub mod symbol_key;

pub use builder::{AnalysisOutput, AnalysisStats, CandidateBuilder};
pub use candidate::{
    CacheRegistration, CachedClass, CachedInterface, CachedMember, Candidate, DeclarationRef,
    DependencyLoader, EmitTarget, LoaderParameter, ResolvedMember, TypeHeader, ValueMemberKind,
};
pub use member_set::{MemberSet, SetMember};
pub use shape::{CandidateShape, MemberShape, MemberShapeKind};
pub use symbol_key::SymbolKey;
