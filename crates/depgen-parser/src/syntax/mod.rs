//! Syntactic queries over parsed trees. Nothing here consults symbols.

pub mod eligibility;
