//! Semantic model and symbol resolver.
//!
//! The binder turns parsed files into a whole-program [`SemanticModel`]:
//! every declared type gets a stable [`TypeKey`], partial declarations merge
//! into one [`TypeSymbol`], and base lists are resolved into base chains and
//! interface closures. The [`SymbolResolver`] then maps each eligible class
//! fragment onto the model and resolves the dependency-injection relevant
//! parts of it.

pub mod errors;
pub mod lookup;
pub mod prelude;
pub mod resolver;
pub mod state;
mod state_bases;
pub mod symbols;
pub mod type_key;
pub mod type_ref;

pub use errors::{ResolutionError, ResolutionResult};
pub use lookup::{ResolveContext, TypeDisplay};
pub use resolver::{
    FragmentResolution, InheritedAttribute, ResolvedAttribute, ResolvedFragment, ResolvedMember,
    ResolvedParameter, SymbolResolver,
};
pub use state::{BindUnit, SemanticModel};
pub use symbols::{Fragment, Scope, ScopeId, SymbolArena, TypeSymbol};
pub use type_key::{TypeId, TypeKey};
pub use type_ref::TypeRef;
