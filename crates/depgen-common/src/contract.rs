//! The attribute contract.
//!
//! The engine, the host, and the runtime dependency container agree on a fixed
//! set of attribute types, a marker interface, and the runtime API the
//! generated code calls into. Any change here must bump [`CONTRACT_VERSION`]:
//! persisted incremental caches written against another version are discarded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the attribute contract and generated-code shape.
pub const CONTRACT_VERSION: u32 = 1;

/// Assembly that declares the contract types.
pub const FRAMEWORK_ASSEMBLY: &str = "Framework";

/// Namespace holding the contract types.
pub const ALLOCATION_NAMESPACE: &str = "Framework.Allocation";

/// Marker interface: any class implementing it (directly or through a base)
/// takes part in dependency injection even without attributes.
pub const MARKER_INTERFACE: &str = "Framework.Allocation.IDependencyInjectionCandidate";

// Runtime API targeted by generated code.
pub const ACTIVATOR_INTERFACE: &str = "Framework.Allocation.ISourceGeneratedDependencyActivator";
pub const ACTIVATOR_REGISTRY: &str = "Framework.Allocation.IDependencyActivatorRegistry";
pub const ACTIVATOR_METHOD: &str = "RegisterForDependencyActivation";
pub const DEPENDENCY_CONTAINER: &str = "Framework.Allocation.DependencyContainer";
pub const READONLY_DEPENDENCY_CONTAINER: &str = "Framework.Allocation.IReadOnlyDependencyContainer";
pub const ACTIVATOR_HELPERS: &str = "Framework.Allocation.DependencyActivator";

/// One of the attributes the engine classifies members by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContractAttribute {
    /// Field/property receives a value from the container.
    Resolved,
    /// Class or member value is published to descendants.
    Cached,
    /// Method invoked once after injection with resolved arguments.
    BackgroundDependencyLoader,
}

impl ContractAttribute {
    pub const ALL: [ContractAttribute; 3] = [
        ContractAttribute::Resolved,
        ContractAttribute::Cached,
        ContractAttribute::BackgroundDependencyLoader,
    ];

    /// Fully qualified name of the attribute type.
    pub fn qualified_name(self) -> &'static str {
        match self {
            ContractAttribute::Resolved => "Framework.Allocation.ResolvedAttribute",
            ContractAttribute::Cached => "Framework.Allocation.CachedAttribute",
            ContractAttribute::BackgroundDependencyLoader => {
                "Framework.Allocation.BackgroundDependencyLoaderAttribute"
            }
        }
    }

    /// Name as written in source, without the `Attribute` suffix.
    pub fn short_name(self) -> &'static str {
        match self {
            ContractAttribute::Resolved => "Resolved",
            ContractAttribute::Cached => "Cached",
            ContractAttribute::BackgroundDependencyLoader => "BackgroundDependencyLoader",
        }
    }

    pub fn from_qualified_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.qualified_name() == name)
    }
}

impl fmt::Display for ContractAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
