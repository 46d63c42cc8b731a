//! Centralized limits and thresholds.
//!
//! Shared constants for recursion depths and capacity limits used by the
//! parser, binder, and analysis phases. Keeping them in one place prevents
//! duplicate definitions with inconsistent values.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting depth of namespace and type declarations.
///
/// The parser recurses once per nested `namespace { }` or nested type body.
/// Past this depth the remaining body is skipped and a diagnostic is reported,
/// so pathological input cannot overflow the stack.
///
/// ```csharp
/// class A { class B { class C { /* ... 64 levels ... */ } } }
/// ```
pub const MAX_DECLARATION_NESTING: usize = 64;

/// Maximum depth of nested generic type arguments.
///
/// ```csharp
/// List<List<List</* ... */>>> value;
/// ```
pub const MAX_TYPE_ARGUMENT_DEPTH: usize = 32;

/// Maximum number of base classes walked when computing a class's base chain.
///
/// A cycle is detected separately; this limit only guards against absurdly
/// deep but acyclic hierarchies from reference assemblies.
pub const MAX_BASE_CHAIN_DEPTH: usize = 256;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Parse diagnostics recorded per file before further errors are dropped.
///
/// Error recovery on badly broken files can otherwise produce one diagnostic
/// per token.
pub const MAX_PARSE_DIAGNOSTICS_PER_FILE: usize = 100;

/// Initial capacity for per-class member collections.
pub const MEMBER_SET_CAPACITY: usize = 8;
