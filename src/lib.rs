//! depgen: incremental build-time dependency injection generator.
//!
//! The phases live in their own crates (`depgen-scanner`, `depgen-parser`,
//! `depgen-binder`, `depgen-analysis`, `depgen-emitter`). This crate ties
//! them into passes:
//! - `compilation` - Host snapshots (`Compilation`, `SourceText`)
//! - `incremental` - The cross-pass `IncrementalCache`
//! - `reporter` - Thread-safe diagnostic collection and the host sink
//! - `pipeline` - `Generator::run_pass`
//! - `cli` - The `depgen` command line driver
//! - `tracing_config` - `DEPGEN_LOG` subscriber setup

pub mod cli;
pub mod compilation;
pub mod incremental;
pub mod pipeline;
pub mod reporter;
pub mod tracing_config;

pub use compilation::{Compilation, ParsedCompilation, SourceText};
pub use incremental::{
    CacheDocument, CacheEntry, CacheError, CommitSummary, IncrementalCache, OutputFormat, PassCommit,
    PassToken, Superseded,
};
pub use pipeline::{
    GeneratedFile, Generator, GeneratorOptions, PassError, PassOutcome, PassResult, PassStats,
};
pub use reporter::{DiagnosticReporter, DiagnosticSink};

pub use depgen_analysis::{Candidate, CandidateShape};
pub use depgen_binder::TypeKey;
pub use depgen_common::{Diagnostic, DiagnosticCategory, diagnostic_codes};
pub use depgen_emitter::EmitOptions;
