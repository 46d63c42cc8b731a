//! Common types and utilities for the depgen generator.
//!
//! This crate provides foundational types used across all depgen crates:
//! - Source spans (`Span`) and line/column conversion (`LineMap`)
//! - Diagnostics with stable codes (`Diagnostic`, `diagnostic_codes`)
//! - The versioned attribute contract shared by the engine and the runtime
//! - Centralized limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Centralized limits and thresholds
pub mod limits;

// Diagnostics - codes, messages, and the diagnostic value type
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticMessage, DiagnosticRelatedInformation,
    diagnostic_codes, diagnostic_messages, format_code, format_message,
};

// Attribute contract - names the host, the engine, and the runtime agree on
pub mod contract;
pub use contract::{CONTRACT_VERSION, ContractAttribute};

#[cfg(test)]
#[path = "tests/position_tests.rs"]
mod position_tests;

#[cfg(test)]
#[path = "tests/diagnostics_tests.rs"]
mod diagnostics_tests;
