//! Emission failures.
//!
//! These are internal invariant breaches, not user errors: a candidate that
//! reaches the emitter has already been validated. They stay scoped to one
//! candidate and surface as `DG9001`.

use depgen_analysis::Candidate;
use depgen_common::Diagnostic;
use depgen_common::diagnostics::diagnostic_codes;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("'{first}' and '{second}' share an emission ordering key")]
    DuplicateOrderingKey { first: String, second: String },
    #[error("'{member}' is not in declaration order")]
    OutOfOrder { member: String },
    #[error("the candidate is not emittable")]
    NotEmittable,
}

impl EmitError {
    /// `DG9001` at the candidate's declaration.
    #[must_use]
    pub fn to_diagnostic(&self, candidate: &Candidate) -> Diagnostic {
        let declaration = &candidate.declaration;
        let name = candidate.symbol.to_string();
        let detail = self.to_string();
        Diagnostic::from_code(
            diagnostic_codes::INTERNAL_EMIT_ERROR,
            &declaration.file_name,
            declaration.name_span,
            &[name.as_str(), detail.as_str()],
        )
    }
}

pub type EmitResult<T> = Result<T, EmitError>;
