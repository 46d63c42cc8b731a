//! Name lookup failures.

use depgen_common::diagnostics::diagnostic_codes;
use depgen_common::{Diagnostic, Span};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("cannot resolve type '{name}'")]
    NotFound { name: String, span: Span },
    #[error("'{name}' is ambiguous between {candidates}")]
    Ambiguous {
        name: String,
        candidates: String,
        span: Span,
    },
}

impl ResolutionError {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            ResolutionError::NotFound { span, .. } | ResolutionError::Ambiguous { span, .. } => {
                *span
            }
        }
    }

    /// Diagnostic for a type used by a member, parameter, or `typeof`.
    #[must_use]
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        match self {
            ResolutionError::NotFound { name, span } => {
                Diagnostic::from_code(diagnostic_codes::CANNOT_RESOLVE_TYPE, file, *span, &[name.as_str()])
            }
            ResolutionError::Ambiguous {
                name,
                candidates,
                span,
            } => Diagnostic::from_code(
                diagnostic_codes::AMBIGUOUS_TYPE_REFERENCE,
                file,
                *span,
                &[name.as_str(), candidates.as_str()],
            ),
        }
    }

    /// Diagnostic for an entry of a base list; `owner` names the declaring type.
    #[must_use]
    pub fn to_base_diagnostic(&self, file: &str, owner: &str) -> Diagnostic {
        match self {
            ResolutionError::NotFound { name, span } => Diagnostic::from_code(
                diagnostic_codes::CANNOT_RESOLVE_BASE_TYPE,
                file,
                *span,
                &[name.as_str(), owner],
            ),
            ResolutionError::Ambiguous { .. } => self.to_diagnostic(file),
        }
    }
}

pub type ResolutionResult<T> = Result<T, ResolutionError>;
