//! Diagnostic reporter.
//!
//! Collects diagnostics from every phase of a pass, from any number of
//! worker threads, and hands them to the host's diagnostic channel. Reporting
//! never fails: a poisoned collector is recovered and a panicking host sink
//! loses its diagnostics, not the pass.

use depgen_common::Diagnostic;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// The host's diagnostic channel.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: Diagnostic) {
        self(diagnostic);
    }
}

/// Append-only, thread-safe diagnostic collector.
#[derive(Debug, Default)]
pub struct DiagnosticReporter {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_all(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.lock().extend(diagnostics);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.lock().iter().filter(|d| d.is_error()).count()
    }

    /// Everything reported so far, ordered by file, position, and code, with
    /// exact duplicates removed.
    #[must_use]
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut diagnostics = self
            .diagnostics
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticSink for DiagnosticReporter {
    fn report(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }
}

/// Sort into reporting order and drop exact duplicates.
pub fn sort_diagnostics(diagnostics: &mut Vec<Diagnostic>) {
    diagnostics.sort_by(|a, b| {
        (a.file.as_str(), a.start, a.code, a.message_text.as_str()).cmp(&(
            b.file.as_str(),
            b.start,
            b.code,
            b.message_text.as_str(),
        ))
    });
    diagnostics.dedup();
}

/// Forward `diagnostics` to `sink`. A panicking sink drops the remaining
/// diagnostics of the batch and is logged.
pub fn forward(diagnostics: &[Diagnostic], sink: &dyn DiagnosticSink) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        for diagnostic in diagnostics {
            sink.report(diagnostic.clone());
        }
    }));
    if result.is_err() {
        warn!(count = diagnostics.len(), "diagnostic sink panicked");
    }
}
