//! One generator pass: parse, bind, build candidates, decide reuse, emit.
//!
//! ```text
//! Compilation ─▶ parse ─▶ bind ─▶ candidates ─▶ cache decision ─┬─▶ reuse
//!                                                               └─▶ emit
//! ```
//!
//! Candidates are independent, so the decision and emission phases run on
//! the rayon pool. The [`IncrementalCache`] is the only shared state and is
//! written once per pass, at commit. A pass superseded by a newer one stops
//! at the next phase boundary and leaves the cache untouched.

use crate::compilation::Compilation;
use crate::incremental::{
    CacheEntry, IncrementalCache, OutputFormat, PassCommit, PassToken, Superseded,
};
use crate::reporter::{DiagnosticReporter, DiagnosticSink, forward};
use depgen_analysis::{AnalysisOutput, Candidate, CandidateBuilder};
use depgen_binder::{SemanticModel, TypeKey};
use depgen_common::Diagnostic;
use depgen_emitter::{EmitOptions, emit_candidate};
use depgen_parser::eligible_class_declarations;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, info_span};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PassError {
    #[error(transparent)]
    Superseded(#[from] Superseded),
}

pub type PassResult<T> = Result<T, PassError>;

#[derive(Clone, Debug)]
pub struct GeneratorOptions {
    /// Run parsing, classification, and emission on the rayon pool.
    pub parallel: bool,
    pub emit: EmitOptions,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            emit: EmitOptions::default(),
        }
    }
}

/// One generated source of a pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    pub key: TypeKey,
    pub hint_name: String,
    pub text: Arc<str>,
    /// Taken verbatim from the cache; the emitter did not run.
    pub reused: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    pub files: usize,
    pub candidates: usize,
    pub emitted: usize,
    pub reused: usize,
    /// Candidates not emitted because of errors or a non-partial declaration.
    pub skipped: usize,
    pub evicted: usize,
    /// Classes excluded by resolution failures.
    pub excluded: usize,
}

/// Result of one committed pass.
#[derive(Debug, Default)]
pub struct PassOutcome {
    pub snapshot: u64,
    /// Generated sources in declaration order.
    pub files: Vec<GeneratedFile>,
    /// Hint names generated by an earlier pass that are gone now.
    pub removed: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: PassStats,
}

impl PassOutcome {
    #[must_use]
    pub fn file(&self, hint_name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.hint_name == hint_name)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Hand this pass's diagnostics to the host channel.
    pub fn report_to(&self, sink: &dyn DiagnosticSink) {
        forward(&self.diagnostics, sink);
    }
}

/// Decision for one emittable candidate.
enum Produced {
    Reused(GeneratedFile),
    Emitted(GeneratedFile, CacheEntry),
    Failed(Diagnostic),
}

/// The engine as seen by a host session.
#[derive(Debug, Default)]
pub struct Generator {
    cache: Arc<IncrementalCache>,
    options: GeneratorOptions,
}

impl Generator {
    #[must_use]
    pub fn new(cache: Arc<IncrementalCache>, options: GeneratorOptions) -> Self {
        Self { cache, options }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<IncrementalCache> {
        &self.cache
    }

    #[must_use]
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Start and run a pass over `compilation`.
    pub fn run_pass(&self, compilation: &Compilation) -> PassResult<PassOutcome> {
        let token = self.cache.begin_pass(compilation.snapshot);
        self.run_pass_with_token(compilation, token)
    }

    /// Run a pass started earlier with [`IncrementalCache::begin_pass`].
    pub fn run_pass_with_token(
        &self,
        compilation: &Compilation,
        token: PassToken,
    ) -> PassResult<PassOutcome> {
        let _span = info_span!(
            "pass",
            snapshot = compilation.snapshot,
            generation = token.generation()
        )
        .entered();

        let reporter = DiagnosticReporter::new();
        let analysis = self.analyze_into(compilation, &reporter);
        self.ensure_current(&token)?;

        let mut stats = PassStats {
            files: compilation.sources.len(),
            candidates: analysis.candidates.len(),
            excluded: analysis.excluded.len(),
            ..PassStats::default()
        };

        let emittable: Vec<&Candidate> = analysis
            .candidates
            .iter()
            .filter(|c| c.is_emittable())
            .collect();
        stats.skipped = analysis.candidates.len() - emittable.len();

        let produced: Vec<Produced> = {
            let _span = info_span!("emit", candidates = emittable.len()).entered();
            let format = OutputFormat::from(&self.options.emit);
            let produce = |candidate: &&Candidate| self.produce(candidate, &format);
            if self.options.parallel {
                emittable.par_iter().map(produce).collect()
            } else {
                emittable.iter().map(produce).collect()
            }
        };
        self.ensure_current(&token)?;

        let mut files = Vec::with_capacity(produced.len());
        let mut commit = PassCommit::default();
        for produced in produced {
            match produced {
                Produced::Reused(file) => {
                    stats.reused += 1;
                    commit.reused.push(file.key.clone());
                    files.push(file);
                }
                Produced::Emitted(file, entry) => {
                    stats.emitted += 1;
                    commit.updates.push((file.key.clone(), entry));
                    files.push(file);
                }
                Produced::Failed(diagnostic) => reporter.report(diagnostic),
            }
        }

        let summary = self.cache.commit(&token, commit)?;
        stats.evicted = summary.evicted.len();

        let live: FxHashSet<&str> = files.iter().map(|f| f.hint_name.as_str()).collect();
        let removed: Vec<String> = summary
            .evicted
            .into_iter()
            .map(|(_, hint)| hint)
            .filter(|hint| !live.contains(hint.as_str()))
            .collect();

        info!(
            candidates = stats.candidates,
            emitted = stats.emitted,
            reused = stats.reused,
            skipped = stats.skipped,
            evicted = stats.evicted,
            "pass finished"
        );

        Ok(PassOutcome {
            snapshot: compilation.snapshot,
            files,
            removed,
            diagnostics: reporter.into_sorted(),
            stats,
        })
    }

    /// Build candidates without touching the cache.
    #[must_use]
    pub fn analyze(&self, compilation: &Compilation) -> (AnalysisOutput, Vec<Diagnostic>) {
        let reporter = DiagnosticReporter::new();
        let output = self.analyze_into(compilation, &reporter);
        (output, reporter.into_sorted())
    }

    fn analyze_into(&self, compilation: &Compilation, sink: &DiagnosticReporter) -> AnalysisOutput {
        let parsed = compilation.parse(self.options.parallel);
        sink.report_all(parsed.syntax_diagnostics());

        let model = {
            let _span = info_span!("bind", files = parsed.files.len()).entered();
            SemanticModel::build(&compilation.assembly, parsed.bind_units())
        };

        let mut output = CandidateBuilder::new(&model)
            .parallel(self.options.parallel)
            .build(eligible_class_declarations(parsed.generated_files()));
        sink.report_all(std::mem::take(&mut output.diagnostics));
        output
    }

    #[tracing::instrument(level = "debug", skip_all, fields(class = %candidate.symbol))]
    fn produce(&self, candidate: &Candidate, format: &OutputFormat) -> Produced {
        let shape = candidate.shape();
        let shape_hash = shape.shape_hash();
        let hint_name = candidate.hint_name();

        if let Some(output) = self
            .cache
            .reusable_output(&candidate.symbol, &shape, shape_hash, format)
        {
            debug!(hint = %hint_name, "reusing cached output");
            return Produced::Reused(GeneratedFile {
                key: candidate.symbol.clone(),
                hint_name,
                text: output,
                reused: true,
            });
        }

        match emit_candidate(candidate, &self.options.emit) {
            Ok(source) => {
                let text: Arc<str> = Arc::from(source.text);
                let entry = CacheEntry {
                    shape,
                    shape_hash,
                    format: format.clone(),
                    hint_name: source.hint_name.clone(),
                    output: Arc::clone(&text),
                };
                Produced::Emitted(
                    GeneratedFile {
                        key: candidate.symbol.clone(),
                        hint_name: source.hint_name,
                        text,
                        reused: false,
                    },
                    entry,
                )
            }
            Err(err) => {
                debug!(error = %err, "emission failed");
                Produced::Failed(err.to_diagnostic(candidate))
            }
        }
    }

    fn ensure_current(&self, token: &PassToken) -> PassResult<()> {
        if self.cache.is_current(token) {
            Ok(())
        } else {
            debug!(snapshot = token.snapshot(), "pass superseded");
            Err(Superseded {
                snapshot: token.snapshot(),
            }
            .into())
        }
    }
}
