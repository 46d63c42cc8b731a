//! Candidate builder: classifies every eligible class fragment and merges the
//! fragments of each class into one [`Candidate`].
//!
//! Fragments are independent, so they are resolved and classified in
//! parallel. Results meet in a join map keyed by [`TypeKey`]; each key's
//! fragments are then folded in declaration order, which makes the merged
//! member sets deterministic no matter how the workers were scheduled.
//!
//! Member classification lives in `builder_members.rs`, the per-class fold in
//! `builder_join.rs`.

use crate::candidate::{
    CachedMember, Candidate, DeclarationRef, DependencyLoader, ResolvedMember,
};
use dashmap::DashMap;
use depgen_binder::{FragmentResolution, SemanticModel, SymbolResolver, TypeKey, TypeRef};
use depgen_common::Diagnostic;
use depgen_parser::{EligibleDeclaration, SyntaxRef};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, info_span};

/// A class-level `[Cached]` declared by one fragment.
#[derive(Clone, Debug)]
pub(crate) struct ClassCache {
    pub(crate) declaration: DeclarationRef,
    pub(crate) types: Vec<TypeRef>,
    pub(crate) name: Option<String>,
}

/// Classification result of one physical class declaration.
#[derive(Debug)]
pub(crate) struct FragmentAnalysis {
    pub(crate) declaration: DeclarationRef,
    pub(crate) resolved: Vec<ResolvedMember>,
    pub(crate) cached: Vec<CachedMember>,
    pub(crate) loaders: Vec<DependencyLoader>,
    pub(crate) class_caches: Vec<ClassCache>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub(crate) enum FragmentOutcome {
    Analyzed(FragmentAnalysis),
    /// Resolution failed; the whole class is excluded.
    Excluded(Vec<Diagnostic>),
}

#[derive(Debug)]
pub(crate) struct FragmentResult {
    pub(crate) syntax: SyntaxRef,
    pub(crate) outcome: FragmentOutcome,
}

/// Counters for one analysis run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    /// Fragments that passed the syntactic filter.
    pub eligible_fragments: usize,
    /// Classes taking part in dependency injection.
    pub classes: usize,
    pub candidates: usize,
    /// Classes dropped by resolution failures.
    pub excluded: usize,
}

/// Everything one analysis run produces.
#[derive(Debug, Default)]
pub struct AnalysisOutput {
    /// One candidate per participating class, in declaration order.
    pub candidates: Vec<Candidate>,
    /// Classes excluded by resolution failures.
    pub excluded: Vec<TypeKey>,
    /// All diagnostics, including those stored on candidates, ordered by
    /// file and position.
    pub diagnostics: Vec<Diagnostic>,
    pub stats: AnalysisStats,
}

impl AnalysisOutput {
    #[must_use]
    pub fn candidate(&self, qualified_name: &str) -> Option<&Candidate> {
        self.candidates
            .iter()
            .find(|c| &*c.symbol.qualified_name == qualified_name)
    }
}

/// Builds candidates against one semantic model.
pub struct CandidateBuilder<'m, 'a> {
    pub(crate) resolver: SymbolResolver<'m, 'a>,
    parallel: bool,
}

impl<'m, 'a> CandidateBuilder<'m, 'a> {
    #[must_use]
    pub fn new(model: &'m SemanticModel<'a>) -> Self {
        Self {
            resolver: SymbolResolver::new(model),
            parallel: true,
        }
    }

    /// Run fragments on the rayon pool (default) or on the calling thread.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub(crate) fn model(&self) -> &'m SemanticModel<'a> {
        self.resolver.model()
    }

    /// Analyze `eligible` fragments and build one candidate per class.
    pub fn build<I>(&self, eligible: I) -> AnalysisOutput
    where
        I: IntoIterator<Item = EligibleDeclaration<'a>>,
    {
        let eligible: Vec<EligibleDeclaration<'a>> = eligible.into_iter().collect();
        let _span = info_span!("build_candidates", fragments = eligible.len()).entered();

        // Fragments of one class may be classified on different workers; the
        // join map collects them per class.
        let join: DashMap<TypeKey, Vec<FragmentResult>> = DashMap::new();
        let loose: DashMap<SyntaxRef, Vec<Diagnostic>> = DashMap::new();
        let visit = |fragment: &EligibleDeclaration<'a>| {
            let syntax = fragment.syntax;
            match self.resolver.resolve(fragment) {
                FragmentResolution::NotParticipating => {}
                FragmentResolution::Excluded {
                    id: Some(id),
                    diagnostics,
                } => {
                    let key = self.model().symbol(id).key.clone();
                    join.entry(key).or_default().push(FragmentResult {
                        syntax,
                        outcome: FragmentOutcome::Excluded(diagnostics),
                    });
                }
                FragmentResolution::Excluded {
                    id: None,
                    diagnostics,
                } => {
                    loose.insert(syntax, diagnostics);
                }
                FragmentResolution::Resolved(resolved) => {
                    let key = self.model().symbol(resolved.id).key.clone();
                    let analysis = self.classify_fragment(&resolved);
                    join.entry(key).or_default().push(FragmentResult {
                        syntax,
                        outcome: FragmentOutcome::Analyzed(analysis),
                    });
                }
            }
        };
        {
            let _span = info_span!("classify_fragments", parallel = self.parallel).entered();
            if self.parallel {
                eligible.par_iter().for_each(visit);
            } else {
                eligible.iter().for_each(visit);
            }
        }

        let classes: Vec<(TypeKey, Vec<FragmentResult>)> = join.into_iter().collect();
        let folded: Vec<Folded> = {
            let _span = info_span!("fold_classes", classes = classes.len()).entered();
            let fold = |(key, fragments): (TypeKey, Vec<FragmentResult>)| self.fold_class(key, fragments);
            if self.parallel {
                classes.into_par_iter().map(fold).collect()
            } else {
                classes.into_iter().map(fold).collect()
            }
        };

        let mut output = AnalysisOutput {
            stats: AnalysisStats {
                eligible_fragments: eligible.len(),
                classes: folded.len(),
                ..AnalysisStats::default()
            },
            ..AnalysisOutput::default()
        };
        for (_, diagnostics) in loose {
            output.diagnostics.extend(diagnostics);
        }
        for folded in folded {
            output.diagnostics.extend(folded.diagnostics);
            match folded.candidate {
                Some(candidate) => {
                    output.diagnostics.extend(candidate.diagnostics.iter().cloned());
                    output.candidates.push(candidate);
                }
                None => output.excluded.push(folded.key),
            }
        }

        output
            .candidates
            .sort_by_key(|c| c.declaration.order_key());
        output.excluded.sort();
        sort_diagnostics(&mut output.diagnostics, self.file_order());
        output.stats.candidates = output.candidates.len();
        output.stats.excluded = output.excluded.len();
        debug!(
            candidates = output.stats.candidates,
            excluded = output.stats.excluded,
            diagnostics = output.diagnostics.len(),
            "candidates built"
        );
        output
    }

    /// File names ranked by compilation order, for ordering diagnostics.
    fn file_order(&self) -> FxHashMap<Arc<str>, u32> {
        let mut order = FxHashMap::default();
        for (_, symbol) in self.model().symbols().iter() {
            for fragment in &symbol.fragments {
                order
                    .entry(Arc::clone(&fragment.file.file_name))
                    .or_insert(fragment.file.id.0);
            }
        }
        order
    }
}

/// One class after its fragments were folded.
pub(crate) struct Folded {
    pub(crate) key: TypeKey,
    pub(crate) candidate: Option<Candidate>,
    /// Diagnostics of excluded classes; candidates carry their own.
    pub(crate) diagnostics: Vec<Diagnostic>,
}

/// Order diagnostics by file (compilation order), position, then code.
/// Identical diagnostics reported by several fragments collapse.
fn sort_diagnostics(diagnostics: &mut Vec<Diagnostic>, file_order: FxHashMap<Arc<str>, u32>) {
    let rank = |file: &str| file_order.get(file).copied().unwrap_or(u32::MAX);
    diagnostics.sort_by(|a, b| {
        (rank(&a.file), &a.file, a.start, a.code, &a.message_text).cmp(&(
            rank(&b.file),
            &b.file,
            b.start,
            b.code,
            &b.message_text,
        ))
    });
    diagnostics.dedup();
}
