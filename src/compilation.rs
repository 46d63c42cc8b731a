//! Compilation snapshots handed over by the host.
//!
//! A [`Compilation`] is an immutable view of one build: the sources of the
//! assembly code is generated for, plus reference sources whose types are
//! visible but never generated for. Each snapshot carries a monotonically
//! increasing id; a newer snapshot supersedes any pass still running on an
//! older one.

use depgen_binder::BindUnit;
use depgen_common::Diagnostic;
use depgen_parser::{FileId, SourceFile, parse_source_file};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::info_span;

/// One source text tagged with the assembly that declares it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceText {
    pub file_name: Arc<str>,
    pub text: Arc<str>,
    pub assembly: Arc<str>,
}

impl SourceText {
    #[must_use]
    pub fn new(
        file_name: impl Into<Arc<str>>,
        text: impl Into<Arc<str>>,
        assembly: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
            assembly: assembly.into(),
        }
    }
}

/// One compilation snapshot.
#[derive(Clone, Debug)]
pub struct Compilation {
    pub snapshot: u64,
    /// Assembly code is generated for.
    pub assembly: Arc<str>,
    pub sources: Vec<SourceText>,
    /// Sources of referenced assemblies.
    pub references: Vec<SourceText>,
}

impl Compilation {
    #[must_use]
    pub fn new(assembly: impl Into<Arc<str>>, snapshot: u64) -> Self {
        Self {
            snapshot,
            assembly: assembly.into(),
            sources: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Add a source of the generated assembly.
    pub fn add_source(&mut self, file_name: impl Into<Arc<str>>, text: impl Into<Arc<str>>) {
        let assembly = Arc::clone(&self.assembly);
        self.sources.push(SourceText::new(file_name, text, assembly));
    }

    /// Add a source of a referenced assembly.
    pub fn add_reference(
        &mut self,
        assembly: impl Into<Arc<str>>,
        file_name: impl Into<Arc<str>>,
        text: impl Into<Arc<str>>,
    ) {
        self.references
            .push(SourceText::new(file_name, text, assembly));
    }

    #[must_use]
    pub fn with_source(mut self, file_name: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> Self {
        self.add_source(file_name, text);
        self
    }

    #[must_use]
    pub fn with_reference(
        mut self,
        assembly: impl Into<Arc<str>>,
        file_name: impl Into<Arc<str>>,
        text: impl Into<Arc<str>>,
    ) -> Self {
        self.add_reference(assembly, file_name, text);
        self
    }

    /// The same inputs under a new snapshot id.
    #[must_use]
    pub fn next_snapshot(&self, snapshot: u64) -> Self {
        Self {
            snapshot,
            ..self.clone()
        }
    }

    /// Parse every source. Generated-assembly sources get the first file
    /// ids, in input order; references follow.
    #[must_use]
    pub fn parse(&self, parallel: bool) -> ParsedCompilation {
        let _span = info_span!(
            "parse",
            sources = self.sources.len(),
            references = self.references.len()
        )
        .entered();

        let inputs: Vec<&SourceText> = self.sources.iter().chain(&self.references).collect();
        let parse_one = |(index, source): (usize, &&SourceText)| {
            parse_source_file(
                FileId(index as u32),
                Arc::clone(&source.file_name),
                Arc::clone(&source.text),
            )
        };
        let files: Vec<SourceFile> = if parallel {
            inputs.par_iter().enumerate().map(parse_one).collect()
        } else {
            inputs.iter().enumerate().map(parse_one).collect()
        };

        ParsedCompilation {
            assemblies: inputs.iter().map(|s| Arc::clone(&s.assembly)).collect(),
            generated: self.sources.len(),
            files,
        }
    }
}

/// Parsed files of one snapshot.
#[derive(Debug)]
pub struct ParsedCompilation {
    pub files: Vec<SourceFile>,
    /// Declaring assembly per file, parallel to `files`.
    pub assemblies: Vec<Arc<str>>,
    /// `files[..generated]` belong to the generated assembly.
    pub generated: usize,
}

impl ParsedCompilation {
    /// Files of the generated assembly.
    #[must_use]
    pub fn generated_files(&self) -> &[SourceFile] {
        &self.files[..self.generated]
    }

    /// Every file with its assembly, ready for the binder.
    pub fn bind_units(&self) -> impl Iterator<Item = BindUnit<'_>> {
        self.files
            .iter()
            .zip(&self.assemblies)
            .map(|(file, assembly)| BindUnit::new(file, Arc::clone(assembly)))
    }

    /// Syntax errors in the generated assembly's files. Reference sources are
    /// owned by other builds and report there.
    #[must_use]
    pub fn syntax_diagnostics(&self) -> Vec<Diagnostic> {
        self.generated_files()
            .iter()
            .flat_map(|file| file.diagnostics.iter().cloned())
            .collect()
    }
}
