use anyhow::{Context, Result, bail};
use rustc_hash::FxHashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info_span, warn};

use crate::cli::config::ResolvedConfig;
use crate::cli::fs::load_compilation;
use crate::compilation::Compilation;
use crate::incremental::IncrementalCache;
use crate::pipeline::{Generator, PassError, PassOutcome};

const GENERATED_SUFFIX: &str = ".g.cs";

#[derive(Debug)]
pub struct GenerationResult {
    pub compilation: Compilation,
    pub outcome: PassOutcome,
    /// Files whose content changed on disk.
    pub written: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

/// Open the persisted cache, or an empty one. An unreadable or incompatible
/// cache file only costs a full regeneration.
pub fn open_cache(config: &ResolvedConfig) -> Arc<IncrementalCache> {
    let Some(path) = config.cache_file.as_deref() else {
        return Arc::new(IncrementalCache::new());
    };
    match IncrementalCache::load(path) {
        Ok(cache) => {
            debug!(entries = cache.len(), path = %path.display(), "cache loaded");
            Arc::new(cache)
        }
        Err(err) => {
            warn!(error = %err, path = %path.display(), "ignoring unreadable cache");
            Arc::new(IncrementalCache::new())
        }
    }
}

pub fn persist_cache(config: &ResolvedConfig, cache: &IncrementalCache) -> Result<()> {
    let Some(path) = config.cache_file.as_deref() else {
        return Ok(());
    };
    cache
        .save(path)
        .with_context(|| format!("failed to write cache file: {}", path.display()))
}

/// Run one pass over the files on disk and sync the output directory.
pub fn generate(
    config: &ResolvedConfig,
    generator: &Generator,
    snapshot: u64,
) -> Result<GenerationResult> {
    let _span = info_span!("generate", snapshot).entered();
    let compilation = load_compilation(config, snapshot)?;
    let outcome = match generator.run_pass(&compilation) {
        Ok(outcome) => outcome,
        Err(PassError::Superseded(superseded)) => bail!("{superseded}"),
    };
    let (written, deleted) = write_outputs(&config.out_dir, &outcome)?;
    Ok(GenerationResult {
        compilation,
        outcome,
        written,
        deleted,
    })
}

/// Write generated files and delete generated files no pass produces any more.
/// Unchanged files are not rewritten, so their timestamps stay put.
pub fn write_outputs(out_dir: &Path, outcome: &PassOutcome) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let mut written = Vec::new();
    let mut live: FxHashSet<&str> = FxHashSet::default();
    for file in &outcome.files {
        live.insert(file.hint_name.as_str());
        let path = out_dir.join(&file.hint_name);
        let unchanged = std::fs::read_to_string(&path)
            .map(|existing| existing == *file.text)
            .unwrap_or(false);
        if unchanged {
            continue;
        }
        std::fs::write(&path, file.text.as_bytes())
            .with_context(|| format!("failed to write generated file: {}", path.display()))?;
        written.push(path);
    }

    let mut deleted = Vec::new();
    let entries = std::fs::read_dir(out_dir)
        .with_context(|| format!("failed to read output directory: {}", out_dir.display()))?;
    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(GENERATED_SUFFIX) || live.contains(name.as_str()) {
            continue;
        }
        let path = entry.path();
        std::fs::remove_file(&path)
            .with_context(|| format!("failed to delete stale generated file: {}", path.display()))?;
        deleted.push(path);
    }
    deleted.sort();

    Ok((written, deleted))
}

/// `--listCandidates`: every candidate with its classified members.
pub fn list_candidates(config: &ResolvedConfig) -> Result<String> {
    let compilation = load_compilation(config, 0)?;
    let generator = Generator::new(Arc::new(IncrementalCache::new()), config.generator.clone());
    let (analysis, _) = generator.analyze(&compilation);

    let mut out = String::new();
    for candidate in &analysis.candidates {
        let state = if candidate.is_emittable() {
            ""
        } else {
            " (not emitted)"
        };
        let _ = writeln!(out, "{}{}", candidate.symbol, state);
        for member in &candidate.resolved_members {
            let _ = writeln!(out, "  resolved   {}: {}", member.name, member.ty);
        }
        for class in &candidate.cached_classes {
            for registration in &class.registrations {
                let _ = writeln!(out, "  cached     class as {}", registration.ty);
            }
        }
        for interface in &candidate.cached_interfaces {
            let _ = writeln!(out, "  cached     interface {}", interface.ty);
        }
        for member in &candidate.cached_members {
            let _ = writeln!(out, "  cached     {}: {}", member.name, member.ty);
        }
        for loader in &candidate.dependency_loader_members {
            let parameters: Vec<&str> = loader.parameters.iter().map(|p| p.ty.as_str()).collect();
            let _ = writeln!(out, "  loader     {}({})", loader.name, parameters.join(", "));
        }
    }
    Ok(out)
}
