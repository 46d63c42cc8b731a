//! Source discovery and snapshot loading.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::config::{ResolvedConfig, SourceSet};
use crate::compilation::Compilation;

/// Files of `set`, sorted. Hidden directories and `skip_dirs` are not walked.
pub fn discover_sources(set: &SourceSet) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(&set.root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            !hidden && !set.skip_dirs.iter().any(|dir| entry.path() == dir)
        });

    for entry in walker.filter_map(Result::ok) {
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(&set.root) else {
            continue;
        };
        if set.include.is_match(relative) && !set.exclude.is_match(relative) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}

/// Every input file of the generated assembly.
pub fn input_files(config: &ResolvedConfig) -> Vec<PathBuf> {
    if config.files.is_empty() {
        discover_sources(&config.sources)
    } else {
        config.files.clone()
    }
}

/// Read every source and reference into a snapshot.
pub fn load_compilation(config: &ResolvedConfig, snapshot: u64) -> Result<Compilation> {
    let mut compilation = Compilation::new(config.assembly_name.as_str(), snapshot);
    for path in input_files(config) {
        let text = read_source(&path)?;
        compilation.add_source(display_name(&config.base_dir, &path), text);
    }
    for reference in &config.references {
        for path in discover_sources(&reference.sources) {
            let text = read_source(&path)?;
            compilation.add_reference(
                reference.assembly_name.as_str(),
                display_name(&config.base_dir, &path),
                text,
            );
        }
    }
    Ok(compilation)
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read source file: {}", path.display()))
}

/// File name used in diagnostics: relative to the project when possible.
fn display_name(base_dir: &Path, path: &Path) -> String {
    path.strip_prefix(base_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
