//! `--watch`: rerun passes against one cache as sources change.
//!
//! The watcher lives for the whole host session, so the incremental cache
//! is created once and shared by every pass; unchanged classes are reused
//! across edits. Bursts of file events are coalesced into one pass.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info};

use crate::cli::config::ResolvedConfig;
use crate::cli::driver::{self, GenerationResult};
use crate::pipeline::Generator;

/// Quiet period after the last event before a pass starts.
const DEBOUNCE: Duration = Duration::from_millis(150);

/// Whether a changed path can affect generation.
#[must_use]
pub fn is_relevant_change(config: &ResolvedConfig, path: &Path) -> bool {
    if path.starts_with(&config.out_dir) {
        return false;
    }
    if config.cache_file.as_deref() == Some(path) {
        return false;
    }
    path.extension().is_some_and(|ext| ext == "cs")
}

/// Watch the project and run `on_pass` after every pass. Returns only when
/// the watcher channel closes.
pub fn run<F>(config: &ResolvedConfig, generator: &Generator, mut on_pass: F) -> Result<()>
where
    F: FnMut(&GenerationResult),
{
    let (tx, rx) = mpsc::channel::<PathBuf>();
    let mut watcher: RecommendedWatcher =
        notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let Ok(event) = res else {
                return;
            };
            if matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
        })
        .context("failed to start file watcher")?;

    for root in watch_roots(config) {
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;
    }

    let mut snapshot = 1;
    let result = driver::generate(config, generator, snapshot)?;
    driver::persist_cache(config, generator.cache())?;
    on_pass(&result);

    while let Some(changed) = next_batch(&rx, config) {
        snapshot += 1;
        info!(snapshot, changed = changed.len(), "sources changed");
        let result = driver::generate(config, generator, snapshot)?;
        driver::persist_cache(config, generator.cache())?;
        on_pass(&result);
    }
    Ok(())
}

fn watch_roots(config: &ResolvedConfig) -> Vec<PathBuf> {
    let mut roots = vec![config.sources.root.clone()];
    for reference in &config.references {
        if !roots.iter().any(|root| reference.sources.root.starts_with(root)) {
            roots.push(reference.sources.root.clone());
        }
    }
    roots
}

/// Block until a relevant change arrives, then drain events until the
/// debounce window stays quiet. `None` when the channel closed.
fn next_batch(rx: &Receiver<PathBuf>, config: &ResolvedConfig) -> Option<Vec<PathBuf>> {
    let mut changed = Vec::new();
    loop {
        let path = rx.recv().ok()?;
        if is_relevant_change(config, &path) {
            changed.push(path);
            break;
        }
        debug!(path = %path.display(), "ignored change");
    }
    loop {
        match rx.recv_timeout(DEBOUNCE) {
            Ok(path) => {
                if is_relevant_change(config, &path) && !changed.contains(&path) {
                    changed.push(path);
                }
            }
            Err(RecvTimeoutError::Timeout) => return Some(changed),
            Err(RecvTimeoutError::Disconnected) => return Some(changed),
        }
    }
}
