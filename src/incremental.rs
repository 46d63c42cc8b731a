//! Incremental cache: symbol identity to last emitted candidate shape.
//!
//! The cache is an explicit object with a host-session lifecycle: created
//! when the session starts, handed to every pass by reference, cleared when
//! the session ends. A candidate whose [`CandidateShape`] equals the cached
//! one, and whose [`OutputFormat`] is the one the output was written with,
//! reuses the cached output verbatim; shapes compare as sets, so reordering
//! declarations never forces regeneration.
//!
//! Passes are transactional. [`IncrementalCache::begin_pass`] hands out a
//! [`PassToken`]; starting a newer pass supersedes every older token, and a
//! superseded pass can never commit. Reads during a pass see the state left
//! by the last committed pass.

use depgen_analysis::CandidateShape;
use depgen_binder::TypeKey;
use depgen_common::CONTRACT_VERSION;
use depgen_emitter::EmitOptions;
use dashmap::DashMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, trace};

/// Version of the persisted document layout.
pub const CACHE_FORMAT_VERSION: u32 = 2;

/// Version of the tool that wrote a persisted cache.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to access cache file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed cache file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// A pass lost its right to commit to a newer pass.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("pass for snapshot {snapshot} was superseded by a newer pass")]
pub struct Superseded {
    pub snapshot: u64,
}

/// Text formatting a cached output was emitted with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFormat {
    pub indent: String,
    pub new_line: String,
}

impl From<&EmitOptions> for OutputFormat {
    fn from(options: &EmitOptions) -> Self {
        Self {
            indent: options.indent.to_string(),
            new_line: options.new_line.to_string(),
        }
    }
}

/// Last emitted state of one class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub shape: CandidateShape,
    pub shape_hash: u64,
    pub format: OutputFormat,
    pub hint_name: String,
    pub output: Arc<str>,
}

impl CacheEntry {
    #[must_use]
    pub fn new(
        shape: CandidateShape,
        format: OutputFormat,
        hint_name: String,
        output: Arc<str>,
    ) -> Self {
        Self {
            shape_hash: shape.shape_hash(),
            shape,
            format,
            hint_name,
            output,
        }
    }

    /// Same shape, written with the same formatting.
    #[must_use]
    pub fn matches(&self, shape: &CandidateShape, shape_hash: u64, format: &OutputFormat) -> bool {
        self.shape_hash == shape_hash && &self.format == format && &self.shape == shape
    }
}

/// Permission to commit one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassToken {
    generation: u64,
    snapshot: u64,
}

impl PassToken {
    #[must_use]
    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Changes one pass applies to the cache.
#[derive(Debug, Default)]
pub struct PassCommit {
    /// New or changed entries.
    pub updates: Vec<(TypeKey, CacheEntry)>,
    /// Keys whose existing entry was reused unchanged.
    pub reused: Vec<TypeKey>,
}

/// What a commit changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub updated: usize,
    /// Evicted entries as `(key, hint name)`, sorted by key.
    pub evicted: Vec<(TypeKey, String)>,
}

#[derive(Debug, Default)]
pub struct IncrementalCache {
    entries: DashMap<TypeKey, CacheEntry>,
    generation: AtomicU64,
    commit_lock: Mutex<()>,
}

impl IncrementalCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &TypeKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Cached keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// End of the host session. Also supersedes any pass in flight.
    pub fn clear(&self) {
        let _guard = self.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
    }

    // =========================================================================
    // Passes
    // =========================================================================

    /// Start a pass over `snapshot`, superseding every earlier pass.
    pub fn begin_pass(&self, snapshot: u64) -> PassToken {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(snapshot, generation, "pass started");
        PassToken {
            generation,
            snapshot,
        }
    }

    #[must_use]
    pub fn is_current(&self, token: &PassToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.generation
    }

    /// Cached output for `key` if the cached shape equals `shape` and the
    /// output was written in `format`.
    #[must_use]
    pub fn reusable_output(
        &self,
        key: &TypeKey,
        shape: &CandidateShape,
        shape_hash: u64,
        format: &OutputFormat,
    ) -> Option<Arc<str>> {
        let entry = self.entries.get(key)?;
        if entry.matches(shape, shape_hash, format) {
            trace!(class = %key, "shape unchanged");
            Some(Arc::clone(&entry.output))
        } else {
            trace!(class = %key, "shape or format changed");
            None
        }
    }

    /// Apply a pass. Every entry neither updated nor reused is evicted: its
    /// class disappeared, was renamed, or stopped being emittable.
    pub fn commit(&self, token: &PassToken, commit: PassCommit) -> Result<CommitSummary, Superseded> {
        let _guard = self.lock();
        if !self.is_current(token) {
            debug!(snapshot = token.snapshot, "superseded pass abandoned");
            return Err(Superseded {
                snapshot: token.snapshot,
            });
        }

        let mut live: FxHashSet<TypeKey> = commit.reused.into_iter().collect();
        live.extend(commit.updates.iter().map(|(key, _)| key.clone()));

        let mut evicted: Vec<(TypeKey, String)> = Vec::new();
        self.entries.retain(|key, entry| {
            let keep = live.contains(key);
            if !keep {
                evicted.push((key.clone(), entry.hint_name.clone()));
            }
            keep
        });
        evicted.sort();

        let updated = commit.updates.len();
        for (key, entry) in commit.updates {
            self.entries.insert(key, entry);
        }

        debug!(
            snapshot = token.snapshot,
            updated,
            evicted = evicted.len(),
            entries = self.entries.len(),
            "pass committed"
        );
        Ok(CommitSummary { updated, evicted })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        // The guarded state lives in `entries`; a poisoned lock holds nothing.
        self.commit_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    #[must_use]
    pub fn to_document(&self) -> CacheDocument {
        let mut entries: Vec<PersistedEntry> = self
            .entries
            .iter()
            .map(|entry| PersistedEntry {
                key: entry.key().clone(),
                shape_hash: entry.shape_hash,
                shape: entry.shape.clone(),
                format: entry.format.clone(),
                hint_name: entry.hint_name.clone(),
                output: entry.output.to_string(),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        CacheDocument {
            format_version: CACHE_FORMAT_VERSION,
            contract_version: CONTRACT_VERSION,
            tool_version: TOOL_VERSION.to_string(),
            entries,
        }
    }

    /// Restore a cache. Documents written by another tool or contract
    /// version yield an empty cache; entries whose hash no longer matches
    /// their shape are dropped.
    #[must_use]
    pub fn from_document(document: CacheDocument) -> Self {
        let cache = Self::new();
        if !document.is_compatible() {
            debug!(
                format_version = document.format_version,
                contract_version = document.contract_version,
                tool_version = %document.tool_version,
                "incompatible cache document ignored"
            );
            return cache;
        }
        for entry in document.entries {
            if entry.shape.shape_hash() != entry.shape_hash || entry.shape.key != entry.key {
                debug!(class = %entry.key, "inconsistent cache entry dropped");
                continue;
            }
            cache.entries.insert(
                entry.key,
                CacheEntry {
                    shape: entry.shape,
                    shape_hash: entry.shape_hash,
                    format: entry.format,
                    hint_name: entry.hint_name,
                    output: Arc::from(entry.output),
                },
            );
        }
        cache
    }

    pub fn to_json(&self) -> CacheResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn from_json(text: &str) -> CacheResult<Self> {
        let document: CacheDocument = serde_json::from_str(text)?;
        Ok(Self::from_document(document))
    }

    pub fn save(&self, path: &Path) -> CacheResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load a persisted cache; a missing file is an empty cache.
    pub fn load(path: &Path) -> CacheResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(err) => Err(err.into()),
        }
    }
}

/// On-disk form of the cache.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDocument {
    pub format_version: u32,
    pub contract_version: u32,
    pub tool_version: String,
    pub entries: Vec<PersistedEntry>,
}

impl CacheDocument {
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.format_version == CACHE_FORMAT_VERSION
            && self.contract_version == CONTRACT_VERSION
            && self.tool_version == TOOL_VERSION
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEntry {
    pub key: TypeKey,
    pub shape_hash: u64,
    pub shape: CandidateShape,
    pub format: OutputFormat,
    pub hint_name: String,
    pub output: String,
}
