//! Incremental cache: reuse decisions, commits, supersession, persistence.

use depgen::incremental::{CACHE_FORMAT_VERSION, CacheDocument, TOOL_VERSION};
use depgen::pipeline::{Generator, GeneratorOptions};
use depgen::{
    CacheEntry, CandidateShape, Compilation, EmitOptions, IncrementalCache, OutputFormat, PassCommit,
    TypeKey,
};
use std::sync::Arc;

fn shape_of(body: &str, class: &str) -> CandidateShape {
    let text = format!("using Framework.Allocation;\nnamespace Game\n{{\n{body}\n}}\n");
    let compilation = Compilation::new("Game", 1).with_source("Game.cs", text);
    let generator = Generator::new(Arc::new(IncrementalCache::new()), GeneratorOptions::default());
    let (analysis, _) = generator.analyze(&compilation);
    analysis
        .candidate(class)
        .unwrap_or_else(|| panic!("no candidate {class}"))
        .shape()
}

fn player_shape(dependency: &str) -> CandidateShape {
    shape_of(
        &format!(
            "class Audio {{ }} class Clock {{ }}\n\
             partial class Player : IDependencyInjectionCandidate {{ [Resolved] private {dependency} d {{ get; set; }} }}"
        ),
        "Game.Player",
    )
}

fn default_format() -> OutputFormat {
    OutputFormat::from(&EmitOptions::default())
}

fn entry(shape: &CandidateShape, output: &str) -> CacheEntry {
    CacheEntry::new(
        shape.clone(),
        default_format(),
        "Game.Player.g.cs".to_string(),
        Arc::from(output),
    )
}

fn player_key() -> TypeKey {
    TypeKey::new("Game.Player", 0, "Game")
}

fn seeded(shape: &CandidateShape, output: &str) -> IncrementalCache {
    let cache = IncrementalCache::new();
    let token = cache.begin_pass(1);
    cache
        .commit(
            &token,
            PassCommit {
                updates: vec![(player_key(), entry(shape, output))],
                reused: Vec::new(),
            },
        )
        .expect("commit");
    cache
}

// =============================================================================
// Reuse decisions
// =============================================================================

#[test]
fn equal_shape_reuses_the_cached_output() {
    let shape = player_shape("Audio");
    let cache = seeded(&shape, "// player");

    let again = player_shape("Audio");
    let output =
        cache.reusable_output(&player_key(), &again, again.shape_hash(), &default_format());
    assert_eq!(output.as_deref(), Some("// player"));
}

#[test]
fn changed_member_type_is_not_reused() {
    let cache = seeded(&player_shape("Audio"), "// player");
    let changed = player_shape("Clock");
    assert!(
        cache
            .reusable_output(&player_key(), &changed, changed.shape_hash(), &default_format())
            .is_none()
    );
}

#[test]
fn output_written_in_another_format_is_not_reused() {
    let shape = player_shape("Audio");
    let cache = seeded(&shape, "// player");
    let crlf_tabs = OutputFormat::from(&EmitOptions {
        indent: "\t",
        new_line: "\r\n",
    });
    assert!(
        cache
            .reusable_output(&player_key(), &shape, shape.shape_hash(), &crlf_tabs)
            .is_none()
    );
}

#[test]
fn unknown_keys_are_never_reused() {
    let shape = player_shape("Audio");
    let cache = IncrementalCache::new();
    assert!(
        cache
            .reusable_output(&player_key(), &shape, shape.shape_hash(), &default_format())
            .is_none()
    );
}

// =============================================================================
// Commits
// =============================================================================

#[test]
fn commit_evicts_entries_that_are_neither_updated_nor_reused() {
    let cache = seeded(&player_shape("Audio"), "// player");
    let token = cache.begin_pass(2);
    let summary = cache.commit(&token, PassCommit::default()).expect("commit");

    assert_eq!(summary.updated, 0);
    assert_eq!(
        summary.evicted,
        vec![(player_key(), "Game.Player.g.cs".to_string())]
    );
    assert!(cache.is_empty());
}

#[test]
fn reused_entries_survive_a_commit_unchanged() {
    let shape = player_shape("Audio");
    let cache = seeded(&shape, "// player");
    let token = cache.begin_pass(2);
    let summary = cache
        .commit(
            &token,
            PassCommit {
                updates: Vec::new(),
                reused: vec![player_key()],
            },
        )
        .expect("commit");

    assert!(summary.evicted.is_empty());
    assert_eq!(cache.get(&player_key()), Some(entry(&shape, "// player")));
}

#[test]
fn a_newer_pass_supersedes_an_older_one() {
    let cache = IncrementalCache::new();
    let older = cache.begin_pass(1);
    let newer = cache.begin_pass(2);
    assert!(!cache.is_current(&older));
    assert!(cache.is_current(&newer));

    let shape = player_shape("Audio");
    let stale = PassCommit {
        updates: vec![(player_key(), entry(&shape, "// stale"))],
        reused: Vec::new(),
    };
    let err = cache.commit(&older, stale).expect_err("older pass must lose");
    assert_eq!(err.snapshot, 1);
    assert!(cache.is_empty());

    let fresh = PassCommit {
        updates: vec![(player_key(), entry(&shape, "// fresh"))],
        reused: Vec::new(),
    };
    cache.commit(&newer, fresh).expect("newer pass commits");
    assert_eq!(
        cache.get(&player_key()).map(|e| e.output.to_string()),
        Some("// fresh".to_string())
    );
}

#[test]
fn clearing_ends_the_session_and_supersedes_passes_in_flight() {
    let cache = seeded(&player_shape("Audio"), "// player");
    let token = cache.begin_pass(2);
    cache.clear();

    assert!(cache.is_empty());
    assert!(!cache.is_current(&token));
    assert!(cache.commit(&token, PassCommit::default()).is_err());
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn persisted_cache_round_trips_through_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("obj").join("depgen.cache.json");

    let shape = player_shape("Audio");
    let cache = seeded(&shape, "// player");
    cache.save(&path).expect("save");

    let restored = IncrementalCache::load(&path).expect("load");
    assert_eq!(restored.keys(), vec![player_key()]);
    assert_eq!(
        restored
            .reusable_output(&player_key(), &shape, shape.shape_hash(), &default_format())
            .as_deref(),
        Some("// player")
    );
}

#[test]
fn missing_cache_file_loads_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = IncrementalCache::load(&dir.path().join("absent.json")).expect("load");
    assert!(cache.is_empty());
}

#[test]
fn malformed_cache_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "{ not json").expect("write");
    assert!(IncrementalCache::load(&path).is_err());
}

#[test]
fn documents_from_another_version_are_discarded() {
    let cache = seeded(&player_shape("Audio"), "// player");
    let document = cache.to_document();
    assert_eq!(document.format_version, CACHE_FORMAT_VERSION);
    assert_eq!(document.tool_version, TOOL_VERSION);

    let older_tool = CacheDocument {
        tool_version: "0.0.0-old".to_string(),
        ..document.clone()
    };
    assert!(!older_tool.is_compatible());
    assert!(IncrementalCache::from_document(older_tool).is_empty());

    let newer_format = CacheDocument {
        format_version: CACHE_FORMAT_VERSION + 1,
        ..document
    };
    assert!(IncrementalCache::from_document(newer_format).is_empty());
}

#[test]
fn entries_with_a_stale_hash_are_dropped_on_load() {
    let cache = seeded(&player_shape("Audio"), "// player");
    let mut document = cache.to_document();
    document.entries[0].shape_hash ^= 1;

    let restored = IncrementalCache::from_document(document);
    assert!(restored.is_empty());
}

#[test]
fn persisted_document_uses_camel_case_fields() {
    let cache = seeded(&player_shape("Audio"), "// player");
    let json = cache.to_json().expect("json");
    assert!(json.contains("\"formatVersion\""));
    assert!(json.contains("\"contractVersion\""));
    assert!(json.contains("\"shapeHash\""));
    assert!(json.contains("\"newLine\": \"\\n\""));
    assert!(json.contains("\"hintName\": \"Game.Player.g.cs\""));
}
