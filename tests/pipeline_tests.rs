//! End-to-end passes: parse, bind, classify, reuse, emit.

use depgen::pipeline::{Generator, GeneratorOptions, PassError};
use depgen::{Compilation, Diagnostic, EmitOptions, IncrementalCache, TypeKey, diagnostic_codes};
use std::sync::{Arc, Mutex};

const ASSEMBLY: &str = "Game";

fn game(body: &str) -> String {
    format!("using System;\nusing Framework.Allocation;\nnamespace Game\n{{\n{body}\n}}\n")
}

fn compilation(snapshot: u64, sources: &[(&str, &str)]) -> Compilation {
    let mut compilation = Compilation::new(ASSEMBLY, snapshot);
    for (name, body) in sources {
        compilation.add_source(*name, game(body));
    }
    compilation
}

fn generator() -> Generator {
    Generator::new(Arc::new(IncrementalCache::new()), GeneratorOptions::default())
}

fn key(name: &str) -> TypeKey {
    TypeKey::new(name, 0, ASSEMBLY)
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<u32> {
    diagnostics.iter().map(|d| d.code).collect()
}

const CLASS_A: &str = r"
    class Foo { }
    partial class A : IDependencyInjectionCandidate
    {
        [Resolved] private Foo x { get; set; }
    }
";

// =============================================================================
// Reuse
// =============================================================================

#[test]
fn adding_an_unrelated_class_reuses_existing_output() {
    let generator = generator();
    let first = generator
        .run_pass(&compilation(1, &[("A.cs", CLASS_A)]))
        .expect("first pass");
    assert_eq!(first.stats.emitted, 1);
    let a_first = first.file("Game.A.g.cs").expect("A generated").clone();
    assert!(!a_first.reused);

    let second = generator
        .run_pass(&compilation(
            2,
            &[
                ("A.cs", CLASS_A),
                ("B.cs", "    partial class B : IDependencyInjectionCandidate { }"),
            ],
        ))
        .expect("second pass");

    let a = second.file("Game.A.g.cs").expect("A generated");
    assert!(a.reused, "A must not be re-emitted");
    assert_eq!(a.text, a_first.text);

    let b = second.file("Game.B.g.cs").expect("B generated");
    assert!(!b.reused);
    assert!(b.text.contains("registry.Register(typeof(global::Game.B), null, null);"));
    assert!(second.diagnostics.is_empty(), "{:?}", second.diagnostics);
    assert_eq!((second.stats.reused, second.stats.emitted), (1, 1));
}

#[test]
fn reordering_members_and_files_is_not_a_change() {
    let parts_1 = r"
    class Audio { }
    class Clock { }
    partial class Player : IDependencyInjectionCandidate
    {
        [Resolved] private Audio audio { get; set; }
        [Cached] private Clock clock;
    }
";
    let parts_2 = r"
    partial class Player
    {
        [BackgroundDependencyLoader] private void load() { }
    }
";
    let reordered_1 = r"
    class Clock { }
    class Audio { }
    partial class Player : IDependencyInjectionCandidate
    {
        [Cached] private Clock clock;

        [Resolved] private Audio audio { get; set; }
    }
";

    let generator = generator();
    generator
        .run_pass(&compilation(1, &[("P1.cs", parts_1), ("P2.cs", parts_2)]))
        .expect("first pass");
    let second = generator
        .run_pass(&compilation(
            2,
            &[("P2.cs", parts_2), ("P1.cs", reordered_1)],
        ))
        .expect("second pass");

    assert_eq!(second.stats.emitted, 0);
    assert_eq!(second.stats.reused, 1);
    assert!(second.file("Game.Player.g.cs").is_some_and(|f| f.reused));
}

#[test]
fn changing_a_member_re_emits_only_that_class() {
    let generator = generator();
    let other = "    partial class Other : IDependencyInjectionCandidate { }";
    generator
        .run_pass(&compilation(1, &[("A.cs", CLASS_A), ("Other.cs", other)]))
        .expect("first pass");

    let changed = r#"
    class Foo { }
    partial class A : IDependencyInjectionCandidate
    {
        [Resolved(Name = "main")] private Foo x { get; set; }
    }
"#;
    let second = generator
        .run_pass(&compilation(2, &[("A.cs", changed), ("Other.cs", other)]))
        .expect("second pass");

    let a = second.file("Game.A.g.cs").expect("A generated");
    assert!(!a.reused);
    assert!(a.text.contains("\"x\", \"main\", false);"));
    assert!(second.file("Game.Other.g.cs").is_some_and(|f| f.reused));
}

#[test]
fn changed_formatting_re_emits_cached_classes() {
    let cache = Arc::new(IncrementalCache::new());
    let sources = [("A.cs", CLASS_A)];
    Generator::new(Arc::clone(&cache), GeneratorOptions::default())
        .run_pass(&compilation(1, &sources))
        .expect("first pass");

    let crlf_tabs = Generator::new(
        Arc::clone(&cache),
        GeneratorOptions {
            emit: EmitOptions {
                indent: "\t",
                new_line: "\r\n",
            },
            ..GeneratorOptions::default()
        },
    );
    let second = crlf_tabs
        .run_pass(&compilation(2, &sources))
        .expect("second pass");
    let a = second.file("Game.A.g.cs").expect("A generated");
    assert!(!a.reused);
    assert!(a.text.contains("\r\n"));
    assert!(a.text.contains("\n\tpartial class A"));

    let third = crlf_tabs
        .run_pass(&compilation(3, &sources))
        .expect("third pass");
    assert!(third.file("Game.A.g.cs").is_some_and(|f| f.reused));
}

#[test]
fn persisted_cache_is_reused_by_a_new_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("depgen.cache.json");
    let sources = [
        ("A.cs", CLASS_A),
        ("B.cs", "    partial class B : IDependencyInjectionCandidate { }"),
    ];

    let first_session = generator();
    let first = first_session
        .run_pass(&compilation(1, &sources))
        .expect("first pass");
    first_session.cache().save(&path).expect("save");

    let restored = IncrementalCache::load(&path).expect("load");
    let second_session = Generator::new(Arc::new(restored), GeneratorOptions::default());
    let second = second_session
        .run_pass(&compilation(1, &sources))
        .expect("second pass");

    assert_eq!(second.stats.reused, 2);
    assert_eq!(second.stats.emitted, 0);
    for file in &second.files {
        let original = first.file(&file.hint_name).expect("same files");
        assert_eq!(file.text, original.text);
    }
    assert!(second.removed.is_empty());
}

#[test]
fn identical_passes_are_byte_identical() {
    let sources = [("A.cs", CLASS_A)];
    let first = generator().run_pass(&compilation(1, &sources)).expect("pass");
    let second = generator().run_pass(&compilation(1, &sources)).expect("pass");
    assert_eq!(first.files, second.files);
}

// =============================================================================
// Eviction
// =============================================================================

#[test]
fn removed_classes_are_evicted_and_reported() {
    let generator = generator();
    let b = "    partial class B : IDependencyInjectionCandidate { }";
    generator
        .run_pass(&compilation(1, &[("A.cs", CLASS_A), ("B.cs", b)]))
        .expect("first pass");
    assert!(generator.cache().contains(&key("Game.B")));

    let second = generator
        .run_pass(&compilation(2, &[("A.cs", CLASS_A)]))
        .expect("second pass");
    assert_eq!(second.removed, vec!["Game.B.g.cs".to_string()]);
    assert_eq!(second.stats.evicted, 1);
    assert!(!generator.cache().contains(&key("Game.B")));
    assert!(generator.cache().contains(&key("Game.A")));
}

#[test]
fn classes_that_gain_errors_lose_their_output() {
    let generator = generator();
    generator
        .run_pass(&compilation(1, &[("A.cs", CLASS_A)]))
        .expect("first pass");

    let broken = r"
    class Foo { }
    partial class A : IDependencyInjectionCandidate
    {
        [Resolved] private readonly Foo x;
    }
";
    let second = generator
        .run_pass(&compilation(2, &[("A.cs", broken)]))
        .expect("second pass");
    assert!(second.files.is_empty());
    assert_eq!(second.removed, vec!["Game.A.g.cs".to_string()]);
    assert_eq!(codes(&second.diagnostics), vec![diagnostic_codes::RESOLVED_FIELD_READONLY]);
    assert!(generator.cache().is_empty());
}

// =============================================================================
// Classification through the pipeline
// =============================================================================

#[test]
fn conflicting_member_reports_once_and_blocks_only_its_class() {
    let source = r"
    class Foo { }
    partial class Conflicted : IDependencyInjectionCandidate
    {
        [Resolved, Cached] private Foo both { get; set; }
    }
    partial class Fine : IDependencyInjectionCandidate
    {
        [Resolved] private Foo foo { get; set; }
    }
";
    let outcome = generator()
        .run_pass(&compilation(1, &[("Game.cs", source)]))
        .expect("pass");

    assert_eq!(
        codes(&outcome.diagnostics),
        vec![diagnostic_codes::MEMBER_RESOLVED_AND_CACHED]
    );
    assert!(outcome.diagnostics[0].message_text.contains("both"));
    assert!(outcome.file("Game.Conflicted.g.cs").is_none());
    assert!(outcome.file("Game.Fine.g.cs").is_some());
    assert_eq!(outcome.stats.skipped, 1);
}

#[test]
fn only_listed_interfaces_of_a_cached_class_are_registered() {
    let source = r"
    [Cached]
    interface I1 { }
    interface I2 { }

    [Cached]
    partial class C : I1, I2 { }
";
    let outcome = generator()
        .run_pass(&compilation(1, &[("C.cs", source)]))
        .expect("pass");
    let text = &outcome.file("Game.C.g.cs").expect("C generated").text;
    assert!(text.contains("Cache<global::Game.C>(dc, target, null, typeof(global::Game.C));"));
    assert!(text.contains("Cache<global::Game.I1>(dc, target, null, typeof(global::Game.C));"));
    assert!(!text.contains("global::Game.I2"));
}

#[test]
fn partial_fragments_in_separate_files_produce_one_file() {
    let first = r"
    class Audio { }
    partial class Player : IDependencyInjectionCandidate
    {
        [Resolved] private Audio a { get; set; }
    }
";
    let second = r"
    class Clock { }
    partial class Player
    {
        [Resolved] private Clock c { get; set; }
    }
";
    let outcome = generator()
        .run_pass(&compilation(1, &[("P1.cs", first), ("P2.cs", second)]))
        .expect("pass");
    assert_eq!(outcome.files.len(), 1);
    let text = &outcome.files[0].text;
    let a = text.find("target.a = ").expect("a injected");
    let c = text.find("target.c = ").expect("c injected");
    assert!(a < c, "file order decides member order");
}

#[test]
fn contract_attributes_written_through_an_alias_are_generated() {
    let body = r"
    using R = Framework.Allocation.ResolvedAttribute;
    class Foo { }
    partial class P
    {
        [R] private Foo x { get; set; }
    }
";
    let outcome = generator()
        .run_pass(&compilation(1, &[("P.cs", body)]))
        .expect("pass");
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    let text = &outcome.file("Game.P.g.cs").expect("P generated").text;
    assert!(text.contains("target.x = "));
}

#[test]
fn reference_assemblies_are_visible_but_not_generated() {
    let engine = r"
using Framework.Allocation;
namespace Engine
{
    public class Drawable : IDependencyInjectionCandidate
    {
        [Resolved] private Texture texture { get; set; }
    }
    public class Texture { }
}
";
    let sprite = r"
    partial class Sprite : Engine.Drawable
    {
        [Resolved] private Engine.Texture overlay { get; set; }
    }
";
    let compilation =
        compilation(1, &[("Sprite.cs", sprite)]).with_reference("Engine", "Engine.cs", engine);
    let outcome = generator().run_pass(&compilation).expect("pass");

    assert_eq!(outcome.files.len(), 1);
    let text = &outcome.files[0].text;
    assert!(text.contains("public override void RegisterForDependencyActivation"));
    assert!(text.contains("base.RegisterForDependencyActivation(registry);"));
    assert!(text.contains("Resolve<global::Engine.Texture>"));
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
}

#[test]
fn syntax_errors_are_reported_without_aborting_the_pass() {
    let broken = "namespace Game { class Broken { int x = ; } ";
    let mut compilation = compilation(1, &[("A.cs", CLASS_A)]);
    compilation.add_source("Broken.cs", broken);

    let outcome = generator().run_pass(&compilation).expect("pass");
    assert!(outcome.file("Game.A.g.cs").is_some());
    assert!(
        outcome
            .diagnostics
            .iter()
            .all(|d| d.file == "Broken.cs" && (101..=105).contains(&d.code)),
        "{:?}",
        outcome.diagnostics
    );
    assert!(!outcome.diagnostics.is_empty());
}

#[test]
fn unresolvable_member_type_excludes_the_class() {
    let source = r"
    partial class Lost : IDependencyInjectionCandidate
    {
        [Resolved] private Missing thing { get; set; }
    }
";
    let generator = generator();
    let outcome = generator
        .run_pass(&compilation(1, &[("Lost.cs", source), ("A.cs", CLASS_A)]))
        .expect("pass");
    assert!(codes(&outcome.diagnostics).contains(&diagnostic_codes::CANNOT_RESOLVE_TYPE));
    assert_eq!(outcome.stats.excluded, 1);
    assert!(outcome.file("Game.A.g.cs").is_some());
    assert!(!generator.cache().contains(&key("Game.Lost")));
}

// =============================================================================
// Passes and diagnostics plumbing
// =============================================================================

#[test]
fn superseded_passes_leave_the_cache_untouched() {
    let generator = generator();
    let compilation_1 = compilation(1, &[("A.cs", CLASS_A)]);
    let compilation_2 = compilation_1.next_snapshot(2);

    let stale = generator.cache().begin_pass(1);
    let current = generator.cache().begin_pass(2);

    let result = generator.run_pass_with_token(&compilation_1, stale);
    assert!(matches!(
        result,
        Err(PassError::Superseded(superseded)) if superseded.snapshot == 1
    ));
    assert!(generator.cache().is_empty());

    let outcome = generator
        .run_pass_with_token(&compilation_2, current)
        .expect("current pass");
    assert_eq!(outcome.snapshot, 2);
    assert_eq!(generator.cache().len(), 1);
}

#[test]
fn diagnostics_reach_the_host_sink_in_order() {
    let source = r"
    class Foo { }
    partial class A : IDependencyInjectionCandidate
    {
        [Resolved] private readonly Foo first;
        [Resolved] private Foo second { get; }
    }
";
    let outcome = generator()
        .run_pass(&compilation(1, &[("A.cs", source)]))
        .expect("pass");

    let received: Mutex<Vec<u32>> = Mutex::new(Vec::new());
    let sink = |diagnostic: Diagnostic| {
        if let Ok(mut received) = received.lock() {
            received.push(diagnostic.code);
        }
    };
    outcome.report_to(&sink);

    assert_eq!(
        received.into_inner().expect("sink"),
        vec![
            diagnostic_codes::RESOLVED_FIELD_READONLY,
            diagnostic_codes::RESOLVED_PROPERTY_WITHOUT_SETTER
        ]
    );
}

#[test]
fn parallel_and_sequential_passes_agree() {
    let sources = [
        ("A.cs", CLASS_A),
        ("B.cs", "    partial class B : IDependencyInjectionCandidate { }"),
        ("C.cs", "    [Cached] partial class C { }"),
    ];
    let sequential = Generator::new(
        Arc::new(IncrementalCache::new()),
        GeneratorOptions {
            parallel: false,
            ..GeneratorOptions::default()
        },
    );
    let a = sequential.run_pass(&compilation(1, &sources)).expect("pass");
    let b = generator().run_pass(&compilation(1, &sources)).expect("pass");
    assert_eq!(a.files, b.files);
    assert_eq!(a.diagnostics, b.diagnostics);
}

#[test]
fn a_panicking_sink_does_not_fail_the_host() {
    let source = r"
    class Foo { }
    partial class A : IDependencyInjectionCandidate
    {
        [Resolved] private readonly Foo first;
    }
";
    let outcome = generator()
        .run_pass(&compilation(1, &[("A.cs", source)]))
        .expect("pass");
    fn closed_channel(_: Diagnostic) {
        panic!("host channel closed");
    }
    outcome.report_to(&closed_channel);
    assert_eq!(outcome.diagnostics.len(), 1);
}
