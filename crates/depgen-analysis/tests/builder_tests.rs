//! Tests for candidate building: member classification, fragment merging,
//! cached classes and interfaces, and emission prerequisites.

use depgen_analysis::{AnalysisOutput, Candidate, CandidateBuilder, SymbolKey, ValueMemberKind};
use depgen_binder::{BindUnit, SemanticModel, TypeKey};
use depgen_common::DiagnosticCategory;
use depgen_common::diagnostics::diagnostic_codes;
use depgen_parser::{FileId, SourceFile, eligible_class_declarations, parse_source_file};

const ASSEMBLY: &str = "Game";
const HEADER: &str = "using System;\nusing Framework.Allocation;\n";

fn parse_all(sources: &[&str]) -> Vec<SourceFile> {
    sources
        .iter()
        .enumerate()
        .map(|(i, text)| parse_source_file(FileId(i as u32), format!("file{i}.cs"), *text))
        .collect()
}

fn analyze_with(sources: &[&str], parallel: bool) -> AnalysisOutput {
    let files = parse_all(sources);
    let model = SemanticModel::build(ASSEMBLY, files.iter().map(|f| BindUnit::new(f, ASSEMBLY)));
    CandidateBuilder::new(&model)
        .parallel(parallel)
        .build(eligible_class_declarations(&files))
}

fn analyze(sources: &[&str]) -> AnalysisOutput {
    analyze_with(sources, true)
}

/// Wrap class declarations in the usual usings and namespace.
fn game(body: &str) -> String {
    format!("{HEADER}namespace Game\n{{\n{body}\n}}\n")
}

fn candidate<'o>(output: &'o AnalysisOutput, name: &str) -> &'o Candidate {
    output
        .candidate(name)
        .unwrap_or_else(|| panic!("no candidate for {name}: {:#?}", output.diagnostics))
}

fn codes(candidate: &Candidate) -> Vec<u32> {
    candidate.diagnostics.iter().map(|d| d.code).collect()
}

fn names<'c, T: 'c>(items: impl Iterator<Item = &'c T>, name: impl Fn(&T) -> &str) -> Vec<String> {
    items.map(|item| name(item).to_string()).collect()
}

// =============================================================================
// Resolved members
// =============================================================================

#[test]
fn resolved_members_follow_declaration_order() {
    let source = game(
        r#"
    class Audio { }
    class Clock { }
    partial class Player : IDependencyInjectionCandidate
    {
        [Resolved]
        private Clock clock { get; set; }

        [Resolved(Name = "music", CanBeNull = true)]
        private Audio audio;

        private Audio unrelated;
    }
"#,
    );
    let output = analyze(&[source.as_str()]);
    let player = candidate(&output, "Game.Player");
    assert!(player.diagnostics.is_empty(), "{:?}", player.diagnostics);
    assert!(player.is_emittable());

    let members: Vec<_> = player.resolved_members.iter().collect();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].name, "clock");
    assert_eq!(members[0].kind, ValueMemberKind::Property);
    assert_eq!(members[0].ty, "global::Game.Clock");
    assert_eq!(members[0].dependency_name, None);
    assert!(!members[0].can_be_null);

    assert_eq!(members[1].name, "audio");
    assert_eq!(members[1].kind, ValueMemberKind::Field);
    assert_eq!(members[1].dependency_name.as_deref(), Some("music"));
    assert!(members[1].can_be_null);
}

#[test]
fn partial_fragments_merge_into_one_candidate() {
    let first = game(
        r"
    class Audio { }
    partial class Player : IDependencyInjectionCandidate
    {
        [Resolved] private Audio audio { get; set; }
    }
",
    );
    let second = game(
        r"
    partial class Player
    {
        [Resolved] private Audio other { get; set; }

        [BackgroundDependencyLoader]
        private void load() { }
    }
",
    );
    let output = analyze(&[first.as_str(), second.as_str()]);
    assert_eq!(output.candidates.len(), 1);
    let player = candidate(&output, "Game.Player");
    assert_eq!(
        names(player.resolved_members.iter(), |m| m.name.as_str()),
        ["audio", "other"]
    );
    assert_eq!(player.dependency_loader_members.len(), 1);
    assert_eq!(&*player.declaration.file_name, "file0.cs");
}

#[test]
fn readonly_fields_and_setterless_properties_are_rejected() {
    let source = game(
        r"
    class Audio { }
    partial class Player : IDependencyInjectionCandidate
    {
        [Resolved] private readonly Audio field;
        [Resolved] private Audio getter { get; }
        [Resolved] private Audio init { get; init; }
        [Resolved] private Audio fine { get; set; }
    }
",
    );
    let output = analyze(&[source.as_str()]);
    let player = candidate(&output, "Game.Player");
    assert_eq!(
        codes(player),
        [
            diagnostic_codes::RESOLVED_FIELD_READONLY,
            diagnostic_codes::RESOLVED_PROPERTY_WITHOUT_SETTER,
            diagnostic_codes::RESOLVED_PROPERTY_WITHOUT_SETTER,
        ]
    );
    assert_eq!(names(player.resolved_members.iter(), |m| m.name.as_str()), ["fine"]);
    assert!(player.has_errors());
    assert!(!player.is_emittable());
}

#[test]
fn member_both_resolved_and_cached_is_in_neither_set() {
    let source = game(
        r"
    class Audio { }
    partial class Player : IDependencyInjectionCandidate
    {
        [Resolved]
        [Cached]
        private Audio audio { get; set; }
    }
",
    );
    let output = analyze(&[source.as_str()]);
    let player = candidate(&output, "Game.Player");
    assert_eq!(codes(player), [diagnostic_codes::MEMBER_RESOLVED_AND_CACHED]);
    assert!(player.resolved_members.is_empty());
    assert!(player.cached_members.is_empty());
}

#[test]
fn resolving_the_own_type_is_a_warning_and_skipped() {
    let source = game(
        r"
    partial class Node : IDependencyInjectionCandidate
    {
        [Resolved] private Node? parent { get; set; }
    }
",
    );
    let output = analyze(&[source.as_str()]);
    let node = candidate(&output, "Game.Node");
    assert_eq!(codes(node), [diagnostic_codes::RESOLVED_MEMBER_OF_OWN_TYPE]);
    assert_eq!(node.diagnostics[0].category, DiagnosticCategory::Warning);
    assert!(node.resolved_members.is_empty());
    assert!(node.is_emittable());
}

#[test]
fn static_and_misplaced_attributes_are_rejected() {
    let source = game(
        r"
    class Audio { }
    [Resolved]
    partial class Player : IDependencyInjectionCandidate
    {
        [Resolved] private static Audio shared;
        [Resolved] private void method() { }
        [BackgroundDependencyLoader] private Audio notAMethod;
    }
",
    );
    let output = analyze(&[source.as_str()]);
    let player = candidate(&output, "Game.Player");
    let mut found = codes(player);
    found.sort_unstable();
    assert_eq!(
        found,
        [
            diagnostic_codes::ATTRIBUTE_INVALID_TARGET,
            diagnostic_codes::ATTRIBUTE_INVALID_TARGET,
            diagnostic_codes::ATTRIBUTE_INVALID_TARGET,
            diagnostic_codes::STATIC_MEMBER_NOT_ALLOWED,
        ]
    );
    assert!(player.is_empty());
}

// =============================================================================
// Cached members
// =============================================================================

#[test]
fn cached_members_register_their_types() {
    let source = game(
        r#"
    interface IAudio { }
    class Audio : IAudio { }
    partial class Host : IDependencyInjectionCandidate
    {
        [Cached]
        [Cached(typeof(IAudio), Name = "main")]
        private Audio audio;

        [Cached(typeof(IDisposable))]
        private Audio broken;
    }
"#,
    );
    let output = analyze(&[source.as_str()]);
    let host = candidate(&output, "Game.Host");
    assert_eq!(codes(host), [diagnostic_codes::CACHED_TYPE_NOT_IMPLEMENTED]);
    assert!(host.diagnostics[0].message_text.contains("System.IDisposable"));

    assert_eq!(host.cached_members.len(), 1);
    let audio = host
        .cached_members
        .get(&SymbolKey::value_member("audio"))
        .expect("audio");
    let registrations: Vec<(&str, Option<&str>)> = audio
        .registrations
        .iter()
        .map(|r| (r.ty.as_str(), r.name.as_deref()))
        .collect();
    assert_eq!(
        registrations,
        [
            ("global::Game.Audio", None),
            ("global::Game.IAudio", Some("main")),
        ]
    );
}

// =============================================================================
// Dependency loaders
// =============================================================================

#[test]
fn loader_signatures_are_checked() {
    let source = game(
        r"
    partial class Player : IDependencyInjectionCandidate
    {
        [BackgroundDependencyLoader] private int returnsValue() { return 0; }
        [BackgroundDependencyLoader] private void generic<T>() { }
        [BackgroundDependencyLoader] private void byRef(ref int count, out int other) { other = 0; }
    }
",
    );
    let output = analyze(&[source.as_str()]);
    let player = candidate(&output, "Game.Player");
    assert_eq!(
        codes(player),
        [
            diagnostic_codes::LOADER_MUST_RETURN_VOID,
            diagnostic_codes::LOADER_CANNOT_BE_GENERIC,
            diagnostic_codes::LOADER_PARAMETER_BY_REFERENCE,
            diagnostic_codes::LOADER_PARAMETER_BY_REFERENCE,
        ]
    );
    assert!(player.dependency_loader_members.is_empty());
}

#[test]
fn loaders_keep_parameters_and_permit_nulls() {
    let source = game(
        r"
    class Audio { }
    partial class Player : IDependencyInjectionCandidate
    {
        [BackgroundDependencyLoader(true)]
        private void load(Audio audio, int count) { }

        [BackgroundDependencyLoader(permitNulls: false)]
        private void load(Audio audio) { }
    }
",
    );
    let output = analyze(&[source.as_str()]);
    let player = candidate(&output, "Game.Player");
    assert!(player.diagnostics.is_empty(), "{:?}", player.diagnostics);

    let loaders: Vec<_> = player.dependency_loader_members.iter().collect();
    assert_eq!(loaders.len(), 2);
    assert_eq!(
        loaders[0].key,
        SymbolKey::method("load", &["global::Game.Audio", "global::System.Int32"])
    );
    assert!(loaders[0].permit_nulls);
    let parameters: Vec<(&str, &str)> = loaders[0]
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.ty.as_str()))
        .collect();
    assert_eq!(
        parameters,
        [("audio", "global::Game.Audio"), ("count", "global::System.Int32")]
    );
    assert!(!loaders[1].permit_nulls);
}

// =============================================================================
// Duplicates
// =============================================================================

#[test]
fn members_declared_twice_across_fragments_are_reported() {
    let first = game(
        r"
    class Audio { }
    partial class Player : IDependencyInjectionCandidate
    {
        [Resolved] private Audio audio { get; set; }
    }
",
    );
    let second = game(
        r"
    partial class Player
    {
        [Cached] private Audio audio;
    }
",
    );
    let output = analyze(&[first.as_str(), second.as_str()]);
    let player = candidate(&output, "Game.Player");
    assert_eq!(codes(player), [diagnostic_codes::DUPLICATE_MEMBER]);
    let duplicate = &player.diagnostics[0];
    assert_eq!(duplicate.file, "file1.cs");
    assert_eq!(duplicate.related_information.len(), 1);
    assert_eq!(duplicate.related_information[0].file, "file0.cs");

    assert_eq!(player.resolved_members.len(), 1);
    assert!(player.cached_members.is_empty());
}

// =============================================================================
// Cached classes and interfaces
// =============================================================================

#[test]
fn only_cached_interfaces_of_a_cached_class_are_registered() {
    let source = game(
        r"
    [Cached]
    interface I1 { }
    interface I2 { }

    [Cached]
    partial class C : I1, I2 { }

    partial class Plain : I1, IDependencyInjectionCandidate { }
",
    );
    let output = analyze(&[source.as_str()]);
    let c = candidate(&output, "Game.C");
    assert!(c.is_cached_class());
    assert_eq!(
        names(c.cached_interfaces.iter(), |i| i.ty.as_str()),
        ["global::Game.I1"]
    );
    let class = c.cached_classes.iter().next().expect("cached class");
    assert_eq!(class.declaring, "global::Game.C");
    assert_eq!(class.registrations.len(), 1);
    assert_eq!(class.registrations[0].ty, "global::Game.C");

    let plain = candidate(&output, "Game.Plain");
    assert!(!plain.is_cached_class());
    assert!(plain.cached_interfaces.is_empty());
}

#[test]
fn cached_interface_named_by_two_fragments_is_one_element() {
    let first = game(
        r"
    interface IStore { }
    [Cached(typeof(IStore))]
    partial class Store : IStore { }
",
    );
    let second = game(
        r"
    [Cached(typeof(IStore))]
    partial class Store { }
",
    );
    let output = analyze(&[first.as_str(), second.as_str()]);
    let store = candidate(&output, "Game.Store");
    assert!(store.diagnostics.is_empty(), "{:?}", store.diagnostics);
    assert_eq!(store.cached_interfaces.len(), 1);
    assert_eq!(store.cached_classes.len(), 1);
    // Only interfaces were named, so the class itself is not registered.
    assert!(store.cached_classes.iter().all(|c| c.registrations.is_empty()));
}

#[test]
fn class_cache_must_name_an_implemented_type() {
    let source = game(
        r"
    interface IOther { }
    [Cached(typeof(IOther))]
    partial class Store : IDependencyInjectionCandidate { }
",
    );
    let output = analyze(&[source.as_str()]);
    let store = candidate(&output, "Game.Store");
    assert_eq!(codes(store), [diagnostic_codes::CACHED_TYPE_NOT_IMPLEMENTED]);
    assert!(!store.is_cached_class());
}

#[test]
fn class_level_caching_is_inherited_per_declaring_type() {
    let source = game(
        r"
    [Cached]
    partial class Screen : IDependencyInjectionCandidate { }

    [Cached]
    partial class GameScreen : Screen { }

    partial class MenuScreen : GameScreen { }
",
    );
    let output = analyze(&[source.as_str()]);

    let menu = candidate(&output, "Game.MenuScreen");
    assert_eq!(
        names(menu.cached_classes.iter(), |c| c.declaring.as_str()),
        ["global::Game.GameScreen", "global::Game.Screen"]
    );
    assert_eq!(menu.target.base.as_deref(), Some("global::Game.GameScreen"));

    let game_screen = candidate(&output, "Game.GameScreen");
    assert_eq!(
        names(game_screen.cached_classes.iter(), |c| c.declaring.as_str()),
        ["global::Game.GameScreen", "global::Game.Screen"]
    );
}

#[test]
fn class_and_member_caching_are_additive() {
    let source = game(
        r"
    class Audio { }
    [Cached]
    partial class Host : IDependencyInjectionCandidate
    {
        [Cached] private Audio audio;
    }
",
    );
    let output = analyze(&[source.as_str()]);
    let host = candidate(&output, "Game.Host");
    assert_eq!(host.cached_classes.len(), 1);
    assert_eq!(host.cached_members.len(), 1);
}

// =============================================================================
// Emission prerequisites and exclusion
// =============================================================================

#[test]
fn non_partial_declarations_are_warned_about() {
    let source = game(
        r"
    class Audio { }
    class Player : IDependencyInjectionCandidate
    {
        [Resolved] private Audio audio { get; set; }
    }

    class Outer
    {
        partial class Inner : IDependencyInjectionCandidate { }
    }
",
    );
    let output = analyze(&[source.as_str()]);

    let player = candidate(&output, "Game.Player");
    assert_eq!(codes(player), [diagnostic_codes::CANDIDATE_MUST_BE_PARTIAL]);
    assert!(!player.has_errors());
    assert!(!player.is_emittable());

    let inner = candidate(&output, "Game.Outer.Inner");
    assert_eq!(
        codes(inner),
        [diagnostic_codes::CONTAINING_TYPE_MUST_BE_PARTIAL]
    );
    assert_eq!(inner.target.containing.len(), 1);
    assert_eq!(inner.target.containing[0].name, "Outer");
    assert!(!inner.is_emittable());
}

#[test]
fn unresolvable_classes_are_excluded_without_a_candidate() {
    let source = game(
        r"
    class Audio { }
    partial class Broken : IDependencyInjectionCandidate
    {
        [Resolved] private Missing missing { get; set; }
    }
    partial class Fine : IDependencyInjectionCandidate
    {
        [Resolved] private Audio audio { get; set; }
    }
",
    );
    let output = analyze(&[source.as_str()]);
    assert!(output.candidate("Game.Broken").is_none());
    assert_eq!(output.excluded, [TypeKey::new("Game.Broken", 0, ASSEMBLY)]);
    assert!(output.candidate("Game.Fine").is_some());
    assert_eq!(output.stats.excluded, 1);
    assert_eq!(output.stats.candidates, 1);
    assert!(
        output
            .diagnostics
            .iter()
            .any(|d| d.code == diagnostic_codes::CANNOT_RESOLVE_TYPE)
    );
}

#[test]
fn candidates_and_diagnostics_are_in_declaration_order() {
    let first = game(
        r"
    partial class B : IDependencyInjectionCandidate { [Resolved] private B self { get; set; } }
    partial class A : IDependencyInjectionCandidate { [Resolved] private A self { get; set; } }
",
    );
    let second = game(
        r"
    partial class C : IDependencyInjectionCandidate { [Resolved] private C self { get; set; } }
",
    );
    let output = analyze(&[second.as_str(), first.as_str()]);
    let order: Vec<String> = output
        .candidates
        .iter()
        .map(|c| c.symbol.qualified_name.to_string())
        .collect();
    assert_eq!(order, ["Game.C", "Game.B", "Game.A"]);

    let files: Vec<&str> = output.diagnostics.iter().map(|d| d.file.as_str()).collect();
    assert_eq!(files, ["file0.cs", "file1.cs", "file1.cs"]);
}

#[test]
fn parallel_and_sequential_builds_agree() {
    let mut sources = Vec::new();
    for file in 0..6 {
        let mut body = String::from("    class Audio{file} { }\n");
        for class in 0..8 {
            body.push_str(&format!(
                "    partial class Node{file}_{class} : IDependencyInjectionCandidate\n    {{\n        [Resolved] private Audio{file} audio {{ get; set; }}\n        [Cached] private Audio{file} cached;\n        [Resolved] private readonly Audio{file} broken;\n        [BackgroundDependencyLoader] private void load(Audio{file} a) {{ }}\n    }}\n"
            ));
        }
        sources.push(game(&body.replace("{file}", &file.to_string())));
    }
    let sources: Vec<&str> = sources.iter().map(String::as_str).collect();

    let parallel = analyze_with(&sources, true);
    let sequential = analyze_with(&sources, false);

    assert_eq!(parallel.candidates.len(), 48);
    assert_eq!(parallel.stats, sequential.stats);
    assert_eq!(parallel.diagnostics, sequential.diagnostics);
    for (p, s) in parallel.candidates.iter().zip(&sequential.candidates) {
        assert_eq!(p.symbol, s.symbol);
        assert_eq!(p.shape(), s.shape());
        assert_eq!(p.diagnostics, s.diagnostics);
    }
}
