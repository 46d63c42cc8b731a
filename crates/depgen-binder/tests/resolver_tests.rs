//! Tests for mapping eligible class fragments onto resolved symbols.

use depgen_binder::{
    BindUnit, FragmentResolution, ResolvedFragment, SemanticModel, SymbolResolver, TypeDisplay,
    TypeKey,
};
use depgen_common::ContractAttribute;
use depgen_common::diagnostics::diagnostic_codes;
use depgen_parser::{FileId, SourceFile, eligible_class_declarations, parse_source_file};

const ASSEMBLY: &str = "Game";

fn parse_all(sources: &[&str]) -> Vec<SourceFile> {
    sources
        .iter()
        .enumerate()
        .map(|(i, text)| parse_source_file(FileId(i as u32), format!("file{i}.cs"), *text))
        .collect()
}

fn build(files: &[SourceFile]) -> SemanticModel<'_> {
    SemanticModel::build(ASSEMBLY, files.iter().map(|f| BindUnit::new(f, ASSEMBLY)))
}

/// Resolve every eligible fragment, keyed by class name.
fn resolve_all<'a>(
    model: &SemanticModel<'a>,
    files: &'a [SourceFile],
) -> Vec<(String, FragmentResolution<'a>)> {
    let resolver = SymbolResolver::new(model);
    eligible_class_declarations(files)
        .map(|eligible| (eligible.decl.name.text.clone(), resolver.resolve(&eligible)))
        .collect()
}

fn resolved<'r, 'a>(
    results: &'r [(String, FragmentResolution<'a>)],
    name: &str,
) -> &'r ResolvedFragment<'a> {
    match results.iter().find(|(n, _)| n == name) {
        Some((_, FragmentResolution::Resolved(fragment))) => fragment,
        Some((_, other)) => panic!("{name}: expected resolved, got {other:?}"),
        None => panic!("{name}: not eligible"),
    }
}

const HEADER: &str = "using System;\nusing Framework.Allocation;\n";

#[test]
fn marker_interface_makes_a_class_participate() {
    let source = format!(
        "{HEADER}namespace Game {{ class Plain : Object {{ }} class Drawable : IDependencyInjectionCandidate {{ }} class Sprite : Drawable {{ }} }}"
    );
    let files = parse_all(&[source.as_str()]);
    let model = build(&files);
    let results = resolve_all(&model, &files);
    assert!(matches!(
        results.iter().find(|(n, _)| n == "Plain"),
        Some((_, FragmentResolution::NotParticipating))
    ));
    resolved(&results, "Drawable");
    let sprite = resolved(&results, "Sprite");
    assert!(sprite.members.is_empty());
    assert!(sprite.class_attributes.is_empty());
}

#[test]
fn contract_attributes_make_a_class_participate() {
    let source = format!(
        r"{HEADER}
namespace Game
{{
    class Audio {{ }}
    class Player
    {{
        [Resolved]
        private Audio audio {{ get; set; }}

        [BackgroundDependencyLoader]
        private void load(Audio audio, int count = 0) {{ }}
    }}
}}
"
    );
    let files = parse_all(&[source.as_str()]);
    let model = build(&files);
    let results = resolve_all(&model, &files);
    let player = resolved(&results, "Player");
    assert_eq!(player.members.len(), 2);

    let property = &player.members[0];
    assert_eq!(property.attributes[0].contract, ContractAttribute::Resolved);
    let ty = property.ty.as_ref().expect("property type");
    assert_eq!(model.display_type(ty, TypeDisplay::Code), "global::Game.Audio");

    let loader = &player.members[1];
    assert_eq!(
        loader.attributes[0].contract,
        ContractAttribute::BackgroundDependencyLoader
    );
    let parameters: Vec<String> = loader
        .parameters
        .iter()
        .map(|p| model.describe(&p.ty))
        .collect();
    assert_eq!(parameters, ["Game.Audio", "System.Int32"]);
    assert_eq!(model.describe(loader.ty.as_ref().expect("return")), "System.Void");
}

#[test]
fn lookalike_attributes_from_other_namespaces_are_ignored() {
    let files = parse_all(&[
        "using Fake;\nnamespace Game { class Lookalike { [Resolved] private int x; } }",
        "namespace Fake { class ResolvedAttribute : System.Attribute { } }",
    ]);
    let model = build(&files);
    let results = resolve_all(&model, &files);
    assert!(matches!(
        results.iter().find(|(n, _)| n == "Lookalike"),
        Some((_, FragmentResolution::NotParticipating))
    ));
}

#[test]
fn unresolvable_member_type_excludes_the_class() {
    let source = format!(
        "{HEADER}namespace Game {{ class Broken : IDependencyInjectionCandidate {{ [Resolved] private Missing missing {{ get; set; }} }} }}"
    );
    let files = parse_all(&[source.as_str()]);
    let model = build(&files);
    let results = resolve_all(&model, &files);
    let Some((_, FragmentResolution::Excluded { id, diagnostics })) =
        results.iter().find(|(n, _)| n == "Broken")
    else {
        panic!("expected exclusion");
    };
    assert!(id.is_some());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, diagnostic_codes::CANNOT_RESOLVE_TYPE);
    assert!(diagnostics[0].message_text.contains("Missing"));
}

#[test]
fn header_errors_are_attributed_to_their_fragment() {
    let files = parse_all(&[
        format!("{HEADER}namespace Game {{ partial class Split : IDependencyInjectionCandidate {{ }} }}").as_str(),
        "namespace Game { partial class Split : Nowhere { } }",
    ]);
    let model = build(&files);
    let results = resolve_all(&model, &files);
    let excluded: Vec<usize> = results
        .iter()
        .filter(|(n, _)| n == "Split")
        .map(|(_, r)| match r {
            FragmentResolution::Excluded { diagnostics, .. } => diagnostics.len(),
            other => panic!("expected exclusion, got {other:?}"),
        })
        .collect();
    assert_eq!(excluded, [0, 1]);
}

#[test]
fn typeof_arguments_are_resolved() {
    let source = format!(
        r#"{HEADER}
namespace Game
{{
    interface IStore {{ }}
    [Cached(typeof(IStore))]
    class Store : IStore, IDependencyInjectionCandidate
    {{
        [Cached(Type = typeof(IStore), Name = "main")]
        private Store self;
    }}
}}
"#
    );
    let files = parse_all(&[source.as_str()]);
    let model = build(&files);
    let results = resolve_all(&model, &files);
    let store = resolved(&results, "Store");
    let class_types: Vec<String> = store.class_attributes[0]
        .types
        .iter()
        .map(|t| model.describe(t))
        .collect();
    assert_eq!(class_types, ["Game.IStore"]);
    let member_types: Vec<String> = store.members[0].attributes[0]
        .types
        .iter()
        .map(|t| model.describe(t))
        .collect();
    assert_eq!(member_types, ["Game.IStore"]);
}

#[test]
fn inherited_class_attributes_are_instantiated() {
    let source = format!(
        r"{HEADER}
namespace Game
{{
    [Cached]
    class Box<T> : IDependencyInjectionCandidate {{ }}
    class IntBox : Box<int> {{ }}
}}
"
    );
    let files = parse_all(&[source.as_str()]);
    let model = build(&files);
    let resolver = SymbolResolver::new(&model);
    let id = model
        .lookup_key(&TypeKey::new("Game.IntBox", 0, ASSEMBLY))
        .expect("IntBox");
    let inherited = resolver.inherited_class_attributes(id);
    assert_eq!(inherited.len(), 1);
    assert_eq!(model.describe(&inherited[0].declaring), "Game.Box<System.Int32>");
    assert_eq!(inherited[0].attribute.contract, ContractAttribute::Cached);
    assert!(inherited[0].attribute.types.is_empty());
}

#[test]
fn cached_interfaces_are_recognized() {
    let source = format!(
        "{HEADER}namespace Game {{ [Cached] interface IClock {{ }} interface IOther {{ }} class Clock : IClock {{ }} }}"
    );
    let files = parse_all(&[source.as_str()]);
    let model = build(&files);
    let resolver = SymbolResolver::new(&model);
    let lookup = |name: &str| {
        model.self_type(
            model
                .lookup_key(&TypeKey::new(name, 0, ASSEMBLY))
                .expect("declared"),
        )
    };
    assert!(resolver.is_cached_interface(&lookup("Game.IClock")));
    assert!(!resolver.is_cached_interface(&lookup("Game.IOther")));
    assert!(!resolver.is_cached_interface(&lookup("Game.Clock")));
}

#[test]
fn referenced_assembly_classes_do_not_participate() {
    let reference = parse_source_file(
        FileId(0),
        "engine.cs",
        format!("{HEADER}namespace Engine {{ class Host : IDependencyInjectionCandidate {{ }} }}"),
    );
    let files = [reference];
    let model = SemanticModel::build(ASSEMBLY, [BindUnit::new(&files[0], "Engine")]);
    let results = resolve_all(&model, &files);
    assert!(matches!(
        results.as_slice(),
        [(_, FragmentResolution::NotParticipating)]
    ));
}
