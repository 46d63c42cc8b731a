//! Tests for declaration parsing and error recovery.

use depgen_common::diagnostics::diagnostic_codes;
use depgen_parser::ast::{
    AccessorKind, AttributeValue, MemberKind, Modifiers, NamespaceMember, ParameterModifier,
    TypeDecl, TypeDeclKind, TypeSyntax, UsingKind,
};
use depgen_parser::{FileId, SourceFile, parse_source_file};

fn parse(source: &str) -> SourceFile {
    parse_source_file(FileId(0), "test.cs", source)
}

fn first_type(file: &SourceFile) -> &TypeDecl {
    file.type_declarations().next().expect("a type declaration")
}

fn codes(file: &SourceFile) -> Vec<u32> {
    file.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn parse_namespace_usings_and_class_header() {
    let file = parse(
        "using System;\nusing Framework.Allocation;\n\nnamespace Game.Screens\n{\n    public partial class Player : Drawable, IDependencyInjectionCandidate\n    {\n    }\n}\n",
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    assert_eq!(file.body.usings.len(), 2);

    let NamespaceMember::Namespace(ns) = &file.body.members[0] else {
        panic!("expected namespace");
    };
    assert_eq!(ns.qualified_name(), "Game.Screens");
    assert!(!ns.file_scoped);

    let class = first_type(&file);
    assert_eq!(class.kind, TypeDeclKind::Class);
    assert_eq!(class.name.text, "Player");
    assert!(class.is_partial());
    assert!(class.modifiers.contains(Modifiers::PUBLIC));
    let bases: Vec<String> = class.base_list.iter().map(ToString::to_string).collect();
    assert_eq!(bases, ["Drawable", "IDependencyInjectionCandidate"]);
}

#[test]
fn parse_file_scoped_namespace_owns_following_types() {
    let file = parse("namespace Game;\n\nclass A {}\nclass B {}\n");
    let NamespaceMember::Namespace(ns) = &file.body.members[0] else {
        panic!("expected namespace");
    };
    assert!(ns.file_scoped);
    assert_eq!(ns.body.members.len(), 2);
    assert_eq!(file.type_declarations().count(), 2);
}

#[test]
fn parse_using_variants() {
    let file = parse("global using System;\nusing static System.Math;\nusing Col = System.Collections.Generic;\n");
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    let usings = &file.body.usings;
    assert!(usings[0].global);
    assert_eq!(usings[1].kind, UsingKind::Static);
    match &usings[2].kind {
        UsingKind::Alias(alias) => assert_eq!(alias.text, "Col"),
        other => panic!("expected alias, got {other:?}"),
    }
    assert_eq!(usings[2].target.to_string(), "System.Collections.Generic");
}

#[test]
fn parse_di_members() {
    let file = parse(
        r#"
partial class Player
{
    [Resolved]
    private AudioManager audio { get; set; } = null!;

    [Resolved(Name = "primary", CanBeNull = true)]
    private Storage storage;

    [Cached(typeof(IBindable<int>))]
    protected readonly Bindable<int> Score = new Bindable<int>(0), Combo;

    [BackgroundDependencyLoader(permitNulls: true)]
    private void load(TextureStore textures, [CanBeNull] GameHost host = null)
    {
        var s = "}";
        if (textures != null) { textures.Get("a"); }
    }

    public int Value => 42;
}
"#,
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    let class = first_type(&file);
    let names: Vec<&str> = class.members.iter().map(|m| m.name.text.as_str()).collect();
    assert_eq!(names, ["audio", "storage", "Score", "Combo", "load", "Value"]);

    let audio = &class.members[0];
    assert!(audio.has_setter());
    assert_eq!(audio.attributes[0].short_name(), "Resolved");

    let storage = &class.members[1];
    let name_arg = storage.attributes[0].named_argument("Name").expect("Name");
    assert_eq!(name_arg.value, AttributeValue::String("primary".to_string()));
    let nullable = storage.attributes[0].named_argument("CanBeNull").expect("CanBeNull");
    assert_eq!(nullable.value, AttributeValue::Bool(true));

    // Both declarators share the attribute list and the readonly modifier.
    for field in &class.members[2..4] {
        assert!(field.modifiers.contains(Modifiers::READONLY));
        let arg = field.attributes[0].positional_arguments().next().expect("typeof");
        let AttributeValue::TypeOf(ty) = &arg.value else {
            panic!("expected typeof");
        };
        assert_eq!(ty.to_string(), "IBindable<int>");
    }

    let MemberKind::Method {
        return_type,
        parameters,
        ..
    } = &class.members[4].kind
    else {
        panic!("expected method");
    };
    assert!(return_type.is_void());
    assert_eq!(parameters.len(), 2);
    assert!(parameters[1].has_default);
    assert_eq!(parameters[1].attributes[0].short_name(), "CanBeNull");
    let permit = class.members[4].attributes[0]
        .named_argument("PermitNulls")
        .expect("permitNulls matches either casing");
    assert_eq!(permit.value, AttributeValue::Bool(true));

    let MemberKind::Property { accessors, .. } = &class.members[5].kind else {
        panic!("expected property");
    };
    assert_eq!(accessors[0].kind, AccessorKind::Get);
}

#[test]
fn parse_generic_field_initializer_commas() {
    let file = parse(
        "class A { private Dictionary<int, string> map = new Dictionary<int, string>(), other; }",
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    let class = first_type(&file);
    let names: Vec<&str> = class.members.iter().map(|m| m.name.text.as_str()).collect();
    assert_eq!(names, ["map", "other"]);
}

#[test]
fn parse_property_accessor_kinds() {
    let file = parse("class A { public int X { get; private set; } public int Y { get; init; } }");
    let class = first_type(&file);
    assert!(class.members[0].has_setter());
    assert!(!class.members[1].has_setter());
    let MemberKind::Property { accessors, .. } = &class.members[0].kind else {
        panic!("expected property");
    };
    assert!(accessors[1].modifiers.contains(Modifiers::PRIVATE));
}

#[test]
fn parse_nested_generic_and_type_syntax() {
    let file = parse(
        "class Outer<T> where T : class, new() { class Inner : global::System.Collections.Generic.List<int[]> { } private (int a, string b)? pair; private T[,] grid; }",
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    let outer = first_type(&file);
    assert_eq!(outer.arity(), 1);
    assert_eq!(outer.nested.len(), 1);
    let inner = &outer.nested[0];
    assert_eq!(
        inner.base_list[0].to_string(),
        "global::System.Collections.Generic.List<int[]>"
    );
    let MemberKind::Field { ty } = &outer.members[0].kind else {
        panic!("expected field");
    };
    assert!(matches!(ty, TypeSyntax::Nullable { .. }));
    assert_eq!(ty.to_string(), "(int, string)?");
    let MemberKind::Field { ty } = &outer.members[1].kind else {
        panic!("expected field");
    };
    assert_eq!(ty.to_string(), "T[,]");
}

#[test]
fn parse_constructor_and_parameter_modifiers() {
    let file = parse(
        "class A : Base { public A(ref int x, out string y, in Foo z, params object[] rest) : base(x) { } void M(this A self) {} }",
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    let class = first_type(&file);
    let MemberKind::Constructor { parameters } = &class.members[0].kind else {
        panic!("expected constructor");
    };
    let modifiers: Vec<ParameterModifier> = parameters.iter().map(|p| p.modifier).collect();
    assert_eq!(
        modifiers,
        [
            ParameterModifier::Ref,
            ParameterModifier::Out,
            ParameterModifier::In,
            ParameterModifier::Params
        ]
    );
}

#[test]
fn parse_explicit_interface_members_and_others() {
    let file = parse(
        "class A : IFoo<int> { void IFoo<int>.Run() {} int IFoo<int>.this[int i] => i; public event Action Changed; public static A operator +(A a, A b) => a; ~A() {} }",
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    let class = first_type(&file);
    assert_eq!(class.members[0].name.text, "Run");
    assert_eq!(
        class.members[0]
            .explicit_interface
            .as_ref()
            .map(ToString::to_string)
            .as_deref(),
        Some("IFoo<int>")
    );
    let kinds: Vec<&str> = class.members.iter().map(|m| m.kind_name()).collect();
    assert_eq!(kinds, ["method", "indexer", "event", "operator", "destructor"]);
}

#[test]
fn parse_records_enums_and_delegates() {
    let file = parse(
        "public record Point(int X, int Y); public record class Named : Base { } enum Color { Red, Green = 2 } delegate void Handler(int x); interface IThing { void Do(); }",
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    let kinds: Vec<(TypeDeclKind, &str)> = file
        .type_declarations()
        .map(|d| (d.kind, d.name.text.as_str()))
        .collect();
    assert_eq!(
        kinds,
        [
            (TypeDeclKind::Class, "Point"),
            (TypeDeclKind::Class, "Named"),
            (TypeDeclKind::Enum, "Color"),
            (TypeDeclKind::Delegate, "Handler"),
            (TypeDeclKind::Interface, "IThing"),
        ]
    );
}

#[test]
fn parse_skips_bodies_containing_strings_with_braces() {
    let file = parse(
        r#"class A { void M() { var a = $"{x} }} {(y ? "}" : "{")}"; var b = @"}"; var c = """ { """; } [Resolved] private Foo foo; }"#,
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    let class = first_type(&file);
    assert_eq!(class.members.len(), 2);
    assert_eq!(class.members[1].name.text, "foo");
}

#[test]
fn parse_recovers_from_malformed_member() {
    let file = parse("class A { int = 5; [Resolved] private Foo ok; }\nclass B {}");
    assert!(!file.diagnostics.is_empty());
    assert!(codes(&file).contains(&diagnostic_codes::TOKEN_EXPECTED));
    let class = first_type(&file);
    assert!(class.members.iter().any(|m| m.name.text == "ok"));
    assert_eq!(file.type_declarations().count(), 2);
}

#[test]
fn parse_reports_stray_close_brace_and_continues() {
    let file = parse("}\nclass A {}");
    assert_eq!(codes(&file), [diagnostic_codes::UNEXPECTED_TOKEN]);
    assert_eq!(file.type_declarations().count(), 1);
}

#[test]
fn parse_reports_missing_close_brace_at_end_of_file() {
    let file = parse("class A { [Resolved] private Foo foo;");
    assert!(codes(&file).contains(&diagnostic_codes::TOKEN_EXPECTED));
    assert_eq!(first_type(&file).members.len(), 1);
}

#[test]
fn parse_surfaces_scanner_diagnostics() {
    let file = parse("class A { string s = \"open\n; }");
    assert!(codes(&file).contains(&diagnostic_codes::UNTERMINATED_STRING_LITERAL));
}

#[test]
fn parse_preprocessor_directives_are_ignored() {
    let file = parse("#nullable enable\n#region Fields\nclass A {\n#if DEBUG\n[Resolved] private Foo foo;\n#endif\n}\n#endregion\n");
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    assert_eq!(first_type(&file).members.len(), 1);
}

#[test]
fn parse_assembly_attributes_are_skipped() {
    let file = parse("[assembly: InternalsVisibleTo(\"Tests\")]\nclass A {}");
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    assert_eq!(file.type_declarations().count(), 1);
}

#[test]
fn parse_deep_nesting_is_cut_off() {
    let depth = depgen_common::limits::MAX_DECLARATION_NESTING + 2;
    let mut source = String::new();
    for i in 0..depth {
        source.push_str(&format!("class C{i} {{ "));
    }
    for _ in 0..depth {
        source.push_str("} ");
    }
    let file = parse(&source);
    assert!(codes(&file).contains(&diagnostic_codes::DECLARATION_NESTING_TOO_DEEP));
}

fn nested_generic_field(levels: usize) -> String {
    format!(
        "class A {{ private {}int{} x; }}",
        "L<".repeat(levels),
        ">".repeat(levels)
    )
}

#[test]
fn parse_deep_type_arguments_are_cut_off() {
    let limit = depgen_common::limits::MAX_TYPE_ARGUMENT_DEPTH;

    let file = parse(&nested_generic_field(limit));
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    assert_eq!(first_type(&file).members.len(), 1);

    let file = parse(&nested_generic_field(limit + 2));
    assert!(!file.diagnostics.is_empty());
    assert_eq!(first_type(&file).name.text, "A");
}
