//! Syntactic pre-filter for dependency injection candidates.
//!
//! Runs before any symbol is resolved, so it can only look at spelling: a
//! class is plausible when it has a base list (it may inherit participation or
//! implement the marker interface) or when it or one of its members carries
//! an attribute spelled like a contract attribute. A `using X = ...` alias
//! anywhere in the file set can rename a contract attribute, so attributes
//! spelled with an alias name are plausible too. False positives are dropped
//! by the resolver; this filter must never reject a real candidate.

use crate::ast::{
    Attribute, Modifiers, NamespaceBody, NamespaceMember, SourceFile, SyntaxRef, TypeDecl,
    TypeDeclKind, UsingKind,
};
use depgen_common::ContractAttribute;

/// A class declaration fragment that passed the syntactic filter.
#[derive(Clone, Copy, Debug)]
pub struct EligibleDeclaration<'a> {
    pub file: &'a SourceFile,
    pub decl: &'a TypeDecl,
    pub syntax: SyntaxRef,
}

/// Walk `files` and yield plausible candidate class fragments in file
/// order, outer declarations before nested ones. Pure and restartable.
pub fn eligible_class_declarations<'a, I>(files: I) -> impl Iterator<Item = EligibleDeclaration<'a>>
where
    I: IntoIterator<Item = &'a SourceFile>,
{
    let files: Vec<&'a SourceFile> = files.into_iter().collect();
    // Global aliases cross file boundaries, so names from every file count.
    let aliases = AliasNames::collect(files.iter().copied());
    files.into_iter().flat_map(move |file| {
        let aliases = aliases.clone();
        file.type_declarations()
            .filter(move |decl| is_plausible_candidate_with(decl, &aliases))
            .map(move |decl| EligibleDeclaration {
                file,
                decl,
                syntax: file.syntax_ref(decl.span),
            })
    })
}

/// Plausibility of a single declaration, without any `using` aliases in scope.
#[must_use]
pub fn is_plausible_candidate(decl: &TypeDecl) -> bool {
    is_plausible_candidate_with(decl, &AliasNames::default())
}

fn is_plausible_candidate_with(decl: &TypeDecl, aliases: &AliasNames<'_>) -> bool {
    if decl.kind != TypeDeclKind::Class || decl.modifiers.contains(Modifiers::STATIC) {
        return false;
    }
    let plausible = |attribute: &Attribute| {
        is_contract_attribute_spelling(attribute) || aliases.spells(attribute)
    };
    !decl.base_list.is_empty()
        || decl.attributes.iter().any(plausible)
        || decl
            .members
            .iter()
            .any(|member| member.attributes.iter().any(plausible))
}

/// `Resolved`, `ResolvedAttribute`, `Framework.Allocation.Resolved`, ...
#[must_use]
pub fn is_contract_attribute_spelling(attribute: &Attribute) -> bool {
    let name = attribute.short_name();
    ContractAttribute::ALL
        .iter()
        .any(|contract| contract.short_name() == name)
}

/// Sorted alias names declared by `using X = ...` directives.
#[derive(Clone, Debug, Default)]
struct AliasNames<'a>(Vec<&'a str>);

impl<'a> AliasNames<'a> {
    fn collect(files: impl Iterator<Item = &'a SourceFile>) -> Self {
        let mut names = Vec::new();
        let mut bodies: Vec<&'a NamespaceBody> = files.map(|file| &file.body).collect();
        while let Some(body) = bodies.pop() {
            names.extend(body.usings.iter().filter_map(|using| match &using.kind {
                UsingKind::Alias(alias) => Some(alias.text.as_str()),
                UsingKind::Namespace | UsingKind::Static => None,
            }));
            bodies.extend(body.members.iter().filter_map(|member| match member {
                NamespaceMember::Namespace(ns) => Some(&ns.body),
                NamespaceMember::Type(_) => None,
            }));
        }
        names.sort_unstable();
        names.dedup();
        Self(names)
    }

    /// `[R]` or `[RAttribute]` under `using R = ...;`.
    fn spells(&self, attribute: &Attribute) -> bool {
        if self.0.is_empty() {
            return false;
        }
        let full = attribute.name.simple_name().unwrap_or("");
        [full, attribute.short_name()]
            .iter()
            .any(|name| self.0.binary_search_by(|alias| (*alias).cmp(*name)).is_ok())
    }
}
