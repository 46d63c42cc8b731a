//! Per-fragment classification of members and class-level attributes.

use crate::builder::{CandidateBuilder, ClassCache, FragmentAnalysis};
use crate::candidate::{
    CacheRegistration, CachedMember, DeclarationRef, DependencyLoader, LoaderParameter,
    ResolvedMember, ValueMemberKind,
};
use crate::symbol_key::SymbolKey;
use depgen_binder::ResolvedMember as ResolvedSyntaxMember;
use depgen_binder::{ResolvedAttribute, ResolvedFragment, TypeDisplay, TypeRef};
use depgen_common::diagnostics::diagnostic_codes;
use depgen_common::{ContractAttribute, Diagnostic, Span};
use depgen_parser::ast::{
    Attribute, AttributeValue, MemberDecl, MemberKind, Modifiers, ParameterModifier,
};
use depgen_parser::{FileId, SyntaxRef};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::trace;

/// Shared context while classifying one fragment.
struct FragmentContext<'f> {
    file_name: &'f Arc<str>,
    file: FileId,
    self_type: &'f TypeRef,
    /// Readable class name for diagnostics.
    class_name: String,
    diagnostics: Vec<Diagnostic>,
}

impl FragmentContext<'_> {
    fn report(&mut self, code: u32, span: Span, args: &[&str]) {
        self.diagnostics
            .push(Diagnostic::from_code(code, self.file_name, span, args));
    }

    fn declaration(&self, span: Span, name_span: Span) -> DeclarationRef {
        DeclarationRef {
            syntax: SyntaxRef::new(self.file, span),
            file_name: Arc::clone(self.file_name),
            name_span,
        }
    }
}

impl<'a> CandidateBuilder<'_, 'a> {
    #[tracing::instrument(level = "trace", skip_all, fields(class = %fragment.fragment.decl.name.text))]
    pub(crate) fn classify_fragment(&self, fragment: &ResolvedFragment<'a>) -> FragmentAnalysis {
        let model = self.model();
        let decl = fragment.fragment.decl;
        let file = fragment.fragment.file;
        let mut ctx = FragmentContext {
            file_name: &file.file_name,
            file: file.id,
            self_type: &fragment.self_type,
            class_name: model.describe(&fragment.self_type),
            diagnostics: Vec::new(),
        };
        let mut analysis = FragmentAnalysis {
            declaration: ctx.declaration(decl.span, decl.name.span),
            resolved: Vec::new(),
            cached: Vec::new(),
            loaders: Vec::new(),
            class_caches: Vec::new(),
            diagnostics: Vec::new(),
        };

        for attribute in &fragment.class_attributes {
            self.classify_class_attribute(attribute, &decl.name.text, &mut ctx, &mut analysis);
        }
        for member in &fragment.members {
            self.classify_member(member, &mut ctx, &mut analysis);
        }

        analysis.diagnostics = ctx.diagnostics;
        trace!(
            resolved = analysis.resolved.len(),
            cached = analysis.cached.len(),
            loaders = analysis.loaders.len(),
            diagnostics = analysis.diagnostics.len(),
            "fragment classified"
        );
        analysis
    }

    // =========================================================================
    // Class-level attributes
    // =========================================================================

    fn classify_class_attribute(
        &self,
        attribute: &ResolvedAttribute<'a>,
        class_name: &str,
        ctx: &mut FragmentContext<'_>,
        analysis: &mut FragmentAnalysis,
    ) {
        let model = self.model();
        let syntax = attribute.syntax;
        if attribute.contract != ContractAttribute::Cached {
            ctx.report(
                diagnostic_codes::ATTRIBUTE_INVALID_TARGET,
                syntax.span,
                &[attribute.contract.short_name(), "class", class_name],
            );
            return;
        }
        let mut valid = true;
        for ty in &attribute.types {
            if !model.is_assignable(ctx.self_type, ty) {
                let cached = model.describe(ty);
                let class = ctx.class_name.clone();
                ctx.report(
                    diagnostic_codes::CACHED_TYPE_NOT_IMPLEMENTED,
                    syntax.span,
                    &[cached.as_str(), class.as_str()],
                );
                valid = false;
            }
        }
        if valid {
            analysis.class_caches.push(ClassCache {
                declaration: ctx.declaration(syntax.span, syntax.name.span()),
                types: attribute.types.clone(),
                name: string_argument(syntax, "Name"),
            });
        }
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn classify_member(
        &self,
        member: &ResolvedSyntaxMember<'a>,
        ctx: &mut FragmentContext<'_>,
        analysis: &mut FragmentAnalysis,
    ) {
        let decl = member.decl;
        let name = decl.name.text.as_str();

        let mut valid_targets = true;
        for attribute in &member.attributes {
            if !is_valid_target(attribute.contract, &decl.kind) {
                ctx.report(
                    diagnostic_codes::ATTRIBUTE_INVALID_TARGET,
                    attribute.syntax.span,
                    &[attribute.contract.short_name(), decl.kind_name(), name],
                );
                valid_targets = false;
            }
        }
        if !valid_targets {
            return;
        }
        if decl.is_static() {
            ctx.report(
                diagnostic_codes::STATIC_MEMBER_NOT_ALLOWED,
                decl.name.span,
                &[name],
            );
            return;
        }

        let resolved = member
            .attributes
            .iter()
            .find(|a| a.contract == ContractAttribute::Resolved);
        let cached: SmallVec<[&ResolvedAttribute<'a>; 1]> = member
            .attributes
            .iter()
            .filter(|a| a.contract == ContractAttribute::Cached)
            .collect();
        let loader = member
            .attributes
            .iter()
            .find(|a| a.contract == ContractAttribute::BackgroundDependencyLoader);

        match (&decl.kind, &member.ty) {
            (MemberKind::Field { .. } | MemberKind::Property { .. }, Some(ty)) => {
                let kind = if matches!(decl.kind, MemberKind::Field { .. }) {
                    ValueMemberKind::Field
                } else {
                    ValueMemberKind::Property
                };
                if resolved.is_some() && !cached.is_empty() {
                    ctx.report(
                        diagnostic_codes::MEMBER_RESOLVED_AND_CACHED,
                        decl.name.span,
                        &[name],
                    );
                    return;
                }
                if let Some(attribute) = resolved {
                    if let Some(entry) = self.resolved_member(decl, kind, ty, attribute, ctx) {
                        analysis.resolved.push(entry);
                    }
                } else if !cached.is_empty() {
                    if let Some(entry) = self.cached_member(decl, kind, ty, &cached, ctx) {
                        analysis.cached.push(entry);
                    }
                }
            }
            (MemberKind::Method { .. }, Some(_)) => {
                if let Some(attribute) = loader {
                    if let Some(entry) = self.dependency_loader(member, attribute, ctx) {
                        analysis.loaders.push(entry);
                    }
                }
            }
            _ => {}
        }
    }

    fn resolved_member(
        &self,
        decl: &MemberDecl,
        kind: ValueMemberKind,
        ty: &TypeRef,
        attribute: &ResolvedAttribute<'a>,
        ctx: &mut FragmentContext<'_>,
    ) -> Option<ResolvedMember> {
        let name = decl.name.text.as_str();
        match kind {
            ValueMemberKind::Field if decl.modifiers.contains(Modifiers::READONLY) => {
                ctx.report(diagnostic_codes::RESOLVED_FIELD_READONLY, decl.name.span, &[name]);
                return None;
            }
            ValueMemberKind::Property if !decl.has_setter() => {
                ctx.report(
                    diagnostic_codes::RESOLVED_PROPERTY_WITHOUT_SETTER,
                    decl.name.span,
                    &[name],
                );
                return None;
            }
            _ => {}
        }
        // A class cannot be its own dependency.
        if ty.without_nullable() == ctx.self_type {
            ctx.report(diagnostic_codes::RESOLVED_MEMBER_OF_OWN_TYPE, decl.name.span, &[name]);
            return None;
        }
        Some(ResolvedMember {
            key: SymbolKey::value_member(name),
            declaration: ctx.declaration(decl.span, decl.name.span),
            name: name.to_string(),
            kind,
            ty: self.model().display_type(ty, TypeDisplay::Code),
            dependency_name: string_argument(attribute.syntax, "Name"),
            can_be_null: bool_argument(attribute.syntax, "CanBeNull", false).unwrap_or(false),
        })
    }

    fn cached_member(
        &self,
        decl: &MemberDecl,
        kind: ValueMemberKind,
        ty: &TypeRef,
        attributes: &[&ResolvedAttribute<'a>],
        ctx: &mut FragmentContext<'_>,
    ) -> Option<CachedMember> {
        let model = self.model();
        let name = decl.name.text.as_str();
        let mut registrations: SmallVec<[CacheRegistration; 1]> = SmallVec::new();
        let mut valid = true;
        for attribute in attributes {
            let cache_name = string_argument(attribute.syntax, "Name");
            if attribute.types.is_empty() {
                push_unique(
                    &mut registrations,
                    CacheRegistration {
                        ty: model.display_type(ty, TypeDisplay::Code),
                        name: cache_name,
                    },
                );
                continue;
            }
            for cached_as in &attribute.types {
                if !model.is_assignable(ty, cached_as) {
                    let cached = model.describe(cached_as);
                    let member_type = model.describe(ty);
                    ctx.report(
                        diagnostic_codes::CACHED_TYPE_NOT_IMPLEMENTED,
                        attribute.syntax.span,
                        &[cached.as_str(), member_type.as_str()],
                    );
                    valid = false;
                    continue;
                }
                push_unique(
                    &mut registrations,
                    CacheRegistration {
                        ty: model.display_type(cached_as, TypeDisplay::Code),
                        name: cache_name.clone(),
                    },
                );
            }
        }
        if !valid {
            return None;
        }
        Some(CachedMember {
            key: SymbolKey::value_member(name),
            declaration: ctx.declaration(decl.span, decl.name.span),
            name: name.to_string(),
            kind,
            ty: model.display_type(ty, TypeDisplay::Code),
            registrations,
        })
    }

    fn dependency_loader(
        &self,
        member: &ResolvedSyntaxMember<'a>,
        attribute: &ResolvedAttribute<'a>,
        ctx: &mut FragmentContext<'_>,
    ) -> Option<DependencyLoader> {
        let model = self.model();
        let decl = member.decl;
        let name = decl.name.text.as_str();
        let MemberKind::Method {
            return_type,
            type_parameters,
            parameters,
        } = &decl.kind
        else {
            return None;
        };
        let mut valid = true;
        if !return_type.is_void() {
            ctx.report(diagnostic_codes::LOADER_MUST_RETURN_VOID, decl.name.span, &[name]);
            valid = false;
        }
        if !type_parameters.is_empty() {
            ctx.report(diagnostic_codes::LOADER_CANNOT_BE_GENERIC, decl.name.span, &[name]);
            valid = false;
        }
        for parameter in parameters {
            if matches!(
                parameter.modifier,
                ParameterModifier::Ref | ParameterModifier::Out | ParameterModifier::In
            ) {
                ctx.report(
                    diagnostic_codes::LOADER_PARAMETER_BY_REFERENCE,
                    parameter.span,
                    &[parameter.name.text.as_str(), name],
                );
                valid = false;
            }
        }
        if !valid {
            return None;
        }

        let parameters: Vec<LoaderParameter> = member
            .parameters
            .iter()
            .map(|p| LoaderParameter {
                name: p.syntax.name.text.clone(),
                ty: model.display_type(&p.ty, TypeDisplay::Code),
            })
            .collect();
        let parameter_types: Vec<&str> = parameters.iter().map(|p| p.ty.as_str()).collect();
        let permit_nulls = attribute
            .syntax
            .positional_arguments()
            .find_map(|arg| match arg.value {
                AttributeValue::Bool(value) => Some(value),
                _ => None,
            })
            .or_else(|| bool_argument(attribute.syntax, "PermitNulls", false))
            .unwrap_or(false);
        Some(DependencyLoader {
            key: SymbolKey::method(name, &parameter_types),
            declaration: ctx.declaration(decl.span, decl.name.span),
            name: name.to_string(),
            parameters,
            permit_nulls,
        })
    }
}

fn is_valid_target(contract: ContractAttribute, kind: &MemberKind) -> bool {
    match contract {
        ContractAttribute::Resolved | ContractAttribute::Cached => {
            matches!(kind, MemberKind::Field { .. } | MemberKind::Property { .. })
        }
        ContractAttribute::BackgroundDependencyLoader => matches!(kind, MemberKind::Method { .. }),
    }
}

fn push_unique(registrations: &mut SmallVec<[CacheRegistration; 1]>, entry: CacheRegistration) {
    if !registrations.contains(&entry) {
        registrations.push(entry);
    }
}

/// `Name = "..."` style string argument.
pub(crate) fn string_argument(attribute: &Attribute, name: &str) -> Option<String> {
    match &attribute.named_argument(name)?.value {
        AttributeValue::String(value) => Some(value.clone()),
        _ => None,
    }
}

/// `Name = true` style bool argument; `default` when present but not a literal.
fn bool_argument(attribute: &Attribute, name: &str, default: bool) -> Option<bool> {
    let argument = attribute.named_argument(name)?;
    Some(match argument.value {
        AttributeValue::Bool(value) => value,
        _ => default,
    })
}
