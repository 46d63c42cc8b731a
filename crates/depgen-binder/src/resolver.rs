//! Symbol resolver: maps an eligible class fragment to its semantic symbol and
//! resolves everything the candidate builder needs from it.
//!
//! Only dependency-injection relevant syntax is resolved: contract
//! attributes and their `typeof` arguments, the types of annotated members,
//! and loader signatures. Any failure excludes the class; attributes that do
//! not resolve at all are not contract attributes and are ignored.

use crate::lookup::ResolveContext;
use crate::state::SemanticModel;
use crate::symbols::Fragment;
use crate::type_key::TypeId;
use crate::type_ref::TypeRef;
use depgen_common::contract::FRAMEWORK_ASSEMBLY;
use depgen_common::{ContractAttribute, Diagnostic};
use depgen_parser::EligibleDeclaration;
use depgen_parser::ast::{Attribute, AttributeValue, MemberDecl, MemberKind, Parameter, TypeSyntax};
use std::sync::Arc;
use tracing::trace;

/// A contract attribute with its `typeof` arguments resolved.
#[derive(Clone, Debug)]
pub struct ResolvedAttribute<'a> {
    pub contract: ContractAttribute,
    pub syntax: &'a Attribute,
    /// Positional `typeof(T)` arguments and `Type = typeof(T)`, in order.
    pub types: Vec<TypeRef>,
}

#[derive(Clone, Debug)]
pub struct ResolvedParameter<'a> {
    pub syntax: &'a Parameter,
    pub ty: TypeRef,
}

/// A member carrying at least one contract attribute.
#[derive(Clone, Debug)]
pub struct ResolvedMember<'a> {
    pub decl: &'a MemberDecl,
    /// Field or property type, or method return type.
    pub ty: Option<TypeRef>,
    pub parameters: Vec<ResolvedParameter<'a>>,
    pub attributes: Vec<ResolvedAttribute<'a>>,
}

/// Everything resolved from one physical class declaration.
#[derive(Clone, Debug)]
pub struct ResolvedFragment<'a> {
    pub id: TypeId,
    pub fragment: Fragment<'a>,
    pub fragment_index: usize,
    pub self_type: TypeRef,
    pub class_attributes: Vec<ResolvedAttribute<'a>>,
    pub members: Vec<ResolvedMember<'a>>,
}

/// Class-level contract attribute declared on a base class.
#[derive(Clone, Debug)]
pub struct InheritedAttribute<'a> {
    /// The base class carrying the attribute, instantiated as seen from the
    /// derived class.
    pub declaring: TypeRef,
    pub attribute: ResolvedAttribute<'a>,
}

#[derive(Debug)]
pub enum FragmentResolution<'a> {
    Resolved(ResolvedFragment<'a>),
    /// The class resolved but takes no part in dependency injection.
    NotParticipating,
    /// Resolution failed. `diagnostics` holds the problems attributed to this
    /// fragment; other fragments of the same class report their own.
    Excluded {
        id: Option<TypeId>,
        diagnostics: Vec<Diagnostic>,
    },
}

/// Resolves eligible fragments against a finished [`SemanticModel`].
#[derive(Clone, Copy)]
pub struct SymbolResolver<'m, 'a> {
    model: &'m SemanticModel<'a>,
}

impl<'m, 'a> SymbolResolver<'m, 'a> {
    #[must_use]
    pub fn new(model: &'m SemanticModel<'a>) -> Self {
        Self { model }
    }

    #[must_use]
    pub fn model(&self) -> &'m SemanticModel<'a> {
        self.model
    }

    #[tracing::instrument(level = "trace", skip_all, fields(class = %eligible.decl.name.text))]
    pub fn resolve(&self, eligible: &EligibleDeclaration<'a>) -> FragmentResolution<'a> {
        let Some((id, index)) = self.model.fragment_at(eligible.syntax) else {
            return FragmentResolution::NotParticipating;
        };
        let symbol = self.model.symbol(id);
        if !self.model.is_in_generated_assembly(id) {
            return FragmentResolution::NotParticipating;
        }
        if !symbol.header_errors.is_empty() {
            let diagnostics = symbol
                .header_errors
                .iter()
                .filter(|(i, _)| *i == index)
                .map(|(_, d)| d.clone())
                .collect();
            return FragmentResolution::Excluded {
                id: Some(id),
                diagnostics,
            };
        }
        if !self.participates(id) {
            trace!(class = %symbol.key, "not a dependency injection participant");
            return FragmentResolution::NotParticipating;
        }

        let fragment = symbol.fragments[index];
        let file_name = &*fragment.file.file_name;
        let mut diagnostics = Vec::new();

        let class_ctx = ResolveContext::new(fragment.scope, symbol.containing);
        let class_attributes =
            self.contract_attributes(&fragment.decl.attributes, &class_ctx, file_name, &mut diagnostics);

        let member_ctx = ResolveContext::new(fragment.scope, Some(id));
        let mut members = Vec::new();
        for member in &fragment.decl.members {
            let attributes =
                self.contract_attributes(&member.attributes, &member_ctx, file_name, &mut diagnostics);
            if attributes.is_empty() {
                continue;
            }
            if let Some(resolved) =
                self.resolve_member(member, attributes, &member_ctx, file_name, &mut diagnostics)
            {
                members.push(resolved);
            }
        }

        if !diagnostics.is_empty() {
            return FragmentResolution::Excluded {
                id: Some(id),
                diagnostics,
            };
        }
        FragmentResolution::Resolved(ResolvedFragment {
            id,
            fragment,
            fragment_index: index,
            self_type: self.model.self_type(id),
            class_attributes,
            members,
        })
    }

    fn resolve_member(
        &self,
        member: &'a MemberDecl,
        attributes: Vec<ResolvedAttribute<'a>>,
        ctx: &ResolveContext<'_>,
        file_name: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<ResolvedMember<'a>> {
        let mut resolve = |syntax: &TypeSyntax, ctx: &ResolveContext<'_>| {
            match self.model.resolve_type(syntax, ctx) {
                Ok(ty) => Some(ty),
                Err(error) => {
                    diagnostics.push(error.to_diagnostic(file_name));
                    None
                }
            }
        };
        match &member.kind {
            MemberKind::Field { ty } | MemberKind::Property { ty, .. } => {
                let ty = resolve(ty, ctx)?;
                Some(ResolvedMember {
                    decl: member,
                    ty: Some(ty),
                    parameters: Vec::new(),
                    attributes,
                })
            }
            MemberKind::Method {
                return_type,
                type_parameters,
                parameters,
            } => {
                let method_params: Vec<Arc<str>> = type_parameters
                    .iter()
                    .map(|p| Arc::from(p.text.as_str()))
                    .collect();
                let method_ctx = ctx.with_type_parameters(&method_params);
                let return_type = resolve(return_type, &method_ctx);
                let resolved: Vec<ResolvedParameter<'a>> = parameters
                    .iter()
                    .filter_map(|p| {
                        resolve(&p.ty, &method_ctx).map(|ty| ResolvedParameter { syntax: p, ty })
                    })
                    .collect();
                if return_type.is_none() || resolved.len() != parameters.len() {
                    return None;
                }
                Some(ResolvedMember {
                    decl: member,
                    ty: return_type,
                    parameters: resolved,
                    attributes,
                })
            }
            // Invalid targets are diagnosed by the candidate builder.
            MemberKind::Constructor { .. } | MemberKind::Other { .. } => Some(ResolvedMember {
                decl: member,
                ty: None,
                parameters: Vec::new(),
                attributes,
            }),
        }
    }

    // =========================================================================
    // Contract attributes
    // =========================================================================

    /// The contract attribute `attribute` denotes, if any.
    #[must_use]
    pub fn contract_of(
        &self,
        attribute: &Attribute,
        ctx: &ResolveContext<'_>,
    ) -> Option<ContractAttribute> {
        let ty = self.model.resolve_attribute_type(&attribute.name, ctx).ok()?;
        let key = &self.model.symbol(ty.type_id()?).key;
        if &*key.assembly != FRAMEWORK_ASSEMBLY {
            return None;
        }
        ContractAttribute::from_qualified_name(&key.qualified_name)
    }

    /// Resolve the contract attributes among `attributes`. Failures to resolve
    /// a `typeof` argument are pushed to `diagnostics` and the attribute is
    /// dropped.
    fn contract_attributes(
        &self,
        attributes: &'a [Attribute],
        ctx: &ResolveContext<'_>,
        file_name: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ResolvedAttribute<'a>> {
        let mut out = Vec::new();
        for attribute in attributes {
            let Some(contract) = self.contract_of(attribute, ctx) else {
                continue;
            };
            let mut types = Vec::new();
            let mut failed = false;
            let type_arguments = attribute.arguments.iter().filter(|arg| {
                arg.name
                    .as_ref()
                    .is_none_or(|name| name.text.eq_ignore_ascii_case("type"))
            });
            for argument in type_arguments {
                if let AttributeValue::TypeOf(syntax) = &argument.value {
                    match self.model.resolve_type(syntax, ctx) {
                        Ok(ty) => types.push(ty),
                        Err(error) => {
                            diagnostics.push(error.to_diagnostic(file_name));
                            failed = true;
                        }
                    }
                }
            }
            if !failed {
                out.push(ResolvedAttribute {
                    contract,
                    syntax: attribute,
                    types,
                });
            }
        }
        out
    }

    fn declares_contract_attributes(&self, id: TypeId, fragment: &Fragment<'a>) -> bool {
        let symbol = self.model.symbol(id);
        let class_ctx = ResolveContext::new(fragment.scope, symbol.containing);
        let member_ctx = ResolveContext::new(fragment.scope, Some(id));
        fragment
            .decl
            .attributes
            .iter()
            .any(|a| self.contract_of(a, &class_ctx).is_some())
            || fragment.decl.members.iter().any(|member| {
                member
                    .attributes
                    .iter()
                    .any(|a| self.contract_of(a, &member_ctx).is_some())
            })
    }

    /// A class takes part in dependency injection when it implements the
    /// marker interface (directly or through a base type) or declares a
    /// contract attribute itself.
    #[must_use]
    pub fn participates(&self, id: TypeId) -> bool {
        let symbol = self.model.symbol(id);
        if !symbol.is_class() {
            return false;
        }
        self.model.implements_marker(id)
            || symbol
                .fragments
                .iter()
                .any(|f| self.declares_contract_attributes(id, f))
    }

    /// Class-level contract attributes declared on the base classes of `id`,
    /// nearest base first.
    #[must_use]
    pub fn inherited_class_attributes(&self, id: TypeId) -> Vec<InheritedAttribute<'a>> {
        let mut out = Vec::new();
        for base in self.model.base_chain(&self.model.self_type(id)) {
            let Some(base_id) = base.type_id() else {
                continue;
            };
            let base_symbol = self.model.symbol(base_id);
            let params = self.model.all_type_parameters(base_id);
            let args = match &base {
                TypeRef::Named { args, .. } => args.as_slice(),
                _ => &[],
            };
            for fragment in &base_symbol.fragments {
                let ctx = ResolveContext::new(fragment.scope, base_symbol.containing);
                let file_name = &*fragment.file.file_name;
                // Problems in the base's own attributes are reported for the base.
                let mut ignored = Vec::new();
                for mut attribute in
                    self.contract_attributes(&fragment.decl.attributes, &ctx, file_name, &mut ignored)
                {
                    for ty in &mut attribute.types {
                        *ty = ty.substitute(&params, args);
                    }
                    out.push(InheritedAttribute {
                        declaring: base.clone(),
                        attribute,
                    });
                }
            }
        }
        out
    }

    /// True when the interface declaration carries `[Cached]`.
    #[must_use]
    pub fn is_cached_interface(&self, iface: &TypeRef) -> bool {
        let Some(id) = iface.type_id() else {
            return false;
        };
        let symbol = self.model.symbol(id);
        symbol.is_interface()
            && symbol.fragments.iter().any(|fragment| {
                let ctx = ResolveContext::new(fragment.scope, symbol.containing);
                fragment
                    .decl
                    .attributes
                    .iter()
                    .any(|a| self.contract_of(a, &ctx) == Some(ContractAttribute::Cached))
            })
    }
}
