//! Folding the classified fragments of one class into a [`Candidate`].

use crate::builder::{CandidateBuilder, ClassCache, FragmentAnalysis, FragmentOutcome, FragmentResult, Folded};
use crate::builder_members::string_argument;
use crate::candidate::{
    CacheRegistration, CachedClass, CachedInterface, Candidate, DeclarationRef, EmitTarget,
    TypeHeader,
};
use crate::member_set::SetMember;
use crate::symbol_key::SymbolKey;
use depgen_binder::{TypeDisplay, TypeId, TypeKey, TypeRef, TypeSymbol};
use depgen_common::diagnostics::diagnostic_codes;
use depgen_common::{ContractAttribute, Diagnostic};
use depgen_parser::ast::{Modifiers, TypeDeclKind};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// Tracks every member key claimed so far to report duplicates across sets
/// and fragments.
struct MemberClaims<'c> {
    class_name: &'c str,
    claimed: FxHashMap<SymbolKey, DeclarationRef>,
}

impl MemberClaims<'_> {
    /// `true` when `key` was free. A second declaration of the same member is
    /// reported at the later declaration.
    fn claim(
        &mut self,
        key: &SymbolKey,
        name: &str,
        declaration: &DeclarationRef,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        match self.claimed.get(key) {
            None => {
                self.claimed.insert(key.clone(), declaration.clone());
                true
            }
            Some(first) => {
                diagnostics.push(
                    Diagnostic::from_code(
                        diagnostic_codes::DUPLICATE_MEMBER,
                        &declaration.file_name,
                        declaration.name_span,
                        &[name, self.class_name],
                    )
                    .with_related(
                        &first.file_name,
                        first.name_span,
                        format!("'{name}' is first declared here."),
                    ),
                );
                false
            }
        }
    }
}

impl<'a> CandidateBuilder<'_, 'a> {
    #[tracing::instrument(level = "debug", skip_all, fields(class = %key))]
    pub(crate) fn fold_class(&self, key: TypeKey, mut fragments: Vec<FragmentResult>) -> Folded {
        fragments.sort_by_key(|f| f.syntax);

        let excluded = fragments
            .iter()
            .any(|f| matches!(f.outcome, FragmentOutcome::Excluded(_)));
        let id = self.model().lookup_key(&key);
        let (Some(id), false) = (id, excluded) else {
            let diagnostics = fragments
                .into_iter()
                .flat_map(|f| match f.outcome {
                    FragmentOutcome::Excluded(diagnostics) => diagnostics,
                    FragmentOutcome::Analyzed(analysis) => analysis.diagnostics,
                })
                .collect();
            debug!("class excluded from generation");
            return Folded {
                key,
                candidate: None,
                diagnostics,
            };
        };

        let analyses: Vec<FragmentAnalysis> = fragments
            .into_iter()
            .filter_map(|f| match f.outcome {
                FragmentOutcome::Analyzed(analysis) => Some(analysis),
                FragmentOutcome::Excluded(_) => None,
            })
            .collect();
        let Some(first) = analyses.first().map(|a| a.declaration.clone()) else {
            return Folded {
                key,
                candidate: None,
                diagnostics: Vec::new(),
            };
        };

        let candidate = self.merge_fragments(id, key.clone(), first, analyses);
        Folded {
            key,
            candidate: Some(candidate),
            diagnostics: Vec::new(),
        }
    }

    fn merge_fragments(
        &self,
        id: TypeId,
        key: TypeKey,
        first: DeclarationRef,
        analyses: Vec<FragmentAnalysis>,
    ) -> Candidate {
        let model = self.model();
        let self_type = model.self_type(id);
        let self_code = model.display_type(&self_type, TypeDisplay::Code);
        let class_name = model.describe(&self_type);

        let mut candidate = Candidate::new(first, key, self.emit_target(id, &self_type));
        let mut diagnostics = Vec::new();
        let mut claims = MemberClaims {
            class_name: &class_name,
            claimed: FxHashMap::default(),
        };
        let mut class_caches: Vec<ClassCache> = Vec::new();

        // Fragments arrive in declaration order, so every set ends up in
        // declaration order as well.
        for analysis in analyses {
            diagnostics.extend(analysis.diagnostics);
            for member in analysis.resolved {
                if claims.claim(member.key(), &member.name, &member.declaration, &mut diagnostics) {
                    candidate.resolved_members.insert(member);
                }
            }
            for member in analysis.cached {
                if claims.claim(member.key(), &member.name, &member.declaration, &mut diagnostics) {
                    candidate.cached_members.insert(member);
                }
            }
            for loader in analysis.loaders {
                if claims.claim(loader.key(), &loader.name, &loader.declaration, &mut diagnostics) {
                    candidate.dependency_loader_members.insert(loader);
                }
            }
            class_caches.extend(analysis.class_caches);
        }

        self.collect_cached_classes(id, &self_type, &self_code, class_caches, &mut candidate);
        if candidate.is_cached_class() {
            for iface in model.all_interfaces(&self_type) {
                if self.resolver.is_cached_interface(&iface) {
                    insert_interface(&mut candidate, model.display_type(&iface, TypeDisplay::Code));
                }
            }
        }

        self.check_attachable(id, &candidate, &mut diagnostics);
        candidate.diagnostics = diagnostics;
        trace!(
            resolved = candidate.resolved_members.len(),
            cached = candidate.cached_members.len(),
            cached_classes = candidate.cached_classes.len(),
            cached_interfaces = candidate.cached_interfaces.len(),
            loaders = candidate.dependency_loader_members.len(),
            "candidate merged"
        );
        candidate
    }

    // =========================================================================
    // Cached classes and interfaces
    // =========================================================================

    fn collect_cached_classes(
        &self,
        id: TypeId,
        self_type: &TypeRef,
        self_code: &str,
        own: Vec<ClassCache>,
        candidate: &mut Candidate,
    ) {
        let model = self.model();

        if let Some(first) = own.first() {
            let declaration = first.declaration.clone();
            let mut registrations = Vec::new();
            for cache in &own {
                self.register_class_cache(
                    self_code,
                    &cache.types,
                    cache.name.clone(),
                    &mut registrations,
                    candidate,
                );
            }
            candidate.cached_classes.insert(CachedClass {
                key: SymbolKey::class(self_code),
                declaration,
                declaring: self_code.to_string(),
                registrations,
            });
        }

        // Nearest base first; one entry per declaring base class.
        let mut inherited: Vec<(TypeRef, Vec<CacheRegistration>)> = Vec::new();
        for entry in self.resolver.inherited_class_attributes(id) {
            if entry.attribute.contract != ContractAttribute::Cached {
                continue;
            }
            let declaring_code = model.display_type(&entry.declaring, TypeDisplay::Code);
            let position = match inherited.iter().position(|(ty, _)| *ty == entry.declaring) {
                Some(position) => position,
                None => {
                    inherited.push((entry.declaring.clone(), Vec::new()));
                    inherited.len() - 1
                }
            };
            let mut registrations = std::mem::take(&mut inherited[position].1);
            self.register_class_cache(
                &declaring_code,
                &entry.attribute.types,
                string_argument(entry.attribute.syntax, "Name"),
                &mut registrations,
                candidate,
            );
            inherited[position].1 = registrations;
        }
        for (declaring, registrations) in inherited {
            if declaring == *self_type {
                continue;
            }
            let declaring = model.display_type(&declaring, TypeDisplay::Code);
            candidate.cached_classes.insert(CachedClass {
                key: SymbolKey::class(&declaring),
                declaration: candidate.declaration.clone(),
                declaring,
                registrations,
            });
        }
    }

    /// Sort the types of one class-level `[Cached]` into class registrations
    /// and cached interfaces. Without types the instance is published as
    /// `default_type`.
    fn register_class_cache(
        &self,
        default_type: &str,
        types: &[TypeRef],
        name: Option<String>,
        registrations: &mut Vec<CacheRegistration>,
        candidate: &mut Candidate,
    ) {
        let model = self.model();
        if types.is_empty() {
            push_registration(registrations, default_type.to_string(), name);
            return;
        }
        for ty in types {
            let code = model.display_type(ty, TypeDisplay::Code);
            let is_interface = ty
                .type_id()
                .is_some_and(|id| model.symbol(id).is_interface());
            if is_interface {
                insert_interface(candidate, code);
            } else {
                push_registration(registrations, code, name.clone());
            }
        }
    }

    // =========================================================================
    // Emission target
    // =========================================================================

    fn emit_target(&self, id: TypeId, self_type: &TypeRef) -> EmitTarget {
        let model = self.model();
        let symbol = model.symbol(id);

        let mut containing = Vec::new();
        let mut outer = symbol.containing;
        while let Some(outer_id) = outer {
            let outer_symbol = model.symbol(outer_id);
            containing.push(type_header(outer_symbol));
            outer = outer_symbol.containing;
        }
        containing.reverse();

        let base = model
            .base_chain(self_type)
            .into_iter()
            .find(|base| base.type_id().is_some_and(|b| self.resolver.participates(b)))
            .map(|base| model.display_type(&base, TypeDisplay::Code));

        EmitTarget {
            namespace: symbol.namespace.to_string(),
            containing,
            class: type_header(symbol),
            is_sealed: symbol.modifiers.contains(Modifiers::SEALED),
            base,
        }
    }

    /// Generated code can only attach to partial declarations.
    fn check_attachable(&self, id: TypeId, candidate: &Candidate, diagnostics: &mut Vec<Diagnostic>) {
        let model = self.model();
        let declaration = &candidate.declaration;
        let class_name = model.describe(&model.self_type(id));
        if !candidate.target.class.is_partial {
            diagnostics.push(Diagnostic::from_code(
                diagnostic_codes::CANDIDATE_MUST_BE_PARTIAL,
                &declaration.file_name,
                declaration.name_span,
                &[class_name.as_str()],
            ));
        }
        let mut outer = model.symbol(id).containing;
        while let Some(outer_id) = outer {
            let outer_symbol = model.symbol(outer_id);
            if !outer_symbol.is_partial() {
                let outer_name = model.describe(&model.self_type(outer_id));
                diagnostics.push(Diagnostic::from_code(
                    diagnostic_codes::CONTAINING_TYPE_MUST_BE_PARTIAL,
                    &declaration.file_name,
                    declaration.name_span,
                    &[outer_name.as_str(), class_name.as_str()],
                ));
            }
            outer = outer_symbol.containing;
        }
    }
}

fn type_header(symbol: &TypeSymbol<'_>) -> TypeHeader {
    let is_record = symbol.fragments.iter().any(|f| f.decl.is_record);
    let keyword = match (is_record, symbol.kind) {
        (true, TypeDeclKind::Struct) => "record struct",
        (true, _) => "record",
        (false, kind) => kind.keyword(),
    };
    TypeHeader {
        keyword: keyword.to_string(),
        name: symbol.name.clone(),
        type_parameters: symbol.type_parameters.iter().map(|p| p.to_string()).collect(),
        is_partial: symbol.is_partial(),
    }
}

fn insert_interface(candidate: &mut Candidate, ty: String) {
    candidate.cached_interfaces.insert(CachedInterface {
        key: SymbolKey::interface(&ty),
        ty,
    });
}

fn push_registration(registrations: &mut Vec<CacheRegistration>, ty: String, name: Option<String>) {
    let registration = CacheRegistration { ty, name };
    if !registrations.contains(&registration) {
        registrations.push(registration);
    }
}
