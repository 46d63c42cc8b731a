//! Base types: header binding, cycle detection, and inheritance queries.

use crate::lookup::{ResolveContext, TypeDisplay};
use crate::state::SemanticModel;
use crate::type_key::TypeId;
use crate::type_ref::TypeRef;
use depgen_common::diagnostics::diagnostic_codes;
use depgen_common::limits::MAX_BASE_CHAIN_DEPTH;
use depgen_common::{Diagnostic, Span};
use depgen_parser::ast::TypeDeclKind;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::trace;

/// Result of binding one type's declaration header.
struct BoundHeader {
    base_class: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    errors: Vec<(usize, Diagnostic)>,
}

impl<'a> SemanticModel<'a> {
    /// Resolve base lists of every type, outer declarations first.
    pub(crate) fn bind_headers(&mut self) {
        let mut order: Vec<TypeId> = self.symbols.iter().map(|(id, _)| id).collect();
        order.sort_by_key(|id| self.symbols[*id].depth);
        for id in order {
            let header = self.bind_header(id);
            if let Some(symbol) = self.symbols.get_mut(id) {
                symbol.base_class = header.base_class;
                symbol.interfaces = header.interfaces;
                symbol.header_errors.extend(header.errors);
            }
        }
    }

    fn bind_header(&self, id: TypeId) -> BoundHeader {
        let symbol = &self.symbols[id];
        let owner = symbol.key.to_string();
        let mut header = BoundHeader {
            base_class: None,
            interfaces: Vec::new(),
            errors: Vec::new(),
        };
        // Where the first base class came from, for conflict reporting.
        let mut base_origin: Option<(usize, Span)> = None;
        // `enum E : byte` names the underlying type, not a base.
        if matches!(symbol.kind, TypeDeclKind::Enum | TypeDeclKind::Delegate) {
            return header;
        }

        for (index, fragment) in symbol.fragments.iter().enumerate() {
            // Base lists see the type's own parameters but not its members.
            let ctx = ResolveContext::new(fragment.scope, symbol.containing)
                .with_type_parameters(&symbol.type_parameters);
            let file_name = &*fragment.file.file_name;
            for syntax in &fragment.decl.base_list {
                let ty = match self.resolve_type(syntax, &ctx) {
                    Ok(ty) => ty,
                    Err(error) => {
                        header
                            .errors
                            .push((index, error.to_base_diagnostic(file_name, &owner)));
                        continue;
                    }
                };
                let Some(target) = ty.type_id() else {
                    continue;
                };
                if self.symbols[target].is_interface() || !symbol.is_class() {
                    if !header.interfaces.contains(&ty) {
                        header.interfaces.push(ty);
                    }
                    continue;
                }
                if header.base_class.is_none() {
                    header.base_class = Some(ty);
                    base_origin = Some((index, syntax.span()));
                    continue;
                }
                if header.base_class.as_ref() != Some(&ty) {
                    let mut diagnostic = Diagnostic::from_code(
                        diagnostic_codes::CONFLICTING_PARTIAL_BASE_CLASSES,
                        file_name,
                        syntax.span(),
                        &[owner.as_str()],
                    );
                    if let Some((first, span)) = base_origin {
                        let first_file = &symbol.fragments[first].file.file_name;
                        diagnostic = diagnostic.with_related(
                            first_file,
                            span,
                            "The other base class is declared here.".to_string(),
                        );
                    }
                    header.errors.push((index, diagnostic));
                }
            }
        }
        header
    }

    /// Find base class cycles, report them, and cut them so every later walk
    /// terminates. Interface inheritance cycles are handled the same way.
    pub(crate) fn cut_base_cycles(&mut self) {
        let count = self.symbols.len();
        let mut in_cycle: FxHashSet<TypeId> = FxHashSet::default();

        // Base classes form chains: walk each chain once.
        let mut state = vec![0u8; count];
        for (start, _) in self.symbols.iter() {
            let mut path: Vec<TypeId> = Vec::new();
            let mut current = Some(start);
            while let Some(id) = current {
                match state[id.index()] {
                    2 => break,
                    1 => {
                        if let Some(pos) = path.iter().position(|p| *p == id) {
                            in_cycle.extend(path[pos..].iter().copied());
                        }
                        break;
                    }
                    _ => {}
                }
                state[id.index()] = 1;
                path.push(id);
                current = self.symbols[id]
                    .base_class
                    .as_ref()
                    .and_then(TypeRef::type_id);
            }
            for id in path {
                state[id.index()] = 2;
            }
        }

        // Interfaces form a graph: an interface is cyclic if it reaches itself.
        for (id, symbol) in self.symbols.iter() {
            if symbol.is_interface() && self.interface_reaches(id, id) {
                in_cycle.insert(id);
            }
        }

        let mut cyclic: Vec<TypeId> = in_cycle.into_iter().collect();
        cyclic.sort();
        for id in cyclic {
            let Some(symbol) = self.symbols.get_mut(id) else {
                continue;
            };
            trace!(ty = %symbol.key, "circular base type");
            let origin = symbol
                .fragments
                .iter()
                .enumerate()
                .find_map(|(i, f)| f.decl.base_list.first().map(|b| (i, f, b.span())));
            if let Some((index, fragment, span)) = origin {
                let diagnostic = Diagnostic::from_code(
                    diagnostic_codes::CIRCULAR_BASE_TYPE,
                    &fragment.file.file_name,
                    span,
                    &[symbol.key.to_string().as_str()],
                );
                symbol.header_errors.push((index, diagnostic));
            }
            if symbol.is_interface() {
                symbol.interfaces.clear();
            } else {
                symbol.base_class = None;
            }
        }
    }

    fn interface_reaches(&self, from: TypeId, target: TypeId) -> bool {
        let mut seen: FxHashSet<TypeId> = FxHashSet::default();
        let mut stack: Vec<TypeId> = self.symbols[from]
            .interfaces
            .iter()
            .filter_map(TypeRef::type_id)
            .collect();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if seen.insert(id) {
                stack.extend(self.symbols[id].interfaces.iter().filter_map(TypeRef::type_id));
            }
        }
        false
    }

    // =========================================================================
    // Inheritance queries
    // =========================================================================

    /// Type parameters of `id` including those of its containers, outermost
    /// first. This is the parameter list matching a `Named` instantiation.
    #[must_use]
    pub fn all_type_parameters(&self, id: TypeId) -> Vec<Arc<str>> {
        let symbol = &self.symbols[id];
        let mut params = symbol
            .containing
            .map(|outer| self.all_type_parameters(outer))
            .unwrap_or_default();
        params.extend(symbol.type_parameters.iter().cloned());
        params
    }

    /// The type as seen from inside its own declaration.
    #[must_use]
    pub fn self_type(&self, id: TypeId) -> TypeRef {
        TypeRef::Named {
            id,
            args: self
                .all_type_parameters(id)
                .into_iter()
                .map(TypeRef::TypeParameter)
                .collect(),
        }
    }

    fn instantiate(&self, declared: &TypeRef, owner: &TypeRef) -> TypeRef {
        match owner {
            TypeRef::Named { id, args } if !args.is_empty() => {
                declared.substitute(&self.all_type_parameters(*id), args)
            }
            _ => declared.clone(),
        }
    }

    /// Base class of an instantiated type, instantiated in turn.
    #[must_use]
    pub fn base_of(&self, ty: &TypeRef) -> Option<TypeRef> {
        let id = ty.type_id()?;
        let base = self.symbols[id].base_class.as_ref()?;
        Some(self.instantiate(base, ty))
    }

    /// Base classes of `ty`, nearest first. `System.Object` is included only
    /// when written explicitly.
    #[must_use]
    pub fn base_chain(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut chain = Vec::new();
        let mut current = self.base_of(ty);
        while let Some(base) = current {
            if chain.len() >= MAX_BASE_CHAIN_DEPTH || chain.contains(&base) {
                break;
            }
            current = self.base_of(&base);
            chain.push(base);
        }
        chain
    }

    /// Every interface implemented by `ty`: its own interfaces and theirs,
    /// then those of each base class. Deduplicated, in that order.
    #[must_use]
    pub fn all_interfaces(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut out: Vec<TypeRef> = Vec::new();
        let mut seen: FxHashSet<TypeRef> = FxHashSet::default();
        let mut owners = vec![ty.clone()];
        owners.extend(self.base_chain(ty));
        for owner in &owners {
            self.collect_interfaces(owner, &mut out, &mut seen);
        }
        out
    }

    fn collect_interfaces(
        &self,
        owner: &TypeRef,
        out: &mut Vec<TypeRef>,
        seen: &mut FxHashSet<TypeRef>,
    ) {
        let Some(id) = owner.type_id() else {
            return;
        };
        for declared in &self.symbols[id].interfaces {
            let iface = self.instantiate(declared, owner);
            if seen.insert(iface.clone()) {
                out.push(iface.clone());
                self.collect_interfaces(&iface, out, seen);
            }
        }
    }

    /// True when a value of type `from` can be published as `to`: same type,
    /// a base class, an implemented interface, or `System.Object`.
    #[must_use]
    pub fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        let from = from.without_nullable();
        let to = to.without_nullable();
        if from == to {
            return true;
        }
        if let (Some(object), Some(target)) = (self.object, to.type_id()) {
            if object == target {
                return true;
            }
        }
        if from.type_id().is_none() {
            return false;
        }
        self.base_chain(from).iter().any(|b| b == to)
            || self.all_interfaces(from).iter().any(|i| i == to)
    }

    /// True when `id` implements the marker interface, directly or through
    /// a base type.
    #[must_use]
    pub fn implements_marker(&self, id: TypeId) -> bool {
        let Some(marker) = self.marker else {
            return false;
        };
        self.all_interfaces(&self.self_type(id))
            .iter()
            .any(|i| i.type_id() == Some(marker))
    }

    /// Readable name of a type reference, for diagnostics.
    #[must_use]
    pub fn describe(&self, ty: &TypeRef) -> String {
        self.display_type(ty, TypeDisplay::Readable)
    }
}
