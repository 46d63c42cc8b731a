//! Type name lookup.
//!
//! Simple names are searched in this order, first hit wins:
//! 1. type parameters of the enclosing method and types,
//! 2. nested types of the enclosing types and of their base classes,
//! 3. each enclosing namespace from the innermost outwards: types declared in
//!    the namespace, then the aliases and usings of the namespace declaration,
//! 4. the global namespace, then the file's usings (including global usings).
//!
//! Several matches through using directives of one declaration are ambiguous.

use crate::errors::{ResolutionError, ResolutionResult};
use crate::state::{SemanticModel, join_namespace, namespace_name};
use crate::symbols::ScopeId;
use crate::type_key::TypeId;
use crate::type_ref::TypeRef;
use depgen_common::Span;
use depgen_common::limits::MAX_BASE_CHAIN_DEPTH;
use depgen_parser::ast::{NameSegment, TypeSyntax};
use smallvec::SmallVec;
use std::sync::Arc;

/// Where a type name is written.
#[derive(Clone, Copy, Debug)]
pub struct ResolveContext<'c> {
    pub scope: ScopeId,
    /// Innermost enclosing type, if any.
    pub type_context: Option<TypeId>,
    /// Type parameters in scope besides those of `type_context` and its
    /// containers (method type parameters, or a type's own parameters while
    /// its base list is bound).
    pub type_parameters: &'c [Arc<str>],
}

impl<'c> ResolveContext<'c> {
    #[must_use]
    pub fn new(scope: ScopeId, type_context: Option<TypeId>) -> Self {
        Self {
            scope,
            type_context,
            type_parameters: &[],
        }
    }

    #[must_use]
    pub fn with_type_parameters(mut self, type_parameters: &'c [Arc<str>]) -> Self {
        self.type_parameters = type_parameters;
        self
    }
}

/// Display flavor for [`SemanticModel::display_type`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeDisplay {
    /// `global::`-qualified, for generated code.
    Code,
    /// Namespace-qualified without `global::`, for diagnostics.
    Readable,
}

impl SemanticModel<'_> {
    /// Resolve written type syntax to a [`TypeRef`].
    pub fn resolve_type(
        &self,
        syntax: &TypeSyntax,
        ctx: &ResolveContext<'_>,
    ) -> ResolutionResult<TypeRef> {
        match syntax {
            TypeSyntax::Predefined { keyword, span } => {
                let name = format!("System.{}", keyword.system_name());
                self.top_level_type(&name, 0)
                    .map(TypeRef::named)
                    .ok_or_else(|| not_found(syntax, *span))
            }
            TypeSyntax::Array { element, rank, .. } => Ok(TypeRef::Array {
                element: Box::new(self.resolve_type(element, ctx)?),
                rank: *rank,
            }),
            TypeSyntax::Nullable { inner, .. } => {
                Ok(TypeRef::Nullable(Box::new(self.resolve_type(inner, ctx)?)))
            }
            TypeSyntax::Pointer { inner, .. } => {
                Ok(TypeRef::Pointer(Box::new(self.resolve_type(inner, ctx)?)))
            }
            TypeSyntax::Tuple { elements, .. } => elements
                .iter()
                .map(|e| self.resolve_type(e, ctx))
                .collect::<ResolutionResult<Vec<_>>>()
                .map(TypeRef::Tuple),
            TypeSyntax::Named {
                global,
                alias,
                segments,
                span,
            } => {
                let args = segments
                    .iter()
                    .map(|segment| {
                        segment
                            .type_arguments
                            .iter()
                            .map(|a| self.resolve_type(a, ctx))
                            .collect::<ResolutionResult<Vec<_>>>()
                    })
                    .collect::<ResolutionResult<Vec<_>>>()?;
                let found = if *global {
                    self.resolve_in_namespace("", segments, &args)
                } else if let Some(alias) = alias {
                    self.alias_namespace(&alias.text, ctx.scope)
                        .and_then(|ns| self.resolve_in_namespace(&ns, segments, &args))
                } else {
                    self.resolve_unqualified(segments, &args, ctx, *span)?
                };
                found.ok_or_else(|| not_found(syntax, *span))
            }
        }
    }

    /// Resolve an attribute name, trying the `Attribute` suffix first.
    pub fn resolve_attribute_type(
        &self,
        syntax: &TypeSyntax,
        ctx: &ResolveContext<'_>,
    ) -> ResolutionResult<TypeRef> {
        if let TypeSyntax::Named {
            global,
            alias,
            segments,
            span,
        } = syntax
        {
            if let Some(last) = segments.last() {
                if !last.name.text.ends_with("Attribute") {
                    let mut suffixed = segments.clone();
                    if let Some(last) = suffixed.last_mut() {
                        last.name.text.push_str("Attribute");
                    }
                    let suffixed = TypeSyntax::Named {
                        global: *global,
                        alias: alias.clone(),
                        segments: suffixed,
                        span: *span,
                    };
                    if let Ok(found) = self.resolve_type(&suffixed, ctx) {
                        return Ok(found);
                    }
                }
            }
        }
        self.resolve_type(syntax, ctx)
    }

    fn resolve_unqualified(
        &self,
        segments: &[NameSegment],
        args: &[Vec<TypeRef>],
        ctx: &ResolveContext<'_>,
        span: Span,
    ) -> ResolutionResult<Option<TypeRef>> {
        let Some(first) = segments.first() else {
            return Ok(None);
        };
        if let Some(head) = self.lookup_simple(&first.name.text, &args[0], ctx, span)? {
            return Ok(self.walk_nested(head, &segments[1..], &args[1..]));
        }
        if segments.len() == 1 {
            return Ok(None);
        }
        // `A.B.C` where `A` is a namespace or a namespace alias.
        if let Some(ns) = self.alias_namespace(&first.name.text, ctx.scope) {
            if let Some(found) = self.resolve_in_namespace(&ns, &segments[1..], &args[1..]) {
                return Ok(Some(found));
            }
        }
        let mut scope = Some(ctx.scope);
        while let Some(id) = scope {
            let current = self.scope(id);
            let stop = current
                .parent
                .map(|p| self.scope(p).namespace.len())
                .unwrap_or(0);
            let mut namespace: &str = &current.namespace;
            loop {
                if let Some(found) = self.resolve_in_namespace(namespace, segments, args) {
                    return Ok(Some(found));
                }
                if namespace.len() <= stop {
                    break;
                }
                namespace = parent_namespace(namespace);
            }
            scope = current.parent;
        }
        Ok(None)
    }

    /// Look up the first segment of a name. `Ok(None)` means "not a type".
    fn lookup_simple(
        &self,
        name: &str,
        args: &[TypeRef],
        ctx: &ResolveContext<'_>,
        span: Span,
    ) -> ResolutionResult<Option<TypeRef>> {
        let arity = u16::try_from(args.len()).unwrap_or(u16::MAX);
        if arity == 0 && ctx.type_parameters.iter().any(|p| &**p == name) {
            return Ok(Some(TypeRef::TypeParameter(Arc::from(name))));
        }

        let mut current = ctx.type_context;
        while let Some(id) = current {
            let symbol = &self.symbols[id];
            if arity == 0 && symbol.type_parameters.iter().any(|p| &**p == name) {
                return Ok(Some(TypeRef::TypeParameter(Arc::from(name))));
            }
            if let Some(found) = self.find_nested(&self.self_type(id), name, args) {
                return Ok(Some(found));
            }
            current = symbol.containing;
        }

        let mut scope = Some(ctx.scope);
        while let Some(id) = scope {
            let current = self.scope(id);
            let stop = current
                .parent
                .map(|p| self.scope(p).namespace.len())
                .unwrap_or(0);

            if let Some(found) = self.top_level_type(&join_namespace(&current.namespace, name), arity) {
                return Ok(Some(TypeRef::Named {
                    id: found,
                    args: args.to_vec(),
                }));
            }
            if let Some(found) = self.lookup_imports(id, name, args, span)? {
                return Ok(Some(found));
            }
            // `namespace A.B.C { }` also opens `A.B` and `A` without usings.
            let mut namespace: &str = &current.namespace;
            while namespace.len() > stop {
                namespace = parent_namespace(namespace);
                if let Some(found) = self.top_level_type(&join_namespace(namespace, name), arity) {
                    return Ok(Some(TypeRef::Named {
                        id: found,
                        args: args.to_vec(),
                    }));
                }
            }
            scope = current.parent;
        }
        Ok(None)
    }

    /// Aliases and using directives of one scope.
    fn lookup_imports(
        &self,
        scope_id: ScopeId,
        name: &str,
        args: &[TypeRef],
        span: Span,
    ) -> ResolutionResult<Option<TypeRef>> {
        let scope = self.scope(scope_id);
        let arity = u16::try_from(args.len()).unwrap_or(u16::MAX);
        let globals = scope
            .is_file_root
            .then(|| self.global_usings.get(&scope.assembly))
            .flatten();

        if arity == 0 {
            let alias = scope
                .aliases
                .get(name)
                .or_else(|| globals.and_then(|g| g.aliases.get(name)));
            if let Some(target) = alias {
                if let Ok(found) = self.resolve_alias_target(target) {
                    return Ok(Some(found));
                }
            }
        }

        let namespaces = scope
            .usings
            .iter()
            .chain(globals.into_iter().flat_map(|g| g.namespaces.iter()));
        let mut matches: SmallVec<[TypeId; 2]> = SmallVec::new();
        for namespace in namespaces {
            if let Some(found) = self.top_level_type(&join_namespace(namespace, name), arity) {
                if !matches.contains(&found) {
                    matches.push(found);
                }
            }
        }
        match matches.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(TypeRef::Named {
                id: *single,
                args: args.to_vec(),
            })),
            many => {
                let candidates = many
                    .iter()
                    .map(|id| format!("'{}'", self.symbols[*id].key.qualified_name))
                    .collect::<Vec<_>>()
                    .join(" and ");
                Err(ResolutionError::Ambiguous {
                    name: name.to_string(),
                    candidates,
                    span,
                })
            }
        }
    }

    /// Alias targets are always fully qualified.
    fn resolve_alias_target(&self, target: &TypeSyntax) -> ResolutionResult<TypeRef> {
        let root = ResolveContext::new(ScopeId(0), None);
        match target {
            TypeSyntax::Named { segments, span, .. } => {
                let args = segments
                    .iter()
                    .map(|segment| {
                        segment
                            .type_arguments
                            .iter()
                            .map(|a| self.resolve_alias_argument(a, &root))
                            .collect::<ResolutionResult<Vec<_>>>()
                    })
                    .collect::<ResolutionResult<Vec<_>>>()?;
                self.resolve_in_namespace("", segments, &args)
                    .ok_or_else(|| not_found(target, *span))
            }
            other => self.resolve_alias_argument(other, &root),
        }
    }

    fn resolve_alias_argument(
        &self,
        syntax: &TypeSyntax,
        root: &ResolveContext<'_>,
    ) -> ResolutionResult<TypeRef> {
        match syntax {
            TypeSyntax::Named { .. } => self.resolve_alias_target(syntax),
            _ => self.resolve_type(syntax, root),
        }
    }

    /// Namespace named by an alias visible from `scope`, if the alias targets a
    /// namespace.
    fn alias_namespace(&self, alias: &str, scope: ScopeId) -> Option<String> {
        if alias == "global" {
            return Some(String::new());
        }
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scope(id);
            let globals = s
                .is_file_root
                .then(|| self.global_usings.get(&s.assembly))
                .flatten();
            let target = s
                .aliases
                .get(alias)
                .or_else(|| globals.and_then(|g| g.aliases.get(alias)));
            if let Some(target) = target {
                return namespace_name(target).filter(|ns| self.namespaces.contains(ns.as_str()));
            }
            current = s.parent;
        }
        None
    }

    /// Resolve `segments` as a name qualified by `namespace`. Leading segments
    /// may extend the namespace; the rest are nested types.
    fn resolve_in_namespace(
        &self,
        namespace: &str,
        segments: &[NameSegment],
        args: &[Vec<TypeRef>],
    ) -> Option<TypeRef> {
        let mut prefix = namespace.to_string();
        for (split, segment) in segments.iter().enumerate() {
            let arity = u16::try_from(args[split].len()).unwrap_or(u16::MAX);
            let full = join_namespace(&prefix, &segment.name.text);
            if let Some(id) = self.top_level_type(&full, arity) {
                let head = TypeRef::Named {
                    id,
                    args: args[split].clone(),
                };
                if let Some(found) =
                    self.walk_nested(head, &segments[split + 1..], &args[split + 1..])
                {
                    return Some(found);
                }
            }
            if !self.namespaces.contains(full.as_str()) {
                return None;
            }
            prefix = full;
        }
        None
    }

    fn walk_nested(
        &self,
        head: TypeRef,
        segments: &[NameSegment],
        args: &[Vec<TypeRef>],
    ) -> Option<TypeRef> {
        let mut current = head;
        for (segment, own_args) in segments.iter().zip(args) {
            current = self.find_nested(&current, &segment.name.text, own_args)?;
        }
        Some(current)
    }

    /// Nested type `name` of `owner` or of one of its base classes.
    fn find_nested(&self, owner: &TypeRef, name: &str, own_args: &[TypeRef]) -> Option<TypeRef> {
        let arity = u16::try_from(own_args.len()).unwrap_or(u16::MAX);
        let mut current = Some(owner.clone());
        let mut steps = 0;
        while let Some(TypeRef::Named { id, args }) = current {
            if let Some(&nested) = self.symbols[id].nested.get(&(name.to_string(), arity)) {
                let mut all_args = args;
                all_args.extend_from_slice(own_args);
                return Some(TypeRef::Named {
                    id: nested,
                    args: all_args,
                });
            }
            steps += 1;
            if steps > MAX_BASE_CHAIN_DEPTH {
                return None;
            }
            current = self.base_of(&TypeRef::Named { id, args });
        }
        None
    }

    /// A top-level type, preferring the generated assembly when several
    /// assemblies declare the same name.
    pub(crate) fn top_level_type(&self, qualified_name: &str, arity: u16) -> Option<TypeId> {
        let ids = self.top_level.get(&(Arc::from(qualified_name), arity))?;
        ids.iter()
            .copied()
            .find(|id| self.symbols[*id].key.assembly == self.assembly)
            .or_else(|| ids.first().copied())
    }

    // =========================================================================
    // Display
    // =========================================================================

    /// Render a type reference as source text.
    #[must_use]
    pub fn display_type(&self, ty: &TypeRef, style: TypeDisplay) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty, style);
        out
    }

    fn write_type(&self, out: &mut String, ty: &TypeRef, style: TypeDisplay) {
        match ty {
            TypeRef::Named { id, args } => {
                let mut chain: SmallVec<[TypeId; 4]> = SmallVec::new();
                let mut current = Some(*id);
                while let Some(c) = current {
                    chain.push(c);
                    current = self.symbols[c].containing;
                }
                chain.reverse();
                let outermost = &self.symbols[chain[0]];
                if style == TypeDisplay::Code {
                    out.push_str("global::");
                }
                if !outermost.namespace.is_empty() {
                    out.push_str(&outermost.namespace);
                    out.push('.');
                }
                let mut remaining = args.as_slice();
                for (i, level) in chain.iter().enumerate() {
                    let symbol = &self.symbols[*level];
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(&symbol.name);
                    let count = symbol.type_parameters.len().min(remaining.len());
                    if count > 0 {
                        out.push('<');
                        for (j, arg) in remaining[..count].iter().enumerate() {
                            if j > 0 {
                                out.push_str(", ");
                            }
                            self.write_type(out, arg, style);
                        }
                        out.push('>');
                    }
                    remaining = &remaining[count..];
                }
            }
            TypeRef::TypeParameter(name) => out.push_str(name),
            TypeRef::Array { element, rank } => {
                self.write_type(out, element, style);
                out.push('[');
                for _ in 1..*rank {
                    out.push(',');
                }
                out.push(']');
            }
            TypeRef::Nullable(inner) => {
                self.write_type(out, inner, style);
                out.push('?');
            }
            TypeRef::Pointer(inner) => {
                self.write_type(out, inner, style);
                out.push('*');
            }
            TypeRef::Tuple(elements) => {
                out.push('(');
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, element, style);
                }
                out.push(')');
            }
        }
    }
}

fn parent_namespace(namespace: &str) -> &str {
    namespace.rfind('.').map_or("", |i| &namespace[..i])
}

fn not_found(syntax: &TypeSyntax, span: Span) -> ResolutionError {
    ResolutionError::NotFound {
        name: syntax.to_string(),
        span,
    }
}
