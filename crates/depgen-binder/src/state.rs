//! Semantic model construction: declaring symbols and scopes.
//!
//! Binding runs in three steps:
//! 1. Declare every type of every file (prelude, references, and the
//!    generated assembly) and record namespace scopes with their usings.
//! 2. Bind declaration headers (base classes and interfaces), outer types
//!    before nested ones so that lookups through containing types see bound
//!    base chains.
//! 3. Detect circular base types and cut the cycles.
//!
//! The finished model is immutable and shared by the per-fragment resolver
//! workers.

use crate::prelude::{PRELUDE_ASSEMBLY, prelude_file};
use crate::symbols::{Fragment, Scope, ScopeId, SymbolArena, TypeSymbol};
use crate::type_key::{TypeId, TypeKey};
use depgen_common::contract::{FRAMEWORK_ASSEMBLY, MARKER_INTERFACE};
use depgen_parser::ast::{NamespaceBody, NamespaceMember, TypeDecl, TypeSyntax, UsingKind};
use depgen_parser::{FileId, SourceFile, SyntaxRef};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// One file handed to the binder, tagged with its declaring assembly.
#[derive(Clone, Debug)]
pub struct BindUnit<'a> {
    pub file: &'a SourceFile,
    pub assembly: Arc<str>,
}

impl<'a> BindUnit<'a> {
    #[must_use]
    pub fn new(file: &'a SourceFile, assembly: impl Into<Arc<str>>) -> Self {
        Self {
            file,
            assembly: assembly.into(),
        }
    }
}

/// Usings that apply to every file of one assembly (`global using`).
#[derive(Debug, Default)]
pub(crate) struct GlobalUsings {
    pub(crate) namespaces: Vec<Arc<str>>,
    pub(crate) aliases: FxHashMap<String, TypeSyntax>,
}

/// Whole-program semantic model for one compilation snapshot.
#[derive(Debug)]
pub struct SemanticModel<'a> {
    pub(crate) symbols: SymbolArena<'a>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) namespaces: FxHashSet<Arc<str>>,
    /// Top-level types by `(qualified name, arity)`; several assemblies may
    /// declare the same name.
    pub(crate) top_level: FxHashMap<(Arc<str>, u16), SmallVec<[TypeId; 1]>>,
    pub(crate) by_key: FxHashMap<TypeKey, TypeId>,
    pub(crate) global_usings: FxHashMap<Arc<str>, GlobalUsings>,
    pub(crate) files: FxHashMap<FileId, &'a SourceFile>,
    pub(crate) fragments_by_syntax: FxHashMap<SyntaxRef, (TypeId, usize)>,
    pub(crate) assembly: Arc<str>,
    pub(crate) marker: Option<TypeId>,
    pub(crate) object: Option<TypeId>,
}

impl<'a> SemanticModel<'a> {
    /// Bind `units` together with the prelude. `assembly` names the assembly
    /// code is generated for; types it declares win lookups over same-named
    /// types from references.
    #[tracing::instrument(level = "debug", skip_all, fields(assembly = %assembly))]
    pub fn build(assembly: &str, units: impl IntoIterator<Item = BindUnit<'a>>) -> Self {
        let mut model = SemanticModel {
            symbols: SymbolArena::new(),
            scopes: Vec::new(),
            namespaces: FxHashSet::default(),
            top_level: FxHashMap::default(),
            by_key: FxHashMap::default(),
            global_usings: FxHashMap::default(),
            files: FxHashMap::default(),
            fragments_by_syntax: FxHashMap::default(),
            assembly: Arc::from(assembly),
            marker: None,
            object: None,
        };
        model.namespaces.insert(Arc::from(""));

        let prelude_assembly: Arc<str> = Arc::from(PRELUDE_ASSEMBLY);
        model.declare_file(prelude_file(), &prelude_assembly);
        for unit in units {
            model.declare_file(unit.file, &unit.assembly);
        }

        model.marker = model
            .by_key
            .get(&TypeKey::new(MARKER_INTERFACE, 0, FRAMEWORK_ASSEMBLY))
            .copied();
        model.object = model
            .by_key
            .get(&TypeKey::new("System.Object", 0, FRAMEWORK_ASSEMBLY))
            .copied();

        model.bind_headers();
        model.cut_base_cycles();

        debug!(
            types = model.symbols.len(),
            scopes = model.scopes.len(),
            "semantic model built"
        );
        model
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn symbols(&self) -> &SymbolArena<'a> {
        &self.symbols
    }

    #[must_use]
    pub fn symbol(&self, id: TypeId) -> &TypeSymbol<'a> {
        &self.symbols[id]
    }

    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    #[must_use]
    pub fn lookup_key(&self, key: &TypeKey) -> Option<TypeId> {
        self.by_key.get(key).copied()
    }

    #[must_use]
    pub fn file(&self, id: FileId) -> Option<&'a SourceFile> {
        self.files.get(&id).copied()
    }

    /// Assembly code is generated for.
    #[must_use]
    pub fn assembly(&self) -> &str {
        &self.assembly
    }

    /// True when `id` is declared by the generated assembly.
    #[must_use]
    pub fn is_in_generated_assembly(&self, id: TypeId) -> bool {
        self.symbols[id].key.assembly == self.assembly
    }

    /// Find the symbol and fragment index declared at `syntax`.
    #[must_use]
    pub fn fragment_at(&self, syntax: SyntaxRef) -> Option<(TypeId, usize)> {
        self.fragments_by_syntax.get(&syntax).copied()
    }

    // =========================================================================
    // Declaration
    // =========================================================================

    fn declare_file(&mut self, file: &'a SourceFile, assembly: &Arc<str>) {
        self.files.insert(file.id, file);
        let root = self.alloc_scope(None, Arc::from(""), assembly, &file.body, true);
        self.declare_body(file, &file.body, root, assembly);
    }

    fn alloc_scope(
        &mut self,
        parent: Option<ScopeId>,
        namespace: Arc<str>,
        assembly: &Arc<str>,
        body: &NamespaceBody,
        is_file_root: bool,
    ) -> ScopeId {
        let mut scope = Scope {
            parent,
            namespace,
            assembly: Arc::clone(assembly),
            usings: Vec::new(),
            aliases: FxHashMap::default(),
            is_file_root,
        };
        for using in &body.usings {
            match &using.kind {
                UsingKind::Namespace => {
                    let Some(name) = namespace_name(&using.target) else {
                        continue;
                    };
                    let name: Arc<str> = Arc::from(name);
                    if using.global {
                        self.global_usings
                            .entry(Arc::clone(assembly))
                            .or_default()
                            .namespaces
                            .push(name);
                    } else if !scope.usings.contains(&name) {
                        scope.usings.push(name);
                    }
                }
                UsingKind::Alias(alias) => {
                    if using.global {
                        self.global_usings
                            .entry(Arc::clone(assembly))
                            .or_default()
                            .aliases
                            .insert(alias.text.clone(), using.target.clone());
                    } else {
                        scope
                            .aliases
                            .insert(alias.text.clone(), using.target.clone());
                    }
                }
                // Static imports bring members, not types, into scope.
                UsingKind::Static => {}
            }
        }
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    fn declare_body(
        &mut self,
        file: &'a SourceFile,
        body: &'a NamespaceBody,
        scope: ScopeId,
        assembly: &Arc<str>,
    ) {
        for member in &body.members {
            match member {
                NamespaceMember::Namespace(ns) => {
                    let parent = Arc::clone(&self.scope(scope).namespace);
                    let full = join_namespace(&parent, &ns.qualified_name());
                    self.register_namespace(&full);
                    let child = self.alloc_scope(Some(scope), Arc::from(full), assembly, &ns.body, false);
                    self.declare_body(file, &ns.body, child, assembly);
                }
                NamespaceMember::Type(decl) => {
                    self.declare_type(file, decl, scope, None, assembly, 0);
                }
            }
        }
    }

    fn register_namespace(&mut self, full: &str) {
        let mut end = 0;
        for segment in full.split('.') {
            end += segment.len();
            self.namespaces.insert(Arc::from(&full[..end]));
            end += 1;
        }
    }

    fn declare_type(
        &mut self,
        file: &'a SourceFile,
        decl: &'a TypeDecl,
        scope: ScopeId,
        containing: Option<TypeId>,
        assembly: &Arc<str>,
        depth: usize,
    ) -> TypeId {
        let arity = u16::try_from(decl.arity()).unwrap_or(u16::MAX);
        let (qualified_name, namespace) = match containing {
            Some(outer) => {
                let outer = &self.symbols[outer];
                (
                    format!("{}.{}", outer.key.metadata_name(), decl.name.text),
                    Arc::clone(&outer.namespace),
                )
            }
            None => {
                let namespace = Arc::clone(&self.scope(scope).namespace);
                (join_namespace(&namespace, &decl.name.text), namespace)
            }
        };
        let key = TypeKey::new(qualified_name, arity, Arc::clone(assembly));
        let fragment = Fragment {
            file,
            decl,
            syntax: file.syntax_ref(decl.span),
            scope,
        };

        let id = if let Some(&existing) = self.by_key.get(&key) {
            if let Some(symbol) = self.symbols.get_mut(existing) {
                symbol.modifiers |= decl.modifiers;
                self.fragments_by_syntax
                    .insert(fragment.syntax, (existing, symbol.fragments.len()));
                symbol.fragments.push(fragment);
            }
            existing
        } else {
            let symbol = TypeSymbol {
                key: key.clone(),
                name: decl.name.text.clone(),
                kind: decl.kind,
                namespace,
                containing,
                type_parameters: decl
                    .type_parameters
                    .iter()
                    .map(|p| Arc::from(p.text.as_str()))
                    .collect(),
                modifiers: decl.modifiers,
                fragments: smallvec::smallvec![fragment],
                nested: FxHashMap::default(),
                base_class: None,
                interfaces: Vec::new(),
                header_errors: Vec::new(),
                depth,
            };
            let id = self.symbols.alloc(symbol);
            self.by_key.insert(key.clone(), id);
            self.fragments_by_syntax.insert(fragment.syntax, (id, 0));
            match containing {
                Some(outer) => {
                    if let Some(outer) = self.symbols.get_mut(outer) {
                        outer.nested.insert((decl.name.text.clone(), arity), id);
                    }
                }
                None => {
                    self.top_level
                        .entry((Arc::clone(&key.qualified_name), arity))
                        .or_default()
                        .push(id);
                }
            }
            id
        };

        for nested in &decl.nested {
            self.declare_type(file, nested, scope, Some(id), assembly, depth + 1);
        }
        id
    }
}

/// Dotted namespace named by a using directive, without `global::`.
pub(crate) fn namespace_name(target: &TypeSyntax) -> Option<String> {
    match target {
        TypeSyntax::Named { segments, .. }
            if segments.iter().all(|s| s.type_arguments.is_empty()) =>
        {
            let mut out = String::new();
            for (i, segment) in segments.iter().enumerate() {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(&segment.name.text);
            }
            Some(out)
        }
        _ => None,
    }
}

pub(crate) fn join_namespace(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}
