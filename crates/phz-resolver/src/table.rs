//! Declaration registry and versioned lookup cache.
//!
//! The registry indexes every parsed type/function declaration per source
//! file and bumps a monotonic version counter on every file add/remove. The
//! lookup cache memoizes name -> candidate multimaps keyed off that counter;
//! any mismatch triggers a lazy whole rebuild, since cross-file ambiguity can
//! be affected by any edit. No operation performs I/O.

use crate::external::{ExternalTypeResolver, NoExternalTypes};
use crate::options::ResolverOptions;
use crate::stats::{ResolutionStats, StatsSnapshot};
use crate::symbol::{
    FileId, FunctionSymbol, SymbolArena, SymbolId, SymbolOrigin, TypeKind, TypeSymbol,
};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use phz_ast::{SourceFile, TypeDeclKind};
use phz_common::{Diagnostic, DiagnosticBag, Interner, QualifiedName, Span};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

struct FileEntry {
    id: FileId,
    file: Arc<SourceFile>,
}

/// Registered source files in insertion order, so candidate lists and
/// therefore version numbering stay deterministic.
struct Registry {
    files: IndexMap<String, FileEntry>,
    next_file: u32,
}

/// Per-name candidate multimaps, valid for exactly one registry version.
struct LookupCache {
    built_version: u64,
    types: FxHashMap<QualifiedName, SmallVec<[SymbolId; 2]>>,
    functions: FxHashMap<QualifiedName, SmallVec<[Arc<FunctionSymbol>; 1]>>,
}

/// Deduplication state for diagnostics that must be reported once per
/// offending span or once per cycle.
#[derive(Default)]
pub(crate) struct DedupState {
    pub slot_spans: FxHashSet<(u32, FileId, Span)>,
    /// Canonical representative (smallest participating id) of each cycle
    /// already reported.
    pub cycles: FxHashSet<SymbolId>,
}

/// The symbol table: declaration registry, versioned lookup cache, symbol
/// arena, and the resolution entry points spread across the sibling modules.
pub struct SymbolTable {
    interner: Arc<Interner>,
    pub(crate) options: ResolverOptions,
    external: Box<dyn ExternalTypeResolver>,
    pub(crate) arena: SymbolArena,
    registry: RwLock<Registry>,
    cache: RwLock<LookupCache>,
    version: AtomicU64,
    pub(crate) diagnostics: DiagnosticBag,
    pub(crate) dedup: Mutex<DedupState>,
    /// Head symbol per declaration, stable across cache rebuilds while the
    /// owning file stays registered.
    decl_symbols: Mutex<FxHashMap<(FileId, u32), SymbolId>>,
    func_symbols: Mutex<FxHashMap<(FileId, u32), Arc<FunctionSymbol>>>,
    external_symbols: Mutex<FxHashMap<QualifiedName, Option<SymbolId>>>,
    missing_placeholders: Mutex<FxHashMap<QualifiedName, SymbolId>>,
    cycle_placeholders: Mutex<FxHashMap<QualifiedName, SymbolId>>,
    root_object: OnceCell<SymbolId>,
    stats: ResolutionStats,
}

impl SymbolTable {
    pub fn new(options: ResolverOptions) -> Self {
        Self::with_external(options, Box::new(NoExternalTypes))
    }

    pub fn with_external(options: ResolverOptions, external: Box<dyn ExternalTypeResolver>) -> Self {
        let table = Self {
            interner: Arc::new(Interner::new()),
            options,
            external,
            arena: SymbolArena::new(),
            registry: RwLock::new(Registry {
                files: IndexMap::new(),
                next_file: 0,
            }),
            cache: RwLock::new(LookupCache {
                built_version: u64::MAX,
                types: FxHashMap::default(),
                functions: FxHashMap::default(),
            }),
            version: AtomicU64::new(0),
            diagnostics: DiagnosticBag::new(),
            dedup: Mutex::new(DedupState::default()),
            decl_symbols: Mutex::new(FxHashMap::default()),
            func_symbols: Mutex::new(FxHashMap::default()),
            external_symbols: Mutex::new(FxHashMap::default()),
            missing_placeholders: Mutex::new(FxHashMap::default()),
            cycle_placeholders: Mutex::new(FxHashMap::default()),
            root_object: OnceCell::new(),
            stats: ResolutionStats::default(),
        };
        // Materialize the root object eagerly so explicit references to it
        // hit the external cache instead of minting a missing placeholder.
        table.root_object();
        table
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// The current registry version; bumped by every add/remove.
    pub fn registry_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Register a parsed source file. Re-adding an already registered path
    /// replaces the previous contents.
    pub fn add_file(&self, file: SourceFile) {
        assert!(!file.path.is_empty(), "source file path must not be empty");
        let path = file.path.clone();
        {
            let mut registry = self.registry.write().unwrap();
            let id = FileId(registry.next_file);
            registry.next_file += 1;
            registry.files.insert(
                path.clone(),
                FileEntry {
                    id,
                    file: Arc::new(file),
                },
            );
        }
        self.version.fetch_add(1, Ordering::AcqRel);
        ResolutionStats::bump(&self.stats.files_added);
        debug!(path = %path, "file added");
    }

    /// Remove a registered file by its normalized relative path. Returns
    /// false when the path was never registered.
    pub fn remove_file(&self, path: &str) -> bool {
        let removed = {
            let mut registry = self.registry.write().unwrap();
            registry.files.shift_remove(path).is_some()
        };
        if removed {
            self.version.fetch_add(1, Ordering::AcqRel);
            ResolutionStats::bump(&self.stats.files_removed);
            debug!(path = %path, "file removed");
        }
        removed
    }

    /// Run `f` against an up-to-date lookup cache, rebuilding first if the
    /// registry version moved. Rebuild is double-checked under the cache's
    /// write lock so it happens at most once per version.
    fn with_cache<R>(&self, f: impl FnOnce(&LookupCache) -> R) -> R {
        let current = self.registry_version();
        {
            let cache = self.cache.read().unwrap();
            if cache.built_version == current {
                return f(&cache);
            }
        }
        let mut cache = self.cache.write().unwrap();
        let current = self.registry_version();
        if cache.built_version != current {
            self.rebuild_cache(&mut cache, current);
        }
        f(&cache)
    }

    fn rebuild_cache(&self, cache: &mut LookupCache, current: u64) {
        cache.types.clear();
        cache.functions.clear();

        let registry = self.registry.read().unwrap();
        let mut decl_symbols = self.decl_symbols.lock().unwrap();
        let mut func_symbols = self.func_symbols.lock().unwrap();
        for entry in registry.files.values() {
            for (index, decl) in entry.file.types.iter().enumerate() {
                let key = (entry.id, index as u32);
                let id = *decl_symbols.entry(key).or_insert_with(|| {
                    let kind = match decl.kind {
                        TypeDeclKind::Class => TypeKind::Class,
                        TypeDeclKind::Interface => TypeKind::Interface,
                        TypeDeclKind::Trait => TypeKind::Trait,
                    };
                    ResolutionStats::bump(&self.stats.symbols_allocated);
                    self.arena.alloc(TypeSymbol::source(
                        decl.name,
                        kind,
                        decl.clone(),
                        entry.id,
                        index as u32,
                    ))
                });
                cache.types.entry(decl.name).or_default().push(id);
            }
            for (index, decl) in entry.file.functions.iter().enumerate() {
                let key = (entry.id, index as u32);
                let symbol = func_symbols
                    .entry(key)
                    .or_insert_with(|| {
                        Arc::new(FunctionSymbol {
                            name: decl.name,
                            file: entry.id,
                            decl: decl.clone(),
                        })
                    })
                    .clone();
                cache.functions.entry(decl.name).or_default().push(symbol);
            }
        }

        cache.built_version = current;
        ResolutionStats::bump(&self.stats.cache_rebuilds);
        debug!(version = current, "lookup cache rebuilt");
    }

    /// All type declarations registered under `name`, in registry order.
    pub fn lookup_types(&self, name: QualifiedName) -> SmallVec<[SymbolId; 2]> {
        self.with_cache(|cache| cache.types.get(&name).cloned().unwrap_or_default())
    }

    /// The visible/reachable subset of [`lookup_types`]: conditional
    /// declarations are filtered out unless a single conditional declaration
    /// is the only one under the name, and unreachable versions are dropped.
    pub fn visible_types(&self, name: QualifiedName) -> SmallVec<[SymbolId; 2]> {
        let all = self.lookup_types(name);
        let sole = all.len() == 1;
        all.into_iter()
            .filter(|&id| {
                let symbol = self.arena.get(id);
                let conditional = symbol
                    .decl
                    .as_ref()
                    .is_some_and(|decl| decl.is_conditional());
                (sole || !conditional) && !self.is_unreachable(id)
            })
            .collect()
    }

    /// All function declarations registered under `name`, in registry order.
    pub fn lookup_functions(&self, name: QualifiedName) -> SmallVec<[Arc<FunctionSymbol>; 1]> {
        self.with_cache(|cache| cache.functions.get(&name).cloned().unwrap_or_default())
    }

    /// Visible subset of [`lookup_functions`], with the same sole-conditional
    /// rule as types.
    pub fn visible_functions(&self, name: QualifiedName) -> SmallVec<[Arc<FunctionSymbol>; 1]> {
        let all = self.lookup_functions(name);
        let sole = all.len() == 1;
        all.into_iter()
            .filter(|symbol| sole || !symbol.is_conditional())
            .collect()
    }

    pub fn symbol(&self, id: SymbolId) -> Arc<TypeSymbol> {
        self.arena.get(id)
    }

    pub(crate) fn alloc_symbol(&self, symbol: TypeSymbol) -> SymbolId {
        ResolutionStats::bump(&self.stats.symbols_allocated);
        self.arena.alloc(symbol)
    }

    /// The platform root object type, materialized as an always-present
    /// external class symbol.
    pub fn root_object(&self) -> SymbolId {
        *self.root_object.get_or_init(|| {
            let name = QualifiedName::intern(&self.interner, &self.options.root_object);
            let id = self.alloc_symbol(TypeSymbol::external(name, TypeKind::Class));
            self.external_symbols.lock().unwrap().insert(name, Some(id));
            id
        })
    }

    /// Offer a name to the external resolver, memoizing hits and misses.
    pub(crate) fn resolve_external(&self, name: QualifiedName) -> Option<SymbolId> {
        if let Some(&cached) = self.external_symbols.lock().unwrap().get(&name) {
            return cached;
        }
        let resolved = self
            .external
            .resolve(&self.interner, name)
            .map(|ext| self.alloc_symbol(TypeSymbol::external(ext.name, ext.kind)));
        self.external_symbols.lock().unwrap().insert(name, resolved);
        resolved
    }

    /// Placeholder symbol for a name with no matching declaration; one per
    /// attempted name, never null.
    pub(crate) fn missing_placeholder(&self, name: QualifiedName) -> SymbolId {
        let mut placeholders = self.missing_placeholders.lock().unwrap();
        *placeholders
            .entry(name)
            .or_insert_with(|| self.alloc_symbol(TypeSymbol::missing(name)))
    }

    /// Placeholder symbol terminating a detected circular base chain.
    pub(crate) fn cycle_placeholder(&self, name: QualifiedName) -> SymbolId {
        let mut placeholders = self.cycle_placeholders.lock().unwrap();
        *placeholders
            .entry(name)
            .or_insert_with(|| self.alloc_symbol(TypeSymbol::cycle(name)))
    }

    /// Resolved implemented interfaces of one version, in source order.
    pub fn interfaces(&self, id: SymbolId) -> SmallVec<[SymbolId; 4]> {
        self.ensure_resolved(id);
        self.arena
            .get(id)
            .signature()
            .map(|sig| sig.interfaces.clone())
            .unwrap_or_default()
    }

    /// Resolved trait uses of one version, in source order.
    pub fn trait_uses(&self, id: SymbolId) -> Vec<crate::symbol::ResolvedTraitUse> {
        self.ensure_resolved(id);
        self.arena
            .get(id)
            .signature()
            .map(|sig| sig.trait_uses.clone())
            .unwrap_or_default()
    }

    /// The full version chain under `name`: the concatenation of every
    /// declaration's versions in registry order. A chain with more than one
    /// entry is renumbered 1..N; a sole version keeps ordinal 0.
    pub fn version_chain(&self, name: QualifiedName) -> SmallVec<[SymbolId; 4]> {
        let heads = self.lookup_types(name);
        for &head in &heads {
            self.ensure_resolved(head);
        }
        let mut chain: SmallVec<[SymbolId; 4]> = SmallVec::new();
        for &head in &heads {
            if let Some(versions) = self.arena.get(head).versions() {
                chain.extend(versions.iter().copied());
            }
        }
        if chain.len() > 1 {
            for (position, &id) in chain.iter().enumerate() {
                self.arena.get(id).set_version(position as u32 + 1);
            }
        } else if let Some(&only) = chain.first() {
            self.arena.get(only).set_version(0);
        }
        chain
    }

    /// Successor of `id` in its per-name version chain.
    pub fn next_version(&self, id: SymbolId) -> Option<SymbolId> {
        let name = self.arena.get(id).name;
        let chain = self.version_chain(name);
        let position = chain.iter().position(|&entry| entry == id)?;
        chain.get(position + 1).copied()
    }

    /// Every version under `name` that can possibly execute.
    pub fn reachable_versions(&self, name: QualifiedName) -> SmallVec<[SymbolId; 4]> {
        self.version_chain(name)
            .into_iter()
            .filter(|&id| !self.is_unreachable(id))
            .collect()
    }

    /// All versions of the declaration that produced `id`, head first.
    pub fn declaration_versions(&self, id: SymbolId) -> SmallVec<[SymbolId; 2]> {
        let symbol = self.arena.get(id);
        let SymbolOrigin::Source { file, decl_index } = symbol.origin else {
            return SmallVec::from_slice(&[id]);
        };
        let head = *self
            .decl_symbols
            .lock()
            .unwrap()
            .get(&(file, decl_index))
            .expect("source symbol with no registered head");
        self.ensure_resolved(head);
        self.arena
            .get(head)
            .versions()
            .cloned()
            .unwrap_or_else(|| SmallVec::from_slice(&[head]))
    }

    /// Reachable subset of [`declaration_versions`].
    pub fn reachable_versions_of(&self, id: SymbolId) -> SmallVec<[SymbolId; 2]> {
        self.declaration_versions(id)
            .into_iter()
            .filter(|&version| !self.is_unreachable(version))
            .collect()
    }

    /// External dead-code signal from flow analysis of the enclosing
    /// statement.
    pub fn mark_unreachable(&self, id: SymbolId) {
        self.arena.get(id).mark_unreachable();
    }

    /// Path of the file a source symbol was declared in.
    pub(crate) fn file_path(&self, file: FileId) -> String {
        let registry = self.registry.read().unwrap();
        registry
            .files
            .iter()
            .find(|(_, entry)| entry.id == file)
            .map(|(path, _)| path.clone())
            .unwrap_or_default()
    }

    pub(crate) fn push_diagnostic(&self, diagnostic: Diagnostic) {
        self.diagnostics.add(diagnostic);
    }

    /// Emit a span-keyed diagnostic at most once per (code, file, span).
    pub(crate) fn push_deduped(&self, diagnostic: Diagnostic, file: FileId) {
        let key = (diagnostic.code, file, diagnostic.span);
        if self.dedup.lock().unwrap().slot_spans.insert(key) {
            self.diagnostics.add(diagnostic);
        }
    }

    /// Drain accumulated diagnostics; ownership passes to the caller.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// Copy of the current diagnostics without draining them.
    pub fn snapshot_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }

    /// Count of diagnostics with the given code, without draining.
    pub fn diagnostic_count(&self, code: u32) -> usize {
        self.diagnostics
            .snapshot()
            .iter()
            .filter(|d| d.code == code)
            .count()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn bump_versions_published(&self) {
        ResolutionStats::bump(&self.stats.versions_published);
    }
}
