//! Type symbols and the symbol arena.
//!
//! One head [`TypeSymbol`] exists per parsed [`TypeDeclaration`]. Under
//! ambiguity (conditionally declared base/interface/trait names), resolution
//! materializes further symbols sharing the same declaration; the arena owns
//! them all, and the per-name version chain is a vector of arena indices
//! rather than an intrusive linked list.
//!
//! A symbol's resolved signature and member table are published exactly once
//! behind `OnceCell`s. The compute step is serialized by a per-symbol mutex
//! (double-checked), after which readers need no synchronization.

use crate::traits::MemberTable;
use once_cell::sync::OnceCell;
use phz_ast::TypeDeclaration;
use phz_common::QualifiedName;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Index of a symbol in the [`SymbolArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// A sentinel value representing no symbol.
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Index of a registered source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// What a symbol is, matched exhaustively everywhere a slot's syntactic role
/// is validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Trait,
    /// A platform value type, only ever produced by the external resolver.
    Value,
}

/// Where a symbol came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolOrigin {
    /// Declared in a registered source file.
    Source { file: FileId, decl_index: u32 },
    /// Provided by the external type resolver (library/runtime type).
    External,
    /// Placeholder for a name with no matching declaration.
    Missing,
    /// Placeholder terminating a detected circular base chain.
    Cycle,
}

/// One resolved trait mention: the trait symbol plus the index of the
/// originating trait-use block (which carries the adaptation list).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedTraitUse {
    pub target: SymbolId,
    pub use_index: u32,
}

/// The published base/interface/trait resolution of one symbol version.
#[derive(Clone, Debug)]
pub struct Signature {
    /// Resolved base class; `None` for interfaces, traits, and classes with
    /// no base slot.
    pub base: Option<SymbolId>,
    /// Implemented interfaces in source order.
    pub interfaces: SmallVec<[SymbolId; 4]>,
    /// Trait uses in source order.
    pub trait_uses: Vec<ResolvedTraitUse>,
    /// False when no candidate combination validated and the raw slot
    /// resolutions were published best-effort.
    pub valid: bool,
}

/// The resolved unit: one version of one type declaration.
pub struct TypeSymbol {
    pub name: QualifiedName,
    pub kind: TypeKind,
    pub origin: SymbolOrigin,
    /// The shared parse node; `None` for external and placeholder symbols.
    pub decl: Option<Arc<TypeDeclaration>>,
    /// 1-based ordinal in the per-name version chain; 0 means "sole
    /// version, no ambiguity".
    version: AtomicU32,
    /// Explicit dead-code mark driven by flow analysis of the enclosing
    /// statement.
    unreachable_mark: AtomicBool,
    signature: OnceCell<Signature>,
    /// All versions of this declaration, head first. Set on the head symbol
    /// when enumeration completes.
    versions: OnceCell<SmallVec<[SymbolId; 2]>>,
    members: OnceCell<Arc<MemberTable>>,
    /// Serializes the expensive compute steps; readers go through the
    /// `OnceCell`s without taking it.
    resolve_lock: Mutex<()>,
}

impl TypeSymbol {
    fn new(
        name: QualifiedName,
        kind: TypeKind,
        origin: SymbolOrigin,
        decl: Option<Arc<TypeDeclaration>>,
    ) -> Self {
        Self {
            name,
            kind,
            origin,
            decl,
            version: AtomicU32::new(0),
            unreachable_mark: AtomicBool::new(false),
            signature: OnceCell::new(),
            versions: OnceCell::new(),
            members: OnceCell::new(),
            resolve_lock: Mutex::new(()),
        }
    }

    pub(crate) fn source(
        name: QualifiedName,
        kind: TypeKind,
        decl: Arc<TypeDeclaration>,
        file: FileId,
        decl_index: u32,
    ) -> Self {
        Self::new(name, kind, SymbolOrigin::Source { file, decl_index }, Some(decl))
    }

    pub(crate) fn external(name: QualifiedName, kind: TypeKind) -> Self {
        Self::new(name, kind, SymbolOrigin::External, None)
    }

    /// Placeholder for a missing name; kind defaults to `Class` so the
    /// placeholder validates in any slot.
    pub(crate) fn missing(name: QualifiedName) -> Self {
        Self::new(name, TypeKind::Class, SymbolOrigin::Missing, None)
    }

    pub(crate) fn cycle(name: QualifiedName) -> Self {
        Self::new(name, TypeKind::Class, SymbolOrigin::Cycle, None)
    }

    #[inline]
    pub fn is_source(&self) -> bool {
        matches!(self.origin, SymbolOrigin::Source { .. })
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.origin == SymbolOrigin::Missing
    }

    #[inline]
    pub fn is_cycle(&self) -> bool {
        self.origin == SymbolOrigin::Cycle
    }

    /// True for the missing-name and circular-base placeholders.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.is_missing() || self.is_cycle()
    }

    pub fn file(&self) -> Option<FileId> {
        match self.origin {
            SymbolOrigin::Source { file, .. } => Some(file),
            _ => None,
        }
    }

    /// Version ordinal: 0 when this is the sole version under its name,
    /// otherwise the 1-based position in the per-name chain.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version.load(Ordering::Relaxed)
    }

    pub(crate) fn set_version(&self, ordinal: u32) {
        self.version.store(ordinal, Ordering::Relaxed);
    }

    pub fn is_marked_unreachable(&self) -> bool {
        self.unreachable_mark.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_unreachable(&self) {
        self.unreachable_mark.store(true, Ordering::Relaxed);
    }

    /// The published signature, if resolution has run.
    #[inline]
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.get()
    }

    pub(crate) fn publish_signature(&self, signature: Signature) {
        let published = self.signature.set(signature).is_ok();
        debug_assert!(published, "signature published twice");
    }

    /// All versions of this declaration (head first), once enumerated.
    #[inline]
    pub fn versions(&self) -> Option<&SmallVec<[SymbolId; 2]>> {
        self.versions.get()
    }

    pub(crate) fn publish_versions(&self, versions: SmallVec<[SymbolId; 2]>) {
        let published = self.versions.set(versions).is_ok();
        debug_assert!(published, "version list published twice");
    }

    /// True once resolution ran and at least one candidate combination
    /// validated.
    pub fn has_valid_version(&self) -> bool {
        self.signature().is_some_and(|sig| sig.valid)
    }

    #[inline]
    pub fn members(&self) -> Option<Arc<MemberTable>> {
        self.members.get().cloned()
    }

    pub(crate) fn publish_members(&self, members: Arc<MemberTable>) {
        // Racing publishers compute identical tables; first one wins.
        let _ = self.members.set(members);
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.resolve_lock.lock().unwrap()
    }
}

impl std::fmt::Debug for TypeSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeSymbol")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

/// Append-only arena of type symbols.
pub struct SymbolArena {
    symbols: RwLock<Vec<Arc<TypeSymbol>>>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self {
            symbols: RwLock::new(Vec::new()),
        }
    }

    pub fn alloc(&self, symbol: TypeSymbol) -> SymbolId {
        let mut symbols = self.symbols.write().unwrap();
        let id = SymbolId(symbols.len() as u32);
        symbols.push(Arc::new(symbol));
        id
    }

    /// Panics on an id not produced by this arena; that is a collaborator
    /// bug, not a user-facing error.
    pub fn get(&self, id: SymbolId) -> Arc<TypeSymbol> {
        self.symbols.read().unwrap()[id.0 as usize].clone()
    }

    pub fn len(&self) -> usize {
        self.symbols.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SymbolArena {
    fn default() -> Self {
        Self::new()
    }
}

/// A resolved function declaration. Functions have no base signature to
/// resolve; only name, file, and conditionality matter to lookups.
#[derive(Clone, Debug)]
pub struct FunctionSymbol {
    pub name: QualifiedName,
    pub file: FileId,
    pub decl: Arc<phz_ast::FunctionDeclaration>,
}

impl FunctionSymbol {
    #[inline]
    pub fn is_conditional(&self) -> bool {
        self.decl.is_conditional()
    }
}
