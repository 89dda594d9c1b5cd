//! Base-signature resolution.
//!
//! For one type declaration, resolves its referenced base class, interfaces,
//! and used traits into an ordered list of candidate slots, re-entering the
//! resolver for referenced declarations as needed. The in-progress path is
//! threaded through the recursion as an immutable chain of stack frames; a
//! name already on the path short-circuits instead of recursing forever.

use crate::symbol::SymbolId;
use crate::table::SymbolTable;
use phz_ast::{DeclFlags, TypeDeclKind, TypeRef};
use phz_common::QualifiedName;
use smallvec::SmallVec;
use tracing::debug;

/// Outcome of resolving one type reference, pattern-matched at each
/// consumer instead of carrying candidate lists inside an error symbol.
#[derive(Clone, Debug)]
pub enum Resolution {
    /// Exactly one declaration (or external type) matches.
    Resolved(SymbolId),
    /// Two or more declarations match; conditional declarations make the
    /// same qualified name legitimately multi-definition.
    Ambiguous(SmallVec<[SymbolId; 2]>),
    /// No declaration matches and the external resolver missed.
    Missing(QualifiedName),
}

/// Syntactic role of a candidate slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotRole {
    Base,
    Interface,
    TraitUse { use_index: u32 },
}

/// One base/interface/trait reference site awaiting validation.
pub(crate) struct CandidateSlot {
    pub role: SlotRole,
    /// The reference site; `None` for the implicit root-object base.
    pub reference: Option<TypeRef>,
    pub resolution: Resolution,
}

/// Immutable stack frame chain recording which names the current thread is
/// in the middle of resolving.
pub(crate) struct ResolutionPath<'a> {
    name: QualifiedName,
    parent: Option<&'a ResolutionPath<'a>>,
}

impl<'a> ResolutionPath<'a> {
    pub(crate) fn new(name: QualifiedName, parent: Option<&'a ResolutionPath<'a>>) -> Self {
        Self { name, parent }
    }

    pub(crate) fn contains(&self, name: QualifiedName) -> bool {
        let mut frame = Some(self);
        while let Some(current) = frame {
            if current.name == name {
                return true;
            }
            frame = current.parent;
        }
        false
    }
}

impl SymbolTable {
    /// Resolve `id`'s base signature if not already resolved.
    ///
    /// Safe to call from any thread; the per-symbol lock and the publish-once
    /// cell guarantee the work happens at most once per declaration.
    pub fn ensure_resolved(&self, id: SymbolId) {
        self.resolve_symbol(id, None);
    }

    pub(crate) fn resolve_symbol(&self, id: SymbolId, path: Option<&ResolutionPath<'_>>) {
        let symbol = self.arena.get(id);
        if !symbol.is_source() || symbol.signature().is_some() {
            return;
        }
        // In progress further up this thread's stack; the caller's slot keeps
        // the head symbol and the cycle checker deals with the loop.
        if path.is_some_and(|frame| frame.contains(symbol.name)) {
            return;
        }
        let _guard = symbol.lock();
        if symbol.signature().is_some() {
            return;
        }
        debug!(symbol = id.0, "resolving base signature");
        let frame = ResolutionPath::new(symbol.name, path);
        let slots = self.resolve_slots(&symbol, &frame);
        self.enumerate_versions(id, &symbol, slots);
    }

    /// Build the ordered slot list for one declaration: base first, then
    /// interfaces in source order, then trait uses in source order.
    fn resolve_slots(
        &self,
        symbol: &crate::symbol::TypeSymbol,
        path: &ResolutionPath<'_>,
    ) -> Vec<CandidateSlot> {
        let decl = symbol
            .decl
            .as_ref()
            .expect("source symbol without declaration");
        let mut slots = Vec::with_capacity(1 + decl.interfaces.len() + decl.trait_uses.len());

        if decl.kind == TypeDeclKind::Class {
            if let Some(base) = decl.base {
                slots.push(CandidateSlot {
                    role: SlotRole::Base,
                    reference: Some(base),
                    resolution: self.resolve_reference(base.name, path),
                });
            } else if !decl.flags.intersects(DeclFlags::ABSTRACT | DeclFlags::STATIC) {
                let root = self.root_object();
                // The root object type itself has no base slot.
                if self.symbol(root).name != symbol.name {
                    slots.push(CandidateSlot {
                        role: SlotRole::Base,
                        reference: None,
                        resolution: Resolution::Resolved(root),
                    });
                }
            }
        }

        for &interface in &decl.interfaces {
            slots.push(CandidateSlot {
                role: SlotRole::Interface,
                reference: Some(interface),
                resolution: self.resolve_reference(interface.name, path),
            });
        }

        for (index, trait_use) in decl.trait_uses.iter().enumerate() {
            slots.push(CandidateSlot {
                role: SlotRole::TraitUse {
                    use_index: index as u32,
                },
                reference: Some(trait_use.trait_ref),
                resolution: self.resolve_reference(trait_use.trait_ref.name, path),
            });
        }

        slots
    }

    /// Resolve one referenced name to source candidates, falling back to the
    /// external resolver, re-entering signature resolution for each source
    /// candidate not already on the path.
    pub(crate) fn resolve_reference(
        &self,
        name: QualifiedName,
        path: &ResolutionPath<'_>,
    ) -> Resolution {
        let candidates = self.lookup_types(name);
        match candidates.len() {
            0 => match self.resolve_external(name) {
                Some(id) => Resolution::Resolved(id),
                None => Resolution::Missing(name),
            },
            1 => {
                self.resolve_symbol(candidates[0], Some(path));
                Resolution::Resolved(candidates[0])
            }
            _ => {
                for &candidate in &candidates {
                    self.resolve_symbol(candidate, Some(path));
                }
                Resolution::Ambiguous(candidates)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phz_common::Interner;

    #[test]
    fn test_resolution_path_contains() {
        let interner = Interner::new();
        let a = QualifiedName::intern(&interner, "A");
        let b = QualifiedName::intern(&interner, "B");
        let c = QualifiedName::intern(&interner, "C");
        let root = ResolutionPath::new(a, None);
        let nested = ResolutionPath::new(b, Some(&root));
        assert!(nested.contains(a));
        assert!(nested.contains(b));
        assert!(!nested.contains(c));
        assert!(!root.contains(b));
    }
}
