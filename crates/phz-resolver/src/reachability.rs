//! Reachability and circular-base checking.
//!
//! A version is unreachable when flow analysis explicitly marked it dead, or
//! when any source-declared base/interface/trait dependency is itself
//! unreachable. Unreachable versions stay in the chain for diagnostics and
//! tooling but are excluded from visible lookups and code generation.

use crate::symbol::SymbolId;
use crate::table::SymbolTable;
use phz_common::{Diagnostic, QualifiedName, Span, diagnostics};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Result of walking a base chain that loops back on itself.
struct CycleInfo {
    /// Position in the walk order where the cycle begins; 0 means the walk's
    /// starting symbol is itself on the cycle.
    entry_position: usize,
    /// Smallest participating symbol id, used to report each distinct cycle
    /// exactly once.
    canonical: SymbolId,
}

impl SymbolTable {
    /// Whether this version can never execute: explicitly marked dead, or
    /// transitively dependent on an unreachable source declaration.
    pub fn is_unreachable(&self, id: SymbolId) -> bool {
        let mut visited: FxHashSet<QualifiedName> = FxHashSet::default();
        self.is_unreachable_inner(id, &mut visited)
    }

    fn is_unreachable_inner(&self, id: SymbolId, visited: &mut FxHashSet<QualifiedName>) -> bool {
        let symbol = self.arena.get(id);
        if symbol.is_marked_unreachable() {
            return true;
        }
        if !symbol.is_source() {
            return false;
        }
        // Mutual recursion guard: a name already on the walk contributes
        // nothing new.
        if !visited.insert(symbol.name) {
            return false;
        }
        self.ensure_resolved(id);
        let Some(signature) = symbol.signature() else {
            return false;
        };
        let dependencies = signature
            .base
            .into_iter()
            .chain(signature.interfaces.iter().copied())
            .chain(signature.trait_uses.iter().map(|use_| use_.target));
        for dependency in dependencies {
            if self.arena.get(dependency).is_source()
                && self.is_unreachable_inner(dependency, visited)
            {
                return true;
            }
        }
        false
    }

    /// Walk the source-declared base chain from `id`; `Some` when a repeated
    /// node is found.
    fn base_chain_cycle(&self, id: SymbolId) -> Option<CycleInfo> {
        let mut seen: FxHashSet<SymbolId> = FxHashSet::default();
        let mut order: SmallVec<[SymbolId; 8]> = SmallVec::new();
        let mut current = id;
        loop {
            if !seen.insert(current) {
                let entry_position = order
                    .iter()
                    .position(|&walked| walked == current)
                    .expect("repeated node missing from walk order");
                let canonical = order[entry_position..]
                    .iter()
                    .copied()
                    .min()
                    .expect("empty cycle");
                return Some(CycleInfo {
                    entry_position,
                    canonical,
                });
            }
            order.push(current);
            let symbol = self.arena.get(current);
            if !symbol.is_source() {
                return None;
            }
            self.ensure_resolved(current);
            let Some(base) = symbol.signature().and_then(|sig| sig.base) else {
                return None;
            };
            if !self.arena.get(base).is_source() {
                return None;
            }
            current = base;
        }
    }

    /// Detect a circular base chain reachable from `id`, reporting each
    /// distinct cycle once. Returns true when a cycle was found.
    pub fn check_circular_base(&self, id: SymbolId) -> bool {
        self.ensure_resolved(id);
        match self.base_chain_cycle(id) {
            Some(info) => {
                self.report_cycle(&info);
                true
            }
            None => false,
        }
    }

    fn report_cycle(&self, info: &CycleInfo) {
        let first_report = self.dedup.lock().unwrap().cycles.insert(info.canonical);
        if !first_report {
            return;
        }
        let symbol = self.arena.get(info.canonical);
        let name = symbol.name.text(self.interner());
        let message = diagnostics::format_message(
            diagnostics::diagnostic_messages::CIRCULAR_BASE_DEPENDENCY,
            &[&name],
        );
        let (file, span) = match (symbol.file(), symbol.decl.as_ref()) {
            (Some(file), Some(decl)) => {
                let span = decl.base.map(|base| base.span).unwrap_or(decl.span);
                (self.file_path(file), span)
            }
            _ => (String::new(), Span::empty()),
        };
        self.push_diagnostic(Diagnostic::error(
            file,
            span,
            message,
            diagnostics::diagnostic_codes::CIRCULAR_BASE_DEPENDENCY,
        ));
    }

    /// Resolved base type of one version, with circular chains substituted
    /// by an error symbol so the chain terminates instead of looping.
    pub fn base_type(&self, id: SymbolId) -> Option<SymbolId> {
        self.ensure_resolved(id);
        let symbol = self.arena.get(id);
        let base = symbol.signature()?.base?;
        if let Some(info) = self.base_chain_cycle(id) {
            self.report_cycle(&info);
            if info.entry_position == 0 {
                let attempted = self.arena.get(base).name;
                return Some(self.cycle_placeholder(attempted));
            }
        }
        Some(base)
    }
}
