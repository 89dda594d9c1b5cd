//! Ambiguity enumeration and version materialization.
//!
//! Most slots hold exactly one candidate. A slot is ambiguous when several
//! declarations share the referenced name (conditional declarations make
//! that legal); every validated combination of slot candidates becomes a
//! distinct symbol version appended to the declaration's chain.

use crate::resolve::{CandidateSlot, Resolution, SlotRole};
use crate::symbol::{
    FileId, ResolvedTraitUse, Signature, SymbolId, SymbolOrigin, TypeKind, TypeSymbol,
};
use crate::table::SymbolTable;
use phz_ast::TypeRef;
use phz_common::{Diagnostic, Span, diagnostics};
use smallvec::{SmallVec, smallvec};
use std::sync::Arc;
use tracing::debug;

/// A slot reduced to its raw candidate list, in registry order.
struct NormalizedSlot {
    role: SlotRole,
    reference: Option<TypeRef>,
    candidates: SmallVec<[SymbolId; 2]>,
}

impl SymbolTable {
    /// Enumerate validated candidate combinations for `head` and publish the
    /// resulting version chain. Called with the head's resolve lock held.
    pub(crate) fn enumerate_versions(
        &self,
        head_id: SymbolId,
        head: &Arc<TypeSymbol>,
        slots: Vec<CandidateSlot>,
    ) {
        let decl = head.decl.as_ref().expect("source symbol without declaration");
        let file = head.file().expect("source symbol without file");
        let decl_index = match head.origin {
            SymbolOrigin::Source { decl_index, .. } => decl_index,
            _ => unreachable!("enumeration runs on source symbols only"),
        };

        let raw: Vec<NormalizedSlot> = slots
            .into_iter()
            .map(|slot| self.normalize_slot(file, slot))
            .collect();

        // Validate each slot candidate once, up front; a combination is valid
        // exactly when every one of its slot picks is.
        let mut validated: Vec<SmallVec<[SymbolId; 2]>> = Vec::with_capacity(raw.len());
        for slot in &raw {
            let kept: SmallVec<[SymbolId; 2]> = slot
                .candidates
                .iter()
                .copied()
                .filter(|&candidate| self.validate_slot_candidate(head, file, slot, candidate))
                .collect();
            validated.push(kept);
        }

        if validated.iter().any(|kept| kept.is_empty()) {
            // No combination survives validation. Publish the raw slot
            // resolutions as a single best-effort version so later passes
            // still have a symbol to work with.
            let fallback = self.signature_from_picks(
                &raw,
                &raw.iter()
                    .map(|slot| slot.candidates[0])
                    .collect::<SmallVec<[SymbolId; 8]>>(),
                false,
            );
            head.publish_signature(fallback);
            head.publish_versions(smallvec![head_id]);
            self.bump_versions_published();
            debug!(symbol = head_id.0, "no candidate combination validated");
            return;
        }

        // Cartesian product across the validated slots, prefix-first so
        // discovery order is deterministic.
        let mut combinations: Vec<SmallVec<[SymbolId; 8]>> = Vec::new();
        let mut picks: SmallVec<[SymbolId; 8]> = SmallVec::new();
        collect_combinations(&validated, 0, &mut picks, &mut combinations);

        let mut versions: SmallVec<[SymbolId; 2]> = SmallVec::with_capacity(combinations.len());
        for (index, picks) in combinations.iter().enumerate() {
            let signature = self.signature_from_picks(&raw, picks, true);
            if index == 0 {
                head.publish_signature(signature);
                versions.push(head_id);
            } else {
                let sibling =
                    TypeSymbol::source(head.name, head.kind, decl.clone(), file, decl_index);
                sibling.publish_signature(signature);
                versions.push(self.alloc_symbol(sibling));
            }
            self.bump_versions_published();
        }

        if versions.len() > 1 {
            for (position, &id) in versions.iter().enumerate() {
                self.symbol(id).set_version(position as u32 + 1);
            }
            let name = head.name.text(self.interner());
            let message = diagnostics::format_message(
                diagnostics::diagnostic_messages::AMBIGUOUS_DECLARATION,
                &[&name, &versions.len().to_string()],
            );
            self.push_diagnostic(Diagnostic::warning(
                self.file_path(file),
                decl.span,
                message,
                diagnostics::diagnostic_codes::AMBIGUOUS_DECLARATION,
            ));
        }
        debug!(
            symbol = head_id.0,
            versions = versions.len(),
            "versions published"
        );
        head.publish_versions(versions);
    }

    /// Reduce a slot to raw candidates, applying the tie-break: a candidate
    /// declared unconditionally in the referencing type's own file wins its
    /// slot outright, discarding the other raw candidates.
    fn normalize_slot(&self, file: FileId, slot: CandidateSlot) -> NormalizedSlot {
        let candidates = match slot.resolution {
            Resolution::Resolved(id) => smallvec![id],
            Resolution::Missing(name) => smallvec![self.missing_placeholder(name)],
            Resolution::Ambiguous(list) => {
                let local_unconditional = list.iter().copied().find(|&candidate| {
                    let symbol = self.symbol(candidate);
                    symbol.file() == Some(file)
                        && symbol
                            .decl
                            .as_ref()
                            .is_some_and(|decl| !decl.is_conditional())
                });
                match local_unconditional {
                    Some(winner) => smallvec![winner],
                    None => list,
                }
            }
        };
        NormalizedSlot {
            role: slot.role,
            reference: slot.reference,
            candidates,
        }
    }

    /// Check a candidate against its slot's syntactic role; error
    /// placeholders pass any slot. Emits one structural diagnostic per
    /// distinct offending span.
    fn validate_slot_candidate(
        &self,
        head: &TypeSymbol,
        file: FileId,
        slot: &NormalizedSlot,
        candidate: SymbolId,
    ) -> bool {
        let symbol = self.symbol(candidate);
        if symbol.is_error() {
            return true;
        }
        let (ok, code, template) = match slot.role {
            SlotRole::Base => (
                symbol.kind == TypeKind::Class,
                diagnostics::diagnostic_codes::CANNOT_EXTEND_FROM,
                diagnostics::diagnostic_messages::CANNOT_EXTEND_FROM,
            ),
            SlotRole::Interface => (
                symbol.kind == TypeKind::Interface,
                diagnostics::diagnostic_codes::CANNOT_IMPLEMENT_NON_INTERFACE,
                diagnostics::diagnostic_messages::CANNOT_IMPLEMENT_NON_INTERFACE,
            ),
            SlotRole::TraitUse { .. } => (
                symbol.kind == TypeKind::Trait,
                diagnostics::diagnostic_codes::CANNOT_USE_NON_TRAIT,
                diagnostics::diagnostic_messages::CANNOT_USE_NON_TRAIT,
            ),
        };
        if ok {
            return true;
        }
        let span = slot.reference.map(|r| r.span).unwrap_or(Span::empty());
        let own_name = head.name.text(self.interner());
        let candidate_name = symbol.name.text(self.interner());
        let message = diagnostics::format_message(template, &[&own_name, &candidate_name]);
        self.push_deduped(
            Diagnostic::error(self.file_path(file), span, message, code),
            file,
        );
        false
    }

    fn signature_from_picks(
        &self,
        slots: &[NormalizedSlot],
        picks: &[SymbolId],
        valid: bool,
    ) -> Signature {
        debug_assert_eq!(slots.len(), picks.len());
        let mut signature = Signature {
            base: None,
            interfaces: SmallVec::new(),
            trait_uses: Vec::new(),
            valid,
        };
        for (slot, &pick) in slots.iter().zip(picks) {
            match slot.role {
                SlotRole::Base => signature.base = Some(pick),
                SlotRole::Interface => signature.interfaces.push(pick),
                SlotRole::TraitUse { use_index } => signature.trait_uses.push(ResolvedTraitUse {
                    target: pick,
                    use_index,
                }),
            }
        }
        signature
    }
}

/// Depth-first Cartesian product; the shared `picks` prefix is pushed and
/// popped in place so prefixes are never re-derived per branch.
fn collect_combinations(
    slots: &[SmallVec<[SymbolId; 2]>],
    index: usize,
    picks: &mut SmallVec<[SymbolId; 8]>,
    out: &mut Vec<SmallVec<[SymbolId; 8]>>,
) {
    if index == slots.len() {
        out.push(picks.clone());
        return;
    }
    for &candidate in &slots[index] {
        picks.push(candidate);
        collect_combinations(slots, index + 1, picks, out);
        picks.pop();
    }
}
