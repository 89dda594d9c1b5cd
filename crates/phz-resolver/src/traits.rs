//! Trait composition.
//!
//! Traits are flat, non-instantiable bundles of methods and fields mixed
//! into a consuming class without classical inheritance. Each trait use
//! derives a member map (name -> chosen trait member + effective
//! accessibility + effective name); use-site adaptations resolve or rename
//! collisions; finalization synthesizes forwarding members delegating to a
//! hidden instance of the trait embedded in the consumer.

use crate::symbol::{SymbolId, TypeKind, TypeSymbol};
use crate::table::SymbolTable;
use indexmap::IndexMap;
use phz_ast::{Accessibility, Adaptation, Member, TypeRef};
use phz_common::{Atom, Diagnostic, diagnostics};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::debug;

/// Identity of a member as declared by a specific trait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TraitMemberRef {
    pub declaring_trait: SymbolId,
    /// Index into the declaring trait's member list.
    pub member_index: u32,
}

/// One entry of a trait-use member map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraitMapEntry {
    pub source: TraitMemberRef,
    pub visibility: Accessibility,
    /// Effective name; also the map key.
    pub name: Atom,
}

/// Derived member map of one trait use; at most one entry per name.
#[derive(Clone, Debug, Default)]
pub struct TraitMemberMap {
    pub entries: IndexMap<Atom, TraitMapEntry>,
}

/// A member of a consuming type after composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassMember {
    /// Declared directly on the type (index into its member list).
    Declared { member_index: u32 },
    /// Synthesized forwarding method delegating to the hidden trait
    /// instance.
    TraitMethod {
        source: TraitMemberRef,
        visibility: Accessibility,
        name: Atom,
    },
    /// A trait field replicated onto the consuming type.
    TraitField {
        source: TraitMemberRef,
        visibility: Accessibility,
        name: Atom,
    },
}

/// Composed members of one symbol version. Methods and fields live in
/// separate namespaces.
#[derive(Clone, Debug, Default)]
pub struct MemberTable {
    pub methods: IndexMap<Atom, ClassMember>,
    pub fields: IndexMap<Atom, ClassMember>,
    /// Per-trait-use member maps, parallel to the version's resolved trait
    /// uses in source order.
    pub trait_maps: Vec<TraitMemberMap>,
}

impl MemberTable {
    /// Look up a composed member by name, methods first.
    pub fn get(&self, name: Atom) -> Option<&ClassMember> {
        self.methods.get(&name).or_else(|| self.fields.get(&name))
    }
}

impl SymbolTable {
    /// Member table of one version, including synthesized trait-forwarding
    /// members; computed once per version.
    pub fn members(&self, id: SymbolId) -> Arc<MemberTable> {
        let symbol = self.arena.get(id);
        if let Some(table) = symbol.members() {
            return table;
        }
        self.ensure_resolved(id);
        let _guard = symbol.lock();
        if let Some(table) = symbol.members() {
            return table;
        }
        debug!(symbol = id.0, "composing member table");
        let table = Arc::new(self.build_member_table(&symbol));
        symbol.publish_members(table.clone());
        table
    }

    fn build_member_table(&self, symbol: &Arc<TypeSymbol>) -> MemberTable {
        let mut table = MemberTable::default();
        let Some(decl) = symbol.decl.as_ref() else {
            return table;
        };

        // Declared members claim their names first.
        for (index, member) in decl.members.iter().enumerate() {
            let entry = ClassMember::Declared {
                member_index: index as u32,
            };
            match member {
                Member::Method(method) => {
                    table.methods.insert(method.name, entry);
                }
                Member::Field(field) => {
                    table.fields.insert(field.name, entry);
                }
            }
        }

        let trait_uses = symbol
            .signature()
            .map(|sig| sig.trait_uses.clone())
            .unwrap_or_default();

        for trait_use in &trait_uses {
            let adaptations = &decl.trait_uses[trait_use.use_index as usize].adaptations;
            let mut in_progress = FxHashSet::default();
            table
                .trait_maps
                .push(self.trait_member_map(trait_use.target, adaptations, &mut in_progress));
        }

        // Forwarding synthesis: mapped members not overridden by an own
        // declaration and not abstract, first trait-use wins a name.
        for map in &table.trait_maps {
            for entry in map.entries.values() {
                if table.methods.contains_key(&entry.name) {
                    continue;
                }
                if self.trait_member_is_abstract(entry.source) {
                    continue;
                }
                table.methods.insert(
                    entry.name,
                    ClassMember::TraitMethod {
                        source: entry.source,
                        visibility: entry.visibility,
                        name: entry.name,
                    },
                );
            }
        }

        // Field composition in trait-use declaration order; names already
        // taken by own fields or earlier traits are suppressed.
        for trait_use in &trait_uses {
            let target = self.arena.get(trait_use.target);
            if target.kind != TypeKind::Trait {
                continue;
            }
            let Some(trait_decl) = target.decl.as_ref() else {
                continue;
            };
            for (index, member) in trait_decl.members.iter().enumerate() {
                let Member::Field(field) = member else {
                    continue;
                };
                if table.fields.contains_key(&field.name) {
                    continue;
                }
                table.fields.insert(
                    field.name,
                    ClassMember::TraitField {
                        source: TraitMemberRef {
                            declaring_trait: trait_use.target,
                            member_index: index as u32,
                        },
                        visibility: field.visibility,
                        name: field.name,
                    },
                );
            }
        }

        self.check_field_accessibility(symbol);
        table
    }

    /// Build the member map for one use of `trait_id`, applying the use
    /// site's adaptations. `in_progress` guards against traits using
    /// themselves transitively.
    fn trait_member_map(
        &self,
        trait_id: SymbolId,
        adaptations: &[Adaptation],
        in_progress: &mut FxHashSet<SymbolId>,
    ) -> TraitMemberMap {
        let mut map = TraitMemberMap::default();
        if !in_progress.insert(trait_id) {
            return map;
        }
        let symbol = self.arena.get(trait_id);
        if symbol.kind == TypeKind::Trait
            && let Some(decl) = symbol.decl.as_ref()
        {
            self.ensure_resolved(trait_id);

            // Pass 1a: the trait's own trait uses compose transitively,
            // inner-first.
            if let Some(signature) = symbol.signature() {
                for inner in &signature.trait_uses {
                    let inner_adaptations = &decl.trait_uses[inner.use_index as usize].adaptations;
                    let inner_map =
                        self.trait_member_map(inner.target, inner_adaptations, in_progress);
                    for (name, entry) in inner_map.entries {
                        map.entries.insert(name, entry);
                    }
                }
            }

            // Pass 1b: the trait's own ordinary instance methods override.
            for (index, member) in decl.members.iter().enumerate() {
                let Member::Method(method) = member else {
                    continue;
                };
                if method.is_constructor() || method.is_static() {
                    continue;
                }
                map.entries.insert(
                    method.name,
                    TraitMapEntry {
                        source: TraitMemberRef {
                            declaring_trait: trait_id,
                            member_index: index as u32,
                        },
                        visibility: method.visibility,
                        name: method.name,
                    },
                );
            }

            // Pass 2: use-site adaptations in source order.
            for adaptation in adaptations {
                self.apply_adaptation(&mut map, trait_id, adaptation);
            }
        }
        in_progress.remove(&trait_id);
        map
    }

    fn apply_adaptation(&self, map: &mut TraitMemberMap, trait_id: SymbolId, adaptation: &Adaptation) {
        match adaptation {
            Adaptation::Precedence { member, losers, .. } => {
                let Some(entry) = map.entries.get(member) else {
                    return;
                };
                let declaring = self.arena.get(entry.source.declaring_trait).name;
                if losers.iter().any(|loser| loser.name == declaring) {
                    map.entries.shift_remove(member);
                }
            }
            Adaptation::Alias {
                source_trait,
                source_name,
                new_name,
                new_visibility,
                ..
            } => {
                let Some(source_entry) =
                    self.alias_source_entry(map, trait_id, source_trait.as_ref(), *source_name)
                else {
                    return;
                };
                let effective_name = new_name.unwrap_or(*source_name);
                // An alias never removes the source-name mapping; the
                // target-name mapping is overwritten whether or not it
                // pointed at the same source member.
                map.entries.insert(
                    effective_name,
                    TraitMapEntry {
                        source: source_entry.source,
                        visibility: new_visibility.unwrap_or(source_entry.visibility),
                        name: effective_name,
                    },
                );
            }
        }
    }

    /// Find the member an alias refers to: the current mapping when no
    /// source trait is spelled out, otherwise the member as declared by the
    /// named trait.
    fn alias_source_entry(
        &self,
        map: &TraitMemberMap,
        trait_id: SymbolId,
        source_trait: Option<&TypeRef>,
        source_name: Atom,
    ) -> Option<TraitMapEntry> {
        let Some(source) = source_trait else {
            return map.entries.get(&source_name).copied();
        };
        let target_id = if source.name == self.arena.get(trait_id).name {
            trait_id
        } else {
            self.lookup_types(source.name)
                .iter()
                .copied()
                .find(|&candidate| self.arena.get(candidate).kind == TypeKind::Trait)?
        };
        let target = self.arena.get(target_id);
        let decl = target.decl.as_ref()?;
        let (index, method) = decl.members.iter().enumerate().find_map(|(i, m)| match m {
            Member::Method(method) if method.name == source_name => Some((i, method)),
            _ => None,
        })?;
        Some(TraitMapEntry {
            source: TraitMemberRef {
                declaring_trait: target_id,
                member_index: index as u32,
            },
            visibility: method.visibility,
            name: source_name,
        })
    }

    fn trait_member_is_abstract(&self, member: TraitMemberRef) -> bool {
        let symbol = self.arena.get(member.declaring_trait);
        let Some(decl) = symbol.decl.as_ref() else {
            return false;
        };
        match decl.members.get(member.member_index as usize) {
            Some(Member::Method(method)) => method.is_abstract(),
            _ => false,
        }
    }

    /// A field redeclaration must not narrow visibility relative to the
    /// nearest inherited field of the same name.
    fn check_field_accessibility(&self, symbol: &Arc<TypeSymbol>) {
        let Some(decl) = symbol.decl.as_ref() else {
            return;
        };
        let Some(file) = symbol.file() else {
            return;
        };
        for field in decl.fields() {
            let mut guard: FxHashSet<SymbolId> = FxHashSet::default();
            let mut current = symbol.signature().and_then(|sig| sig.base);
            while let Some(base_id) = current {
                if !guard.insert(base_id) {
                    break;
                }
                let base = self.arena.get(base_id);
                if !base.is_source() {
                    break;
                }
                self.ensure_resolved(base_id);
                if let Some(base_decl) = base.decl.as_ref()
                    && let Some(inherited) = base_decl.fields().find(|f| f.name == field.name)
                {
                    if field.visibility.is_narrower_than(inherited.visibility) {
                        let field_name = self.interner().resolve(field.name);
                        let type_name = symbol.name.text(self.interner());
                        let message = diagnostics::format_message(
                            diagnostics::diagnostic_messages::PROPERTY_ACCESSIBILITY_ERROR,
                            &[&field_name, &type_name],
                        );
                        self.push_deduped(
                            Diagnostic::error(
                                self.file_path(file),
                                field.span,
                                message,
                                diagnostics::diagnostic_codes::PROPERTY_ACCESSIBILITY_ERROR,
                            ),
                            file,
                        );
                    }
                    // The nearest inherited declaration decides.
                    break;
                }
                current = base.signature().and_then(|sig| sig.base);
            }
        }
    }
}
