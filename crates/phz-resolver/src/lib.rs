//! Declaration resolution for the phz compiler.
//!
//! This crate turns parsed type and trait-use declarations into a validated,
//! queryable symbol table. The source language permits conditionally
//! declared types (the same qualified name can have several mutually
//! exclusive definitions) and flat trait composition with explicit conflict
//! adaptations, so name resolution is a constrained search with ambiguity,
//! cycles, and partial failure rather than a plain map lookup.
//!
//! Module map:
//! - `table` - declaration registry, versioned lookup cache, query surface
//! - `symbol` - symbol arena, version chains, publish-once signatures
//! - `resolve` - base-signature resolution for one declaration
//! - `enumerate` - candidate-combination enumeration and validation
//! - `reachability` - unreachable-version and circular-base checking
//! - `traits` - trait member-map composition and forwarding synthesis
//! - `external` - boundary to referenced-library/runtime types
//! - `emit_name` - stable per-version external names
//!
//! Resolution is lazy and thread-safe: whichever phase first asks for a
//! symbol's base type, interfaces, or members triggers the computation, and
//! a per-symbol double-checked lock makes it happen at most once.

pub mod emit_name;
mod enumerate;
pub mod external;
pub mod options;
mod reachability;
pub mod resolve;
pub mod stats;
pub mod symbol;
pub mod table;
pub mod traits;

pub use emit_name::versioned_name;
pub use external::{ExternalType, ExternalTypeResolver, FixedExternalTypes, NoExternalTypes};
pub use options::ResolverOptions;
pub use resolve::Resolution;
pub use stats::StatsSnapshot;
pub use symbol::{
    FileId, FunctionSymbol, ResolvedTraitUse, Signature, SymbolArena, SymbolId, SymbolOrigin,
    TypeKind, TypeSymbol,
};
pub use table::SymbolTable;
pub use traits::{ClassMember, MemberTable, TraitMapEntry, TraitMemberMap, TraitMemberRef};
