//! Stable per-version external names.
//!
//! When several versions or several same-named conditional declarations must
//! be distinguished in emitted output, each version gets an ordinal suffix.
//! The suffix is unique per (qualified name, file, declaration order)
//! because chain ordinals are positional over the deterministic registry
//! order.

use crate::symbol::SymbolId;
use crate::table::SymbolTable;

/// Separator between a qualified name and its version ordinal.
pub const VERSION_SUFFIX_SEPARATOR: char = '@';

/// External name of one version: the plain qualified name when it is the
/// sole version, otherwise `Name@ordinal`.
pub fn versioned_name(table: &SymbolTable, id: SymbolId) -> String {
    let symbol = table.symbol(id);
    let text = symbol.name.text(table.interner());
    let chain = table.version_chain(symbol.name);
    if chain.len() <= 1 {
        text.to_string()
    } else {
        format!("{}{}{}", text, VERSION_SUFFIX_SEPARATOR, symbol.version())
    }
}
