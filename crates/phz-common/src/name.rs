//! Namespaced identifiers.
//!
//! A `QualifiedName` is the full, namespace-qualified name of a type or
//! function (`App\Http\Kernel`). Identity is the interned atom of the full
//! text, so equality and hashing are case-sensitive integer comparisons.
//! Case-folding rules, if the surrounding compiler applies any, are a
//! collaborator concern and happen before interning.

use crate::interner::{Atom, Interner};
use serde::Serialize;
use std::sync::Arc;

/// Namespace separator in source text.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// A namespace-qualified identifier, interned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
pub struct QualifiedName(Atom);

impl QualifiedName {
    /// Intern the full qualified text (`Vendor\Pkg\Type`).
    pub fn intern(interner: &Interner, text: &str) -> Self {
        Self(interner.intern(text))
    }

    pub fn from_atom(atom: Atom) -> Self {
        Self(atom)
    }

    #[inline]
    pub fn atom(self) -> Atom {
        self.0
    }

    /// Full qualified text.
    pub fn text(self, interner: &Interner) -> Arc<str> {
        interner.resolve(self.0)
    }

    /// The last path segment (`Kernel` for `App\Http\Kernel`).
    pub fn short_name(self, interner: &Interner) -> String {
        let text = interner.resolve(self.0);
        match text.rfind(NAMESPACE_SEPARATOR) {
            Some(pos) => text[pos + 1..].to_string(),
            None => text.to_string(),
        }
    }
}
