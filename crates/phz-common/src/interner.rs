//! String interner for identifier deduplication.
//!
//! Identifiers and member names are interned into a shared pool and passed
//! around as `Atom`s (u32 indices). Comparisons become integer comparisons,
//! and the maps keyed by member name throughout the resolver stay cheap.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// An interned string identifier.
///
/// Atoms are cheap to copy (just a u32) and can be compared with == in O(1).
/// To get the actual string, use `Interner::resolve(atom)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// A sentinel value representing no atom / empty string.
    pub const NONE: Atom = Atom(0);

    /// Check if this is the empty/none atom.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Get the raw index value.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Keywords and member names common enough to pre-seed, so their atoms are
/// stable regardless of input order.
const COMMON_STRINGS: &[&str] = &[
    "",
    // Keywords
    "abstract",
    "class",
    "const",
    "extends",
    "final",
    "function",
    "implements",
    "insteadof",
    "interface",
    "namespace",
    "new",
    "private",
    "protected",
    "public",
    "static",
    "trait",
    "use",
    // Common member names
    "__construct",
    "__destruct",
    "__get",
    "__set",
    "__call",
    "__toString",
    "run",
    "value",
    "name",
];

struct InternerInner {
    map: FxHashMap<Arc<str>, u32>,
    strings: Vec<Arc<str>>,
}

/// Thread-safe string pool handing out `Atom`s.
pub struct Interner {
    inner: RwLock<InternerInner>,
}

impl Interner {
    pub fn new() -> Self {
        let mut inner = InternerInner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(COMMON_STRINGS.len()),
        };
        for s in COMMON_STRINGS {
            let arc: Arc<str> = Arc::from(*s);
            let id = inner.strings.len() as u32;
            inner.map.insert(arc.clone(), id);
            inner.strings.push(arc);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Intern a string, returning its atom. Repeated calls with equal text
    /// return equal atoms.
    pub fn intern(&self, text: &str) -> Atom {
        {
            let inner = self.inner.read().unwrap();
            if let Some(&id) = inner.map.get(text) {
                return Atom(id);
            }
        }
        let mut inner = self.inner.write().unwrap();
        // Re-check under the write lock; another thread may have won the race.
        if let Some(&id) = inner.map.get(text) {
            return Atom(id);
        }
        let arc: Arc<str> = Arc::from(text);
        let id = inner.strings.len() as u32;
        inner.map.insert(arc.clone(), id);
        inner.strings.push(arc);
        Atom(id)
    }

    /// Resolve an atom back to its text.
    ///
    /// Panics if the atom was not produced by this interner; that is a
    /// programmer-contract violation, not a user-facing error.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let inner = self.inner.read().unwrap();
        inner.strings[atom.0 as usize].clone()
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
