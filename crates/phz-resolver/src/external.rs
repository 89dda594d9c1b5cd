//! External type resolution.
//!
//! Names not found among source declarations are offered to an
//! [`ExternalTypeResolver`] — the boundary to referenced-library and runtime
//! types. External types are always unconditional and single-candidate.

use crate::symbol::TypeKind;
use phz_common::{Interner, QualifiedName};

/// Descriptor of a type provided from outside the source program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExternalType {
    pub name: QualifiedName,
    pub kind: TypeKind,
}

/// Collaborator service resolving names to library/runtime types. The
/// querying table's interner is passed through so implementations can match
/// or mint qualified names.
pub trait ExternalTypeResolver: Send + Sync {
    fn resolve(&self, interner: &Interner, name: QualifiedName) -> Option<ExternalType>;
}

/// The null resolver: every name misses.
pub struct NoExternalTypes;

impl ExternalTypeResolver for NoExternalTypes {
    fn resolve(&self, _interner: &Interner, _name: QualifiedName) -> Option<ExternalType> {
        None
    }
}

/// A fixed name -> kind mapping, convenient for embedders and tests.
pub struct FixedExternalTypes {
    types: Vec<(String, TypeKind)>,
}

impl FixedExternalTypes {
    pub fn new(types: Vec<(String, TypeKind)>) -> Self {
        Self { types }
    }
}

impl ExternalTypeResolver for FixedExternalTypes {
    fn resolve(&self, interner: &Interner, name: QualifiedName) -> Option<ExternalType> {
        let text = name.text(interner);
        self.types
            .iter()
            .find(|(known, _)| known.as_str() == &*text)
            .map(|&(_, kind)| ExternalType { name, kind })
    }
}
