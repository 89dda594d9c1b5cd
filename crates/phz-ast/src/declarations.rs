//! Declaration node definitions.
//!
//! These mirror what the parser produces for type and function declarations:
//! qualified name, member list, base/interface references, and trait-use
//! blocks with their ordered adaptation lists. A declaration parsed inside a
//! runtime conditional (an `if` branch, for example) carries
//! `DeclFlags::CONDITIONAL`; the same qualified name may then have several
//! mutually exclusive definitions across files.

use bitflags::bitflags;
use phz_common::{Atom, QualifiedName, Span};
use std::sync::Arc;

/// What sort of type a declaration introduces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeDeclKind {
    Class,
    Interface,
    Trait,
}

bitflags! {
    /// Modifier set on a type or function declaration.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DeclFlags: u16 {
        const ABSTRACT = 1 << 0;
        const FINAL = 1 << 1;
        const STATIC = 1 << 2;
        /// Reachable only along some control paths; set by the parser when
        /// the declaration sits inside a runtime conditional.
        const CONDITIONAL = 1 << 3;
    }
}

bitflags! {
    /// Modifier set on a class/trait member.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct MemberFlags: u8 {
        const STATIC = 1 << 0;
        const ABSTRACT = 1 << 1;
        /// Marks the constructor method.
        const CONSTRUCTOR = 1 << 2;
    }
}

/// Member visibility. Ordering is widest-first so narrowing checks can
/// compare discriminants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Accessibility {
    Public,
    Protected,
    Private,
}

impl Accessibility {
    /// Whether `self` exposes strictly less than `other`.
    #[inline]
    pub fn is_narrower_than(self, other: Accessibility) -> bool {
        self > other
    }
}

/// One base/interface/trait mention: the referenced name plus the span of
/// the reference itself (not of the referenced declaration).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeRef {
    pub name: QualifiedName,
    pub span: Span,
}

impl TypeRef {
    pub fn new(name: QualifiedName, span: Span) -> Self {
        Self { name, span }
    }
}

/// A use-site directive resolving or renaming conflicting trait members.
#[derive(Clone, Debug)]
pub enum Adaptation {
    /// `Winner::member insteadof Loser1, Loser2;`
    Precedence {
        member: Atom,
        winner: TypeRef,
        losers: Vec<TypeRef>,
        span: Span,
    },
    /// `SourceTrait::member as [visibility] [new_name];`
    Alias {
        source_trait: Option<TypeRef>,
        source_name: Atom,
        new_name: Option<Atom>,
        new_visibility: Option<Accessibility>,
        span: Span,
    },
}

impl Adaptation {
    pub fn span(&self) -> Span {
        match self {
            Adaptation::Precedence { span, .. } | Adaptation::Alias { span, .. } => *span,
        }
    }
}

/// One trait mention inside a `use` block, with the block's adaptations.
#[derive(Clone, Debug)]
pub struct TraitUseDecl {
    pub trait_ref: TypeRef,
    pub adaptations: Vec<Adaptation>,
}

/// A method declared directly on a class, interface, or trait.
#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub name: Atom,
    pub visibility: Accessibility,
    pub flags: MemberFlags,
    pub span: Span,
}

impl MethodDecl {
    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.flags.contains(MemberFlags::CONSTRUCTOR)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MemberFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }
}

/// A field (property) declared directly on a class or trait.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: Atom,
    pub visibility: Accessibility,
    pub flags: MemberFlags,
    pub span: Span,
}

/// A declared member.
#[derive(Clone, Debug)]
pub enum Member {
    Method(MethodDecl),
    Field(FieldDecl),
}

impl Member {
    pub fn name(&self) -> Atom {
        match self {
            Member::Method(m) => m.name,
            Member::Field(f) => f.name,
        }
    }
}

/// A parsed class/interface/trait declaration.
#[derive(Clone, Debug)]
pub struct TypeDeclaration {
    pub name: QualifiedName,
    pub kind: TypeDeclKind,
    pub flags: DeclFlags,
    /// Span of the declaration header, used for declaration-level
    /// diagnostics.
    pub span: Span,
    /// Explicit base-class reference; `None` for interfaces and traits, and
    /// for classes that default to the platform root object type.
    pub base: Option<TypeRef>,
    /// Implemented-interface references in source order.
    pub interfaces: Vec<TypeRef>,
    /// Trait-use blocks in source order.
    pub trait_uses: Vec<TraitUseDecl>,
    pub members: Vec<Member>,
}

impl TypeDeclaration {
    #[inline]
    pub fn is_conditional(&self) -> bool {
        self.flags.contains(DeclFlags::CONDITIONAL)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    /// Find a member declared directly on this type.
    pub fn find_member(&self, name: Atom) -> Option<&Member> {
        self.members.iter().find(|m| m.name() == name)
    }
}

/// A parsed function declaration. Function bodies are opaque to resolution;
/// only the name and conditionality matter here.
#[derive(Clone, Debug)]
pub struct FunctionDeclaration {
    pub name: QualifiedName,
    pub flags: DeclFlags,
    pub span: Span,
}

impl FunctionDeclaration {
    #[inline]
    pub fn is_conditional(&self) -> bool {
        self.flags.contains(DeclFlags::CONDITIONAL)
    }
}

/// One parsed source file, identified by its normalized relative path.
#[derive(Clone, Debug, Default)]
pub struct SourceFile {
    pub path: String,
    pub types: Vec<Arc<TypeDeclaration>>,
    pub functions: Vec<Arc<FunctionDeclaration>>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            types: Vec::new(),
            functions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessibility_narrowing() {
        assert!(Accessibility::Private.is_narrower_than(Accessibility::Public));
        assert!(Accessibility::Protected.is_narrower_than(Accessibility::Public));
        assert!(Accessibility::Private.is_narrower_than(Accessibility::Protected));
        assert!(!Accessibility::Public.is_narrower_than(Accessibility::Public));
        assert!(!Accessibility::Public.is_narrower_than(Accessibility::Private));
    }

    #[test]
    fn test_conditional_flag() {
        let decl = FunctionDeclaration {
            name: QualifiedName::from_atom(phz_common::Atom(1)),
            flags: DeclFlags::CONDITIONAL,
            span: Span::empty(),
        };
        assert!(decl.is_conditional());
    }
}
