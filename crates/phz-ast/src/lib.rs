//! Parsed declaration nodes consumed by the phz resolver.
//!
//! The parser is an external collaborator; it contributes one [`SourceFile`]
//! per input, each owning its [`TypeDeclaration`] and [`FunctionDeclaration`]
//! nodes. Everything here is plain immutable data — resolution state lives
//! entirely in `phz-resolver`.

pub mod declarations;

pub use declarations::{
    Accessibility, Adaptation, DeclFlags, FieldDecl, FunctionDeclaration, Member, MemberFlags,
    MethodDecl, SourceFile, TraitUseDecl, TypeDeclKind, TypeDeclaration, TypeRef,
};
