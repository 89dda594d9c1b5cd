//! Shared fixtures for the resolver integration tests.
//!
//! Declarations are built as plain data, the way the parser would hand them
//! over, with names interned through the table under test.

#![allow(dead_code)]

use phz_ast::{
    Accessibility, Adaptation, DeclFlags, FieldDecl, FunctionDeclaration, Member, MemberFlags,
    MethodDecl, SourceFile, TraitUseDecl, TypeDeclKind, TypeDeclaration, TypeRef,
};
use phz_common::{QualifiedName, Span};
use phz_resolver::SymbolTable;
use std::sync::Arc;

/// Install a `tracing` subscriber when `PHZ_LOG` is set; zero overhead
/// otherwise.
pub fn init_tracing() {
    if std::env::var("PHZ_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_env("PHZ_LOG"))
            .try_init();
    }
}

pub fn name(table: &SymbolTable, text: &str) -> QualifiedName {
    QualifiedName::intern(table.interner(), text)
}

pub fn type_ref(table: &SymbolTable, text: &str, start: u32) -> TypeRef {
    TypeRef::new(name(table, text), Span::new(start, text.len() as u32))
}

fn decl(table: &SymbolTable, text: &str, kind: TypeDeclKind) -> TypeDeclaration {
    TypeDeclaration {
        name: name(table, text),
        kind,
        flags: DeclFlags::empty(),
        span: Span::new(0, text.len() as u32),
        base: None,
        interfaces: Vec::new(),
        trait_uses: Vec::new(),
        members: Vec::new(),
    }
}

pub fn class(table: &SymbolTable, text: &str) -> TypeDeclaration {
    decl(table, text, TypeDeclKind::Class)
}

pub fn interface(table: &SymbolTable, text: &str) -> TypeDeclaration {
    decl(table, text, TypeDeclKind::Interface)
}

pub fn trait_decl(table: &SymbolTable, text: &str) -> TypeDeclaration {
    decl(table, text, TypeDeclKind::Trait)
}

pub fn function(table: &SymbolTable, text: &str) -> FunctionDeclaration {
    FunctionDeclaration {
        name: name(table, text),
        flags: DeclFlags::empty(),
        span: Span::new(0, text.len() as u32),
    }
}

pub fn method(table: &SymbolTable, text: &str) -> Member {
    Member::Method(MethodDecl {
        name: table.interner().intern(text),
        visibility: Accessibility::Public,
        flags: MemberFlags::empty(),
        span: Span::new(0, text.len() as u32),
    })
}

pub fn method_with(
    table: &SymbolTable,
    text: &str,
    visibility: Accessibility,
    flags: MemberFlags,
) -> Member {
    Member::Method(MethodDecl {
        name: table.interner().intern(text),
        visibility,
        flags,
        span: Span::new(0, text.len() as u32),
    })
}

pub fn field(table: &SymbolTable, text: &str, visibility: Accessibility) -> Member {
    Member::Field(FieldDecl {
        name: table.interner().intern(text),
        visibility,
        flags: MemberFlags::empty(),
        span: Span::new(0, text.len() as u32),
    })
}

pub fn field_at(
    table: &SymbolTable,
    text: &str,
    visibility: Accessibility,
    start: u32,
) -> Member {
    Member::Field(FieldDecl {
        name: table.interner().intern(text),
        visibility,
        flags: MemberFlags::empty(),
        span: Span::new(start, text.len() as u32),
    })
}

/// Plain trait use without adaptations.
pub fn uses(table: &SymbolTable, text: &str, start: u32) -> TraitUseDecl {
    TraitUseDecl {
        trait_ref: type_ref(table, text, start),
        adaptations: Vec::new(),
    }
}

/// `winner::member insteadof losers;`
pub fn precedence(
    table: &SymbolTable,
    member: &str,
    winner: &str,
    losers: &[&str],
    start: u32,
) -> Adaptation {
    Adaptation::Precedence {
        member: table.interner().intern(member),
        winner: type_ref(table, winner, start),
        losers: losers
            .iter()
            .enumerate()
            .map(|(i, loser)| type_ref(table, loser, start + 16 * (i as u32 + 1)))
            .collect(),
        span: Span::new(start, 8),
    }
}

/// `source_trait::source as visibility new_name;` with optional parts.
pub fn alias(
    table: &SymbolTable,
    source_trait: Option<&str>,
    source: &str,
    new_name: Option<&str>,
    new_visibility: Option<Accessibility>,
    start: u32,
) -> Adaptation {
    Adaptation::Alias {
        source_trait: source_trait.map(|t| type_ref(table, t, start)),
        source_name: table.interner().intern(source),
        new_name: new_name.map(|n| table.interner().intern(n)),
        new_visibility,
        span: Span::new(start, 8),
    }
}

pub fn file(path: &str, types: Vec<TypeDeclaration>) -> SourceFile {
    let mut source = SourceFile::new(path);
    source.types = types.into_iter().map(Arc::new).collect();
    source
}

/// Single symbol registered under `text`; panics when the name is missing or
/// ambiguous.
pub fn sole(table: &SymbolTable, text: &str) -> phz_resolver::SymbolId {
    let found = table.lookup_types(name(table, text));
    assert_eq!(found.len(), 1, "expected exactly one declaration of {text}");
    found[0]
}
