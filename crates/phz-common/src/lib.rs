//! Common types and utilities for the phz compiler.
//!
//! This crate provides foundational types used across all phz crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Qualified names (`QualifiedName`)
//! - Diagnostics (`Diagnostic`, `DiagnosticBag`, code/message tables)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Namespaced identifiers
pub mod name;
pub use name::QualifiedName;

// Diagnostic collection and formatting
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCategory};
