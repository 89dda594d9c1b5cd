//! Diagnostic infrastructure.
//!
//! Resolution never aborts compilation: user-facing failures become
//! `Diagnostic` records accumulated in a `DiagnosticBag` and drained by the
//! caller. Only programmer-contract violations panic.

use crate::span::Span;
use serde::Serialize;
use std::sync::Mutex;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

/// A single diagnostic record: `(severity, file, span, code, message)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub span: Span,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, span: Span, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            file: file.into(),
            span,
            message_text: message.into(),
        }
    }

    pub fn warning(
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            code,
            file: file.into(),
            span,
            message_text: message.into(),
        }
    }
}

/// Diagnostic codes owned by declaration resolution.
pub mod diagnostic_codes {
    pub const CANNOT_EXTEND_FROM: u32 = 4510;
    pub const CANNOT_IMPLEMENT_NON_INTERFACE: u32 = 4511;
    pub const CANNOT_USE_NON_TRAIT: u32 = 4512;
    pub const CIRCULAR_BASE_DEPENDENCY: u32 = 4520;
    pub const AMBIGUOUS_DECLARATION: u32 = 4530;
    pub const PROPERTY_ACCESSIBILITY_ERROR: u32 = 4540;
}

/// Message templates; `{n}` placeholders are filled by [`format_message`].
pub mod diagnostic_messages {
    pub const CANNOT_EXTEND_FROM: &str = "Type '{0}' cannot extend '{1}' because it is not a class.";
    pub const CANNOT_IMPLEMENT_NON_INTERFACE: &str =
        "Type '{0}' cannot implement '{1}' because it is not an interface.";
    pub const CANNOT_USE_NON_TRAIT: &str = "Type '{0}' cannot use '{1}' because it is not a trait.";
    pub const CIRCULAR_BASE_DEPENDENCY: &str = "Circular base dependency involving type '{0}'.";
    pub const AMBIGUOUS_DECLARATION: &str =
        "Declaration of '{0}' is ambiguous; {1} candidate definitions are in scope.";
    pub const PROPERTY_ACCESSIBILITY_ERROR: &str =
        "Property '{0}' of type '{1}' must not be less accessible than the inherited property it redeclares.";
}

/// Substitute `{0}`, `{1}`, ... placeholders in a message template.
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A thread-safe diagnostic sink.
///
/// Resolution is triggered lazily from shared-`&self` accessors, possibly on
/// several worker threads at once, so the sink synchronizes internally
/// instead of being threaded through as `&mut`.
#[derive(Default)]
pub struct DiagnosticBag {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().unwrap().push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain all accumulated diagnostics, leaving the bag empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock().unwrap())
    }

    /// Clone out the current contents without draining.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        let msg = format_message(diagnostic_messages::CANNOT_EXTEND_FROM, &["A", "I"]);
        assert_eq!(msg, "Type 'A' cannot extend 'I' because it is not a class.");
    }

    #[test]
    fn test_bag_take_drains() {
        let bag = DiagnosticBag::new();
        bag.add(Diagnostic::error("a.phz", Span::new(0, 1), "boom", 4510));
        assert_eq!(bag.len(), 1);
        let taken = bag.take();
        assert_eq!(taken.len(), 1);
        assert!(bag.is_empty());
    }
}
