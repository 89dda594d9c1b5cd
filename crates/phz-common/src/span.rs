//! Byte-offset source spans.

use serde::{Deserialize, Serialize};

/// A half-open byte range into one source file, stored as start + length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub length: u32,
}

impl Span {
    pub const fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    /// A zero-width span at offset 0, used for synthesized nodes.
    pub const fn empty() -> Self {
        Self {
            start: 0,
            length: 0,
        }
    }

    #[inline]
    pub fn end(self) -> u32 {
        self.start + self.length
    }
}
