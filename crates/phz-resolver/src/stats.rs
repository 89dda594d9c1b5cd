//! Resolution statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Internal counters, updated with relaxed atomics on the hot paths.
#[derive(Default)]
pub(crate) struct ResolutionStats {
    pub files_added: AtomicU64,
    pub files_removed: AtomicU64,
    pub cache_rebuilds: AtomicU64,
    pub symbols_allocated: AtomicU64,
    pub versions_published: AtomicU64,
}

impl ResolutionStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_added: self.files_added.load(Ordering::Relaxed),
            files_removed: self.files_removed.load(Ordering::Relaxed),
            cache_rebuilds: self.cache_rebuilds.load(Ordering::Relaxed),
            symbols_allocated: self.symbols_allocated.load(Ordering::Relaxed),
            versions_published: self.versions_published.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the resolution counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub files_added: u64,
    pub files_removed: u64,
    pub cache_rebuilds: u64,
    pub symbols_allocated: u64,
    pub versions_published: u64,
}
