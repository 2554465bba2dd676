//! Batch threshold tracking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running count of stored events. Incremented by the worker on every save
/// and reset to the store's count after each flush.
#[derive(Debug)]
pub struct BatchCounter {
    max_batch_size: u64,
    observed: AtomicU64,
}

impl BatchCounter {
    /// Counter firing at `max_batch_size` stored events.
    pub fn new(max_batch_size: u64) -> Self {
        Self {
            max_batch_size,
            observed: AtomicU64::new(0),
        }
    }

    /// Count one saved event. Returns `true` when a flush is due.
    pub fn record_save(&self) -> bool {
        let count = self.observed.fetch_add(1, Ordering::AcqRel) + 1;
        count >= self.max_batch_size
    }

    /// Reset to the store's count after a flush.
    pub fn resync(&self, count: u64) {
        self.observed.store(count, Ordering::Release);
    }

    /// Current count.
    pub fn observed(&self) -> u64 {
        self.observed.load(Ordering::Acquire)
    }

    /// Configured threshold.
    pub fn max_batch_size(&self) -> u64 {
        self.max_batch_size
    }
}
