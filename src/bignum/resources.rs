//! Allocation tracking and guards for large-number storage.
//!
//! Counting tables scale with the total weight times the per-element footprint of the backend,
//! so every acquisition goes through an [`AllocTracker`]:
//! - a byte budget ([`ResourceLimits`]) turns oversize requests into
//!   [`EngineError::LimitExceeded`],
//! - `try_reserve` wrappers surface allocator failures as [`EngineError::AllocationFailed`].
//!
//! Releases happen from `Drop` of the storage handles, so live counts return to zero on every
//! exit path.

use std::cell::Cell;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Budgets for one computation.
pub struct ResourceLimits {
    /// Maximum number of bytes held in large-number storage at any time.
    pub max_memory_bytes: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_memory_bytes: 16 << 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Snapshot of the tracker counters.
pub struct AllocCounts {
    pub live_bytes: u64,
    pub peak_bytes: u64,
    pub live_arrays: u64,
    pub total_arrays: u64,
}

#[derive(Debug, Default)]
/// Tracks storage held by one calculator.
pub struct AllocTracker {
    limits: ResourceLimits,
    live_bytes: Cell<u64>,
    peak_bytes: Cell<u64>,
    live_arrays: Cell<u64>,
    total_arrays: Cell<u64>,
}

impl AllocTracker {
    #[inline]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    #[inline]
    pub fn limits(&self) -> ResourceLimits {
        self.limits
    }

    #[inline]
    pub fn set_limits(&mut self, limits: ResourceLimits) {
        self.limits = limits;
    }

    #[inline]
    pub fn counts(&self) -> AllocCounts {
        AllocCounts {
            live_bytes: self.live_bytes.get(),
            peak_bytes: self.peak_bytes.get(),
            live_arrays: self.live_arrays.get(),
            total_arrays: self.total_arrays.get(),
        }
    }

    /// Account for `bytes` about to be allocated.
    pub fn acquire(&self, stage: &'static str, bytes: u64) -> Result<(), EngineError> {
        let observed = self.live_bytes.get().saturating_add(bytes);
        if observed > self.limits.max_memory_bytes {
            return Err(EngineError::LimitExceeded {
                stage,
                metric: "memory_bytes",
                limit: self.limits.max_memory_bytes,
                observed,
            });
        }

        self.live_bytes.set(observed);
        self.peak_bytes.set(self.peak_bytes.get().max(observed));
        self.live_arrays.set(self.live_arrays.get() + 1);
        self.total_arrays.set(self.total_arrays.get() + 1);
        Ok(())
    }

    #[inline]
    pub fn release(&self, bytes: u64) {
        self.live_bytes
            .set(self.live_bytes.get().saturating_sub(bytes));
        self.live_arrays
            .set(self.live_arrays.get().saturating_sub(1));
    }

    pub fn try_reserve_vec<T>(
        &self,
        stage: &'static str,
        structure: &'static str,
        v: &mut Vec<T>,
        additional: usize,
    ) -> Result<(), EngineError> {
        v.try_reserve_exact(additional)
            .map_err(|_| EngineError::AllocationFailed {
                stage,
                structure,
                bytes: (additional as u64).checked_mul(std::mem::size_of::<T>() as u64),
            })
    }
}
