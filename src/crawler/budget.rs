//! Global visit budget shared by all workers
//!
//! A unit of work first reserves a slot, then completes it. Reservations
//! are capped at the limit, so even when every worker races for the last
//! slot the run never completes more than `limit` units.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Monotonic counter of completed units of work with an optional cap
#[derive(Debug)]
pub struct Budget {
    /// `None` means unbounded
    limit: Option<usize>,
    reserved: AtomicUsize,
    completed: AtomicUsize,
}

impl Budget {
    /// Creates a budget; a limit of zero means unbounded
    pub fn new(limit: usize) -> Self {
        Self {
            limit: (limit > 0).then_some(limit),
            reserved: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Returns the configured cap, or `None` when unbounded
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Reserves a slot for one unit of work
    ///
    /// Returns false once `limit` slots are reserved.
    pub fn try_reserve(&self) -> bool {
        match self.limit {
            None => {
                self.reserved.fetch_add(1, Ordering::SeqCst);
                true
            }
            Some(limit) => self
                .reserved
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |reserved| {
                    (reserved < limit).then_some(reserved + 1)
                })
                .is_ok(),
        }
    }

    /// Gives back a reservation that will not be used
    pub fn release(&self) {
        let _ = self
            .reserved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |reserved| {
                reserved.checked_sub(1)
            });
    }

    /// Records one completed unit, returning the new completed count
    pub fn complete(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of completed units so far
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns true once the cap has been reached by completed units
    pub fn is_exhausted(&self) -> bool {
        self.limit
            .map(|limit| self.completed() >= limit)
            .unwrap_or(false)
    }
}
