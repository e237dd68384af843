//! Frontier: the shared working set of URLs awaiting a fetch attempt
//!
//! The frontier is a set, not a queue: duplicates are absorbed and `take`
//! yields an arbitrary pending URL. It also tracks how many taken URLs are
//! still being worked on, which lets the worker pool detect when the crawl
//! has run dry: once the set is empty and nothing is outstanding, no worker
//! can ever add another URL, so the frontier closes itself.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct FrontierState {
    pending: HashSet<String>,
    /// URLs handed out by `take` and not yet reported with `task_done`
    outstanding: usize,
    closed: bool,
    halted: bool,
}

impl FrontierState {
    fn pop_any(&mut self) -> Option<String> {
        let url = self.pending.iter().next().cloned()?;
        self.pending.remove(&url);
        Some(url)
    }
}

/// Shared pending-URL set with blocking take
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
}

impl Frontier {
    /// Creates an empty, open frontier
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a URL to the pending set
    ///
    /// Returns true if the URL was not already pending.
    pub fn add(&self, url: impl Into<String>) -> bool {
        let inserted = self.lock().pending.insert(url.into());
        if inserted {
            self.notify.notify_one();
        }
        inserted
    }

    /// Adds every URL in `urls`, returning how many were new
    pub fn add_all<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let added = {
            let mut state = self.lock();
            urls.into_iter()
                .map(Into::into)
                .filter(|url| state.pending.insert(url.clone()))
                .count()
        };
        if added > 0 {
            self.notify.notify_waiters();
        }
        added
    }

    /// Removes and returns one pending URL
    ///
    /// Waits while the set is empty but other workers still have URLs
    /// outstanding, since they may add more.
    ///
    /// # Returns
    ///
    /// * `Some(url)` - The caller owns this URL and must call `task_done`
    /// * `None` - The frontier is halted, or closed and drained
    pub async fn take(&self) -> Option<String> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before inspecting state so a wakeup sent
            // between the check and the await is not lost.
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.halted {
                    return None;
                }
                if let Some(url) = state.pop_any() {
                    state.outstanding += 1;
                    return Some(url);
                }
                if state.outstanding == 0 {
                    state.closed = true;
                }
                if state.closed {
                    drop(state);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Reports that the caller has finished with a URL it took
    pub fn task_done(&self) {
        let wake = {
            let mut state = self.lock();
            state.outstanding = state.outstanding.saturating_sub(1);
            state.outstanding == 0 && state.pending.is_empty()
        };
        if wake {
            self.notify.notify_waiters();
        }
    }

    /// Signals that no more URLs will be added
    ///
    /// Remaining URLs are still handed out; `take` returns `None` once the
    /// set is drained.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    /// Stops handing out URLs immediately
    ///
    /// Pending URLs stay in the set so the final frontier size can be
    /// reported. Used for budget exhaustion and operator shutdown.
    pub fn halt(&self) {
        {
            let mut state = self.lock();
            state.halted = true;
            state.closed = true;
        }
        self.notify.notify_waiters();
    }

    /// Returns true if the frontier was halted
    pub fn is_halted(&self) -> bool {
        self.lock().halted
    }

    /// Returns true if nothing is pending (advisory under concurrency)
    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// Number of pending URLs (advisory under concurrency)
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }
}
