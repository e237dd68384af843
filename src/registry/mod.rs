//! URL registry: the authoritative store of every URL seen in a run
//!
//! The registry deduplicates URLs by [`UrlId`], owns every [`UrlRecord`] and
//! is the single place where record state changes. All operations take one
//! short-lived lock; no caller ever holds it across network I/O.
//!
//! # State transitions
//!
//! ```text
//! register ──> pending ──claim──> in flight ──mark_crawled──> crawled
//!                 ^                   │
//!                 └──────release──────┘
//! ```
//!
//! `crawled` never reverts and `outbound` never shrinks.

mod record;

pub use record::UrlRecord;

use crate::url::UrlId;
use std::collections::{HashMap, HashSet};
use std::mem::size_of;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors raised by registry operations
///
/// These indicate a caller bug: every id handed to the registry must come
/// from an earlier `register` call on the same registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown URL id: {0}")]
    UnknownId(UrlId),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Estimated bytes per record, excluding the URL string itself
const RECORD_OVERHEAD: usize = size_of::<UrlId>() + size_of::<UrlRecord>() + 16;

/// Estimated bytes per outbound edge
const EDGE_OVERHEAD: usize = size_of::<UrlId>() + 8;

#[derive(Debug, Default)]
struct RegistryInner {
    records: HashMap<UrlId, UrlRecord>,
    seeds: HashSet<UrlId>,
    approx_bytes: usize,
}

impl RegistryInner {
    fn get_mut(&mut self, id: UrlId) -> RegistryResult<&mut UrlRecord> {
        self.records
            .get_mut(&id)
            .ok_or(RegistryError::UnknownId(id))
    }
}

/// Thread-safe map from URL id to URL record
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    /// Creates an empty registry for a new crawl run
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // A worker panicking mid-update leaves every record in a valid state,
        // so a poisoned lock is still safe to use.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a URL, creating its record on first sight
    ///
    /// Idempotent: registering the same string again returns the same id
    /// and leaves the existing record untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use spidy_map::registry::Registry;
    ///
    /// let registry = Registry::new();
    /// let a = registry.register("http://example.test/a");
    /// assert_eq!(a, registry.register("http://example.test/a"));
    /// assert_eq!(registry.len(), 1);
    /// ```
    pub fn register(&self, url: &str) -> UrlId {
        let id = UrlId::of(url);
        let mut inner = self.lock();
        if inner.records.contains_key(&id) {
            tracing::trace!("URL already registered: {}", url);
        } else {
            inner.records.insert(id, UrlRecord::new(id, url));
            inner.approx_bytes += RECORD_OVERHEAD + url.len();
            tracing::trace!("Registered new URL {} as {}", url, id);
        }
        id
    }

    /// Registers a URL and remembers it as a seed of this run
    ///
    /// Seeds are always graph nodes, even when they end up with no edges.
    pub fn register_seed(&self, url: &str) -> UrlId {
        let id = self.register(url);
        self.lock().seeds.insert(id);
        id
    }

    /// Hands a pending URL to the calling worker
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The caller now owns the URL and must eventually call
    ///   `mark_crawled` or `release`
    /// * `Ok(false)` - The URL is already crawled or owned by another worker
    pub fn claim(&self, id: UrlId) -> RegistryResult<bool> {
        let mut inner = self.lock();
        let record = inner.get_mut(id)?;
        if !record.is_pending() {
            return Ok(false);
        }
        record.in_flight = true;
        Ok(true)
    }

    /// Returns a claimed URL to the pending state without crawling it
    pub fn release(&self, id: UrlId) -> RegistryResult<()> {
        let mut inner = self.lock();
        inner.get_mut(id)?.in_flight = false;
        Ok(())
    }

    /// Marks a URL as crawled. No-op if it already is.
    pub fn mark_crawled(&self, id: UrlId) -> RegistryResult<()> {
        let mut inner = self.lock();
        let record = inner.get_mut(id)?;
        record.crawled = true;
        record.in_flight = false;
        Ok(())
    }

    /// Marks a URL's content as not eligible for link extraction
    pub fn mark_unparsable(&self, id: UrlId) -> RegistryResult<()> {
        let mut inner = self.lock();
        inner.get_mut(id)?.parsable = false;
        Ok(())
    }

    /// Records that `source` links to `target`
    ///
    /// Both ids must already be registered. Repeated edges collapse.
    pub fn add_edge(&self, source: UrlId, target: UrlId) -> RegistryResult<()> {
        let mut inner = self.lock();
        if !inner.records.contains_key(&target) {
            return Err(RegistryError::UnknownId(target));
        }
        let inserted = inner.get_mut(source)?.outbound.insert(target);
        if inserted {
            inner.approx_bytes += EDGE_OVERHEAD;
        }
        Ok(())
    }

    /// Returns true if the URL has been crawled
    ///
    /// Unknown ids are reported as not crawled.
    pub fn is_crawled(&self, id: UrlId) -> bool {
        self.lock()
            .records
            .get(&id)
            .map(|record| record.crawled)
            .unwrap_or(false)
    }

    /// Returns a copy of the record for `id`, if registered
    pub fn lookup(&self, id: UrlId) -> Option<UrlRecord> {
        self.lock().records.get(&id).cloned()
    }

    /// Returns the ids registered as seeds
    pub fn seeds(&self) -> HashSet<UrlId> {
        self.lock().seeds.clone()
    }

    /// Returns a copy of every record, taken under a single lock
    pub fn records(&self) -> Vec<UrlRecord> {
        self.lock().records.values().cloned().collect()
    }

    /// Number of distinct URLs registered
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Returns true if nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Estimated heap bytes held by the registry
    pub fn approx_bytes(&self) -> usize {
        self.lock().approx_bytes
    }
}
