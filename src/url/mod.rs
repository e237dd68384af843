//! URL identity for spidy-map
//!
//! Every URL string maps to a fixed-length identifier derived from a SHA-256
//! hash of its UTF-8 bytes. Identity is purely structural: the same string
//! always yields the same id, in any order and across runs.

mod domain;

pub use domain::extract_domain;

use sha2::{Digest, Sha256};
use std::fmt;

/// Fixed-length identifier of a URL string
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlId([u8; 32]);

impl UrlId {
    /// Computes the identifier of a URL string
    ///
    /// # Examples
    ///
    /// ```
    /// use spidy_map::url::UrlId;
    ///
    /// let a = UrlId::of("http://example.test/a");
    /// assert_eq!(a, UrlId::of("http://example.test/a"));
    /// assert_ne!(a, UrlId::of("http://example.test/b"));
    /// ```
    pub fn of(url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        Self(digest.into())
    }

    /// Returns the 64 character lowercase hex form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for UrlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for UrlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable
        write!(f, "UrlId({})", &self.to_hex()[..12])
    }
}
