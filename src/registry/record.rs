use crate::url::UrlId;
use std::collections::HashSet;

/// One entry per distinct URL ever seen during a run
///
/// Records are owned by the [`Registry`](super::Registry); callers only ever
/// see clones returned by `lookup` or `records`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// Hash-derived identifier (primary key)
    pub id: UrlId,

    /// The URL string exactly as it was registered
    pub url: String,

    /// True until the content is found non-textual or the fetch fails
    pub parsable: bool,

    /// True once the fetch/extract step for this URL has completed
    pub crawled: bool,

    /// Identifiers of URLs discovered in this URL's content
    pub outbound: HashSet<UrlId>,

    /// Owned by a worker that has not finished with it yet
    pub(crate) in_flight: bool,
}

impl UrlRecord {
    pub(crate) fn new(id: UrlId, url: &str) -> Self {
        Self {
            id,
            url: url.to_string(),
            parsable: true,
            crawled: false,
            outbound: HashSet::new(),
            in_flight: false,
        }
    }

    /// Returns true if a worker currently owns this URL
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Returns true if the URL is neither crawled nor owned by a worker
    pub fn is_pending(&self) -> bool {
        !self.crawled && !self.in_flight
    }
}
