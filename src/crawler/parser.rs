//! Link extraction from textual bodies
//!
//! Links are found by pattern matching over the raw text rather than by
//! parsing markup, so the same extractor works for HTML, CSS, JavaScript,
//! JSON and feeds alike.
//!
//! # Matching rules
//!
//! **Matched:**
//! - Absolute `http://`, `https://` and `ftp://` URLs
//! - Hosts made of dotted labels ending in an alphabetic top-level label of
//!   two or more letters, or in a numeric octet (IPv4)
//! - An optional `:port`
//! - Path, query and fragment characters: letters, digits and `/-?+=_&%#~.`
//!
//! **Not matched:**
//! - Relative references (`/page`, `../up`); they are never resolved
//!   against the page URL
//! - Scheme-less hosts (`example.com/page`)
//! - Other schemes (`mailto:`, `javascript:`, `data:`)

use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:https?|ftp)://(?:www\.)?(?:[A-Za-z0-9-]+\.)+(?:[A-Za-z]{2,}|[0-9]{1,3})(?::[0-9]{1,5})?[/\-?+=_&%#~.0-9A-Za-z]*",
    )
    .expect("URL pattern is valid")
});

/// Lazily yields every URL match in `body`, in order of appearance
///
/// The iterator borrows `body` and has no side effects; calling this again
/// restarts the scan.
pub fn find_links(body: &str) -> impl Iterator<Item = &str> + '_ {
    URL_PATTERN.find_iter(body).map(|found| found.as_str())
}

/// Extracts every absolute URL in `body`, duplicates included
///
/// Deduplication is left to the registry.
///
/// # Examples
///
/// ```
/// use spidy_map::crawler::extract_links;
///
/// let body = r#"<a href="http://example.test/b">b</a> and /relative and https://example.test/c"#;
/// assert_eq!(
///     extract_links(body),
///     vec!["http://example.test/b", "https://example.test/c"]
/// );
/// ```
pub fn extract_links(body: &str) -> Vec<String> {
    find_links(body).map(str::to_string).collect()
}
