//! Content classification
//!
//! Decides from response headers whether a body is worth scanning for links.

use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::fmt;
use std::sync::LazyLock;

/// MIME types that are textual and may contain links
pub const PARSABLE_TYPES: &[&str] = &[
    "text/html",
    "application/html",
    "application/xml",
    "text/plain",
    "text/javascript",
    "text/xml",
    "text/css",
    "application/javascript",
    "application/x-javascript",
    "application/json",
    "application/rss+xml",
    "application/atom+xml",
    "text/turtle",
    // Not an IANA type but found in the wild
    "plain/text",
];

static MIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:application|audio|font|image|message|model|multipart|text|video|plain|binary)/(?:[a-z0-9]+|[.+-])+",
    )
    .expect("MIME pattern is valid")
});

/// Declared content type of a response
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MimeType {
    /// A `type/subtype` pair, lowercased, without parameters
    Known(String),
    /// Header missing, not valid UTF-8, or not a recognizable MIME type
    Unknown,
}

impl MimeType {
    /// Returns the `type/subtype` string, if known
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Known(mime) => Some(mime),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(mime) => f.write_str(mime),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Extracts the declared MIME type from response headers
///
/// Never fails: anything missing or malformed is `MimeType::Unknown`.
///
/// # Examples
///
/// ```
/// use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
/// use spidy_map::crawler::{classify, MimeType};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
/// assert_eq!(classify(&headers), MimeType::Known("text/html".to_string()));
/// assert_eq!(classify(&HeaderMap::new()), MimeType::Unknown);
/// ```
pub fn classify(headers: &HeaderMap) -> MimeType {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        tracing::debug!("No content-type returned");
        return MimeType::Unknown;
    };

    let Ok(raw) = value.to_str() else {
        tracing::debug!("Content-type header is not valid UTF-8");
        return MimeType::Unknown;
    };

    let lowered = raw.to_ascii_lowercase();
    match MIME_PATTERN.find(&lowered) {
        Some(found) => MimeType::Known(found.as_str().to_string()),
        None => {
            tracing::debug!("Invalid MIME in content-type {:?}", raw);
            MimeType::Unknown
        }
    }
}

/// Returns true if the MIME type is on the parsable allow-list
pub fn is_parsable(mime: &MimeType) -> bool {
    mime.as_str()
        .map(|mime| PARSABLE_TYPES.contains(&mime))
        .unwrap_or(false)
}
