use url::Url;

/// Extracts the lowercase host from a URL string
///
/// Used for run statistics only; crawl identity never depends on the domain.
///
/// # Arguments
///
/// * `url` - The URL string to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain/host
/// * `None` - If the string does not parse or has no host
///
/// # Examples
///
/// ```
/// use spidy_map::url::extract_domain;
///
/// assert_eq!(extract_domain("https://EXAMPLE.com/path"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("not a url"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_lowercase())
}
