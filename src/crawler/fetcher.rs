//! HTTP fetcher implementation
//!
//! This module defines the fetch capability the coordinator consumes and a
//! reqwest-backed implementation of it:
//! - Building an HTTP client with the run's fixed request headers
//! - Per-request timeout and redirect limit
//! - Classifying failures into tagged error kinds
//! - Skipping bodies whose content type cannot be parsed for links

use crate::config::{CrawlerConfig, HeadersConfig};
use crate::crawler::classifier::{classify, is_parsable};
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, InvalidHeaderValue, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    USER_AGENT,
};
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Schemes the HTTP client can retrieve
const FETCHABLE_SCHEMES: &[&str] = &["http", "https"];

/// A fetched response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Decoded response body
    pub body: String,
}

/// Classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The request or body read exceeded the timeout
    Timeout,
    /// The redirect chain exceeded the configured limit
    TooManyRedirects,
    /// DNS, connect, TLS or transport failure
    ConnectionError,
    /// The body could not be read or decoded
    EncodingError,
    /// The URL could not be turned into a request
    InvalidUrl,
    /// Anything else; treated as a fault rather than a network condition
    Other,
}

impl FetchErrorKind {
    /// Returns true for expected network conditions the crawl recovers from
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "Connection timed out",
            Self::TooManyRedirects => "Too many redirects",
            Self::ConnectionError => "Connection error",
            Self::EncodingError => "Chunked encoding error",
            Self::InvalidUrl => "Invalid URL",
            Self::Other => "Unclassified fetch error",
        };
        f.write_str(name)
    }
}

/// A failed fetch with its classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A timeout failure after `timeout` elapsed
    pub fn timeout(timeout: Duration) -> Self {
        Self::new(
            FetchErrorKind::Timeout,
            format!("no response within {:?}", timeout),
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            FetchErrorKind::Timeout
        } else if e.is_redirect() {
            FetchErrorKind::TooManyRedirects
        } else if e.is_connect() || e.is_request() {
            FetchErrorKind::ConnectionError
        } else if e.is_body() || e.is_decode() {
            FetchErrorKind::EncodingError
        } else if e.is_builder() {
            FetchErrorKind::InvalidUrl
        } else {
            FetchErrorKind::Other
        };
        Self::new(kind, e.to_string())
    }
}

/// The fetch capability consumed by the coordinator
///
/// Implementations must be cheap to share between workers. Request headers
/// and timeouts are fixed when the fetcher is built, not per call.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves `url`, returning the response or a classified failure
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Builds the fixed request header map for a run
pub fn build_request_headers(config: &HeadersConfig) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language)?,
    );
    headers.insert(
        ACCEPT_ENCODING,
        HeaderValue::from_str(&config.accept_encoding)?,
    );
    headers.insert(CONNECTION, HeaderValue::from_str(&config.connection)?);
    Ok(headers)
}

/// Builds an HTTP client with the run's headers, timeout and redirect limit
///
/// # Arguments
///
/// * `headers` - The request headers configuration
/// * `crawler` - The crawler configuration (timeout, redirect limit)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(SpidyError)` - A header value is invalid or the client failed to build
///
/// # Example
///
/// ```no_run
/// use spidy_map::config::Config;
/// use spidy_map::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.headers, &config.crawler).unwrap();
/// ```
pub fn build_http_client(
    headers: &HeadersConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, crate::SpidyError> {
    let default_headers = build_request_headers(headers)
        .map_err(|e| crate::SpidyError::InvalidHeader(e.to_string()))?;

    let client = Client::builder()
        .default_headers(default_headers)
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.request_timeout())
        .redirect(Policy::limited(crawler.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(
        headers: &HeadersConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, crate::SpidyError> {
        Ok(Self::new(build_http_client(headers, crawler)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| FetchError::new(FetchErrorKind::InvalidUrl, e.to_string()))?;

        // Links may use ftp, which the client cannot retrieve
        if !FETCHABLE_SCHEMES.contains(&parsed.scheme()) {
            return Err(FetchError::new(
                FetchErrorKind::InvalidUrl,
                format!("unsupported scheme: {}", parsed.scheme()),
            ));
        }

        let response = self.client.get(parsed).send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();

        if !response.status().is_success() {
            tracing::debug!("HTTP {} from {}", status, url);
        }

        // Unparsable bodies are never read into memory
        let body = if is_parsable(&classify(&headers)) {
            response.text().await?
        } else {
            String::new()
        };

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}
