use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use thiserror::Error;

use super::document::{parse_document, DocumentError};
use super::verify::{verification_for, FeedVerification, IconLookup, VerifyError};
use crate::normalize::{normalize, FeedDocument, NormalizedItem, Options};

const MAX_RETRIES: u32 = 3;
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_CONCURRENT_LOADS: usize = 4;

/// Client identifier sent with every request. The mirror rejects unknown
/// agents, so this mimics a long-established desktop reader.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_3; de-de) AppleWebKit/531.22.7 (KHTML, like Gecko) NetNewsWire/3.2.7 Tapestry/1.3";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching and decoding a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with a non-2xx, non-304 status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body was not well-formed XML
    #[error("Decode error: {0}")]
    Document(#[from] DocumentError),
    /// Body was XML but not a feed
    #[error("Verification failed: {0}")]
    Verify(#[from] VerifyError),
}

/// Outcome of a conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The server sent a (new) body.
    Modified(String),
    /// The server answered `304 Not Modified` to our validators.
    NotModified,
}

/// Cache validators remembered from the last successful response for a URL.
#[derive(Debug, Clone, Default)]
struct Validators {
    etag: Option<String>,
    last_modified: Option<String>,
}

impl Validators {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let validators = Self {
            etag: header(ETAG),
            last_modified: header(LAST_MODIFIED),
        };
        (validators.etag.is_some() || validators.last_modified.is_some()).then_some(validators)
    }
}

/// Builds the RSS URL of an account on a mirror site.
pub fn feed_url(site: &str, handle: &str) -> String {
    format!(
        "{}/{}/rss",
        site.trim_end_matches('/'),
        handle.trim_start_matches('@')
    )
}

/// HTTP client for mirror feeds with conditional-GET support.
///
/// Validators live in memory for the lifetime of the client only.
pub struct FeedClient {
    client: reqwest::Client,
    timeout: Duration,
    retry_base: Duration,
    validators: Mutex<HashMap<String, Validators>>,
}

impl FeedClient {
    /// Creates a client sending `user_agent` with every request.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the TLS backend cannot be initialized.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self::with_client(client, timeout))
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            retry_base: Duration::from_secs(1),
            validators: Mutex::new(HashMap::new()),
        }
    }

    /// Base delay for exponential backoff (base, 2×base, 4×base).
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    /// Fetches `url`, sending any validators remembered from a previous
    /// response.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection or TLS errors
    /// - [`FetchError::Timeout`] - Request exceeded the timeout
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response other than 304
    /// - [`FetchError::RateLimited`] - 429 response after max retries
    /// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
    pub async fn fetch(&self, url: &str) -> Result<FetchOutcome, FetchError> {
        self.fetch_inner(url, true).await
    }

    async fn fetch_inner(&self, url: &str, conditional: bool) -> Result<FetchOutcome, FetchError> {
        let mut retry_count = 0;

        loop {
            let mut request = self.client.get(url);
            if conditional {
                if let Some(validators) = self.remembered(url) {
                    if let Some(etag) = &validators.etag {
                        request = request.header(IF_NONE_MATCH, etag);
                    }
                    if let Some(modified) = &validators.last_modified {
                        request = request.header(IF_MODIFIED_SINCE, modified);
                    }
                }
            }

            let response = tokio::time::timeout(self.timeout, request.send())
                .await
                .map_err(|_| FetchError::Timeout)?
                .map_err(FetchError::Network)?;
            let status = response.status();

            if status == StatusCode::NOT_MODIFIED {
                tracing::debug!(feed = %url, "Feed not modified");
                return Ok(FetchOutcome::NotModified);
            }

            // Handle rate limiting and server errors with exponential backoff
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if retry_count >= MAX_RETRIES {
                    return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                        FetchError::RateLimited(MAX_RETRIES)
                    } else {
                        FetchError::HttpStatus(status.as_u16())
                    });
                }

                let delay = self.retry_base * 2u32.pow(retry_count);
                tracing::warn!(
                    feed = %url,
                    status = %status,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            let validators = Validators::from_headers(response.headers());
            let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;

            if conditional {
                if let Some(validators) = validators {
                    self.remember(url, validators);
                }
            }

            return Ok(FetchOutcome::Modified(
                String::from_utf8_lossy(&bytes).into_owned(),
            ));
        }
    }

    fn remembered(&self, url: &str) -> Option<Validators> {
        self.validators
            .lock()
            .ok()
            .and_then(|map| map.get(url).cloned())
    }

    fn remember(&self, url: &str, validators: Validators) {
        if let Ok(mut map) = self.validators.lock() {
            map.insert(url.to_owned(), validators);
        }
    }

    /// Fetches, decodes and normalizes a feed.
    ///
    /// An unchanged feed yields no items; that is not an error.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`] from [`FeedClient::fetch`], or
    /// [`FetchError::Document`] when the body is not well-formed XML.
    pub async fn load(&self, url: &str, options: &Options) -> Result<Vec<NormalizedItem>, FetchError> {
        let body = match self.fetch(url).await? {
            FetchOutcome::Modified(body) => body,
            FetchOutcome::NotModified => return Ok(Vec::new()),
        };
        let root = parse_document(&body)?;
        let items = normalize(&FeedDocument::from_root(&root), options);
        tracing::info!(feed = %url, items = items.len(), "Loaded feed");
        Ok(items)
    }

    /// Fetches a feed unconditionally and computes its verification metadata.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`]; [`FetchError::Verify`] when the document is not a
    /// known feed dialect.
    pub async fn verify(&self, url: &str, icons: &dyn IconLookup) -> Result<FeedVerification, FetchError> {
        let body = match self.fetch_inner(url, false).await? {
            FetchOutcome::Modified(body) => body,
            FetchOutcome::NotModified => String::new(),
        };
        let root = parse_document(&body)?;
        Ok(verification_for(&FeedDocument::from_root(&root), icons)?)
    }
}

/// Result of loading one feed in [`load_all`].
#[derive(Debug)]
pub struct LoadResult {
    pub url: String,
    pub result: Result<Vec<NormalizedItem>, FetchError>,
}

/// Loads several feeds concurrently.
///
/// Results are returned in completion order, not input order. A failure of
/// one feed does not affect the others.
pub async fn load_all(client: &FeedClient, urls: Vec<String>, options: &Options) -> Vec<LoadResult> {
    stream::iter(urls)
        .map(|url| async move {
            let result = client.load(&url, options).await;
            if let Err(e) = &result {
                tracing::warn!(feed = %url, error = %e, "Feed load failed");
            }
            LoadResult { url, result }
        })
        .buffer_unordered(MAX_CONCURRENT_LOADS)
        .collect()
        .await
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <link>https://xcancel.com/user</link>
    <item><link>https://rss.xcancel.com/user/status/1#m</link><title>Test</title></item>
</channel></rss>"#;

    fn client() -> FeedClient {
        FeedClient::new(USER_AGENT, DEFAULT_TIMEOUT)
            .unwrap()
            .with_retry_base(Duration::from_millis(1))
    }

    #[test]
    fn test_feed_url() {
        assert_eq!(feed_url("https://xcancel.com/", "@user"), "https://xcancel.com/user/rss");
        assert_eq!(feed_url("https://xcancel.com", "user"), "https://xcancel.com/user/rss");
    }

    #[tokio::test]
    async fn test_load_success_sends_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/rss+xml"),
            )
            .mount(&mock_server)
            .await;

        let items = client()
            .load(&format!("{}/user/rss", mock_server.uri()), &Options::default())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].uri, "https://xcancel.com/user/status/1#m");

        let requests = mock_server.received_requests().await.unwrap();
        let agent = requests[0].headers.get("user-agent").unwrap();
        assert_eq!(agent.to_str().unwrap(), USER_AGENT);
    }

    #[tokio::test]
    async fn test_conditional_get_not_modified_yields_no_items() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("if-none-match", "\"v1\""))
            .respond_with(ResponseTemplate::new(304))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("ETag", "\"v1\""),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client();
        let url = format!("{}/user/rss", mock_server.uri());
        let first = client.load(&url, &Options::default()).await.unwrap();
        assert_eq!(first.len(), 1);

        assert_eq!(client.fetch(&url).await.unwrap(), FetchOutcome::NotModified);
    }

    #[tokio::test]
    async fn test_load_all_isolates_failures() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::path("/good/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::path("/gone/rss"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let urls = vec![
            feed_url(&mock_server.uri(), "good"),
            feed_url(&mock_server.uri(), "gone"),
        ];
        let results = load_all(&client(), urls, &Options::default()).await;
        assert_eq!(results.len(), 2);
        for result in results {
            if result.url.ends_with("/good/rss") {
                assert_eq!(result.result.unwrap().len(), 1);
            } else {
                assert!(matches!(result.result, Err(FetchError::HttpStatus(404))));
            }
        }
    }

    #[tokio::test]
    async fn test_404_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        match client().fetch(&format!("{}/feed", mock_server.uri())).await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_500_error_retries_then_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(4) // Initial request + 3 retries
            .mount(&mock_server)
            .await;

        match client().fetch(&format!("{}/feed", mock_server.uri())).await {
            Err(FetchError::HttpStatus(500)) => {}
            other => panic!("Expected HttpStatus(500), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_429_exhausts_retries() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        match client().fetch(&format!("{}/feed", mock_server.uri())).await {
            Err(FetchError::RateLimited(3)) => {}
            other => panic!("Expected RateLimited(3), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_feed_is_document_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss><channel></rss>"))
            .mount(&mock_server)
            .await;

        match client()
            .load(&format!("{}/feed", mock_server.uri()), &Options::default())
            .await
        {
            Err(FetchError::Document(_)) => {}
            other => panic!("Expected Document error, got {:?}", other.map(|i| i.len())),
        }
    }
}
