//! ETag-aware resilient HTTP loading.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use super::result::{HttpFetchResult, HttpFetchState};
use super::retry::RetryStrategy;

/// The fetched body could not be converted into the target type.
#[derive(Debug, thiserror::Error)]
#[error("Content conversion failed: {0}")]
pub struct ConversionError(pub String);

/// Converts a fetched response body into the loader's payload type.
///
/// Implementations must also supply a safe empty sentinel returned when no
/// content could ever be fetched.
pub trait ContentConverter<T>: Send + Sync {
    /// Parses a response body.
    fn convert(&self, body: &[u8]) -> Result<T, ConversionError>;

    /// A safe empty value for [`HttpFetchState::Error`] results.
    fn empty_value(&self) -> T;
}

/// HTTP client settings shared by the loaders of one issuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// TCP connect timeout (default: 2 s).
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Whole-request timeout (default: 10 s).
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum response size in bytes (default: 1 MB).
    pub max_response_size: usize,

    /// Whether to allow HTTP (non-HTTPS) endpoints.
    /// This should only be enabled for testing.
    pub allow_http: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            max_response_size: 1024 * 1024, // 1 MB
            allow_http: false,
        }
    }
}

/// The endpoint URL scheme is not allowed (must be HTTPS in production).
#[derive(Debug, thiserror::Error)]
#[error("Invalid URL scheme: {0} (only HTTPS is allowed)")]
pub struct InvalidScheme(pub String);

struct CachedContent<T> {
    content: Option<Arc<T>>,
    etag: Option<String>,
}

enum FetchOutcome {
    NotModified,
    Fetched {
        body: Vec<u8>,
        etag: Option<String>,
        status: u16,
    },
    /// Permanent rejection; retrying cannot help.
    Unusable { status: u16, detail: String },
    ServerError { status: u16 },
}

/// Resilient, ETag-aware loader for one remote document.
///
/// Behavior per [`load`](Self::load) call:
///
/// - sends a conditional GET with `If-None-Match` when an ETag is cached
/// - 304 returns the cached value unmodified, with no re-parsing
/// - 2xx converts the body and replaces the cache
/// - 4xx returns the cached value with `Warning` state and no retry
/// - 5xx and I/O failures are retried per the [`RetryStrategy`]; once
///   retries exhaust, the last good cached value is served with `Warning`,
///   or the converter's empty sentinel with `Error` if nothing was ever
///   fetched
///
/// All state transitions are serialized through one lock per loader
/// instance; distinct loaders never contend.
pub struct ResilientHttpLoader<T> {
    client: reqwest::Client,
    url: Url,
    converter: Box<dyn ContentConverter<T>>,
    retry: RetryStrategy,
    max_response_size: usize,
    cache: Mutex<CachedContent<T>>,
}

impl<T> ResilientHttpLoader<T> {
    /// Creates a loader for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidScheme`] unless the URL is HTTPS or `allow_http`
    /// is set.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    pub fn new(
        url: Url,
        converter: impl ContentConverter<T> + 'static,
        settings: &HttpSettings,
        retry: RetryStrategy,
    ) -> Result<Self, InvalidScheme> {
        let scheme = url.scheme();
        if scheme != "https" && !(scheme == "http" && settings.allow_http) {
            return Err(InvalidScheme(scheme.to_string()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            client,
            url,
            converter: Box::new(converter),
            retry,
            max_response_size: settings.max_response_size,
            cache: Mutex::new(CachedContent {
                content: None,
                etag: None,
            }),
        })
    }

    /// The endpoint this loader fetches.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetches the document, applying conditional-GET, retry, and
    /// stale-cache fallback semantics.
    pub async fn load(&self) -> HttpFetchResult<T> {
        let mut cache = self.cache.lock().await;
        let mut last_status = None;
        let mut last_detail = None;

        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.retry.delay_for(attempt - 1)).await;
            }

            match self.fetch_once(cache.etag.as_deref()).await {
                Ok(FetchOutcome::NotModified) => {
                    if let Some(content) = &cache.content {
                        tracing::trace!("Endpoint {} returned 304, serving cache", self.url);
                        return HttpFetchResult {
                            content: Arc::clone(content),
                            state: HttpFetchState::Valid,
                            etag: cache.etag.clone(),
                            status: Some(304),
                            detail: None,
                        };
                    }
                    // 304 without a cached value is server misbehavior.
                    last_status = Some(304);
                    last_detail = Some("304 received without cached content".to_string());
                }
                Ok(FetchOutcome::Fetched { body, etag, status }) => {
                    match self.converter.convert(&body) {
                        Ok(value) => {
                            tracing::debug!(
                                "Fetched {} ({} bytes, etag {:?})",
                                self.url,
                                body.len(),
                                etag
                            );
                            let content = Arc::new(value);
                            cache.content = Some(Arc::clone(&content));
                            cache.etag = etag.clone();
                            return HttpFetchResult {
                                content,
                                state: HttpFetchState::Valid,
                                etag,
                                status: Some(status),
                                detail: None,
                            };
                        }
                        Err(e) => {
                            // Bad content will not improve on retry.
                            tracing::warn!("Failed to convert content from {}: {}", self.url, e);
                            last_status = Some(status);
                            last_detail = Some(e.to_string());
                            break;
                        }
                    }
                }
                Ok(FetchOutcome::Unusable { status, detail }) => {
                    tracing::warn!("Unusable response from {}: {}", self.url, detail);
                    last_status = Some(status);
                    last_detail = Some(detail);
                    break;
                }
                Ok(FetchOutcome::ServerError { status }) => {
                    tracing::debug!(
                        "Server error {} from {} (attempt {}/{})",
                        status,
                        self.url,
                        attempt + 1,
                        self.retry.max_attempts
                    );
                    last_status = Some(status);
                    last_detail = Some(format!("HTTP status {status}"));
                }
                Err(e) => {
                    tracing::debug!(
                        "Request to {} failed (attempt {}/{}): {}",
                        self.url,
                        attempt + 1,
                        self.retry.max_attempts,
                        e
                    );
                    last_detail = Some(e.to_string());
                }
            }
        }

        if let Some(content) = &cache.content {
            tracing::warn!(
                "Serving stale content for {} after failed refresh: {}",
                self.url,
                last_detail.as_deref().unwrap_or("unknown error")
            );
            HttpFetchResult {
                content: Arc::clone(content),
                state: HttpFetchState::Warning,
                etag: cache.etag.clone(),
                status: last_status,
                detail: last_detail,
            }
        } else {
            tracing::warn!(
                "No usable content for {}: {}",
                self.url,
                last_detail.as_deref().unwrap_or("unknown error")
            );
            HttpFetchResult {
                content: Arc::new(self.converter.empty_value()),
                state: HttpFetchState::Error,
                etag: None,
                status: last_status,
                detail: last_detail,
            }
        }
    }

    async fn fetch_once(&self, etag: Option<&str>) -> Result<FetchOutcome, reqwest::Error> {
        let mut request = self
            .client
            .get(self.url.as_str())
            .header("Accept", "application/json");
        if let Some(etag) = etag {
            request = request.header("If-None-Match", etag);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.as_u16() == 304 {
            return Ok(FetchOutcome::NotModified);
        }

        if status.is_server_error() {
            return Ok(FetchOutcome::ServerError {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            // Client errors are treated as permanent.
            return Ok(FetchOutcome::Unusable {
                status: status.as_u16(),
                detail: format!("HTTP status {status}"),
            });
        }

        if let Some(len) = response.content_length()
            && len as usize > self.max_response_size
        {
            return Ok(FetchOutcome::Unusable {
                status: status.as_u16(),
                detail: format!(
                    "response of {len} bytes exceeds maximum {}",
                    self.max_response_size
                ),
            });
        }

        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await?;
        if body.len() > self.max_response_size {
            return Ok(FetchOutcome::Unusable {
                status: status.as_u16(),
                detail: format!(
                    "response of {} bytes exceeds maximum {}",
                    body.len(),
                    self.max_response_size
                ),
            });
        }

        Ok(FetchOutcome::Fetched {
            body: body.to_vec(),
            etag,
            status: status.as_u16(),
        })
    }
}
