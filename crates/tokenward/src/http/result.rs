//! Outcome of a resilient fetch.

use std::sync::Arc;

/// How usable the payload of an [`HttpFetchResult`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpFetchState {
    /// Fresh content from the endpoint (or a 304 confirming the cache).
    Valid,
    /// The endpoint failed but a previously fetched value is being served.
    Warning,
    /// No usable content exists; the payload is the empty sentinel.
    Error,
}

/// The result of one [`ResilientHttpLoader::load`] call.
///
/// Both `Valid` and `Warning` carry usable content; `Error` carries only the
/// converter's safe empty sentinel.
///
/// [`ResilientHttpLoader::load`]: super::loader::ResilientHttpLoader::load
#[derive(Debug, Clone)]
pub struct HttpFetchResult<T> {
    /// The converted payload (shared with the loader cache).
    pub content: Arc<T>,
    /// Usability of the payload.
    pub state: HttpFetchState,
    /// The ETag associated with the cached content, if the endpoint sent one.
    pub etag: Option<String>,
    /// The HTTP status of the final attempt, if a response was received.
    pub status: Option<u16>,
    /// Human-readable detail about a degraded or failed fetch.
    pub detail: Option<String>,
}

impl<T> HttpFetchResult<T> {
    /// Returns `true` if the payload is usable (`Valid` or `Warning`).
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self.state, HttpFetchState::Valid | HttpFetchState::Warning)
    }
}
