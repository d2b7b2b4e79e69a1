//! Resilient HTTP fetching for key material.
//!
//! [`ResilientHttpLoader`] performs ETag-aware conditional GETs with retry,
//! exponential backoff, and stale-cache fallback. Every fetch produces an
//! [`HttpFetchResult`] whose state tells the caller whether the payload is
//! fresh, stale-but-usable, or an empty sentinel.

pub mod discovery;
pub mod loader;
pub mod result;
pub mod retry;

pub use discovery::{WellKnownConverter, WellKnownDocument};
pub use loader::{ContentConverter, ConversionError, HttpSettings, ResilientHttpLoader};
pub use result::{HttpFetchResult, HttpFetchState};
pub use retry::RetryStrategy;
