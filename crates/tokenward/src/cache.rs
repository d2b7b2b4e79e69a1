//! Validated access-token cache.
//!
//! # Security Considerations
//!
//! The cache is keyed by a SHA-256 fingerprint of the raw token, so raw
//! token strings are never retained as keys. A hit skips signature
//! verification, which is only sound because the cached entry was produced
//! by a full validation of the byte-identical token; expiry is re-checked
//! on every hit so a cached token can never outlive its `exp`.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::token::AccessTokenContent;

struct CachedValidation {
    content: Arc<AccessTokenContent>,
    /// Expiry plus leeway, captured at insert time.
    valid_until: Option<OffsetDateTime>,
}

/// Bounded LRU cache of fully validated access tokens.
///
/// Capacity zero disables caching entirely. Concurrent validations of the
/// same token may each do the full work; the contract is a consistent
/// result per fingerprint once cached, not single-flight computation.
pub struct AccessTokenCache {
    entries: Option<Mutex<LruCache<[u8; 32], CachedValidation>>>,
}

impl AccessTokenCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|capacity| Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Looks up a validated token by its raw bytes.
    ///
    /// Entries whose validity window has passed are evicted on lookup and
    /// reported as misses.
    #[must_use]
    pub fn get(&self, raw: &str, now: OffsetDateTime) -> Option<Arc<AccessTokenContent>> {
        let entries = self.entries.as_ref()?;
        let key = fingerprint(raw);

        let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
        let cached = entries.get(&key)?;
        if let Some(valid_until) = cached.valid_until
            && valid_until <= now
        {
            tracing::trace!("Evicting expired cached token");
            entries.pop(&key);
            return None;
        }
        Some(Arc::clone(&cached.content))
    }

    /// Stores a validated token. `valid_until` is the instant after which
    /// the entry must no longer be served (expiry plus leeway).
    pub fn insert(
        &self,
        raw: &str,
        content: Arc<AccessTokenContent>,
        valid_until: Option<OffsetDateTime>,
    ) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };
        let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.put(
            fingerprint(raw),
            CachedValidation {
                content,
                valid_until,
            },
        );
    }

    /// Number of cached validations.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.entries {
            Some(entries) => entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            None => 0,
        }
    }

    /// Returns `true` when nothing is cached (or caching is disabled).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn fingerprint(raw: &str) -> [u8; 32] {
    Sha256::digest(raw.as_bytes()).into()
}
