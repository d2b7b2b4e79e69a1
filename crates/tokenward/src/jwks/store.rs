//! Generation-based JWKS caching with rotation grace.
//!
//! # Overview
//!
//! The store keeps key sets as immutable generations published by atomic
//! reference swap. Readers always observe either the old or the new complete
//! generation, never a partial update. When the key set rotates, the
//! previous generation is retained for one rotation cycle so that tokens
//! signed moments before the rotation still verify.
//!
//! # Security Considerations
//!
//! An unknown `kid` triggers an out-of-band refresh, rate-limited by a
//! minimum interval so that a flood of tokens with bogus key ids cannot be
//! used to hammer the issuer's JWKS endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use url::Url;

use super::key_processor::{KeyInfo, KeyProcessor};
use super::parser::JwksParser;
use crate::crypto::SignatureAlgorithm;
use crate::http::discovery::WellKnownConverter;
use crate::http::loader::{ContentConverter, ConversionError, HttpSettings, InvalidScheme};
use crate::http::result::HttpFetchState;
use crate::http::retry::RetryStrategy;
use crate::http::{ResilientHttpLoader, WellKnownDocument};
use crate::security::{SecurityEventCounter, SecurityEventType};

/// A parsed key set, keyed by `kid`.
pub type JwksKeys = HashMap<String, Arc<KeyInfo>>;

/// Where a store obtains its key set.
#[derive(Debug, Clone)]
pub enum JwksSource {
    /// Fetch directly from a JWKS endpoint.
    Direct(Url),
    /// Resolve the JWKS endpoint from an OIDC discovery document first.
    WellKnown(Url),
}

/// Configuration for one [`JwksKeyStore`].
#[derive(Debug, Clone)]
pub struct JwksStoreConfig {
    /// Key-set endpoint.
    pub source: JwksSource,
    /// The issuer this store serves; discovery documents must match it.
    pub issuer: String,
    /// Algorithms keys may declare.
    pub allowed_algorithms: Vec<SignatureAlgorithm>,
    /// Byte ceiling for the raw JWKS document.
    pub max_document_size: usize,
    /// HTTP client settings for all fetches.
    pub http: HttpSettings,
    /// Retry strategy for all fetches.
    pub retry: RetryStrategy,
    /// Minimum interval between miss-triggered refreshes.
    pub min_refresh_interval: Duration,
}

/// Parses JWKS bytes into a [`JwksKeys`] map for the HTTP loader.
///
/// Structural violations reject the document wholesale and count one
/// JWKS parse-failure event; individually malformed keys are skipped.
#[derive(Clone)]
struct JwksConverter {
    parser: JwksParser,
    processor: KeyProcessor,
    counter: Arc<SecurityEventCounter>,
}

impl ContentConverter<JwksKeys> for JwksConverter {
    fn convert(&self, body: &[u8]) -> Result<JwksKeys, ConversionError> {
        let raw_keys = self.parser.parse(body).map_err(|e| {
            self.counter.increment(SecurityEventType::JwksParseFailed);
            ConversionError(e.to_string())
        })?;

        let mut keys = JwksKeys::with_capacity(raw_keys.len());
        for raw in &raw_keys {
            if let Some(info) = self.processor.process_key(raw) {
                keys.insert(info.key_id.clone(), Arc::new(info));
            }
        }
        if keys.is_empty() {
            tracing::warn!("Key set contained no usable keys");
        }
        Ok(keys)
    }

    fn empty_value(&self) -> JwksKeys {
        JwksKeys::new()
    }
}

/// One immutable key-set snapshot.
struct Generation {
    keys: Arc<JwksKeys>,
    fetched_at: OffsetDateTime,
    etag: Option<String>,
}

#[derive(Default)]
struct Generations {
    current: Option<Arc<Generation>>,
    previous: Option<Arc<Generation>>,
}

/// Cache of an issuer's verification keys.
///
/// Lookups consult the current generation, then the retained previous
/// generation, before reporting a miss. Misses trigger a rate-limited
/// refresh.
pub struct JwksKeyStore {
    discovery: Option<ResilientHttpLoader<WellKnownDocument>>,
    jwks_loader: OnceCell<ResilientHttpLoader<JwksKeys>>,
    converter: JwksConverter,
    http: HttpSettings,
    retry: RetryStrategy,
    generations: ArcSwap<Generations>,
    min_refresh_interval: Duration,
    last_refresh_attempt: Mutex<Option<Instant>>,
}

impl JwksKeyStore {
    /// Creates a store for the given source.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidScheme`] when the endpoint URL is not HTTPS and
    /// `allow_http` is not set.
    pub fn new(
        config: JwksStoreConfig,
        counter: Arc<SecurityEventCounter>,
    ) -> Result<Self, InvalidScheme> {
        let converter = JwksConverter {
            parser: JwksParser::new(config.max_document_size),
            processor: KeyProcessor::new(&config.allowed_algorithms),
            counter,
        };

        let (discovery, jwks_loader) = match config.source {
            JwksSource::Direct(url) => {
                let loader = ResilientHttpLoader::new(
                    url,
                    converter.clone(),
                    &config.http,
                    config.retry.clone(),
                )?;
                (None, OnceCell::new_with(Some(loader)))
            }
            JwksSource::WellKnown(url) => {
                let discovery = ResilientHttpLoader::new(
                    url,
                    WellKnownConverter::new(&config.issuer),
                    &config.http,
                    config.retry.clone(),
                )?;
                (Some(discovery), OnceCell::new())
            }
        };

        Ok(Self {
            discovery,
            jwks_loader,
            converter,
            http: config.http,
            retry: config.retry,
            generations: ArcSwap::from_pointee(Generations::default()),
            min_refresh_interval: config.min_refresh_interval,
            last_refresh_attempt: Mutex::new(None),
        })
    }

    /// Looks up a key by `kid`, consulting the current generation, then the
    /// retained previous generation.
    ///
    /// A miss triggers a refresh and a second lookup, unless a refresh ran
    /// within the configured minimum interval.
    pub async fn get_key_info(&self, kid: &str) -> Option<Arc<KeyInfo>> {
        if let Some(info) = self.lookup(kid) {
            return Some(info);
        }

        if !self.miss_refresh_allowed() {
            tracing::trace!(kid, "Key miss refresh suppressed by rate limit");
            return None;
        }

        tracing::debug!(kid, "Unknown key id, refreshing key set");
        self.refresh().await;
        self.lookup(kid)
    }

    /// Fetches the key set and publishes a new generation when it changed.
    ///
    /// A 304 or a stale-cache fallback serves the byte-identical cached
    /// key map and never rotates generations; a degraded or failed fetch
    /// leaves the existing generations untouched.
    pub async fn refresh(&self) {
        self.note_refresh_attempt();

        let Some(loader) = self.jwks_loader().await else {
            return;
        };

        let result = loader.load().await;
        if result.state != HttpFetchState::Valid {
            tracing::warn!(
                url = %loader.url(),
                detail = result.detail.as_deref().unwrap_or("unknown"),
                "Key set refresh degraded, keeping existing generations"
            );
            return;
        }

        let snapshot = self.generations.load();
        if let Some(current) = &snapshot.current
            && Arc::ptr_eq(&current.keys, &result.content)
        {
            tracing::trace!(url = %loader.url(), "Key set unchanged");
            return;
        }

        let generation = Arc::new(Generation {
            keys: result.content,
            fetched_at: OffsetDateTime::now_utc(),
            etag: result.etag,
        });
        tracing::debug!(
            url = %loader.url(),
            keys = generation.keys.len(),
            etag = ?generation.etag,
            fetched_at = %generation.fetched_at,
            "Publishing new key set generation"
        );
        self.generations.rcu(|old| Generations {
            current: Some(Arc::clone(&generation)),
            previous: old.current.clone(),
        });
    }

    /// Spawns a background task that refreshes the key set on an interval.
    ///
    /// The first refresh runs immediately.
    pub fn spawn_refresh_task(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.refresh().await;
            }
        })
    }

    fn lookup(&self, kid: &str) -> Option<Arc<KeyInfo>> {
        let generations = self.generations.load();
        if let Some(current) = &generations.current
            && let Some(info) = current.keys.get(kid)
        {
            return Some(Arc::clone(info));
        }
        if let Some(previous) = &generations.previous
            && let Some(info) = previous.keys.get(kid)
        {
            tracing::trace!(kid, "Key served from previous generation");
            return Some(Arc::clone(info));
        }
        None
    }

    fn miss_refresh_allowed(&self) -> bool {
        let last = self
            .last_refresh_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(at) => at.elapsed() >= self.min_refresh_interval,
            None => true,
        }
    }

    fn note_refresh_attempt(&self) {
        let mut last = self
            .last_refresh_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last = Some(Instant::now());
    }

    async fn jwks_loader(&self) -> Option<&ResilientHttpLoader<JwksKeys>> {
        match self
            .jwks_loader
            .get_or_try_init(|| self.resolve_jwks_loader())
            .await
        {
            Ok(loader) => Some(loader),
            Err(detail) => {
                tracing::warn!(%detail, "JWKS endpoint not yet resolvable");
                None
            }
        }
    }

    /// Resolves the JWKS endpoint from the discovery document. Runs at most
    /// once successfully; failures are retried on the next refresh.
    async fn resolve_jwks_loader(&self) -> Result<ResilientHttpLoader<JwksKeys>, String> {
        let Some(discovery) = &self.discovery else {
            return Err("no JWKS endpoint configured".to_string());
        };

        let result = discovery.load().await;
        if !result.is_usable() || !result.content.is_usable() {
            return Err(result
                .detail
                .unwrap_or_else(|| "discovery document unavailable".to_string()));
        }

        let url = Url::parse(&result.content.jwks_uri)
            .map_err(|e| format!("invalid jwks_uri '{}': {e}", result.content.jwks_uri))?;
        tracing::debug!(jwks_uri = %url, "Resolved JWKS endpoint from discovery document");

        ResilientHttpLoader::new(url, self.converter.clone(), &self.http, self.retry.clone())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use elliptic_curve::sec1::ToEncodedPoint;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ec_jwk(kid: &str) -> serde_json::Value {
        let secret = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let point = secret.verifying_key().to_encoded_point(false);
        json!({
            "kty": "EC",
            "kid": kid,
            "crv": "P-256",
            "x": URL_SAFE_NO_PAD.encode(point.x().unwrap()),
            "y": URL_SAFE_NO_PAD.encode(point.y().unwrap()),
        })
    }

    fn jwks_body(kids: &[&str]) -> String {
        let keys: Vec<_> = kids.iter().map(|kid| ec_jwk(kid)).collect();
        json!({ "keys": keys }).to_string()
    }

    fn store_config(server: &MockServer, min_refresh_interval: Duration) -> JwksStoreConfig {
        JwksStoreConfig {
            source: JwksSource::Direct(
                Url::parse(&format!("{}/jwks", server.uri())).unwrap(),
            ),
            issuer: server.uri(),
            allowed_algorithms: SignatureAlgorithm::ALL.to_vec(),
            max_document_size: 256 * 1024,
            http: HttpSettings {
                allow_http: true,
                ..HttpSettings::default()
            },
            retry: RetryStrategy::none(),
            min_refresh_interval,
        }
    }

    fn new_store(config: JwksStoreConfig) -> (JwksKeyStore, Arc<SecurityEventCounter>) {
        let counter = Arc::new(SecurityEventCounter::new());
        let store = JwksKeyStore::new(config, Arc::clone(&counter)).unwrap();
        (store, counter)
    }

    async fn serve_jwks(server: &MockServer, body: String) {
        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_rotation_retains_previous_generation() {
        let server = MockServer::start().await;
        let (store, _) = new_store(store_config(&server, Duration::ZERO));

        serve_jwks(&server, jwks_body(&["key-a"])).await;
        store.refresh().await;
        assert!(store.lookup("key-a").is_some());

        serve_jwks(&server, jwks_body(&["key-b"])).await;
        store.refresh().await;
        // The rotated-out key still verifies during the grace period.
        assert!(store.lookup("key-a").is_some());
        assert!(store.lookup("key-b").is_some());

        serve_jwks(&server, jwks_body(&["key-c"])).await;
        store.refresh().await;
        // Two rotations later the grace period has lapsed.
        assert!(store.lookup("key-a").is_none());
        assert!(store.lookup("key-b").is_some());
        assert!(store.lookup("key-c").is_some());
    }

    #[tokio::test]
    async fn test_not_modified_does_not_rotate() {
        let server = MockServer::start().await;
        let (store, _) = new_store(store_config(&server, Duration::ZERO));

        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(jwks_body(&["key-a"]))
                    .insert_header("ETag", "\"v1\""),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(304))
            .mount(&server)
            .await;

        store.refresh().await;
        let first = store.generations.load().current.as_ref().unwrap().clone();

        store.refresh().await;
        let generations = store.generations.load();
        let second = generations.current.as_ref().unwrap();
        // Byte-identical key material, same generation, grace slot untouched.
        assert!(Arc::ptr_eq(&first, second));
        assert!(generations.previous.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_existing_keys() {
        let server = MockServer::start().await;
        let (store, _) = new_store(store_config(&server, Duration::ZERO));

        serve_jwks(&server, jwks_body(&["key-a"])).await;
        store.refresh().await;

        server.reset().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        store.refresh().await;
        assert!(store.lookup("key-a").is_some());
    }

    #[tokio::test]
    async fn test_miss_triggers_rate_limited_refresh() {
        let server = MockServer::start().await;
        let (store, _) = new_store(store_config(&server, Duration::from_secs(60)));

        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_string(jwks_body(&["key-a"])))
            .expect(1)
            .mount(&server)
            .await;

        // First miss fetches the key set and finds the key.
        assert!(store.get_key_info("key-a").await.is_some());
        // Subsequent misses within the interval never touch the endpoint.
        assert!(store.get_key_info("key-b").await.is_none());
        assert!(store.get_key_info("key-c").await.is_none());
    }

    #[tokio::test]
    async fn test_structural_violation_counts_one_event() {
        let server = MockServer::start().await;
        let (store, counter) = new_store(store_config(&server, Duration::ZERO));

        let keys: Vec<_> = (0..51).map(|i| ec_jwk(&format!("key-{i}"))).collect();
        serve_jwks(&server, json!({ "keys": keys }).to_string()).await;

        store.refresh().await;
        assert_eq!(counter.count(SecurityEventType::JwksParseFailed), 1);
        assert!(store.lookup("key-0").is_none());
    }

    #[tokio::test]
    async fn test_well_known_source_resolves_jwks_uri() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": server.uri(),
                "jwks_uri": format!("{}/jwks", server.uri()),
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_string(jwks_body(&["key-a"])))
            .mount(&server)
            .await;

        let config = JwksStoreConfig {
            source: JwksSource::WellKnown(
                Url::parse(&format!("{}/.well-known/openid-configuration", server.uri()))
                    .unwrap(),
            ),
            ..store_config(&server, Duration::ZERO)
        };
        let (store, _) = new_store(config);

        assert!(store.get_key_info("key-a").await.is_some());
        // The discovery document is resolved once, not per refresh.
        store.refresh().await;
        assert!(store.lookup("key-a").is_some());
    }
}
