//! Per-issuer validation configuration.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::crypto::SignatureAlgorithm;
use crate::http::loader::{HttpSettings, InvalidScheme};
use crate::http::retry::RetryStrategy;
use crate::jwks::{JwksKeyStore, JwksSource, JwksStoreConfig};
use crate::security::SecurityEventCounter;

/// Structural parser limits and clock leeway.
///
/// Applied globally for token decoding and per issuer for claim checks;
/// an issuer without explicit limits inherits the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Maximum raw token length in bytes (default: 8 KB).
    pub max_token_size: usize,

    /// Maximum decoded payload size in bytes (default: 8 KB).
    pub max_payload_size: usize,

    /// Maximum raw JWKS document size in bytes (default: 256 KB).
    pub max_jwks_size: usize,

    /// Clock leeway applied to `exp` and `nbf` checks (default: 30 s).
    #[serde(with = "humantime_serde")]
    pub leeway: Duration,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_token_size: 8192,
            max_payload_size: 8192,
            max_jwks_size: 256 * 1024,
            leeway: Duration::from_secs(30),
        }
    }
}

impl ParserConfig {
    /// Sets the maximum raw token length.
    #[must_use]
    pub fn with_max_token_size(mut self, size: usize) -> Self {
        self.max_token_size = size;
        self
    }

    /// Sets the maximum decoded payload size.
    #[must_use]
    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    /// Sets the maximum raw JWKS document size.
    #[must_use]
    pub fn with_max_jwks_size(mut self, size: usize) -> Self {
        self.max_jwks_size = size;
        self
    }

    /// Sets the clock leeway for expiry and not-before checks.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }
}

/// Everything the pipeline needs to validate tokens from one issuer.
///
/// Immutable after construction; built through [`IssuerConfigBuilder`] and
/// shared across validations by reference.
pub struct IssuerConfig {
    issuer: String,
    audiences: Vec<String>,
    authorized_parties: Vec<String>,
    allowed_algorithms: Vec<SignatureAlgorithm>,
    parser: ParserConfig,
    key_store: Arc<JwksKeyStore>,
}

impl IssuerConfig {
    /// The issuer identifier tokens must carry in `iss`.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Expected audiences; empty means the audience check is skipped.
    #[must_use]
    pub fn audiences(&self) -> &[String] {
        &self.audiences
    }

    /// Expected `azp` values; empty means the check is skipped.
    #[must_use]
    pub fn authorized_parties(&self) -> &[String] {
        &self.authorized_parties
    }

    /// Algorithms tokens from this issuer may declare.
    #[must_use]
    pub fn allowed_algorithms(&self) -> &[SignatureAlgorithm] {
        &self.allowed_algorithms
    }

    /// Parser limits and leeway for this issuer.
    #[must_use]
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// The key store serving this issuer's verification keys.
    #[must_use]
    pub fn key_store(&self) -> &Arc<JwksKeyStore> {
        &self.key_store
    }
}

/// Errors from [`IssuerConfigBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum IssuerConfigError {
    /// Neither a JWKS URL nor a well-known URL was configured.
    #[error("Issuer '{0}' has no JWKS or well-known endpoint configured")]
    MissingKeyEndpoint(String),

    /// Both endpoint kinds were configured.
    #[error("Issuer '{0}' has both a JWKS and a well-known endpoint configured")]
    ConflictingKeyEndpoints(String),

    /// The algorithm allow-list is empty.
    #[error("Issuer '{0}' allows no signature algorithms")]
    EmptyAlgorithmList(String),

    /// The endpoint URL scheme was rejected.
    #[error(transparent)]
    Scheme(#[from] InvalidScheme),
}

/// Builder for [`IssuerConfig`].
///
/// Defaults: all supported algorithms allowed, default parser limits,
/// default HTTP settings and retry strategy, 30 s minimum interval between
/// miss-triggered key refreshes.
pub struct IssuerConfigBuilder {
    issuer: String,
    jwks_url: Option<Url>,
    well_known_url: Option<Url>,
    audiences: Vec<String>,
    authorized_parties: Vec<String>,
    allowed_algorithms: Vec<SignatureAlgorithm>,
    parser: ParserConfig,
    http: HttpSettings,
    retry: RetryStrategy,
    min_refresh_interval: Duration,
}

impl IssuerConfigBuilder {
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            jwks_url: None,
            well_known_url: None,
            audiences: Vec::new(),
            authorized_parties: Vec::new(),
            allowed_algorithms: SignatureAlgorithm::ALL.to_vec(),
            parser: ParserConfig::default(),
            http: HttpSettings::default(),
            retry: RetryStrategy::default(),
            min_refresh_interval: Duration::from_secs(30),
        }
    }

    /// Sets a direct JWKS endpoint.
    #[must_use]
    pub fn with_jwks_url(mut self, url: Url) -> Self {
        self.jwks_url = Some(url);
        self
    }

    /// Sets an OIDC discovery endpoint the JWKS URL is resolved from.
    #[must_use]
    pub fn with_well_known_url(mut self, url: Url) -> Self {
        self.well_known_url = Some(url);
        self
    }

    /// Adds one expected audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audiences.push(audience.into());
        self
    }

    /// Adds one expected authorized party (client id).
    #[must_use]
    pub fn with_authorized_party(mut self, party: impl Into<String>) -> Self {
        self.authorized_parties.push(party.into());
        self
    }

    /// Restricts the signature algorithms tokens may declare.
    #[must_use]
    pub fn with_allowed_algorithms(mut self, algorithms: &[SignatureAlgorithm]) -> Self {
        self.allowed_algorithms = algorithms.to_vec();
        self
    }

    /// Overrides the parser limits and leeway.
    #[must_use]
    pub fn with_parser_config(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    /// Overrides the HTTP client settings used for key fetches.
    #[must_use]
    pub fn with_http_settings(mut self, http: HttpSettings) -> Self {
        self.http = http;
        self
    }

    /// Overrides the retry strategy used for key fetches.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the minimum interval between miss-triggered key refreshes.
    #[must_use]
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Allows plain-HTTP key endpoints. For testing only.
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.http.allow_http = allow;
        self
    }

    /// Builds the issuer configuration and its key store.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerConfigError`] when no key endpoint (or two) is
    /// configured, the allow-list is empty, or the endpoint URL scheme is
    /// rejected.
    pub fn build(
        self,
        counter: Arc<SecurityEventCounter>,
    ) -> Result<IssuerConfig, IssuerConfigError> {
        if self.allowed_algorithms.is_empty() {
            return Err(IssuerConfigError::EmptyAlgorithmList(self.issuer));
        }

        let source = match (self.jwks_url, self.well_known_url) {
            (Some(url), None) => JwksSource::Direct(url),
            (None, Some(url)) => JwksSource::WellKnown(url),
            (Some(_), Some(_)) => {
                return Err(IssuerConfigError::ConflictingKeyEndpoints(self.issuer));
            }
            (None, None) => return Err(IssuerConfigError::MissingKeyEndpoint(self.issuer)),
        };

        let key_store = JwksKeyStore::new(
            JwksStoreConfig {
                source,
                issuer: self.issuer.clone(),
                allowed_algorithms: self.allowed_algorithms.clone(),
                max_document_size: self.parser.max_jwks_size,
                http: self.http,
                retry: self.retry,
                min_refresh_interval: self.min_refresh_interval,
            },
            counter,
        )?;

        Ok(IssuerConfig {
            issuer: self.issuer,
            audiences: self.audiences,
            authorized_parties: self.authorized_parties,
            allowed_algorithms: self.allowed_algorithms,
            parser: self.parser,
            key_store: Arc::new(key_store),
        })
    }
}
