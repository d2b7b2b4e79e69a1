//! The token validation orchestrator.
//!
//! # Overview
//!
//! [`TokenValidator`] runs the full pipeline for access, ID, and refresh
//! tokens: structural decode, cache lookup, issuer resolution, header
//! checks, signature verification, typed extraction, and claim validation,
//! short-circuiting on the first failure. Every failure is accounted under
//! exactly one [`SecurityEventType`](crate::security::SecurityEventType)
//! before it propagates.

use std::sync::Arc;

use crate::cache::AccessTokenCache;
use crate::crypto::SignatureAlgorithm;
use crate::error::TokenValidationError;
use crate::issuer::{
    DEFAULT_WARM_CAPACITY, IssuerConfig, IssuerConfigBuilder, IssuerConfigError,
    IssuerConfigResolver, ParserConfig,
};
use crate::pipeline::{
    TokenClaimValidator, TokenHeaderValidator, TokenSignatureValidator, ValidationContext,
};
use crate::security::SecurityEventCounter;
use crate::token::{
    AccessTokenContent, DecodedJwt, IdTokenContent, RefreshTokenContent, TokenType,
};

/// Default capacity of the validated access-token cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Validates bearer tokens against the registered issuers.
///
/// One instance is created at startup and shared across all request
/// handlers; every public operation takes `&self`.
pub struct TokenValidator {
    resolver: IssuerConfigResolver,
    signature: TokenSignatureValidator,
    cache: AccessTokenCache,
    counter: Arc<SecurityEventCounter>,
    parser: ParserConfig,
}

impl TokenValidator {
    /// Starts building a validator.
    #[must_use]
    pub fn builder() -> TokenValidatorBuilder {
        TokenValidatorBuilder::new()
    }

    /// The security event counters this validator reports into.
    #[must_use]
    pub fn security_events(&self) -> &SecurityEventCounter {
        &self.counter
    }

    /// Validates an access token.
    ///
    /// Successfully validated tokens are cached by fingerprint; a hit for a
    /// byte-identical, still-valid token skips signature verification.
    ///
    /// # Errors
    ///
    /// Returns the first pipeline failure; the matching security event
    /// counter is incremented exactly once.
    pub async fn create_access_token(
        &self,
        raw: &str,
    ) -> Result<Arc<AccessTokenContent>, TokenValidationError> {
        self.validate_access(raw).await.inspect_err(|e| {
            self.counter.increment(e.event_type());
        })
    }

    /// Validates an OIDC ID token.
    ///
    /// # Errors
    ///
    /// Returns the first pipeline failure; the matching security event
    /// counter is incremented exactly once.
    pub async fn create_id_token(&self, raw: &str) -> Result<IdTokenContent, TokenValidationError> {
        self.validate_uncached(raw, TokenType::Id)
            .await
            .map(|jwt| IdTokenContent::from_decoded(&jwt))
            .inspect_err(|e| {
                self.counter.increment(e.event_type());
            })
    }

    /// Validates a refresh token. Only presence of `exp` and the temporal
    /// checks apply; refresh tokens carry no audience or client binding.
    ///
    /// # Errors
    ///
    /// Returns the first pipeline failure; the matching security event
    /// counter is incremented exactly once.
    pub async fn create_refresh_token(
        &self,
        raw: &str,
    ) -> Result<RefreshTokenContent, TokenValidationError> {
        self.validate_uncached(raw, TokenType::Refresh)
            .await
            .map(|jwt| RefreshTokenContent::from_decoded(&jwt))
            .inspect_err(|e| {
                self.counter.increment(e.event_type());
            })
    }

    async fn validate_access(
        &self,
        raw: &str,
    ) -> Result<Arc<AccessTokenContent>, TokenValidationError> {
        let context = ValidationContext::new();
        let jwt = DecodedJwt::decode(raw, &self.parser)?;

        // Cache lookup happens before issuer resolution and signature
        // verification; a hit reuses the prior full validation.
        if let Some(content) = self.cache.get(raw, context.now()) {
            tracing::trace!("Access token served from validation cache");
            return Ok(content);
        }

        let config = self.verify_signed(&jwt).await?;
        let content = Arc::new(AccessTokenContent::from_decoded(&jwt));
        TokenClaimValidator::validate(&jwt, TokenType::Access, &config, &context)?;

        // Clamp rather than overflow for a far-future exp.
        let leeway =
            time::Duration::try_from(config.parser().leeway).unwrap_or(time::Duration::MAX);
        let valid_until = content.expires_at().map(|expires_at| {
            expires_at
                .checked_add(leeway)
                .unwrap_or(time::PrimitiveDateTime::MAX.assume_utc())
        });
        self.cache.insert(raw, Arc::clone(&content), valid_until);
        Ok(content)
    }

    async fn validate_uncached(
        &self,
        raw: &str,
        token_type: TokenType,
    ) -> Result<DecodedJwt, TokenValidationError> {
        let context = ValidationContext::new();
        let jwt = DecodedJwt::decode(raw, &self.parser)?;
        let config = self.verify_signed(&jwt).await?;
        TokenClaimValidator::validate(&jwt, token_type, &config, &context)?;
        Ok(jwt)
    }

    /// Shared steps 3 through 7: issuer extraction and resolution, header
    /// validation, signature verification.
    async fn verify_signed(
        &self,
        jwt: &DecodedJwt,
    ) -> Result<Arc<IssuerConfig>, TokenValidationError> {
        let Some(issuer) = jwt.issuer() else {
            return Err(TokenValidationError::MissingClaim("iss".to_string()));
        };
        let config = self.resolver.resolve(issuer)?;

        let header = TokenHeaderValidator::validate(jwt, config.allowed_algorithms())?;
        self.signature
            .validate(jwt, &header, config.key_store())
            .await?;
        Ok(config)
    }
}

/// Builder for [`TokenValidator`].
pub struct TokenValidatorBuilder {
    issuers: Vec<IssuerConfigBuilder>,
    parser: ParserConfig,
    cache_capacity: usize,
    warm_capacity: usize,
}

impl TokenValidatorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            issuers: Vec::new(),
            parser: ParserConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            warm_capacity: DEFAULT_WARM_CAPACITY,
        }
    }

    /// Registers an issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: IssuerConfigBuilder) -> Self {
        self.issuers.push(issuer);
        self
    }

    /// Overrides the global parser limits used for token decoding.
    #[must_use]
    pub fn with_parser_config(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    /// Sets the validated-token cache capacity. Zero disables caching.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Sets the issuer-resolver warm-view capacity.
    #[must_use]
    pub fn with_warm_capacity(mut self, capacity: usize) -> Self {
        self.warm_capacity = capacity;
        self
    }

    /// Builds the validator, creating the shared event counter and one key
    /// store per issuer.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerConfigError`] when an issuer configuration is
    /// invalid.
    pub fn build(self) -> Result<TokenValidator, IssuerConfigError> {
        let counter = Arc::new(SecurityEventCounter::new());
        let configs = self
            .issuers
            .into_iter()
            .map(|issuer| issuer.build(Arc::clone(&counter)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TokenValidator {
            resolver: IssuerConfigResolver::new(configs).with_warm_capacity(self.warm_capacity),
            signature: TokenSignatureValidator::new(&SignatureAlgorithm::ALL),
            cache: AccessTokenCache::new(self.cache_capacity),
            counter,
            parser: self.parser,
        })
    }
}

impl Default for TokenValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
