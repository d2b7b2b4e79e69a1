//! # tokenward
//!
//! Bearer-token validation for OAuth 2.0 / OIDC resource servers.
//!
//! This crate provides:
//! - A staged validation pipeline for access, ID, and refresh tokens
//! - JWKS acquisition with ETag caching, retry, and rotation grace
//! - Signature verification for RS*/ES*/PS* with precomputed verifier
//!   templates
//! - Multi-issuer registration with lock-free steady-state resolution
//! - Security event counters fed by every rejection
//!
//! ## Overview
//!
//! One [`TokenValidator`] is built at startup from per-issuer
//! configurations and shared across request handlers. Each validation call
//! runs the pipeline to completion and returns either a fully validated
//! typed token or a single categorized [`TokenValidationError`].
//!
//! ```no_run
//! use tokenward::{IssuerConfigBuilder, TokenValidator};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = TokenValidator::builder()
//!     .with_issuer(
//!         IssuerConfigBuilder::new("https://idp.example.com")
//!             .with_jwks_url(Url::parse("https://idp.example.com/keys")?)
//!             .with_audience("api://orders"),
//!     )
//!     .build()?;
//!
//! let token = validator.create_access_token("eyJhbGciOi...").await?;
//! assert!(token.has_scope("orders:read"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`validator`] - The validation orchestrator and its builder
//! - [`pipeline`] - Header, signature, and claim validation stages
//! - [`token`] - Wire-format decoding and typed token content
//! - [`jwks`] - Key-set parsing, per-key processing, and generation cache
//! - [`crypto`] - Algorithms, key material, and verifier templates
//! - [`http`] - Resilient ETag-aware fetching and OIDC discovery
//! - [`issuer`] - Per-issuer configuration and resolution
//! - [`cache`] - Validated access-token cache
//! - [`security`] - Security event taxonomy and counters

pub mod cache;
pub mod crypto;
pub mod error;
pub mod http;
pub mod issuer;
pub mod jwks;
pub mod pipeline;
pub mod security;
pub mod token;
pub mod validator;

pub use cache::AccessTokenCache;
pub use error::TokenValidationError;
pub use issuer::{IssuerConfigBuilder, IssuerConfigError, ParserConfig};
pub use security::{SecurityEventCounter, SecurityEventType};
pub use token::{AccessTokenContent, IdTokenContent, RefreshTokenContent, TokenType};
pub use validator::{TokenValidator, TokenValidatorBuilder};
