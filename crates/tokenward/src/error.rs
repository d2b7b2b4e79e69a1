//! Error types for token validation.
//!
//! Every pipeline stage either returns a validated value or raises a single
//! categorized [`TokenValidationError`] immediately; no partial token objects
//! are ever returned. Each variant maps to exactly one
//! [`SecurityEventType`], and the matching counter is incremented at the
//! raise site before the error propagates.

use crate::security::SecurityEventType;

/// Errors raised by the token validation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TokenValidationError {
    /// The raw token violated format or size constraints.
    #[error("Token format violation: {0}")]
    TokenFormat(String),

    /// A Base64URL-decoded segment could not be parsed as JSON.
    #[error("Failed to parse token JSON: {0}")]
    JsonParse(String),

    /// The algorithm is missing, unknown, outside the allow-list, or does
    /// not match the resolved key's type.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The token header carries no `kid`.
    #[error("Token header is missing key ID (kid)")]
    MissingKeyId,

    /// No key with the requested `kid` is known for the issuer.
    #[error("No key found for kid: {0}")]
    KeyNotFound(String),

    /// Cryptographic signature verification failed.
    #[error("Signature validation failed: {0}")]
    SignatureValidationFailed(String),

    /// A mandatory claim is absent from the payload.
    #[error("Missing mandatory claim: {0}")]
    MissingClaim(String),

    /// The token audience does not intersect the expected audience.
    #[error("Audience mismatch: token audience {actual:?} does not intersect expected {expected:?}")]
    AudienceMismatch {
        /// The audiences the issuer configuration expects.
        expected: Vec<String>,
        /// The audiences the token carries.
        actual: Vec<String>,
    },

    /// The `azp` claim does not match any expected client id.
    #[error("Authorized party mismatch: {0}")]
    AuthorizedPartyMismatch(String),

    /// The token expired before the current validation instant.
    #[error("Token has expired")]
    TokenExpired,

    /// The token's `nbf` lies in the future.
    #[error("Token is not yet valid")]
    TokenNotYetValid,

    /// The issuer claim resolved to no registered configuration.
    #[error("Unknown issuer: {0}")]
    UnknownIssuer(String),

    /// The issuer's JWKS document was structurally invalid.
    #[error("Failed to parse JWKS: {0}")]
    JwksParseFailed(String),
}

impl TokenValidationError {
    /// Returns the security event kind this error is accounted under.
    #[must_use]
    pub fn event_type(&self) -> SecurityEventType {
        match self {
            Self::TokenFormat(_) => SecurityEventType::TokenFormatViolation,
            Self::JsonParse(_) => SecurityEventType::TokenJsonParseFailed,
            Self::UnsupportedAlgorithm(_) => SecurityEventType::UnsupportedAlgorithm,
            Self::MissingKeyId => SecurityEventType::MissingKeyId,
            Self::KeyNotFound(_) => SecurityEventType::KeyNotFound,
            Self::SignatureValidationFailed(_) => SecurityEventType::SignatureValidationFailed,
            Self::MissingClaim(_) => SecurityEventType::MissingMandatoryClaim,
            Self::AudienceMismatch { .. } => SecurityEventType::AudienceMismatch,
            Self::AuthorizedPartyMismatch(_) => SecurityEventType::AuthorizedPartyMismatch,
            Self::TokenExpired => SecurityEventType::TokenExpired,
            Self::TokenNotYetValid => SecurityEventType::TokenNotYetValid,
            Self::UnknownIssuer(_) => SecurityEventType::UnknownIssuer,
            Self::JwksParseFailed(_) => SecurityEventType::JwksParseFailed,
        }
    }
}
