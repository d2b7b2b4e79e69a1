//! Process-wide, per-validator security event counters.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// The kind of a security-relevant validation event.
///
/// Each variant corresponds to exactly one rejection category of the
/// validation pipeline or the JWKS subsystem. The set is closed: new failure
/// modes must be given their own variant rather than reusing an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityEventType {
    /// The raw token violated format or size constraints.
    TokenFormatViolation,
    /// A token segment could not be parsed as JSON.
    TokenJsonParseFailed,
    /// The token algorithm is missing, unknown, or not in the allow-list,
    /// or does not match the resolved key's type.
    UnsupportedAlgorithm,
    /// The token header carries no `kid`.
    MissingKeyId,
    /// No key with the requested `kid` exists in the current or previous
    /// key generation.
    KeyNotFound,
    /// Cryptographic signature verification failed.
    SignatureValidationFailed,
    /// A mandatory claim is absent from the payload.
    MissingMandatoryClaim,
    /// The token audience does not intersect the expected audience.
    AudienceMismatch,
    /// The `azp` claim does not match any expected client id.
    AuthorizedPartyMismatch,
    /// The token is expired.
    TokenExpired,
    /// The token is not yet valid (`nbf` in the future).
    TokenNotYetValid,
    /// The issuer claim resolved to no registered configuration.
    UnknownIssuer,
    /// A JWKS document was structurally invalid (unparseable, oversized,
    /// too many properties, empty or oversized key array).
    JwksParseFailed,
}

impl SecurityEventType {
    /// All event kinds, in declaration order.
    pub const ALL: [SecurityEventType; 13] = [
        SecurityEventType::TokenFormatViolation,
        SecurityEventType::TokenJsonParseFailed,
        SecurityEventType::UnsupportedAlgorithm,
        SecurityEventType::MissingKeyId,
        SecurityEventType::KeyNotFound,
        SecurityEventType::SignatureValidationFailed,
        SecurityEventType::MissingMandatoryClaim,
        SecurityEventType::AudienceMismatch,
        SecurityEventType::AuthorizedPartyMismatch,
        SecurityEventType::TokenExpired,
        SecurityEventType::TokenNotYetValid,
        SecurityEventType::UnknownIssuer,
        SecurityEventType::JwksParseFailed,
    ];

    /// Returns the stable, machine-checkable name of this event kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityEventType::TokenFormatViolation => "TOKEN_FORMAT_VIOLATION",
            SecurityEventType::TokenJsonParseFailed => "TOKEN_JSON_PARSE_FAILED",
            SecurityEventType::UnsupportedAlgorithm => "UNSUPPORTED_ALGORITHM",
            SecurityEventType::MissingKeyId => "MISSING_KEY_ID",
            SecurityEventType::KeyNotFound => "KEY_NOT_FOUND",
            SecurityEventType::SignatureValidationFailed => "SIGNATURE_VALIDATION_FAILED",
            SecurityEventType::MissingMandatoryClaim => "MISSING_MANDATORY_CLAIM",
            SecurityEventType::AudienceMismatch => "AUDIENCE_MISMATCH",
            SecurityEventType::AuthorizedPartyMismatch => "AUTHORIZED_PARTY_MISMATCH",
            SecurityEventType::TokenExpired => "TOKEN_EXPIRED",
            SecurityEventType::TokenNotYetValid => "TOKEN_NOT_YET_VALID",
            SecurityEventType::UnknownIssuer => "UNKNOWN_ISSUER",
            SecurityEventType::JwksParseFailed => "JWKS_JSON_PARSE_FAILED",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic counters for security events.
///
/// One instance is created per [`TokenValidator`](crate::TokenValidator) and
/// threaded through every validator constructor as an explicitly shared
/// context object. Increments are lock-free atomic adds; counters are never
/// reset.
#[derive(Debug, Default)]
pub struct SecurityEventCounter {
    counts: [AtomicU64; SecurityEventType::ALL.len()],
}

impl SecurityEventCounter {
    /// Creates a counter with all event counts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for the given event kind.
    pub fn increment(&self, event: SecurityEventType) {
        self.counts[event.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the current count for the given event kind.
    #[must_use]
    pub fn count(&self, event: SecurityEventType) -> u64 {
        self.counts[event.index()].load(Ordering::Relaxed)
    }

    /// Returns all non-zero counters as a map.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<SecurityEventType, u64> {
        SecurityEventType::ALL
            .iter()
            .filter_map(|&event| {
                let count = self.count(event);
                (count > 0).then_some((event, count))
            })
            .collect()
    }
}
