//! Typed token content returned to callers after validation.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use time::OffsetDateTime;

use super::claims::{ClaimValue, normalize_scopes, string_list};
use super::decoded::DecodedJwt;

/// The kind of token being validated; selects the mandatory-claim set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// OAuth access token.
    Access,
    /// OIDC ID token.
    Id,
    /// OAuth refresh token.
    Refresh,
}

impl TokenType {
    /// Claims that must be present for this token type.
    #[must_use]
    pub fn mandatory_claims(self) -> &'static [&'static str] {
        match self {
            TokenType::Access => &["sub", "exp", "iat"],
            TokenType::Id => &["sub", "exp", "iat", "aud"],
            TokenType::Refresh => &["exp"],
        }
    }
}

fn timestamp(claims: &Map<String, Value>, name: &str) -> Option<OffsetDateTime> {
    claims
        .get(name)
        .and_then(Value::as_i64)
        .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
}

fn string_claim(claims: &Map<String, Value>, name: &str) -> Option<String> {
    claims.get(name).and_then(Value::as_str).map(str::to_string)
}

fn list_claim(claims: &Map<String, Value>, name: &str) -> Vec<String> {
    claims.get(name).map(string_list).unwrap_or_default()
}

/// A validated OAuth access token.
///
/// Construction is a pure extraction from the decoded payload; presence of
/// mandatory claims is enforced by the claim-validation stage, so accessors
/// for standard claims return `Option`.
#[derive(Debug, Clone)]
pub struct AccessTokenContent {
    claims: Map<String, Value>,
    subject: Option<String>,
    issuer: Option<String>,
    expires_at: Option<OffsetDateTime>,
    issued_at: Option<OffsetDateTime>,
    not_before: Option<OffsetDateTime>,
    audience: Vec<String>,
    authorized_party: Option<String>,
    scopes: BTreeSet<String>,
    roles: Vec<String>,
    groups: Vec<String>,
}

impl AccessTokenContent {
    /// Extracts typed content from a decoded token.
    #[must_use]
    pub fn from_decoded(jwt: &DecodedJwt) -> Self {
        let claims = jwt.payload().clone();
        Self {
            subject: string_claim(&claims, "sub"),
            issuer: string_claim(&claims, "iss"),
            expires_at: timestamp(&claims, "exp"),
            issued_at: timestamp(&claims, "iat"),
            not_before: timestamp(&claims, "nbf"),
            audience: list_claim(&claims, "aud"),
            authorized_party: string_claim(&claims, "azp"),
            scopes: claims.get("scope").map(normalize_scopes).unwrap_or_default(),
            roles: list_claim(&claims, "roles"),
            groups: list_claim(&claims, "groups"),
            claims,
        }
    }

    /// The `sub` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The `iss` claim.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// The `exp` claim as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
    }

    /// The `iat` claim as a timestamp.
    #[must_use]
    pub fn issued_at(&self) -> Option<OffsetDateTime> {
        self.issued_at
    }

    /// The `nbf` claim as a timestamp.
    #[must_use]
    pub fn not_before(&self) -> Option<OffsetDateTime> {
        self.not_before
    }

    /// The `aud` claim, normalized to a list.
    #[must_use]
    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    /// The `azp` claim.
    #[must_use]
    pub fn authorized_party(&self) -> Option<&str> {
        self.authorized_party.as_deref()
    }

    /// The normalized, sorted scope set.
    #[must_use]
    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// Returns `true` if the token carries the given scope.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// The `roles` claim entries.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Returns `true` if the token carries the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// The `groups` claim entries.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns `true` if the token carries the given group.
    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Looks up any payload claim as a typed value.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<ClaimValue> {
        self.claims.get(name).and_then(ClaimValue::from_json)
    }

    /// The full payload claim map.
    #[must_use]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }
}

/// A validated OIDC ID token.
#[derive(Debug, Clone)]
pub struct IdTokenContent {
    claims: Map<String, Value>,
    subject: Option<String>,
    issuer: Option<String>,
    expires_at: Option<OffsetDateTime>,
    issued_at: Option<OffsetDateTime>,
    audience: Vec<String>,
    authorized_party: Option<String>,
    nonce: Option<String>,
    email: Option<String>,
}

impl IdTokenContent {
    /// Extracts typed content from a decoded token.
    #[must_use]
    pub fn from_decoded(jwt: &DecodedJwt) -> Self {
        let claims = jwt.payload().clone();
        Self {
            subject: string_claim(&claims, "sub"),
            issuer: string_claim(&claims, "iss"),
            expires_at: timestamp(&claims, "exp"),
            issued_at: timestamp(&claims, "iat"),
            audience: list_claim(&claims, "aud"),
            authorized_party: string_claim(&claims, "azp"),
            nonce: string_claim(&claims, "nonce"),
            email: string_claim(&claims, "email"),
            claims,
        }
    }

    /// The `sub` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The `iss` claim.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// The `exp` claim as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
    }

    /// The `iat` claim as a timestamp.
    #[must_use]
    pub fn issued_at(&self) -> Option<OffsetDateTime> {
        self.issued_at
    }

    /// The `aud` claim, normalized to a list.
    #[must_use]
    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    /// The `azp` claim.
    #[must_use]
    pub fn authorized_party(&self) -> Option<&str> {
        self.authorized_party.as_deref()
    }

    /// The `nonce` claim.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    /// The `email` claim.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Looks up any payload claim as a typed value.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<ClaimValue> {
        self.claims.get(name).and_then(ClaimValue::from_json)
    }

    /// The full payload claim map.
    #[must_use]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }
}

/// A validated OAuth refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenContent {
    claims: Map<String, Value>,
    subject: Option<String>,
    expires_at: Option<OffsetDateTime>,
}

impl RefreshTokenContent {
    /// Extracts typed content from a decoded token.
    #[must_use]
    pub fn from_decoded(jwt: &DecodedJwt) -> Self {
        let claims = jwt.payload().clone();
        Self {
            subject: string_claim(&claims, "sub"),
            expires_at: timestamp(&claims, "exp"),
            claims,
        }
    }

    /// The `sub` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The `exp` claim as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
    }

    /// Looks up any payload claim as a typed value.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<ClaimValue> {
        self.claims.get(name).and_then(ClaimValue::from_json)
    }

    /// The full payload claim map.
    #[must_use]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::ParserConfig;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn decode(payload: Value) -> DecodedJwt {
        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({"alg": "RS256"})).unwrap());
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
        let raw = format!("{header}.{body}.{}", URL_SAFE_NO_PAD.encode(b"sig"));
        DecodedJwt::decode(&raw, &ParserConfig::default()).unwrap()
    }

    #[test]
    fn test_access_token_extraction() {
        let jwt = decode(json!({
            "iss": "https://issuer.example.com",
            "sub": "user-1",
            "exp": 1_700_003_600,
            "iat": 1_700_000_000,
            "aud": ["api", "web"],
            "azp": "client-1",
            "scope": "read write",
            "roles": ["admin"],
            "groups": ["ops"]
        }));

        let content = AccessTokenContent::from_decoded(&jwt);
        assert_eq!(content.subject(), Some("user-1"));
        assert_eq!(content.issuer(), Some("https://issuer.example.com"));
        assert_eq!(
            content.expires_at().unwrap().unix_timestamp(),
            1_700_003_600
        );
        assert_eq!(content.audience(), &["api", "web"]);
        assert_eq!(content.authorized_party(), Some("client-1"));
        assert!(content.has_scope("read"));
        assert!(content.has_scope("write"));
        assert!(!content.has_scope("admin"));
        assert!(content.has_role("admin"));
        assert!(content.has_group("ops"));
        assert!(content.not_before().is_none());
    }

    #[test]
    fn test_scope_claim_forms_are_equivalent() {
        let from_string = AccessTokenContent::from_decoded(&decode(json!({"scope": "read write"})));
        let from_array =
            AccessTokenContent::from_decoded(&decode(json!({"scope": ["read", "write"]})));
        assert_eq!(from_string.scopes(), from_array.scopes());
    }

    #[test]
    fn test_mandatory_claim_sets() {
        assert_eq!(TokenType::Access.mandatory_claims(), &["sub", "exp", "iat"]);
        assert_eq!(
            TokenType::Id.mandatory_claims(),
            &["sub", "exp", "iat", "aud"]
        );
        assert_eq!(TokenType::Refresh.mandatory_claims(), &["exp"]);
    }

    #[test]
    fn test_id_token_extraction() {
        let jwt = decode(json!({
            "sub": "user-1",
            "aud": "client-1",
            "nonce": "n-1",
            "email": "user@example.com"
        }));
        let content = IdTokenContent::from_decoded(&jwt);
        assert_eq!(content.audience(), &["client-1"]);
        assert_eq!(content.nonce(), Some("n-1"));
        assert_eq!(content.email(), Some("user@example.com"));
    }

    #[test]
    fn test_typed_claim_lookup_preserves_raw() {
        let jwt = decode(json!({"custom": ["a", "b"]}));
        let content = AccessTokenContent::from_decoded(&jwt);
        let claim = content.claim("custom").unwrap();
        assert_eq!(claim.raw(), &json!(["a", "b"]));
        assert!(content.claim("absent").is_none());
    }
}
