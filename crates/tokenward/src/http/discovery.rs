//! OIDC discovery document handling.
//!
//! Issuers that are configured with a well-known endpoint instead of a
//! direct JWKS URL resolve their key endpoint from the discovery document
//! published at `/.well-known/openid-configuration`.

use serde::{Deserialize, Serialize};

use super::loader::{ContentConverter, ConversionError};

/// The subset of the OIDC discovery document this crate consumes.
///
/// Unknown fields are ignored. The default value is the empty sentinel used
/// when the document could never be fetched; [`is_usable`](Self::is_usable)
/// distinguishes it from real content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WellKnownDocument {
    /// The issuer identifier, which must match the configured issuer.
    #[serde(default)]
    pub issuer: String,

    /// Where the issuer publishes its signing keys.
    #[serde(default)]
    pub jwks_uri: String,

    /// OAuth 2.0 authorization endpoint, if advertised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,

    /// OAuth 2.0 token endpoint, if advertised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
}

impl WellKnownDocument {
    /// Returns `true` when the document carries a JWKS endpoint.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.issuer.is_empty() && !self.jwks_uri.is_empty()
    }
}

/// Parses discovery documents for a [`ResilientHttpLoader`].
///
/// The `issuer` claim of the document must match the issuer the loader was
/// configured for. A mismatch is a misconfigured or hostile endpoint and the
/// document is rejected; trailing-slash differences are tolerated.
///
/// [`ResilientHttpLoader`]: super::loader::ResilientHttpLoader
pub struct WellKnownConverter {
    expected_issuer: String,
}

impl WellKnownConverter {
    #[must_use]
    pub fn new(expected_issuer: impl Into<String>) -> Self {
        Self {
            expected_issuer: expected_issuer.into(),
        }
    }
}

impl ContentConverter<WellKnownDocument> for WellKnownConverter {
    fn convert(&self, body: &[u8]) -> Result<WellKnownDocument, ConversionError> {
        let document: WellKnownDocument =
            serde_json::from_slice(body).map_err(|e| ConversionError(e.to_string()))?;

        if !document.is_usable() {
            return Err(ConversionError(
                "discovery document is missing issuer or jwks_uri".to_string(),
            ));
        }

        if document.issuer.trim_end_matches('/') != self.expected_issuer.trim_end_matches('/') {
            return Err(ConversionError(format!(
                "discovery issuer '{}' does not match expected issuer '{}'",
                document.issuer, self.expected_issuer
            )));
        }

        Ok(document)
    }

    fn empty_value(&self) -> WellKnownDocument {
        WellKnownDocument::default()
    }
}
