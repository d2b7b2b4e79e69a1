//! Per-key validation and key-material parsing.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};

use crate::crypto::{EcCurve, KeyFamily, PublicKey, SignatureAlgorithm};

/// Maximum accepted `kid` length in characters.
pub const MAX_KEY_ID_LENGTH: usize = 100;

/// A validated verification key ready for signature checks.
///
/// Owned exclusively by the key-store generation that produced it; the
/// validation hot path only ever reads it.
#[derive(Debug, Clone)]
pub struct KeyInfo {
    /// The parsed verification key.
    pub key: PublicKey,
    /// The declared `alg`, or the family/curve default when the JWK omits
    /// it. Token-to-key compatibility is checked by key family and curve at
    /// verification time, not against this field.
    pub algorithm: SignatureAlgorithm,
    /// The JWK `kid`.
    pub key_id: String,
}

/// Turns raw JWK objects into [`KeyInfo`] entries.
///
/// Individual malformed keys are logged and skipped so that one bad entry
/// never invalidates the rest of the key set.
#[derive(Debug, Clone)]
pub struct KeyProcessor {
    allowed_algorithms: Vec<SignatureAlgorithm>,
}

impl KeyProcessor {
    #[must_use]
    pub fn new(allowed_algorithms: &[SignatureAlgorithm]) -> Self {
        Self {
            allowed_algorithms: allowed_algorithms.to_vec(),
        }
    }

    /// Validates and parses one raw JWK.
    ///
    /// Returns `None` (after logging) when the key is malformed, uses an
    /// unsupported type or algorithm, or its algorithm is outside the
    /// configured allow-list.
    #[must_use]
    pub fn process_key(&self, raw: &Map<String, Value>) -> Option<KeyInfo> {
        let Some(kid) = raw.get("kid").and_then(Value::as_str) else {
            tracing::warn!("Skipping JWK without a key id");
            return None;
        };
        if kid.is_empty() || kid.chars().count() > MAX_KEY_ID_LENGTH {
            tracing::warn!("Skipping JWK with invalid key id length");
            return None;
        }

        let Some(kty) = raw.get("kty").and_then(Value::as_str) else {
            tracing::warn!(kid, "Skipping JWK without a key type");
            return None;
        };

        let declared = match raw.get("alg").and_then(Value::as_str) {
            Some(name) => match SignatureAlgorithm::from_name(name) {
                Some(alg) => Some(alg),
                None => {
                    tracing::warn!(kid, alg = name, "Skipping JWK with unsupported algorithm");
                    return None;
                }
            },
            None => None,
        };
        if let Some(alg) = declared
            && !self.allowed_algorithms.contains(&alg)
        {
            tracing::warn!(
                kid,
                alg = alg.name(),
                "Skipping JWK whose algorithm is not in the allow-list"
            );
            return None;
        }

        match kty {
            "RSA" => self.process_rsa(raw, kid, declared),
            "EC" => self.process_ec(raw, kid, declared),
            other => {
                tracing::warn!(kid, kty = other, "Skipping JWK with unsupported key type");
                None
            }
        }
    }

    fn process_rsa(
        &self,
        raw: &Map<String, Value>,
        kid: &str,
        declared: Option<SignatureAlgorithm>,
    ) -> Option<KeyInfo> {
        if let Some(alg) = declared
            && alg.key_family() != KeyFamily::Rsa
        {
            tracing::warn!(kid, alg = alg.name(), "Skipping RSA JWK with EC algorithm");
            return None;
        }

        let n = decode_field(raw, kid, "n")?;
        let e = decode_field(raw, kid, "e")?;
        let key = match PublicKey::from_rsa_components(&n, &e) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(kid, error = %e, "Skipping malformed RSA JWK");
                return None;
            }
        };

        Some(KeyInfo {
            key,
            algorithm: declared.unwrap_or(SignatureAlgorithm::Rs256),
            key_id: kid.to_string(),
        })
    }

    fn process_ec(
        &self,
        raw: &Map<String, Value>,
        kid: &str,
        declared: Option<SignatureAlgorithm>,
    ) -> Option<KeyInfo> {
        let Some(curve) = raw
            .get("crv")
            .and_then(Value::as_str)
            .and_then(EcCurve::from_crv)
        else {
            tracing::warn!(kid, "Skipping EC JWK with missing or unsupported curve");
            return None;
        };

        if let Some(alg) = declared
            && alg.curve() != Some(curve)
        {
            tracing::warn!(
                kid,
                alg = alg.name(),
                crv = curve.crv(),
                "Skipping EC JWK whose algorithm does not match its curve"
            );
            return None;
        }

        let x = decode_field(raw, kid, "x")?;
        let y = decode_field(raw, kid, "y")?;
        let key = match PublicKey::from_ec_point(curve, &x, &y) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(kid, error = %e, "Skipping malformed EC JWK");
                return None;
            }
        };

        Some(KeyInfo {
            key,
            algorithm: declared.unwrap_or_else(|| curve.default_algorithm()),
            key_id: kid.to_string(),
        })
    }
}

fn decode_field(raw: &Map<String, Value>, kid: &str, name: &str) -> Option<Vec<u8>> {
    let Some(value) = raw.get(name).and_then(Value::as_str) else {
        tracing::warn!(kid, field = name, "Skipping JWK with missing field");
        return None;
    };
    match URL_SAFE_NO_PAD.decode(value) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(kid, field = name, error = %e, "Skipping JWK with invalid Base64URL");
            None
        }
    }
}
