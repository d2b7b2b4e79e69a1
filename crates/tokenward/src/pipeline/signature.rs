//! Cryptographic signature validation.

use super::header::ValidatedHeader;
use crate::crypto::{KeyFamily, SignatureAlgorithm, SignatureError, SignatureTemplateManager};
use crate::error::TokenValidationError;
use crate::jwks::JwksKeyStore;
use crate::token::DecodedJwt;

/// Verifies token signatures against an issuer's key store.
///
/// Verifier templates are resolved once per configured algorithm at
/// construction; the per-token work is a key lookup plus one verify call.
pub struct TokenSignatureValidator {
    templates: SignatureTemplateManager,
}

impl TokenSignatureValidator {
    #[must_use]
    pub fn new(algorithms: &[SignatureAlgorithm]) -> Self {
        Self {
            templates: SignatureTemplateManager::new(algorithms),
        }
    }

    /// Resolves the key by `kid` and verifies the signature.
    ///
    /// Key-type compatibility is checked before any cryptography: RSA keys
    /// accept `RS*`/`PS*`, EC keys accept the `ES*` variant of their curve.
    ///
    /// # Errors
    ///
    /// Returns [`TokenValidationError::KeyNotFound`] for unknown key ids,
    /// [`TokenValidationError::UnsupportedAlgorithm`] for key/algorithm
    /// mismatches, and [`TokenValidationError::SignatureValidationFailed`]
    /// when verification fails.
    pub async fn validate(
        &self,
        jwt: &DecodedJwt,
        header: &ValidatedHeader,
        key_store: &JwksKeyStore,
    ) -> Result<(), TokenValidationError> {
        let Some(info) = key_store.get_key_info(&header.kid).await else {
            return Err(TokenValidationError::KeyNotFound(header.kid.clone()));
        };

        let compatible = match header.algorithm.key_family() {
            KeyFamily::Rsa => info.key.family() == KeyFamily::Rsa,
            KeyFamily::EllipticCurve => info.key.curve() == header.algorithm.curve(),
        };
        if !compatible {
            return Err(TokenValidationError::UnsupportedAlgorithm(format!(
                "key '{}' cannot verify {}",
                header.kid,
                header.algorithm.name()
            )));
        }

        self.templates
            .verify(
                &info.key,
                header.algorithm,
                jwt.signing_input(),
                jwt.signature(),
            )
            .map_err(|e| match e {
                SignatureError::AlgorithmNotConfigured(alg) => {
                    TokenValidationError::UnsupportedAlgorithm(alg.name().to_string())
                }
                SignatureError::KeyAlgorithmMismatch { algorithm } => {
                    TokenValidationError::UnsupportedAlgorithm(algorithm.name().to_string())
                }
                SignatureError::Malformed(detail) => {
                    TokenValidationError::SignatureValidationFailed(detail)
                }
                SignatureError::Verification => TokenValidationError::SignatureValidationFailed(
                    "signature does not match".to_string(),
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::ParserConfig;
    use crate::jwks::{JwksSource, JwksStoreConfig};
    use crate::pipeline::header::TokenHeaderValidator;
    use crate::security::SecurityEventCounter;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use elliptic_curve::sec1::ToEncodedPoint;
    use p256::ecdsa::signature::Signer;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn signed_token(secret: &p256::ecdsa::SigningKey, kid: &str) -> String {
        let header = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&json!({"alg": "ES256", "kid": kid})).unwrap());
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({"sub": "user-1"})).unwrap());
        let signing_input = format!("{header}.{payload}");
        let signature: p256::ecdsa::Signature = secret.sign(signing_input.as_bytes());
        format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        )
    }

    async fn store_with_key(
        server: &MockServer,
        secret: &p256::ecdsa::SigningKey,
        kid: &str,
    ) -> JwksKeyStore {
        let point = secret.verifying_key().to_encoded_point(false);
        let body = json!({
            "keys": [{
                "kty": "EC",
                "kid": kid,
                "crv": "P-256",
                "x": URL_SAFE_NO_PAD.encode(point.x().unwrap()),
                "y": URL_SAFE_NO_PAD.encode(point.y().unwrap()),
            }]
        });
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;

        let store = JwksKeyStore::new(
            JwksStoreConfig {
                source: JwksSource::Direct(
                    Url::parse(&format!("{}/jwks", server.uri())).unwrap(),
                ),
                issuer: server.uri(),
                allowed_algorithms: SignatureAlgorithm::ALL.to_vec(),
                max_document_size: 256 * 1024,
                http: crate::http::HttpSettings {
                    allow_http: true,
                    ..Default::default()
                },
                retry: crate::http::RetryStrategy::none(),
                min_refresh_interval: Duration::ZERO,
            },
            Arc::new(SecurityEventCounter::new()),
        )
        .unwrap();
        store.refresh().await;
        store
    }

    #[tokio::test]
    async fn test_valid_signature_passes() {
        let server = MockServer::start().await;
        let secret = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let store = store_with_key(&server, &secret, "key-1").await;

        let raw = signed_token(&secret, "key-1");
        let jwt = DecodedJwt::decode(&raw, &ParserConfig::default()).unwrap();
        let header = TokenHeaderValidator::validate(&jwt, &SignatureAlgorithm::ALL).unwrap();

        let validator = TokenSignatureValidator::new(&SignatureAlgorithm::ALL);
        validator.validate(&jwt, &header, &store).await.unwrap();
    }

    #[tokio::test]
    async fn test_tampered_payload_fails() {
        let server = MockServer::start().await;
        let secret = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let store = store_with_key(&server, &secret, "key-1").await;

        let raw = signed_token(&secret, "key-1");
        let mut segments: Vec<&str> = raw.split('.').collect();
        let forged = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&json!({"sub": "attacker"})).unwrap());
        segments[1] = &forged;
        let tampered = segments.join(".");

        let jwt = DecodedJwt::decode(&tampered, &ParserConfig::default()).unwrap();
        let header = TokenHeaderValidator::validate(&jwt, &SignatureAlgorithm::ALL).unwrap();

        let validator = TokenSignatureValidator::new(&SignatureAlgorithm::ALL);
        let err = validator.validate(&jwt, &header, &store).await.unwrap_err();
        assert!(matches!(
            err,
            TokenValidationError::SignatureValidationFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_unknown_kid_is_key_not_found() {
        let server = MockServer::start().await;
        let secret = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let store = store_with_key(&server, &secret, "key-1").await;

        let raw = signed_token(&secret, "key-2");
        let jwt = DecodedJwt::decode(&raw, &ParserConfig::default()).unwrap();
        let header = TokenHeaderValidator::validate(&jwt, &SignatureAlgorithm::ALL).unwrap();

        let validator = TokenSignatureValidator::new(&SignatureAlgorithm::ALL);
        let err = validator.validate(&jwt, &header, &store).await.unwrap_err();
        assert!(matches!(err, TokenValidationError::KeyNotFound(kid) if kid == "key-2"));
    }

    #[tokio::test]
    async fn test_curve_mismatch_is_unsupported_algorithm() {
        let server = MockServer::start().await;
        let secret = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let store = store_with_key(&server, &secret, "key-1").await;

        // ES384 header against a P-256 key.
        let header_b64 = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&json!({"alg": "ES384", "kid": "key-1"})).unwrap());
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({})).unwrap());
        let raw = format!(
            "{header_b64}.{payload_b64}.{}",
            URL_SAFE_NO_PAD.encode([0u8; 96])
        );

        let jwt = DecodedJwt::decode(&raw, &ParserConfig::default()).unwrap();
        let header = TokenHeaderValidator::validate(&jwt, &SignatureAlgorithm::ALL).unwrap();

        let validator = TokenSignatureValidator::new(&SignatureAlgorithm::ALL);
        let err = validator.validate(&jwt, &header, &store).await.unwrap_err();
        assert!(matches!(err, TokenValidationError::UnsupportedAlgorithm(_)));
    }

    #[tokio::test]
    async fn test_all_zero_signature_is_rejected() {
        let server = MockServer::start().await;
        let secret = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let store = store_with_key(&server, &secret, "key-1").await;

        let raw = signed_token(&secret, "key-1");
        let signing_input = raw.rsplit_once('.').unwrap().0;
        let zeroed = format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode([0u8; 64]));

        let jwt = DecodedJwt::decode(&zeroed, &ParserConfig::default()).unwrap();
        let header = TokenHeaderValidator::validate(&jwt, &SignatureAlgorithm::ALL).unwrap();

        let validator = TokenSignatureValidator::new(&SignatureAlgorithm::ALL);
        let err = validator.validate(&jwt, &header, &store).await.unwrap_err();
        assert!(matches!(
            err,
            TokenValidationError::SignatureValidationFailed(_)
        ));
    }
}
