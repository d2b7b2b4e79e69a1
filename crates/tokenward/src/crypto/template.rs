//! Per-algorithm verification templates.
//!
//! Resolving the verification parameters for an algorithm (digest selection,
//! PKCS#1 v1.5 versus PSS padding, curve binding) is done once, at
//! construction, for the configured algorithm set. The validation hot path
//! then dispatches through the pre-resolved template without re-deriving
//! anything per call.

use std::collections::HashMap;

use rsa::Pkcs1v15Sign;
use rsa::pss::Pss;
use sha2::{Digest, Sha256, Sha384, Sha512};

use super::algorithm::{EcCurve, SignatureAlgorithm};
use super::ecdsa::raw_to_der;
use super::key::PublicKey;

/// Errors from signature verification.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The algorithm was not part of the configured set at initialization.
    #[error("Algorithm {0} is not configured for verification")]
    AlgorithmNotConfigured(SignatureAlgorithm),

    /// The key type or curve does not match the token algorithm.
    #[error("Key type does not match algorithm {algorithm}")]
    KeyAlgorithmMismatch {
        /// The token's declared algorithm.
        algorithm: SignatureAlgorithm,
    },

    /// The signature bytes are structurally invalid for the algorithm.
    #[error("Malformed signature: {0}")]
    Malformed(String),

    /// The signature did not verify against the key.
    #[error("Signature verification failed")]
    Verification,
}

#[derive(Debug, Clone, Copy)]
enum ShaVariant {
    Sha256,
    Sha384,
    Sha512,
}

/// Pre-resolved verification parameters for one algorithm.
#[derive(Debug, Clone, Copy)]
enum VerifierTemplate {
    RsaPkcs1v15(ShaVariant),
    RsaPss(ShaVariant),
    Ecdsa(EcCurve),
}

fn resolve(algorithm: SignatureAlgorithm) -> VerifierTemplate {
    match algorithm {
        SignatureAlgorithm::Rs256 => VerifierTemplate::RsaPkcs1v15(ShaVariant::Sha256),
        SignatureAlgorithm::Rs384 => VerifierTemplate::RsaPkcs1v15(ShaVariant::Sha384),
        SignatureAlgorithm::Rs512 => VerifierTemplate::RsaPkcs1v15(ShaVariant::Sha512),
        SignatureAlgorithm::Ps256 => VerifierTemplate::RsaPss(ShaVariant::Sha256),
        SignatureAlgorithm::Ps384 => VerifierTemplate::RsaPss(ShaVariant::Sha384),
        SignatureAlgorithm::Ps512 => VerifierTemplate::RsaPss(ShaVariant::Sha512),
        SignatureAlgorithm::Es256 => VerifierTemplate::Ecdsa(EcCurve::P256),
        SignatureAlgorithm::Es384 => VerifierTemplate::Ecdsa(EcCurve::P384),
        SignatureAlgorithm::Es512 => VerifierTemplate::Ecdsa(EcCurve::P521),
    }
}

/// Caches the verification template for each configured algorithm.
///
/// Construct one per [`TokenValidator`](crate::TokenValidator) with the union
/// of all issuers' allowed algorithms. Verification is stateless afterwards
/// and safe for unbounded concurrent use.
#[derive(Debug)]
pub struct SignatureTemplateManager {
    templates: HashMap<SignatureAlgorithm, VerifierTemplate>,
}

impl SignatureTemplateManager {
    /// Pre-resolves verification templates for the given algorithms.
    #[must_use]
    pub fn new(algorithms: &[SignatureAlgorithm]) -> Self {
        let templates = algorithms
            .iter()
            .map(|&algorithm| (algorithm, resolve(algorithm)))
            .collect();
        Self { templates }
    }

    /// Pre-resolves templates for every supported algorithm.
    #[must_use]
    pub fn all_algorithms() -> Self {
        Self::new(&SignatureAlgorithm::ALL)
    }

    /// Returns `true` if the algorithm was configured at initialization.
    #[must_use]
    pub fn supports(&self, algorithm: SignatureAlgorithm) -> bool {
        self.templates.contains_key(&algorithm)
    }

    /// Verifies `signature` (JOSE wire encoding) over `message` with `key`.
    ///
    /// ECDSA signatures are converted from the raw `r || s` encoding to DER
    /// before verification; a structurally invalid or all-zero signature
    /// fails verification rather than bypassing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm is not configured, the key does not
    /// match the algorithm, or the signature is malformed or invalid.
    pub fn verify(
        &self,
        key: &PublicKey,
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError> {
        let template = self
            .templates
            .get(&algorithm)
            .ok_or(SignatureError::AlgorithmNotConfigured(algorithm))?;

        match *template {
            VerifierTemplate::RsaPkcs1v15(sha) => {
                let PublicKey::Rsa(rsa_key) = key else {
                    return Err(SignatureError::KeyAlgorithmMismatch { algorithm });
                };
                verify_pkcs1v15(rsa_key, sha, message, signature)
            }
            VerifierTemplate::RsaPss(sha) => {
                let PublicKey::Rsa(rsa_key) = key else {
                    return Err(SignatureError::KeyAlgorithmMismatch { algorithm });
                };
                verify_pss(rsa_key, sha, message, signature)
            }
            VerifierTemplate::Ecdsa(curve) => {
                if key.curve() != Some(curve) {
                    return Err(SignatureError::KeyAlgorithmMismatch { algorithm });
                }
                verify_ecdsa(key, curve, message, signature)
            }
        }
    }
}

fn verify_pkcs1v15(
    key: &rsa::RsaPublicKey,
    sha: ShaVariant,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let result = match sha {
        ShaVariant::Sha256 => key.verify(
            Pkcs1v15Sign::new::<Sha256>(),
            &Sha256::digest(message),
            signature,
        ),
        ShaVariant::Sha384 => key.verify(
            Pkcs1v15Sign::new::<Sha384>(),
            &Sha384::digest(message),
            signature,
        ),
        ShaVariant::Sha512 => key.verify(
            Pkcs1v15Sign::new::<Sha512>(),
            &Sha512::digest(message),
            signature,
        ),
    };
    result.map_err(|_| SignatureError::Verification)
}

fn verify_pss(
    key: &rsa::RsaPublicKey,
    sha: ShaVariant,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    // Salt length equals the digest length, as RFC 7518 requires for PS*.
    let result = match sha {
        ShaVariant::Sha256 => key.verify(Pss::new::<Sha256>(), &Sha256::digest(message), signature),
        ShaVariant::Sha384 => key.verify(Pss::new::<Sha384>(), &Sha384::digest(message), signature),
        ShaVariant::Sha512 => key.verify(Pss::new::<Sha512>(), &Sha512::digest(message), signature),
    };
    result.map_err(|_| SignatureError::Verification)
}

fn verify_ecdsa(
    key: &PublicKey,
    curve: EcCurve,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let der = raw_to_der(signature, curve).map_err(|e| SignatureError::Malformed(e.to_string()))?;

    match key {
        PublicKey::P256(vk) => {
            use p256::ecdsa::signature::Verifier;
            let sig = p256::ecdsa::Signature::from_der(&der)
                .map_err(|e| SignatureError::Malformed(e.to_string()))?;
            vk.verify(message, &sig).map_err(|_| SignatureError::Verification)
        }
        PublicKey::P384(vk) => {
            use p384::ecdsa::signature::Verifier;
            let sig = p384::ecdsa::Signature::from_der(&der)
                .map_err(|e| SignatureError::Malformed(e.to_string()))?;
            vk.verify(message, &sig).map_err(|_| SignatureError::Verification)
        }
        PublicKey::P521(vk) => {
            use p521::ecdsa::signature::Verifier;
            let sig = p521::ecdsa::Signature::from_der(&der)
                .map_err(|e| SignatureError::Malformed(e.to_string()))?;
            vk.verify(message, &sig).map_err(|_| SignatureError::Verification)
        }
        PublicKey::Rsa(_) => Err(SignatureError::KeyAlgorithmMismatch {
            algorithm: curve.default_algorithm(),
        }),
    }
}
