//! Token header validation.

use crate::crypto::SignatureAlgorithm;
use crate::error::TokenValidationError;
use crate::token::DecodedJwt;

/// The header fields signature validation depends on.
#[derive(Debug, Clone)]
pub struct ValidatedHeader {
    /// The declared, allow-listed algorithm.
    pub algorithm: SignatureAlgorithm,
    /// The declared key id.
    pub kid: String,
}

/// Checks the token header before any key material is touched.
pub struct TokenHeaderValidator;

impl TokenHeaderValidator {
    /// Confirms the declared `alg` is supported and allow-listed and that a
    /// `kid` is present.
    ///
    /// # Errors
    ///
    /// Returns [`TokenValidationError::UnsupportedAlgorithm`] or
    /// [`TokenValidationError::MissingKeyId`].
    pub fn validate(
        jwt: &DecodedJwt,
        allowed: &[SignatureAlgorithm],
    ) -> Result<ValidatedHeader, TokenValidationError> {
        let Some(name) = jwt.algorithm_name() else {
            return Err(TokenValidationError::UnsupportedAlgorithm(
                "header is missing 'alg'".to_string(),
            ));
        };
        let Some(algorithm) = SignatureAlgorithm::from_name(name) else {
            return Err(TokenValidationError::UnsupportedAlgorithm(name.to_string()));
        };
        if !allowed.contains(&algorithm) {
            return Err(TokenValidationError::UnsupportedAlgorithm(format!(
                "{name} is not allowed for this issuer"
            )));
        }

        let Some(kid) = jwt.kid() else {
            return Err(TokenValidationError::MissingKeyId);
        };

        Ok(ValidatedHeader {
            algorithm,
            kid: kid.to_string(),
        })
    }
}
