//! Claim validation stages.

use serde_json::Value;
use time::OffsetDateTime;

use super::context::ValidationContext;
use crate::error::TokenValidationError;
use crate::issuer::IssuerConfig;
use crate::token::{DecodedJwt, TokenType, string_list};

/// Checks that the token type's mandatory claims are present.
pub struct MandatoryClaimsValidator;

impl MandatoryClaimsValidator {
    /// # Errors
    ///
    /// Returns [`TokenValidationError::MissingClaim`] naming the first
    /// absent claim.
    pub fn validate(jwt: &DecodedJwt, token_type: TokenType) -> Result<(), TokenValidationError> {
        for &claim in token_type.mandatory_claims() {
            match jwt.claim(claim) {
                Some(value) if !value.is_null() => {}
                _ => return Err(TokenValidationError::MissingClaim(claim.to_string())),
            }
        }
        Ok(())
    }
}

/// Checks that the token audience intersects the expected audience.
pub struct AudienceValidator;

impl AudienceValidator {
    /// Skipped when the issuer configures no expected audience; that gap is
    /// logged because accepting tokens for any audience is rarely intended.
    ///
    /// # Errors
    ///
    /// Returns [`TokenValidationError::AudienceMismatch`] when the sets are
    /// disjoint.
    pub fn validate(jwt: &DecodedJwt, config: &IssuerConfig) -> Result<(), TokenValidationError> {
        let expected = config.audiences();
        if expected.is_empty() {
            tracing::warn!(
                issuer = config.issuer(),
                "No expected audience configured; audience validation skipped"
            );
            return Ok(());
        }

        let actual = jwt.claim("aud").map(string_list).unwrap_or_default();
        if actual.iter().any(|aud| expected.contains(aud)) {
            Ok(())
        } else {
            Err(TokenValidationError::AudienceMismatch {
                expected: expected.to_vec(),
                actual,
            })
        }
    }
}

/// Checks the `azp` claim against the expected client ids.
pub struct AuthorizedPartyValidator;

impl AuthorizedPartyValidator {
    /// Skipped when no client ids are configured or the token carries no
    /// `azp` claim.
    ///
    /// # Errors
    ///
    /// Returns [`TokenValidationError::AuthorizedPartyMismatch`] when `azp`
    /// is present but matches no configured client id.
    pub fn validate(jwt: &DecodedJwt, config: &IssuerConfig) -> Result<(), TokenValidationError> {
        let expected = config.authorized_parties();
        if expected.is_empty() {
            return Ok(());
        }
        let Some(azp) = jwt.claim("azp").and_then(Value::as_str) else {
            return Ok(());
        };

        if expected.iter().any(|party| party == azp) {
            Ok(())
        } else {
            Err(TokenValidationError::AuthorizedPartyMismatch(
                azp.to_string(),
            ))
        }
    }
}

/// Checks `exp` and `nbf` against the validation instant with leeway.
pub struct ExpirationValidator;

impl ExpirationValidator {
    /// # Errors
    ///
    /// Returns [`TokenValidationError::TokenExpired`] or
    /// [`TokenValidationError::TokenNotYetValid`]. A present but non-numeric
    /// `exp` or `nbf` is reported as a missing claim.
    pub fn validate(
        jwt: &DecodedJwt,
        config: &IssuerConfig,
        context: &ValidationContext,
    ) -> Result<(), TokenValidationError> {
        let leeway = leeway_for(config);
        let now = context.now();

        if let Some(value) = jwt.claim("exp") {
            let exp = numeric_date(value, "exp")?;
            // A far-future exp plus leeway can leave the representable
            // datetime range; treat overflow as not expired.
            if let Some(deadline) = exp.checked_add(leeway)
                && deadline <= now
            {
                return Err(TokenValidationError::TokenExpired);
            }
        }
        if let Some(value) = jwt.claim("nbf") {
            let nbf = numeric_date(value, "nbf")?;
            if let Some(window) = now.checked_add(leeway)
                && nbf > window
            {
                return Err(TokenValidationError::TokenNotYetValid);
            }
        }
        Ok(())
    }
}

fn leeway_for(config: &IssuerConfig) -> time::Duration {
    time::Duration::try_from(config.parser().leeway).unwrap_or(time::Duration::MAX)
}

fn numeric_date(value: &Value, name: &str) -> Result<OffsetDateTime, TokenValidationError> {
    value
        .as_i64()
        .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
        .ok_or_else(|| TokenValidationError::MissingClaim(name.to_string()))
}

/// Runs all claim stages for one token.
pub struct TokenClaimValidator;

impl TokenClaimValidator {
    /// Validates claims in order: mandatory presence, audience, authorized
    /// party, then temporal checks. Refresh tokens carry no audience or
    /// client binding, so only presence and temporal checks apply to them.
    ///
    /// # Errors
    ///
    /// Propagates the first failing stage's error.
    pub fn validate(
        jwt: &DecodedJwt,
        token_type: TokenType,
        config: &IssuerConfig,
        context: &ValidationContext,
    ) -> Result<(), TokenValidationError> {
        MandatoryClaimsValidator::validate(jwt, token_type)?;
        if token_type != TokenType::Refresh {
            AudienceValidator::validate(jwt, config)?;
            AuthorizedPartyValidator::validate(jwt, config)?;
        }
        ExpirationValidator::validate(jwt, config, context)
    }
}
