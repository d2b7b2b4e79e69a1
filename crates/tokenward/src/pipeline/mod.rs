//! The staged validation pipeline.
//!
//! Stages run in a fixed order and short-circuit on the first failure:
//! header checks (cheap), then signature verification (expensive), then
//! claim validation. Each stage raises exactly one categorized
//! [`TokenValidationError`](crate::error::TokenValidationError).

pub mod claims;
pub mod context;
pub mod header;
pub mod signature;

pub use claims::{
    AudienceValidator, AuthorizedPartyValidator, ExpirationValidator, MandatoryClaimsValidator,
    TokenClaimValidator,
};
pub use context::ValidationContext;
pub use header::{TokenHeaderValidator, ValidatedHeader};
pub use signature::TokenSignatureValidator;
