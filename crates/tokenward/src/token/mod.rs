//! Token representations.
//!
//! A raw bearer token is decoded once per call into a [`DecodedJwt`]
//! (three Base64URL segments, parsed header/payload JSON, extracted
//! `kid`/`alg`/`iss`), which the pipeline stages then borrow. After the
//! pipeline accepts the token, a typed content object
//! ([`AccessTokenContent`], [`IdTokenContent`], [`RefreshTokenContent`]) is
//! built for the caller.

mod claims;
mod content;
mod decoded;

pub use claims::{ClaimKind, ClaimValue, normalize_scopes, string_list};
pub use content::{AccessTokenContent, IdTokenContent, RefreshTokenContent, TokenType};
pub use decoded::DecodedJwt;
