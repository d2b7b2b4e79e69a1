//! Signature verification engine.
//!
//! This module models the supported JOSE signature algorithms as a closed
//! tagged variant, resolves the verification parameters per algorithm once
//! at startup ([`SignatureTemplateManager`]), and converts ECDSA signatures
//! between the raw JOSE encoding and ASN.1 DER ([`ecdsa`]).

pub mod algorithm;
pub mod ecdsa;
pub mod key;
pub mod template;

pub use algorithm::{EcCurve, KeyFamily, SignatureAlgorithm};
pub use key::{KeyParseError, PublicKey};
pub use template::{SignatureError, SignatureTemplateManager};
