//! Public key material parsed from JWK entries.

use rsa::BigUint;

use super::algorithm::{EcCurve, KeyFamily};

/// A verification key parsed from a JWK.
///
/// The variants carry ready-to-use verifying keys so that no further parsing
/// happens on the validation hot path.
#[derive(Clone)]
pub enum PublicKey {
    /// An RSA public key (accepts `RS*` and `PS*`).
    Rsa(rsa::RsaPublicKey),
    /// A P-256 key (accepts `ES256`).
    P256(p256::ecdsa::VerifyingKey),
    /// A P-384 key (accepts `ES384`).
    P384(p384::ecdsa::VerifyingKey),
    /// A P-521 key (accepts `ES512`).
    P521(p521::ecdsa::VerifyingKey),
}

/// Errors from converting JWK components into a verification key.
#[derive(Debug, thiserror::Error)]
pub enum KeyParseError {
    /// The RSA modulus/exponent pair was rejected.
    #[error("Invalid RSA key components: {0}")]
    InvalidRsaComponents(String),

    /// The EC point is not on the declared curve or is malformed.
    #[error("Invalid EC point for curve {curve}: {detail}")]
    InvalidEcPoint {
        /// The declared curve.
        curve: &'static str,
        /// What was wrong with the point.
        detail: String,
    },

    /// A coordinate is longer than the curve's field element size.
    #[error("EC coordinate length {len} exceeds field size {field_len}")]
    CoordinateTooLong {
        /// The decoded coordinate length.
        len: usize,
        /// The curve field element size.
        field_len: usize,
    },
}

// Key material stays out of Debug output (and logs).
impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Rsa(_) => "Rsa",
            Self::P256(_) => "P256",
            Self::P384(_) => "P384",
            Self::P521(_) => "P521",
        };
        f.debug_struct("PublicKey").field("kind", &name).finish()
    }
}

impl PublicKey {
    /// Builds an RSA key from big-endian modulus and exponent bytes
    /// (the decoded `n` and `e` JWK members).
    pub fn from_rsa_components(n: &[u8], e: &[u8]) -> Result<Self, KeyParseError> {
        let n = BigUint::from_bytes_be(n);
        let e = BigUint::from_bytes_be(e);
        let key = rsa::RsaPublicKey::new(n, e)
            .map_err(|e| KeyParseError::InvalidRsaComponents(e.to_string()))?;
        Ok(Self::Rsa(key))
    }

    /// Builds an EC key from big-endian affine coordinates (the decoded
    /// `x` and `y` JWK members) on the given curve.
    pub fn from_ec_point(curve: EcCurve, x: &[u8], y: &[u8]) -> Result<Self, KeyParseError> {
        let field_len = curve.field_len();
        let mut sec1 = Vec::with_capacity(1 + field_len * 2);
        sec1.push(0x04);
        push_padded(&mut sec1, x, field_len)?;
        push_padded(&mut sec1, y, field_len)?;

        let invalid = |e: &dyn std::fmt::Display| KeyParseError::InvalidEcPoint {
            curve: curve.crv(),
            detail: e.to_string(),
        };

        match curve {
            EcCurve::P256 => p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
                .map(Self::P256)
                .map_err(|e| invalid(&e)),
            EcCurve::P384 => p384::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
                .map(Self::P384)
                .map_err(|e| invalid(&e)),
            EcCurve::P521 => p521::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
                .map(Self::P521)
                .map_err(|e| invalid(&e)),
        }
    }

    /// Returns the key family of this key.
    #[must_use]
    pub fn family(&self) -> KeyFamily {
        match self {
            Self::Rsa(_) => KeyFamily::Rsa,
            Self::P256(_) | Self::P384(_) | Self::P521(_) => KeyFamily::EllipticCurve,
        }
    }

    /// Returns the curve for EC keys, `None` for RSA keys.
    #[must_use]
    pub fn curve(&self) -> Option<EcCurve> {
        match self {
            Self::Rsa(_) => None,
            Self::P256(_) => Some(EcCurve::P256),
            Self::P384(_) => Some(EcCurve::P384),
            Self::P521(_) => Some(EcCurve::P521),
        }
    }
}

/// Left-pads a big-endian coordinate to the field element size.
///
/// JWK coordinates are fixed-length per RFC 7518, but some issuers emit
/// values with stripped leading zero bytes.
fn push_padded(out: &mut Vec<u8>, coord: &[u8], field_len: usize) -> Result<(), KeyParseError> {
    if coord.len() > field_len {
        return Err(KeyParseError::CoordinateTooLong {
            len: coord.len(),
            field_len,
        });
    }
    out.extend(std::iter::repeat_n(0u8, field_len - coord.len()));
    out.extend_from_slice(coord);
    Ok(())
}
