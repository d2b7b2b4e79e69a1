//! Supported JOSE signature algorithms.

use std::fmt;
use std::str::FromStr;

/// A supported JWS signature algorithm.
///
/// The set is closed over the asymmetric algorithms this crate verifies:
/// RSA PKCS#1 v1.5 (`RS*`), ECDSA (`ES*`), and RSA-PSS (`PS*`), each with
/// SHA-256/384/512. Symmetric algorithms (`HS*`) and `none` are rejected at
/// parse time, never silently re-interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256.
    Rs256,
    /// RSASSA-PKCS1-v1_5 using SHA-384.
    Rs384,
    /// RSASSA-PKCS1-v1_5 using SHA-512.
    Rs512,
    /// ECDSA using P-256 and SHA-256.
    Es256,
    /// ECDSA using P-384 and SHA-384.
    Es384,
    /// ECDSA using P-521 and SHA-512.
    Es512,
    /// RSASSA-PSS using SHA-256, salt length 32.
    Ps256,
    /// RSASSA-PSS using SHA-384, salt length 48.
    Ps384,
    /// RSASSA-PSS using SHA-512, salt length 64.
    Ps512,
}

/// The key family an algorithm requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    /// RSA keys; accept `RS*` and `PS*` algorithms.
    Rsa,
    /// Elliptic-curve keys; accept `ES*` algorithms on the matching curve.
    EllipticCurve,
}

/// NIST curves supported for ECDSA verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    /// P-256 (secp256r1).
    P256,
    /// P-384 (secp384r1).
    P384,
    /// P-521 (secp521r1).
    P521,
}

impl SignatureAlgorithm {
    /// All supported algorithms.
    pub const ALL: [SignatureAlgorithm; 9] = [
        SignatureAlgorithm::Rs256,
        SignatureAlgorithm::Rs384,
        SignatureAlgorithm::Rs512,
        SignatureAlgorithm::Es256,
        SignatureAlgorithm::Es384,
        SignatureAlgorithm::Es512,
        SignatureAlgorithm::Ps256,
        SignatureAlgorithm::Ps384,
        SignatureAlgorithm::Ps512,
    ];

    /// Parses a JOSE `alg` value. Returns `None` for anything outside the
    /// supported set, including `HS*` and `none`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "RS256" => Some(Self::Rs256),
            "RS384" => Some(Self::Rs384),
            "RS512" => Some(Self::Rs512),
            "ES256" => Some(Self::Es256),
            "ES384" => Some(Self::Es384),
            "ES512" => Some(Self::Es512),
            "PS256" => Some(Self::Ps256),
            "PS384" => Some(Self::Ps384),
            "PS512" => Some(Self::Ps512),
            _ => None,
        }
    }

    /// Returns the JOSE `alg` name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
            Self::Es256 => "ES256",
            Self::Es384 => "ES384",
            Self::Es512 => "ES512",
            Self::Ps256 => "PS256",
            Self::Ps384 => "PS384",
            Self::Ps512 => "PS512",
        }
    }

    /// Returns the key family this algorithm verifies against.
    #[must_use]
    pub fn key_family(self) -> KeyFamily {
        match self {
            Self::Rs256 | Self::Rs384 | Self::Rs512 | Self::Ps256 | Self::Ps384 | Self::Ps512 => {
                KeyFamily::Rsa
            }
            Self::Es256 | Self::Es384 | Self::Es512 => KeyFamily::EllipticCurve,
        }
    }

    /// Returns the curve for ECDSA algorithms, `None` for RSA families.
    #[must_use]
    pub fn curve(self) -> Option<EcCurve> {
        match self {
            Self::Es256 => Some(EcCurve::P256),
            Self::Es384 => Some(EcCurve::P384),
            Self::Es512 => Some(EcCurve::P521),
            _ => None,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}

/// The `alg` value named an algorithm outside the supported set.
#[derive(Debug, thiserror::Error)]
#[error("Unknown signature algorithm: {0}")]
pub struct UnknownAlgorithm(pub String);

impl EcCurve {
    /// Parses a JWK `crv` value.
    #[must_use]
    pub fn from_crv(crv: &str) -> Option<Self> {
        match crv {
            "P-256" => Some(Self::P256),
            "P-384" => Some(Self::P384),
            "P-521" => Some(Self::P521),
            _ => None,
        }
    }

    /// Returns the JWK `crv` name.
    #[must_use]
    pub fn crv(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Byte length of one field element (and of each half of a raw
    /// signature) on this curve.
    #[must_use]
    pub fn field_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// Byte length of a raw `r || s` signature on this curve.
    #[must_use]
    pub fn raw_signature_len(self) -> usize {
        self.field_len() * 2
    }

    /// The default signing algorithm for keys on this curve.
    #[must_use]
    pub fn default_algorithm(self) -> SignatureAlgorithm {
        match self {
            Self::P256 => SignatureAlgorithm::Es256,
            Self::P384 => SignatureAlgorithm::Es384,
            Self::P521 => SignatureAlgorithm::Es512,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for alg in SignatureAlgorithm::ALL {
            assert_eq!(SignatureAlgorithm::from_name(alg.name()), Some(alg));
            assert_eq!(alg.name().parse::<SignatureAlgorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn test_rejects_unsupported_names() {
        for name in ["HS256", "HS384", "HS512", "none", "EdDSA", "RS128", ""] {
            assert_eq!(SignatureAlgorithm::from_name(name), None, "name: {name}");
        }
    }

    #[test]
    fn test_key_family_assignment() {
        assert_eq!(SignatureAlgorithm::Rs384.key_family(), KeyFamily::Rsa);
        assert_eq!(SignatureAlgorithm::Ps512.key_family(), KeyFamily::Rsa);
        assert_eq!(
            SignatureAlgorithm::Es256.key_family(),
            KeyFamily::EllipticCurve
        );
    }

    #[test]
    fn test_curve_properties() {
        assert_eq!(SignatureAlgorithm::Es256.curve(), Some(EcCurve::P256));
        assert_eq!(SignatureAlgorithm::Es512.curve(), Some(EcCurve::P521));
        assert_eq!(SignatureAlgorithm::Rs256.curve(), None);

        assert_eq!(EcCurve::P256.raw_signature_len(), 64);
        assert_eq!(EcCurve::P384.raw_signature_len(), 96);
        assert_eq!(EcCurve::P521.raw_signature_len(), 132);

        assert_eq!(EcCurve::from_crv("P-384"), Some(EcCurve::P384));
        assert_eq!(EcCurve::from_crv("secp256k1"), None);
        assert_eq!(
            EcCurve::P521.default_algorithm(),
            SignatureAlgorithm::Es512
        );
    }
}
