//! Shared key material and token builders for integration tests.

#![allow(dead_code)]

use std::sync::OnceLock;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use elliptic_curve::sec1::ToEncodedPoint;
use p256::ecdsa::signature::Signer;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, Pss};
use serde_json::{Value, json};
use sha2::{Digest, Sha256, Sha384, Sha512};
use tokenward::crypto::SignatureAlgorithm;

pub struct TestKeys {
    pub rsa: rsa::RsaPrivateKey,
    pub p256: p256::ecdsa::SigningKey,
    pub p384: p384::ecdsa::SigningKey,
    pub p521: p521::ecdsa::SigningKey,
}

/// Deterministically shared key material; RSA generation is slow enough to
/// do once per test binary.
pub fn test_keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = rand::thread_rng();
        TestKeys {
            rsa: rsa::RsaPrivateKey::new(&mut rng, 2048).expect("RSA key generation"),
            p256: p256::ecdsa::SigningKey::random(&mut rng),
            p384: p384::ecdsa::SigningKey::random(&mut rng),
            p521: p521::ecdsa::SigningKey::random(&mut rng),
        }
    })
}

/// The `kid` the JWKS document assigns to keys of this algorithm's family.
pub fn kid_for(algorithm: SignatureAlgorithm) -> &'static str {
    use SignatureAlgorithm::*;
    match algorithm {
        Rs256 | Rs384 | Rs512 | Ps256 | Ps384 | Ps512 => "rsa-1",
        Es256 => "p256-1",
        Es384 => "p384-1",
        Es512 => "p521-1",
    }
}

/// A JWKS document carrying one key per supported family and curve.
pub fn jwks_document(keys: &TestKeys) -> Value {
    let rsa_public = keys.rsa.to_public_key();
    let p256_point = keys.p256.verifying_key().to_encoded_point(false);
    let p384_point = keys.p384.verifying_key().to_encoded_point(false);
    let p521_point = p521::ecdsa::VerifyingKey::from(&keys.p521).to_encoded_point(false);

    json!({
        "keys": [
            {
                "kty": "RSA",
                "kid": "rsa-1",
                "n": URL_SAFE_NO_PAD.encode(rsa_public.n().to_bytes_be()),
                "e": URL_SAFE_NO_PAD.encode(rsa_public.e().to_bytes_be()),
            },
            {
                "kty": "EC",
                "kid": "p256-1",
                "crv": "P-256",
                "x": URL_SAFE_NO_PAD.encode(p256_point.x().unwrap()),
                "y": URL_SAFE_NO_PAD.encode(p256_point.y().unwrap()),
            },
            {
                "kty": "EC",
                "kid": "p384-1",
                "crv": "P-384",
                "x": URL_SAFE_NO_PAD.encode(p384_point.x().unwrap()),
                "y": URL_SAFE_NO_PAD.encode(p384_point.y().unwrap()),
            },
            {
                "kty": "EC",
                "kid": "p521-1",
                "crv": "P-521",
                "x": URL_SAFE_NO_PAD.encode(p521_point.x().unwrap()),
                "y": URL_SAFE_NO_PAD.encode(p521_point.y().unwrap()),
            },
        ]
    })
}

/// Signs `payload` with the family key matching `algorithm`.
pub fn sign_token(
    keys: &TestKeys,
    algorithm: SignatureAlgorithm,
    kid: &str,
    payload: &Value,
) -> String {
    let header = URL_SAFE_NO_PAD
        .encode(serde_json::to_vec(&json!({"alg": algorithm.name(), "kid": kid})).unwrap());
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    let signing_input = format!("{header}.{body}");
    let signature = sign_bytes(keys, algorithm, signing_input.as_bytes());
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
}

fn sign_bytes(keys: &TestKeys, algorithm: SignatureAlgorithm, message: &[u8]) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    match algorithm {
        SignatureAlgorithm::Rs256 => keys
            .rsa
            .sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(message))
            .unwrap(),
        SignatureAlgorithm::Rs384 => keys
            .rsa
            .sign(Pkcs1v15Sign::new::<Sha384>(), &Sha384::digest(message))
            .unwrap(),
        SignatureAlgorithm::Rs512 => keys
            .rsa
            .sign(Pkcs1v15Sign::new::<Sha512>(), &Sha512::digest(message))
            .unwrap(),
        SignatureAlgorithm::Ps256 => keys
            .rsa
            .sign_with_rng(&mut rng, Pss::new::<Sha256>(), &Sha256::digest(message))
            .unwrap(),
        SignatureAlgorithm::Ps384 => keys
            .rsa
            .sign_with_rng(&mut rng, Pss::new::<Sha384>(), &Sha384::digest(message))
            .unwrap(),
        SignatureAlgorithm::Ps512 => keys
            .rsa
            .sign_with_rng(&mut rng, Pss::new::<Sha512>(), &Sha512::digest(message))
            .unwrap(),
        SignatureAlgorithm::Es256 => {
            let signature: p256::ecdsa::Signature = keys.p256.sign(message);
            signature.to_bytes().to_vec()
        }
        SignatureAlgorithm::Es384 => {
            let signature: p384::ecdsa::Signature = keys.p384.sign(message);
            signature.to_bytes().to_vec()
        }
        SignatureAlgorithm::Es512 => {
            let signature: p521::ecdsa::Signature = keys.p521.sign(message);
            signature.to_bytes().to_vec()
        }
    }
}
