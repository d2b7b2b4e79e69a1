//! Structural decoding of the JWT wire format.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};

use crate::error::TokenValidationError;
use crate::issuer::ParserConfig;

/// A decoded JWT, immutable once constructed.
///
/// Decoding is purely structural: Base64URL segment decoding, JSON parsing,
/// and size enforcement. No signature or claim semantics are evaluated here.
#[derive(Debug, Clone)]
pub struct DecodedJwt {
    raw: String,
    header: Map<String, Value>,
    payload: Map<String, Value>,
    signature: Vec<u8>,
    /// Length of `header.payload` within `raw`; the signing input.
    signing_input_len: usize,
}

impl DecodedJwt {
    /// Decodes a raw token string, enforcing the parser size limits.
    ///
    /// # Errors
    ///
    /// Returns [`TokenValidationError::TokenFormat`] for structural and size
    /// violations and [`TokenValidationError::JsonParse`] when a segment is
    /// not a JSON object.
    pub fn decode(raw: &str, limits: &ParserConfig) -> Result<Self, TokenValidationError> {
        if raw.is_empty() {
            return Err(TokenValidationError::TokenFormat("token is empty".into()));
        }
        if raw.len() > limits.max_token_size {
            return Err(TokenValidationError::TokenFormat(format!(
                "token size {} exceeds maximum {}",
                raw.len(),
                limits.max_token_size
            )));
        }

        let mut segments = raw.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenValidationError::TokenFormat(
                "expected three dot-separated segments".into(),
            ));
        };

        let header_bytes = decode_segment(header_b64, "header")?;
        let payload_bytes = decode_segment(payload_b64, "payload")?;
        let signature = decode_segment(signature_b64, "signature")?;

        if payload_bytes.len() > limits.max_payload_size {
            return Err(TokenValidationError::TokenFormat(format!(
                "decoded payload size {} exceeds maximum {}",
                payload_bytes.len(),
                limits.max_payload_size
            )));
        }

        let header = parse_object(&header_bytes, "header")?;
        let payload = parse_object(&payload_bytes, "payload")?;

        Ok(Self {
            raw: raw.to_string(),
            header,
            payload,
            signature,
            signing_input_len: header_b64.len() + 1 + payload_b64.len(),
        })
    }

    /// The raw token string as received.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The decoded header object.
    #[must_use]
    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    /// The decoded payload object.
    #[must_use]
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// The decoded signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The bytes the signature covers: `base64url(header).base64url(payload)`.
    #[must_use]
    pub fn signing_input(&self) -> &[u8] {
        &self.raw.as_bytes()[..self.signing_input_len]
    }

    /// The `kid` header value, if present and a string.
    #[must_use]
    pub fn kid(&self) -> Option<&str> {
        self.header.get("kid").and_then(Value::as_str)
    }

    /// The `alg` header value, if present and a string.
    #[must_use]
    pub fn algorithm_name(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    /// The `iss` claim, if present and a string.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.payload.get("iss").and_then(Value::as_str)
    }

    /// Looks up a payload claim by name.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>, TokenValidationError> {
    URL_SAFE_NO_PAD.decode(segment).map_err(|_| {
        TokenValidationError::TokenFormat(format!("{what} is not valid Base64URL"))
    })
}

fn parse_object(bytes: &[u8], what: &str) -> Result<Map<String, Value>, TokenValidationError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TokenValidationError::JsonParse(format!(
            "{what} is not a JSON object"
        ))),
        Err(e) => Err(TokenValidationError::JsonParse(format!("{what}: {e}"))),
    }
}
