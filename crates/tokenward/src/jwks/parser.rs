//! Structural validation of JWKS documents.
//!
//! The parser is the first line of defense against hostile key endpoints:
//! it enforces hard ceilings on document size, top-level property count,
//! and key-set size before any key material is touched. A document that
//! violates a structural limit is rejected wholesale with zero keys
//! extracted.

use serde_json::{Map, Value};

/// Maximum number of top-level properties in a JWKS document.
pub const MAX_TOP_LEVEL_PROPERTIES: usize = 10;

/// Maximum number of keys in one key set.
pub const MAX_KEYS: usize = 50;

/// A structural violation of the JWKS document.
#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    /// The raw document exceeds the configured byte ceiling.
    #[error("JWKS document of {size} bytes exceeds maximum {max}")]
    DocumentTooLarge {
        /// Size of the rejected document.
        size: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// The document is not valid JSON.
    #[error("JWKS document is not valid JSON: {0}")]
    Json(String),

    /// The document root is not a JSON object.
    #[error("JWKS document must be a JSON object")]
    NotAnObject,

    /// The document has too many top-level properties.
    #[error("JWKS document has {0} top-level properties (maximum 10)")]
    TooManyProperties(usize),

    /// The `keys` member is present but not an array.
    #[error("JWKS 'keys' member must be an array")]
    KeysNotAnArray,

    /// The key set is empty.
    #[error("JWKS key set is empty")]
    EmptyKeySet,

    /// The key set is larger than the cap.
    #[error("JWKS key set has {0} keys (maximum 50)")]
    TooManyKeys(usize),

    /// Neither a `keys` array nor a bare key object.
    #[error("JWKS document is neither a key set nor a bare key")]
    NotAKey,
}

/// Parses raw JWKS bytes into individual key objects.
#[derive(Debug, Clone, Copy)]
pub struct JwksParser {
    max_document_size: usize,
}

impl JwksParser {
    #[must_use]
    pub fn new(max_document_size: usize) -> Self {
        Self { max_document_size }
    }

    /// Parses a JWKS document into its raw key objects.
    ///
    /// Accepts either a `{"keys":[...]}` key set or a single bare key
    /// object. Non-object entries inside a structurally valid `keys` array
    /// are skipped with a warning; structural violations reject the whole
    /// document.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError`] when the document breaches a structural limit
    /// or is not valid JSON.
    pub fn parse(&self, content: &[u8]) -> Result<Vec<Map<String, Value>>, JwksError> {
        if content.len() > self.max_document_size {
            return Err(JwksError::DocumentTooLarge {
                size: content.len(),
                max: self.max_document_size,
            });
        }

        let root: Value =
            serde_json::from_slice(content).map_err(|e| JwksError::Json(e.to_string()))?;
        let Value::Object(root) = root else {
            return Err(JwksError::NotAnObject);
        };

        if root.len() > MAX_TOP_LEVEL_PROPERTIES {
            return Err(JwksError::TooManyProperties(root.len()));
        }

        match root.get("keys") {
            Some(Value::Array(keys)) => {
                if keys.is_empty() {
                    return Err(JwksError::EmptyKeySet);
                }
                if keys.len() > MAX_KEYS {
                    return Err(JwksError::TooManyKeys(keys.len()));
                }

                let mut raw_keys = Vec::with_capacity(keys.len());
                for key in keys {
                    if let Value::Object(key) = key {
                        raw_keys.push(key.clone());
                    } else {
                        tracing::warn!("Skipping non-object entry in JWKS key array");
                    }
                }
                Ok(raw_keys)
            }
            Some(_) => Err(JwksError::KeysNotAnArray),
            // A bare key object is accepted when it at least names a key type.
            None if root.contains_key("kty") => Ok(vec![root]),
            None => Err(JwksError::NotAKey),
        }
    }
}
