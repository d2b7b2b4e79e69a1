//! Typed claim values.

use std::collections::BTreeSet;

use serde_json::Value;

/// The typed interpretation of a claim.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimKind {
    /// A JSON string.
    String(String),
    /// A JSON array of strings.
    StringList(Vec<String>),
    /// A JSON number.
    Number(serde_json::Number),
    /// A JSON boolean.
    Boolean(bool),
}

/// A claim value carrying both its typed interpretation and the original
/// raw JSON it was derived from, preserving provenance for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimValue {
    raw: Value,
    kind: ClaimKind,
}

impl ClaimValue {
    /// Classifies a JSON value into a typed claim.
    ///
    /// Returns `None` for `null`, nested objects, and arrays containing
    /// non-string elements; those have no claim-level interpretation here.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let kind = match value {
            Value::String(s) => ClaimKind::String(s.clone()),
            Value::Number(n) => ClaimKind::Number(n.clone()),
            Value::Bool(b) => ClaimKind::Boolean(*b),
            Value::Array(items) => {
                let strings: Option<Vec<String>> = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect();
                ClaimKind::StringList(strings?)
            }
            Value::Null | Value::Object(_) => return None,
        };
        Some(Self {
            raw: value.clone(),
            kind,
        })
    }

    /// The original raw JSON representation.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The typed interpretation.
    #[must_use]
    pub fn kind(&self) -> &ClaimKind {
        &self.kind
    }

    /// The string value, if this claim is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ClaimKind::String(s) => Some(s),
            _ => None,
        }
    }

    /// The list value, if this claim is a string list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match &self.kind {
            ClaimKind::StringList(items) => Some(items),
            _ => None,
        }
    }

    /// The integer value, if this claim is an integral number.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match &self.kind {
            ClaimKind::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// The boolean value, if this claim is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match &self.kind {
            ClaimKind::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Normalizes a `scope` claim into a sorted set.
///
/// OAuth providers emit scopes either as one space-separated string
/// (`"read write"`) or as a JSON array (`["read", "write"]`); both forms
/// normalize to the identical set.
#[must_use]
pub fn normalize_scopes(value: &Value) -> BTreeSet<String> {
    match value {
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// Interprets a claim as a list of strings, accepting both the single-string
/// and the array form (the `aud` claim allows both per RFC 7519).
#[must_use]
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
