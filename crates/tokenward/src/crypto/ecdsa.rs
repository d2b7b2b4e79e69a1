//! ECDSA signature format conversion.
//!
//! JWS transports ECDSA signatures as the raw concatenation `r || s` with
//! both halves zero-padded to the curve's field size (IEEE P1363). The
//! verification APIs consume ASN.1 DER (`SEQUENCE { INTEGER r, INTEGER s }`).
//! This module converts between the two representations as pure functions
//! with strict structural validation; it never evaluates the signature
//! cryptographically.

use super::algorithm::EcCurve;

/// Errors from converting between ECDSA signature encodings.
#[derive(Debug, thiserror::Error)]
pub enum EcdsaFormatError {
    /// The raw signature length does not match the curve.
    #[error("Raw signature length {actual} does not match curve {curve} (expected {expected})")]
    InvalidRawLength {
        /// The declared curve name.
        curve: &'static str,
        /// Expected raw length for the curve.
        expected: usize,
        /// The length that was supplied.
        actual: usize,
    },

    /// The DER structure is malformed.
    #[error("Malformed DER signature: {0}")]
    MalformedDer(&'static str),

    /// A decoded integer does not fit the curve's field size.
    #[error("Signature integer of {len} bytes exceeds field size {field_len}")]
    IntegerTooLarge {
        /// Byte length of the decoded integer.
        len: usize,
        /// Field element size of the curve.
        field_len: usize,
    },
}

/// Converts a raw `r || s` signature into ASN.1 DER.
///
/// The input length must be exactly twice the curve's field size. The output
/// uses minimal integer encodings as DER requires.
pub fn raw_to_der(raw: &[u8], curve: EcCurve) -> Result<Vec<u8>, EcdsaFormatError> {
    let expected = curve.raw_signature_len();
    if raw.len() != expected {
        return Err(EcdsaFormatError::InvalidRawLength {
            curve: curve.crv(),
            expected,
            actual: raw.len(),
        });
    }

    let field_len = curve.field_len();
    let (r, s) = raw.split_at(field_len);

    let mut body = Vec::with_capacity(expected + 8);
    encode_integer(&mut body, r);
    encode_integer(&mut body, s);

    let mut der = Vec::with_capacity(body.len() + 3);
    der.push(0x30);
    if body.len() < 0x80 {
        der.push(body.len() as u8);
    } else {
        // P-521 signatures exceed the short-form length limit.
        der.push(0x81);
        der.push(body.len() as u8);
    }
    der.extend_from_slice(&body);
    Ok(der)
}

/// Converts an ASN.1 DER signature into the raw `r || s` encoding for the
/// given curve, zero-padding both halves to the field size.
pub fn der_to_raw(der: &[u8], curve: EcCurve) -> Result<Vec<u8>, EcdsaFormatError> {
    let mut cursor = Cursor { bytes: der, pos: 0 };

    if cursor.take_byte()? != 0x30 {
        return Err(EcdsaFormatError::MalformedDer("expected SEQUENCE tag"));
    }
    let body_len = cursor.take_length()?;
    if cursor.remaining() != body_len {
        return Err(EcdsaFormatError::MalformedDer(
            "sequence length does not match content",
        ));
    }

    let field_len = curve.field_len();
    let mut raw = vec![0u8; field_len * 2];
    let r = cursor.take_integer()?;
    let s = cursor.take_integer()?;
    if cursor.remaining() != 0 {
        return Err(EcdsaFormatError::MalformedDer("trailing data after s"));
    }

    let (r_half, s_half) = raw.split_at_mut(field_len);
    for (value, half) in [(r, r_half), (s, s_half)] {
        if value.len() > field_len {
            return Err(EcdsaFormatError::IntegerTooLarge {
                len: value.len(),
                field_len,
            });
        }
        half[field_len - value.len()..].copy_from_slice(value);
    }
    Ok(raw)
}

/// Appends a DER INTEGER holding the unsigned big-endian `value`.
fn encode_integer(out: &mut Vec<u8>, value: &[u8]) {
    let stripped = strip_leading_zeros(value);
    // High bit set would flip the sign; prepend a zero byte.
    let needs_pad = stripped.first().is_none_or(|&b| b & 0x80 != 0);

    out.push(0x02);
    if stripped.is_empty() {
        // INTEGER 0 is encoded as a single zero byte.
        out.push(0x01);
        out.push(0x00);
        return;
    }
    out.push((stripped.len() + usize::from(needs_pad)) as u8);
    if needs_pad {
        out.push(0x00);
    }
    out.extend_from_slice(stripped);
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take_byte(&mut self) -> Result<u8, EcdsaFormatError> {
        let byte = self
            .bytes
            .get(self.pos)
            .copied()
            .ok_or(EcdsaFormatError::MalformedDer("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn take_slice(&mut self, len: usize) -> Result<&'a [u8], EcdsaFormatError> {
        if self.remaining() < len {
            return Err(EcdsaFormatError::MalformedDer("unexpected end of input"));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Reads a DER length. Signatures never need more than one length byte
    /// beyond the short form, so anything longer is rejected outright.
    fn take_length(&mut self) -> Result<usize, EcdsaFormatError> {
        let first = self.take_byte()?;
        match first {
            len if len < 0x80 => Ok(len as usize),
            0x81 => {
                let len = self.take_byte()?;
                if len < 0x80 {
                    return Err(EcdsaFormatError::MalformedDer("non-minimal length"));
                }
                Ok(len as usize)
            }
            _ => Err(EcdsaFormatError::MalformedDer("length too large")),
        }
    }

    /// Reads a DER INTEGER and returns its content with any single sign
    /// padding byte removed. Rejects negative and non-minimal encodings.
    fn take_integer(&mut self) -> Result<&'a [u8], EcdsaFormatError> {
        if self.take_byte()? != 0x02 {
            return Err(EcdsaFormatError::MalformedDer("expected INTEGER tag"));
        }
        let len = self.take_length()?;
        if len == 0 {
            return Err(EcdsaFormatError::MalformedDer("empty integer"));
        }
        let content = self.take_slice(len)?;
        if content[0] & 0x80 != 0 {
            return Err(EcdsaFormatError::MalformedDer("negative integer"));
        }
        if content[0] == 0x00 && content.len() > 1 {
            if content[1] & 0x80 == 0 {
                return Err(EcdsaFormatError::MalformedDer("non-minimal integer"));
            }
            return Ok(&content[1..]);
        }
        Ok(content)
    }
}
