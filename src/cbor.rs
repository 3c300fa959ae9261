//! CBOR value helpers.
//!
//! Authenticators produce a small CBOR profile: integers, byte and text
//! strings, arrays, maps keyed by integers or text, and simple values,
//! with indefinite-length encodings permitted. Decoding is delegated to
//! `ciborium`; this module adds the value-level navigation the parsers
//! and attestation verifiers share.

use ciborium::value::Value;

use crate::errors::WebAuthnError;

/// Decode a single CBOR item occupying the whole input.
pub(crate) fn decode(bytes: &[u8]) -> Result<Value, WebAuthnError> {
    let mut rest = bytes;
    let value: Value =
        ciborium::de::from_reader(&mut rest).map_err(|_| WebAuthnError::InvalidCbor)?;
    if !rest.is_empty() {
        return Err(WebAuthnError::InvalidCbor);
    }
    Ok(value)
}

/// Decode a single CBOR item from the front of `bytes`, returning the
/// unconsumed tail. Used where a CBOR structure is embedded in a binary
/// layout (the COSE key and extensions inside authenticator data).
pub(crate) fn decode_prefix(bytes: &[u8]) -> Result<(Value, &[u8]), WebAuthnError> {
    let mut rest = bytes;
    let value: Value =
        ciborium::de::from_reader(&mut rest).map_err(|_| WebAuthnError::InvalidCbor)?;
    Ok((value, rest))
}

/// View a value as map entries.
pub(crate) fn as_map(value: &Value) -> Result<&Vec<(Value, Value)>, WebAuthnError> {
    value.as_map().ok_or(WebAuthnError::InvalidCbor)
}

/// Look up a text-keyed entry in a CBOR map.
pub(crate) fn text_entry<'a>(entries: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|(k, _)| k.as_text() == Some(key))
        .map(|(_, v)| v)
}

/// Look up an integer-keyed entry in a CBOR map (COSE labels).
pub(crate) fn int_entry(entries: &[(Value, Value)], label: i128) -> Option<&Value> {
    entries
        .iter()
        .find(|(k, _)| k.as_integer().map(i128::from) == Some(label))
        .map(|(_, v)| v)
}

pub(crate) fn as_bytes(value: &Value) -> Result<&[u8], WebAuthnError> {
    value
        .as_bytes()
        .map(Vec::as_slice)
        .ok_or(WebAuthnError::InvalidCbor)
}

pub(crate) fn as_text(value: &Value) -> Result<&str, WebAuthnError> {
    value.as_text().ok_or(WebAuthnError::InvalidCbor)
}

pub(crate) fn as_int(value: &Value) -> Result<i128, WebAuthnError> {
    value
        .as_integer()
        .map(i128::from)
        .ok_or(WebAuthnError::InvalidCbor)
}
