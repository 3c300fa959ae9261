//! COSE public keys and signature verification.
//!
//! Credential public keys arrive as CBOR maps with small-integer labels
//! (RFC 8152). The recognised algorithms are ECDSA P-256 with SHA-256
//! (ES256), RSASSA-PKCS1-v1_5 with SHA-256 (RS256) and Ed25519 (EdDSA);
//! further algorithms can be added here without touching any caller. The
//! verification algorithm is always chosen from the key itself, never by
//! the peer.

use ring::signature::{self, UnparsedPublicKey};
use serde::{Deserialize, Serialize};

use crate::cbor;
use crate::constants::{
    COSE_ALG_EDDSA, COSE_ALG_ES256, COSE_ALG_RS256, COSE_COORDINATE_LENGTH, COSE_EC2_CURVE_P256,
    COSE_KEY_TYPE_EC2, COSE_KEY_TYPE_OKP, COSE_KEY_TYPE_RSA, COSE_OKP_CURVE_ED25519,
};
use crate::errors::WebAuthnError;

/// COSE algorithm identifiers this library understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoseAlgorithm {
    /// ECDSA on P-256 with SHA-256 (`-7`).
    Es256,
    /// Ed25519 (`-8`).
    EdDsa,
    /// RSASSA-PKCS1-v1_5 with SHA-256 (`-257`).
    Rs256,
}

impl CoseAlgorithm {
    /// The registered COSE identifier.
    pub fn id(self) -> i64 {
        match self {
            CoseAlgorithm::Es256 => COSE_ALG_ES256 as i64,
            CoseAlgorithm::EdDsa => COSE_ALG_EDDSA as i64,
            CoseAlgorithm::Rs256 => COSE_ALG_RS256 as i64,
        }
    }

    pub(crate) fn from_id(id: i128) -> Option<Self> {
        match id {
            COSE_ALG_ES256 => Some(CoseAlgorithm::Es256),
            COSE_ALG_EDDSA => Some(CoseAlgorithm::EdDsa),
            COSE_ALG_RS256 => Some(CoseAlgorithm::Rs256),
            _ => None,
        }
    }
}

/// A validated credential public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoseKey {
    /// P-256 point, ES256. Coordinates are exactly 32 bytes each.
    Ec2 { x: Vec<u8>, y: Vec<u8> },
    /// RSA modulus and public exponent, RS256.
    Rsa { n: Vec<u8>, e: Vec<u8> },
    /// Ed25519 public key, EdDSA. Exactly 32 bytes.
    Okp { x: Vec<u8> },
}

impl CoseKey {
    /// Convert a decoded CBOR map into a validated key.
    ///
    /// The stated `alg` must agree with the key type, and coordinate and
    /// component lengths are enforced here so the verifiers can assume
    /// well-formed keys.
    pub fn from_cbor(value: &ciborium::value::Value) -> Result<Self, WebAuthnError> {
        let entries = cbor::as_map(value).map_err(|_| WebAuthnError::InvalidCoseKey)?;

        let label = |l: i128| cbor::int_entry(entries, l).ok_or(WebAuthnError::InvalidCoseKey);
        let int_label = |l: i128| label(l).and_then(|v| cbor::as_int(v).map_err(|_| WebAuthnError::InvalidCoseKey));
        let bytes_label =
            |l: i128| label(l).and_then(|v| cbor::as_bytes(v).map_err(|_| WebAuthnError::InvalidCoseKey));

        let kty = int_label(1)?;
        let alg = int_label(3)?;

        match kty {
            COSE_KEY_TYPE_EC2 => {
                if alg != COSE_ALG_ES256 || int_label(-1)? != COSE_EC2_CURVE_P256 {
                    return Err(WebAuthnError::InvalidCoseKey);
                }
                let x = bytes_label(-2)?;
                let y = bytes_label(-3)?;
                if x.len() != COSE_COORDINATE_LENGTH || y.len() != COSE_COORDINATE_LENGTH {
                    return Err(WebAuthnError::InvalidCoseKey);
                }
                Ok(CoseKey::Ec2 {
                    x: x.to_vec(),
                    y: y.to_vec(),
                })
            }
            COSE_KEY_TYPE_RSA => {
                if alg != COSE_ALG_RS256 {
                    return Err(WebAuthnError::InvalidCoseKey);
                }
                let n = bytes_label(-1)?;
                let e = bytes_label(-2)?;
                if n.is_empty() || e.is_empty() {
                    return Err(WebAuthnError::InvalidCoseKey);
                }
                Ok(CoseKey::Rsa {
                    n: n.to_vec(),
                    e: e.to_vec(),
                })
            }
            COSE_KEY_TYPE_OKP => {
                if alg != COSE_ALG_EDDSA {
                    return Err(WebAuthnError::InvalidCoseKey);
                }
                // The curve label is optional in practice; when present it
                // must name Ed25519.
                if let Some(crv) = cbor::int_entry(entries, -1) {
                    if cbor::as_int(crv).map_err(|_| WebAuthnError::InvalidCoseKey)?
                        != COSE_OKP_CURVE_ED25519
                    {
                        return Err(WebAuthnError::InvalidCoseKey);
                    }
                }
                let x = bytes_label(-2)?;
                if x.len() != COSE_COORDINATE_LENGTH {
                    return Err(WebAuthnError::InvalidCoseKey);
                }
                Ok(CoseKey::Okp { x: x.to_vec() })
            }
            _ => Err(WebAuthnError::InvalidCoseKey),
        }
    }

    /// The algorithm implied by the key.
    pub fn algorithm(&self) -> CoseAlgorithm {
        match self {
            CoseKey::Ec2 { .. } => CoseAlgorithm::Es256,
            CoseKey::Rsa { .. } => CoseAlgorithm::Rs256,
            CoseKey::Okp { .. } => CoseAlgorithm::EdDsa,
        }
    }

    /// Verify `signature` over `message` under this key.
    ///
    /// EC signatures must be DER-encoded (`r`,`s` SEQUENCE); non-canonical
    /// encodings are rejected by the underlying verifier.
    pub fn verify_signature(&self, message: &[u8], sig: &[u8]) -> Result<(), WebAuthnError> {
        match self {
            CoseKey::Ec2 { .. } => {
                let point = self.ec_uncompressed_point()?;
                UnparsedPublicKey::new(&signature::ECDSA_P256_SHA256_ASN1, &point)
                    .verify(message, sig)
                    .map_err(|_| WebAuthnError::InvalidSignature)
            }
            CoseKey::Rsa { n, e } => {
                let der = rsa_public_key_der(n, e);
                UnparsedPublicKey::new(&signature::RSA_PKCS1_2048_8192_SHA256, &der)
                    .verify(message, sig)
                    .map_err(|_| WebAuthnError::InvalidSignature)
            }
            CoseKey::Okp { x } => UnparsedPublicKey::new(&signature::ED25519, x)
                .verify(message, sig)
                .map_err(|_| WebAuthnError::InvalidSignature),
        }
    }

    /// The raw ANSI X9.62 uncompressed point (`0x04 || x || y`).
    ///
    /// Only meaningful for EC keys; the U2F verification blob is built from
    /// this form.
    pub fn ec_uncompressed_point(&self) -> Result<Vec<u8>, WebAuthnError> {
        match self {
            CoseKey::Ec2 { x, y } => {
                let mut point = Vec::with_capacity(1 + x.len() + y.len());
                point.push(0x04);
                point.extend_from_slice(x);
                point.extend_from_slice(y);
                Ok(point)
            }
            _ => Err(WebAuthnError::InvalidCoseKey),
        }
    }
}

/// Encode `RSAPublicKey ::= SEQUENCE { modulus INTEGER, exponent INTEGER }`,
/// the form the RSA verifier consumes.
fn rsa_public_key_der(n: &[u8], e: &[u8]) -> Vec<u8> {
    let n_der = der_integer(n);
    let e_der = der_integer(e);
    let mut body = Vec::with_capacity(n_der.len() + e_der.len());
    body.extend_from_slice(&n_der);
    body.extend_from_slice(&e_der);

    let mut out = vec![0x30];
    der_length(&mut out, body.len());
    out.extend_from_slice(&body);
    out
}

/// DER-encode an unsigned big-endian integer: strip leading zeros, then
/// prefix a zero byte when the high bit would flip the sign.
fn der_integer(bytes: &[u8]) -> Vec<u8> {
    let stripped: &[u8] = {
        let mut s = bytes;
        while s.len() > 1 && s[0] == 0 {
            s = &s[1..];
        }
        s
    };
    let stripped = if stripped.is_empty() { &[0u8][..] } else { stripped };
    let pad = stripped[0] & 0x80 != 0;

    let mut out = vec![0x02];
    der_length(&mut out, stripped.len() + pad as usize);
    if pad {
        out.push(0x00);
    }
    out.extend_from_slice(stripped);
    out
}

fn der_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    }
}
