//! The `tpm` attestation statement format.
//!
//! <https://w3c.github.io/webauthn/#sctn-tpm-attestation>
//!
//! The statement shape is parsed in full so dispatch and error reporting
//! are stable, but the TPMS_ATTEST / TPMT_PUBLIC verification procedure is
//! not implemented yet; verification always reports the format as
//! unimplemented. When it lands, TPM chains are verified unconditionally
//! (the statement is meaningless without its AIK certificate chain).

use ciborium::value::Value;

use super::AttestationResult;
use crate::cbor;
use crate::constants::FORMAT_TPM;
use crate::cose::CoseAlgorithm;
use crate::errors::WebAuthnError;

#[derive(Debug)]
#[allow(dead_code)]
pub(crate) struct TpmStatement {
    /// TPM specification version; only "2.0" exists on the wire.
    pub ver: String,
    pub alg: CoseAlgorithm,
    pub sig: Vec<u8>,
    /// TPMS_ATTEST structure the signature covers.
    pub cert_info: Vec<u8>,
    /// TPMT_PUBLIC representation of the credential public key.
    pub pub_area: Vec<u8>,
    /// AIK certificate chain, leaf first.
    pub x5c: Vec<Vec<u8>>,
}

fn malformed() -> WebAuthnError {
    WebAuthnError::AttestationStatementMalformed(FORMAT_TPM)
}

pub(crate) fn parse(att_stmt: &Value) -> Result<TpmStatement, WebAuthnError> {
    let entries = cbor::as_map(att_stmt).map_err(|_| malformed())?;

    let text = |key: &str| {
        cbor::text_entry(entries, key)
            .ok_or_else(malformed)
            .and_then(|v| cbor::as_text(v).map_err(|_| malformed()))
    };
    let bytes = |key: &str| {
        cbor::text_entry(entries, key)
            .ok_or_else(malformed)
            .and_then(|v| cbor::as_bytes(v).map_err(|_| malformed()))
    };

    let ver = text("ver")?.to_string();
    if ver != "2.0" {
        return Err(malformed());
    }

    let alg_id = cbor::text_entry(entries, "alg")
        .ok_or_else(malformed)
        .and_then(|v| cbor::as_int(v).map_err(|_| malformed()))?;
    let alg = CoseAlgorithm::from_id(alg_id)
        .ok_or(WebAuthnError::AttestationInvalidPublicKeyAlgorithm(FORMAT_TPM))?;

    let x5c = cbor::text_entry(entries, "x5c")
        .ok_or_else(malformed)?
        .as_array()
        .ok_or_else(malformed)?
        .iter()
        .map(|cert| cbor::as_bytes(cert).map(<[u8]>::to_vec).map_err(|_| malformed()))
        .collect::<Result<Vec<_>, _>>()?;
    if x5c.is_empty() {
        return Err(malformed());
    }

    Ok(TpmStatement {
        ver,
        alg,
        sig: bytes("sig")?.to_vec(),
        cert_info: bytes("certInfo")?.to_vec(),
        pub_area: bytes("pubArea")?.to_vec(),
        x5c,
    })
}

impl TpmStatement {
    pub(crate) fn verify(&self) -> Result<AttestationResult, WebAuthnError> {
        Err(WebAuthnError::AttestationUnimplemented(FORMAT_TPM))
    }
}
