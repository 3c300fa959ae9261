//! Attestation statement verification.
//!
//! Each recognised statement format gets its own parsed variant and
//! verification procedure; a single dispatch function maps the `fmt` field
//! of the attestation object onto them. New formats are added by extending
//! [`AttestationStatement`], never through a runtime registry.

mod android_safetynet;
mod fido_u2f;
mod none;
mod packed;
mod tpm;

use std::sync::Arc;

use ciborium::value::Value;
use log::debug;
use openssl::hash::MessageDigest;
use openssl::sign::Verifier;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509StoreContext, X509};
use serde::{Deserialize, Serialize};

pub(crate) use android_safetynet::SafetynetStatement;
pub(crate) use fido_u2f::FidoU2fStatement;
pub(crate) use packed::PackedStatement;
pub(crate) use tpm::TpmStatement;

use crate::authenticator_data::AuthenticatorData;
use crate::cbor;
use crate::constants::{
    FORMAT_ANDROID_SAFETYNET, FORMAT_FIDO_U2F, FORMAT_NONE, FORMAT_PACKED, FORMAT_TPM,
};
use crate::cose::CoseAlgorithm;
use crate::errors::WebAuthnError;
use crate::metadata::{MetadataAttestationType, MetadataSource, MetadataStatement};

/// Policy-relevant classification of a verified attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttestationType {
    /// No identity claim was made (or requested).
    #[serde(rename = "none")]
    None,
    /// A model-wide attestation certificate vouched for the authenticator.
    #[serde(rename = "basic")]
    Basic,
    /// The credential key vouched for itself.
    #[serde(rename = "self")]
    Self_,
    /// A privacy CA vouched for the authenticator.
    #[serde(rename = "attca")]
    AttCa,
    /// The statement verified but no trust anchor classified it.
    #[serde(rename = "uncertain")]
    Uncertain,
}

impl AttestationType {
    /// Every type this library can produce; the default trust policy.
    pub fn full_set() -> Vec<AttestationType> {
        vec![
            AttestationType::None,
            AttestationType::Basic,
            AttestationType::Self_,
            AttestationType::AttCa,
            AttestationType::Uncertain,
        ]
    }
}

/// Outcome of a successful attestation statement verification.
#[derive(Debug, Clone)]
pub struct AttestationResult {
    pub attestation_type: AttestationType,
    /// DER certificates the verifier relied on, leaf first. Empty for
    /// `none` and self attestation.
    pub trust_path: Vec<Vec<u8>>,
    /// The metadata statement matched during trust-anchor resolution.
    pub metadata: Option<Arc<MetadataStatement>>,
}

/// The decoded outer attestation object: `{fmt, authData, attStmt}`.
#[derive(Debug)]
pub(crate) struct AttestationObject {
    pub fmt: String,
    pub auth_data: AuthenticatorData,
    pub att_stmt: Value,
}

impl AttestationObject {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, WebAuthnError> {
        let value = cbor::decode(bytes)?;
        let entries = cbor::as_map(&value)?;

        let fmt = cbor::text_entry(entries, "fmt")
            .ok_or(WebAuthnError::InvalidCbor)
            .and_then(cbor::as_text)?
            .to_string();
        let auth_data_bytes = cbor::text_entry(entries, "authData")
            .ok_or(WebAuthnError::InvalidCbor)
            .and_then(cbor::as_bytes)?;
        let att_stmt = cbor::text_entry(entries, "attStmt")
            .ok_or(WebAuthnError::InvalidCbor)?
            .clone();

        Ok(AttestationObject {
            fmt,
            auth_data: AuthenticatorData::parse(auth_data_bytes)?,
            att_stmt,
        })
    }
}

/// One parsed attestation statement per recognised format.
#[derive(Debug)]
pub(crate) enum AttestationStatement {
    None,
    Packed(PackedStatement),
    FidoU2f(FidoU2fStatement),
    AndroidSafetynet(SafetynetStatement),
    Tpm(TpmStatement),
}

impl AttestationStatement {
    /// Parse `att_stmt` according to `fmt`. Unknown formats fail here.
    pub(crate) fn parse(fmt: &str, att_stmt: &Value) -> Result<Self, WebAuthnError> {
        match fmt {
            FORMAT_NONE => none::parse(att_stmt).map(|()| AttestationStatement::None),
            FORMAT_PACKED => packed::parse(att_stmt).map(AttestationStatement::Packed),
            FORMAT_FIDO_U2F => fido_u2f::parse(att_stmt).map(AttestationStatement::FidoU2f),
            FORMAT_ANDROID_SAFETYNET => {
                android_safetynet::parse(att_stmt).map(AttestationStatement::AndroidSafetynet)
            }
            FORMAT_TPM => tpm::parse(att_stmt).map(AttestationStatement::Tpm),
            other => Err(WebAuthnError::UnsupportedAttestationFormat(
                other.to_string(),
            )),
        }
    }

    /// Run the format-specific verification procedure.
    pub(crate) fn verify(
        &self,
        auth_data: &AuthenticatorData,
        client_data_hash: &[u8],
        verify_trust_root: bool,
        metadata: &dyn MetadataSource,
    ) -> Result<AttestationResult, WebAuthnError> {
        match self {
            AttestationStatement::None => none::verify(),
            AttestationStatement::Packed(stmt) => {
                stmt.verify(auth_data, client_data_hash, verify_trust_root, metadata)
            }
            AttestationStatement::FidoU2f(stmt) => {
                stmt.verify(auth_data, client_data_hash, verify_trust_root, metadata)
            }
            AttestationStatement::AndroidSafetynet(stmt) => {
                stmt.verify(auth_data, client_data_hash)
            }
            AttestationStatement::Tpm(stmt) => stmt.verify(),
        }
    }
}

/// Map a metadata statement onto the attestation type it certifies.
///
/// `basic_full` and `attca` are treated as mutually exclusive per
/// authenticator model; when a statement lists both, `basic_full` wins.
/// No statement, or a statement certifying neither, is `Uncertain`.
pub(crate) fn type_from_metadata(metadata: Option<&Arc<MetadataStatement>>) -> AttestationType {
    match metadata {
        Some(statement) if statement.certifies(MetadataAttestationType::BasicFull) => {
            AttestationType::Basic
        }
        Some(statement) if statement.certifies(MetadataAttestationType::AttCa) => {
            AttestationType::AttCa
        }
        _ => AttestationType::Uncertain,
    }
}

/// Verify `sig` over `message` with the public key of a DER certificate,
/// using the digest implied by the COSE algorithm.
pub(crate) fn verify_certificate_signature(
    fmt: &'static str,
    alg: CoseAlgorithm,
    cert_der: &[u8],
    message: &[u8],
    sig: &[u8],
) -> Result<(), WebAuthnError> {
    let cert =
        X509::from_der(cert_der).map_err(|_| WebAuthnError::AttestationInvalidCertificate(fmt))?;
    let public_key = cert
        .public_key()
        .map_err(|_| WebAuthnError::AttestationInvalidCertificate(fmt))?;

    let mut verifier = match alg {
        CoseAlgorithm::Es256 | CoseAlgorithm::Rs256 => {
            Verifier::new(MessageDigest::sha256(), &public_key)
        }
        CoseAlgorithm::EdDsa => Verifier::new_without_digest(&public_key),
    }
    .map_err(|_| WebAuthnError::AttestationInvalidPublicKeyAlgorithm(fmt))?;

    match verifier.verify_oneshot(sig, message) {
        Ok(true) => Ok(()),
        _ => {
            debug!("{fmt} attestation signature rejected");
            Err(WebAuthnError::AttestationInvalidSignature(fmt))
        }
    }
}

/// Build a PKIX path from `trust_path` (DER, leaf first) to one of
/// `roots` (DER trust anchors).
pub(crate) fn verify_trust_path(
    fmt: &'static str,
    trust_path: &[Vec<u8>],
    roots: &[Vec<u8>],
) -> Result<(), WebAuthnError> {
    if roots.is_empty() {
        return Err(WebAuthnError::NoAttestationRootCertificate);
    }

    let certs = trust_path
        .iter()
        .map(|der| X509::from_der(der))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| WebAuthnError::AttestationInvalidCertificate(fmt))?;
    let (leaf, intermediates) = certs
        .split_first()
        .ok_or(WebAuthnError::AttestationInvalidCertificate(fmt))?;

    let chain_error = |_| WebAuthnError::AttestationChainNotTrusted(fmt);

    let mut chain_stack = Stack::new().map_err(chain_error)?;
    for cert in intermediates {
        chain_stack.push(cert.clone()).map_err(chain_error)?;
    }

    let mut store_builder = X509StoreBuilder::new().map_err(chain_error)?;
    for root in roots {
        let root =
            X509::from_der(root).map_err(|_| WebAuthnError::NoAttestationRootCertificate)?;
        store_builder.add_cert(root).map_err(chain_error)?;
    }
    let store = store_builder.build();

    let mut store_ctx = X509StoreContext::new().map_err(chain_error)?;
    let trusted = store_ctx
        .init(&store, leaf, &chain_stack, |ctx| ctx.verify_cert())
        .map_err(chain_error)?;

    if trusted {
        Ok(())
    } else {
        debug!("{fmt} attestation chain failed path validation");
        Err(WebAuthnError::AttestationChainNotTrusted(fmt))
    }
}
