//! The `fido-u2f` attestation statement format.
//!
//! <https://w3c.github.io/webauthn/#fido-u2f-attestation>
//!
//! Legacy U2F authenticators sign over a reconstructed registration blob
//! rather than the authenticator data itself, and are indexed in metadata
//! by the SHA-1 of their attestation certificate's public key (ACKI)
//! instead of an AAGUID.

use ciborium::value::Value;
use ring::digest;
use x509_parser::oid_registry::Oid;

use super::{type_from_metadata, verify_certificate_signature, AttestationResult};
use crate::authenticator_data::AuthenticatorData;
use crate::cbor;
use crate::constants::{ACKI_LENGTH, FORMAT_FIDO_U2F};
use crate::cose::CoseAlgorithm;
use crate::errors::WebAuthnError;
use crate::metadata::MetadataSource;

const SHA256_WITH_RSA_ENCRYPTION: Oid<'static> = der_parser::oid!(1.2.840 .113549 .1 .1 .11);

#[derive(Debug)]
pub(crate) struct FidoU2fStatement {
    pub sig: Vec<u8>,
    /// Exactly one attestation certificate.
    pub attestation_certificate: Vec<u8>,
}

fn malformed() -> WebAuthnError {
    WebAuthnError::AttestationStatementMalformed(FORMAT_FIDO_U2F)
}

pub(crate) fn parse(att_stmt: &Value) -> Result<FidoU2fStatement, WebAuthnError> {
    let entries = cbor::as_map(att_stmt).map_err(|_| malformed())?;
    if entries.len() != 2 {
        return Err(malformed());
    }

    let sig = cbor::text_entry(entries, "sig")
        .ok_or_else(malformed)
        .and_then(|v| cbor::as_bytes(v).map_err(|_| malformed()))?
        .to_vec();

    let x5c = cbor::text_entry(entries, "x5c")
        .ok_or_else(malformed)?
        .as_array()
        .ok_or_else(malformed)?;
    if x5c.len() != 1 {
        return Err(malformed());
    }
    let attestation_certificate = cbor::as_bytes(&x5c[0]).map_err(|_| malformed())?.to_vec();

    Ok(FidoU2fStatement {
        sig,
        attestation_certificate,
    })
}

impl FidoU2fStatement {
    pub(crate) fn verify(
        &self,
        auth_data: &AuthenticatorData,
        client_data_hash: &[u8],
        verify_trust_root: bool,
        metadata: &dyn MetadataSource,
    ) -> Result<AttestationResult, WebAuthnError> {
        let acd = auth_data
            .attested_credential_data
            .as_ref()
            .ok_or(WebAuthnError::InvalidAuthenticatorData)?;

        check_certificate(&self.attestation_certificate)?;

        // ALG_KEY_ECC_X962_RAW form of the credential public key.
        let public_key_u2f = acd.public_key.ec_uncompressed_point().map_err(|_| {
            WebAuthnError::AttestationInvalidPublicKeyAlgorithm(FORMAT_FIDO_U2F)
        })?;

        // 0x00 || rpIdHash || clientDataHash || credentialId || publicKeyU2F
        let mut verification_data =
            Vec::with_capacity(1 + 32 + client_data_hash.len() + acd.credential_id.len() + 65);
        verification_data.push(0x00);
        verification_data.extend_from_slice(&auth_data.rp_id_hash);
        verification_data.extend_from_slice(client_data_hash);
        verification_data.extend_from_slice(&acd.credential_id);
        verification_data.extend_from_slice(&public_key_u2f);

        verify_certificate_signature(
            FORMAT_FIDO_U2F,
            CoseAlgorithm::Es256,
            &self.attestation_certificate,
            &verification_data,
            &self.sig,
        )?;

        let statement = if verify_trust_root {
            let acki = certificate_acki(&self.attestation_certificate)?;
            Some(
                metadata
                    .by_acki(&acki)
                    .ok_or(WebAuthnError::RootTrustCertificateNotFound(FORMAT_FIDO_U2F))?,
            )
        } else {
            None
        };

        Ok(AttestationResult {
            attestation_type: type_from_metadata(statement.as_ref()),
            trust_path: vec![self.attestation_certificate.clone()],
            metadata: statement,
        })
    }
}

/// The attestation certificate must be signed with
/// sha256WithRSAEncryption and carry a P-256 public key.
fn check_certificate(cert_der: &[u8]) -> Result<(), WebAuthnError> {
    let (_, cert) = x509_parser::parse_x509_certificate(cert_der)
        .map_err(|_| WebAuthnError::AttestationInvalidCertificate(FORMAT_FIDO_U2F))?;

    if cert.signature_algorithm.algorithm != SHA256_WITH_RSA_ENCRYPTION {
        return Err(WebAuthnError::AttestationInvalidCertificate(FORMAT_FIDO_U2F));
    }

    let cert = openssl::x509::X509::from_der(cert_der)
        .map_err(|_| WebAuthnError::AttestationInvalidCertificate(FORMAT_FIDO_U2F))?;
    let on_p256 = cert
        .public_key()
        .ok()
        .and_then(|key| key.ec_key().ok())
        .and_then(|ec| ec.group().curve_name())
        == Some(openssl::nid::Nid::X9_62_PRIME256V1);
    if !on_p256 {
        return Err(WebAuthnError::AttestationInvalidPublicKeyAlgorithm(
            FORMAT_FIDO_U2F,
        ));
    }

    Ok(())
}

/// SHA-1 of the subject-public-key-info raw key bytes, the index key for
/// U2F metadata statements.
fn certificate_acki(cert_der: &[u8]) -> Result<[u8; ACKI_LENGTH], WebAuthnError> {
    let (_, cert) = x509_parser::parse_x509_certificate(cert_der)
        .map_err(|_| WebAuthnError::AttestationInvalidCertificate(FORMAT_FIDO_U2F))?;
    let key_bytes: &[u8] = &cert.public_key().subject_public_key.data;
    let acki = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, key_bytes);
    acki.as_ref()
        .try_into()
        .map_err(|_| WebAuthnError::AttestationInvalidCertificate(FORMAT_FIDO_U2F))
}
