//! The `packed` attestation statement format.
//!
//! <https://w3c.github.io/webauthn/#sctn-packed-attestation>
//!
//! Two variants are verified: full attestation (an `x5c` certificate chain
//! signs over the ceremony) and self attestation (the freshly minted
//! credential key signs for itself). The ECDAA variant is recognised and
//! rejected.

use ciborium::value::Value;
use log::debug;
use x509_parser::oid_registry::Oid;
use x509_parser::prelude::{ParsedExtension, X509Version};

use super::{
    type_from_metadata, verify_certificate_signature, verify_trust_path, AttestationResult,
    AttestationType,
};
use crate::authenticator_data::{AttestedCredentialData, AuthenticatorData};
use crate::cbor;
use crate::constants::{AAGUID_LENGTH, FORMAT_PACKED};
use crate::cose::CoseAlgorithm;
use crate::errors::WebAuthnError;
use crate::metadata::MetadataSource;

/// id-fido-gen-ce-aaguid: when present in the attestation certificate its
/// value must match the AAGUID in the attested credential data.
const ID_FIDO_GEN_CE_AAGUID: Oid<'static> = der_parser::oid!(1.3.6 .1 .4 .1 .45724 .1 .1 .4);

/// ISO 3166-1 alpha-2 country codes, for the leaf subject `C` requirement.
const ISO_3166_ALPHA2: &[&str] = &[
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AQ", "AR", "AS", "AT", "AU", "AW", "AX",
    "AZ", "BA", "BB", "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ",
    "BR", "BS", "BT", "BV", "BW", "BY", "BZ", "CA", "CC", "CD", "CF", "CG", "CH", "CI", "CK",
    "CL", "CM", "CN", "CO", "CR", "CU", "CV", "CW", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM",
    "DO", "DZ", "EC", "EE", "EG", "EH", "ER", "ES", "ET", "FI", "FJ", "FK", "FM", "FO", "FR",
    "GA", "GB", "GD", "GE", "GF", "GG", "GH", "GI", "GL", "GM", "GN", "GP", "GQ", "GR", "GS",
    "GT", "GU", "GW", "GY", "HK", "HM", "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN",
    "IO", "IQ", "IR", "IS", "IT", "JE", "JM", "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN",
    "KP", "KR", "KW", "KY", "KZ", "LA", "LB", "LC", "LI", "LK", "LR", "LS", "LT", "LU", "LV",
    "LY", "MA", "MC", "MD", "ME", "MF", "MG", "MH", "MK", "ML", "MM", "MN", "MO", "MP", "MQ",
    "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA", "NC", "NE", "NF", "NG", "NI",
    "NL", "NO", "NP", "NR", "NU", "NZ", "OM", "PA", "PE", "PF", "PG", "PH", "PK", "PL", "PM",
    "PN", "PR", "PS", "PT", "PW", "PY", "QA", "RE", "RO", "RS", "RU", "RW", "SA", "SB", "SC",
    "SD", "SE", "SG", "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO", "SR", "SS", "ST", "SV",
    "SX", "SY", "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TL", "TM", "TN", "TO", "TR",
    "TT", "TV", "TW", "TZ", "UA", "UG", "UM", "US", "UY", "UZ", "VA", "VC", "VE", "VG", "VI",
    "VN", "VU", "WF", "WS", "YE", "YT", "ZA", "ZM", "ZW",
];

#[derive(Debug)]
pub(crate) struct PackedStatement {
    pub alg: CoseAlgorithm,
    pub sig: Vec<u8>,
    /// Attestation certificate chain, leaf first. Present in full
    /// attestation only.
    pub x5c: Option<Vec<Vec<u8>>>,
    pub ecdaa_key_id: Option<Vec<u8>>,
}

fn malformed() -> WebAuthnError {
    WebAuthnError::AttestationStatementMalformed(FORMAT_PACKED)
}

pub(crate) fn parse(att_stmt: &Value) -> Result<PackedStatement, WebAuthnError> {
    let entries = cbor::as_map(att_stmt).map_err(|_| malformed())?;

    let alg_id = cbor::text_entry(entries, "alg")
        .ok_or_else(malformed)
        .and_then(|v| cbor::as_int(v).map_err(|_| malformed()))?;
    let alg = CoseAlgorithm::from_id(alg_id)
        .ok_or(WebAuthnError::AttestationInvalidPublicKeyAlgorithm(FORMAT_PACKED))?;

    let sig = cbor::text_entry(entries, "sig")
        .ok_or_else(malformed)
        .and_then(|v| cbor::as_bytes(v).map_err(|_| malformed()))?
        .to_vec();

    let x5c = cbor::text_entry(entries, "x5c")
        .map(|value| {
            value
                .as_array()
                .ok_or_else(malformed)?
                .iter()
                .map(|cert| cbor::as_bytes(cert).map(<[u8]>::to_vec).map_err(|_| malformed()))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    let ecdaa_key_id = cbor::text_entry(entries, "ecdaaKeyId")
        .map(|v| cbor::as_bytes(v).map(<[u8]>::to_vec).map_err(|_| malformed()))
        .transpose()?;

    // The statement holds exactly alg and sig, plus at most one of x5c or
    // ecdaaKeyId; anything else is a shape violation.
    let expected_len = 2 + usize::from(x5c.is_some()) + usize::from(ecdaa_key_id.is_some());
    if entries.len() != expected_len || (x5c.is_some() && ecdaa_key_id.is_some()) {
        return Err(malformed());
    }

    Ok(PackedStatement {
        alg,
        sig,
        x5c,
        ecdaa_key_id,
    })
}

impl PackedStatement {
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

        // Signatures cover the verbatim authenticator data followed by the
        // client data hash.
        let mut message = auth_data.raw_bytes().to_vec();
        message.extend_from_slice(client_data_hash);

        if self.ecdaa_key_id.is_some() {
            return Err(WebAuthnError::AttestationUnimplemented(FORMAT_PACKED));
        }

        match &self.x5c {
            Some(x5c) => self.verify_full(x5c, acd, &message, verify_trust_root, metadata),
            None => self.verify_self(acd, &message),
        }
    }

    /// Full attestation: the leaf of `x5c` signs over the ceremony and must
    /// satisfy the packed certificate requirements.
    fn verify_full(
        &self,
        x5c: &[Vec<u8>],
        acd: &AttestedCredentialData,
        message: &[u8],
        verify_trust_root: bool,
        metadata: &dyn MetadataSource,
    ) -> Result<AttestationResult, WebAuthnError> {
        let leaf = x5c.first().ok_or_else(malformed)?;

        verify_certificate_signature(FORMAT_PACKED, self.alg, leaf, message, &self.sig)?;
        check_leaf_requirements(leaf, &acd.aaguid)?;

        let statement = metadata.by_aaguid(&acd.aaguid);
        if verify_trust_root {
            let statement = statement
                .as_ref()
                .ok_or(WebAuthnError::NoAttestationMetadataStatement)?;
            verify_trust_path(FORMAT_PACKED, x5c, &statement.attestation_root_certificates)?;
        }

        Ok(AttestationResult {
            attestation_type: type_from_metadata(statement.as_ref()),
            trust_path: x5c.to_vec(),
            metadata: statement,
        })
    }

    /// Self attestation: the credential key itself signs, and the declared
    /// algorithm must match the key's.
    fn verify_self(
        &self,
        acd: &AttestedCredentialData,
        message: &[u8],
    ) -> Result<AttestationResult, WebAuthnError> {
        if self.alg != acd.public_key.algorithm() {
            return Err(WebAuthnError::AttestationInvalidPublicKeyAlgorithm(
                FORMAT_PACKED,
            ));
        }

        acd.public_key
            .verify_signature(message, &self.sig)
            .map_err(|_| WebAuthnError::AttestationInvalidSignature(FORMAT_PACKED))?;

        Ok(AttestationResult {
            attestation_type: AttestationType::Self_,
            trust_path: Vec::new(),
            metadata: None,
        })
    }
}

/// Packed attestation certificate requirements
/// (<https://w3c.github.io/webauthn/#sctn-packed-attestation-cert-requirements>):
/// X.509 v3, subject C a recognised country code, O and CN non-empty,
/// OU exactly "Authenticator Attestation", Basic Constraints CA false, and
/// a matching AAGUID extension when one is present.
fn check_leaf_requirements(
    leaf_der: &[u8],
    aaguid: &[u8; AAGUID_LENGTH],
) -> Result<(), WebAuthnError> {
    let invalid = || WebAuthnError::AttestationInvalidCertificate(FORMAT_PACKED);

    let (_, cert) = x509_parser::parse_x509_certificate(leaf_der).map_err(|_| invalid())?;

    if cert.version() != X509Version::V3 {
        return Err(invalid());
    }

    let subject = cert.subject();

    let country = subject
        .iter_country()
        .next()
        .and_then(|c| c.as_str().ok())
        .ok_or_else(invalid)?;
    if !ISO_3166_ALPHA2.contains(&country) {
        debug!("packed leaf subject C is not a country code: {country}");
        return Err(invalid());
    }

    let organization = subject
        .iter_organization()
        .next()
        .and_then(|o| o.as_str().ok())
        .ok_or_else(invalid)?;
    if organization.is_empty() {
        return Err(invalid());
    }

    let unit = subject
        .iter_organizational_unit()
        .next()
        .and_then(|ou| ou.as_str().ok())
        .ok_or_else(invalid)?;
    if unit != "Authenticator Attestation" {
        return Err(invalid());
    }

    let common_name = subject
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .ok_or_else(invalid)?;
    if common_name.is_empty() {
        return Err(invalid());
    }

    let mut ca = None;
    for extension in cert.extensions() {
        match extension.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => ca = Some(bc.ca),
            _ => {
                if extension.oid == ID_FIDO_GEN_CE_AAGUID {
                    let (_, wrapped) =
                        der_parser::der::parse_der_octetstring(extension.value)
                            .map_err(|_| invalid())?;
                    if wrapped.as_slice().map_err(|_| invalid())? != aaguid.as_slice() {
                        debug!("packed leaf AAGUID extension mismatch");
                        return Err(invalid());
                    }
                }
            }
        }
    }
    if ca != Some(false) {
        return Err(invalid());
    }

    Ok(())
}
