//! The `android-safetynet` attestation statement format.
//!
//! <https://www.w3.org/TR/webauthn/#sctn-android-safetynet-attestation>
//!
//! The statement wraps a SafetyNet attestation response: a three-part JWS
//! whose payload commits to the ceremony through a nonce, and whose
//! signing certificate must be issued to `attest.android.com` under the
//! GlobalSign Root R2.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ciborium::value::Value;
use log::debug;
use ring::digest;
use serde::Deserialize;
use x509_parser::prelude::{GeneralName, ParsedExtension};

use super::{verify_certificate_signature, verify_trust_path, AttestationResult, AttestationType};
use crate::authenticator_data::AuthenticatorData;
use crate::cbor;
use crate::constants::FORMAT_ANDROID_SAFETYNET;
use crate::cose::CoseAlgorithm;
use crate::errors::WebAuthnError;

/// The hostname the SafetyNet signing certificate must be issued to.
const ATTEST_HOSTNAME: &str = "attest.android.com";

/// GlobalSign Root R2, the trust anchor for SafetyNet response signing
/// certificates.
const GLOBALSIGN_ROOT_R2_PEM: &str = "-----BEGIN CERTIFICATE-----
MIIDujCCAqKgAwIBAgILBAAAAAABD4Ym5g0wDQYJKoZIhvcNAQEFBQAwTDEgMB4G
A1UECxMXR2xvYmFsU2lnbiBSb290IENBIC0gUjIxEzARBgNVBAoTCkdsb2JhbFNp
Z24xEzARBgNVBAMTCkdsb2JhbFNpZ24wHhcNMDYxMjE1MDgwMDAwWhcNMjExMjE1
MDgwMDAwWjBMMSAwHgYDVQQLExdHbG9iYWxTaWduIFJvb3QgQ0EgLSBSMjETMBEG
A1UEChMKR2xvYmFsU2lnbjETMBEGA1UEAxMKR2xvYmFsU2lnbjCCASIwDQYJKoZI
hvcNAQEBBQADggEPADCCAQoCggEBAKbPJA6+Lm8omUVCxKs+IVSbC9N/hHD6ErPL
v4dfxn+G07IwXNb9rfF73OX4YJYJkhD10FPe+3t+c4isUoh7SqbKSaZeqKeMWhG8
eoLrvozps6yWJQeXSpkqBy+0Hne/ig+1AnwblrjFuTosvNYSuetZfeLQBoZfXklq
tTleiDTsvHgMCJiEbKjNS7SgfQx5TfC4LcshytVsW33hoCmEofnTlEnLJGKRILzd
C9XZzPnqJworc5HGnRusyMvo4KD0L5CLTfuwNhv2GXqF4G3yYROIXJ/gkwpRl4pa
zq+r1feqCapgvdzZX99yqWATXgAByUr6P6TqBwMhAo6CygPCm48CAwEAAaOBnDCB
mTAOBgNVHQ8BAf8EBAMCAQYwDwYDVR0TAQH/BAUwAwEB/zAdBgNVHQ4EFgQUm+IH
V2ccHsBqBt5ZtJot39wZhi4wNgYDVR0fBC8wLTAroCmgJ4YlaHR0cDovL2NybC5n
bG9iYWxzaWduLm5ldC9yb290LXIyLmNybDAfBgNVHSMEGDAWgBSb4gdXZxwewGoG
3lm0mi3f3BmGLjANBgkqhkiG9w0BAQUFAAOCAQEAmYFThxxol4aR7OBKuEQLq4Gs
J0/WwbgcQ3izDJr86iw8bmEbTUsp9Z8FHSbBuOmDAGJFtqkIk7mpM0sYmsL4h4hO
291xNBrBVNpGP+DTKqttVCL1OmLNIG+6KYnX3ZHu01yiPqFbQfXf5WRDLenVOavS
ot+3i9DAgBkcRcAtjOj4LaR0VknFBbVPFd5uRHg5h6h+u/N5GJG79G+dwfCMNYxd
AfvDbbnvRG15RjF+Cv6pgsH/76tuIMRQyV+dTZsXjAzlAcmgQWpzU/qlULRuJQ/7
TBj0/VLZjmmx6BEP3ojY+x1J96relc8geMJgEtslQIxq/H5COEBkEveegeGTLg==
-----END CERTIFICATE-----
";

#[derive(Debug)]
pub(crate) struct SafetynetStatement {
    pub ver: String,
    pub response: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct JwsHeader {
    alg: String,
    #[serde(default)]
    x5c: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SafetynetResponse {
    nonce: String,
    cts_profile_match: bool,
}

fn malformed() -> WebAuthnError {
    WebAuthnError::AttestationStatementMalformed(FORMAT_ANDROID_SAFETYNET)
}

pub(crate) fn parse(att_stmt: &Value) -> Result<SafetynetStatement, WebAuthnError> {
    let entries = cbor::as_map(att_stmt).map_err(|_| malformed())?;
    if entries.len() != 2 {
        return Err(malformed());
    }

    let ver = cbor::text_entry(entries, "ver")
        .ok_or_else(malformed)
        .and_then(|v| cbor::as_text(v).map_err(|_| malformed()))?
        .to_string();
    let response = cbor::text_entry(entries, "response")
        .ok_or_else(malformed)
        .and_then(|v| cbor::as_bytes(v).map_err(|_| malformed()))?
        .to_vec();

    Ok(SafetynetStatement { ver, response })
}

impl SafetynetStatement {
    pub(crate) fn verify(
        &self,
        auth_data: &AuthenticatorData,
        client_data_hash: &[u8],
    ) -> Result<AttestationResult, WebAuthnError> {
        let pinned_root = openssl::x509::X509::from_pem(GLOBALSIGN_ROOT_R2_PEM.as_bytes())
            .and_then(|cert| cert.to_der())
            .map_err(|_| WebAuthnError::NoAttestationRootCertificate)?;
        self.verify_with_roots(auth_data, client_data_hash, &[pinned_root])
    }

    pub(crate) fn verify_with_roots(
        &self,
        auth_data: &AuthenticatorData,
        client_data_hash: &[u8],
        roots: &[Vec<u8>],
    ) -> Result<AttestationResult, WebAuthnError> {
        // There is only one SafetyNet response format; ver is reserved.
        debug!("android-safetynet response ver {}", self.ver);

        // The response is a compact JWS: header.payload.signature, each
        // part padless base64url.
        let token = std::str::from_utf8(&self.response).map_err(|_| malformed())?;
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(malformed());
        }

        let header_bytes = URL_SAFE_NO_PAD.decode(parts[0]).map_err(|_| malformed())?;
        let header: JwsHeader =
            serde_json::from_slice(&header_bytes).map_err(|_| malformed())?;

        let payload_bytes = URL_SAFE_NO_PAD.decode(parts[1]).map_err(|_| malformed())?;
        let payload: SafetynetResponse =
            serde_json::from_slice(&payload_bytes).map_err(|_| malformed())?;

        if !payload.cts_profile_match {
            return Err(WebAuthnError::AttestationSafetynetCtsProfileNotMatched);
        }

        // The nonce commits the SafetyNet response to this ceremony.
        let mut nonce_input = auth_data.raw_bytes().to_vec();
        nonce_input.extend_from_slice(client_data_hash);
        let expected_nonce = STANDARD.encode(digest::digest(&digest::SHA256, &nonce_input));
        if payload.nonce != expected_nonce {
            return Err(WebAuthnError::AttestationSafetynetNonceMismatch);
        }

        // x5c in a JWS header is standard base64 DER, leaf first.
        let chain = header
            .x5c
            .iter()
            .map(|cert| STANDARD.decode(cert).map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;
        let leaf = chain.first().ok_or_else(malformed)?;

        check_hostname(leaf)?;

        // SafetyNet responses are RS256-signed; anything else is not a
        // SafetyNet service signature.
        if header.alg != "RS256" {
            return Err(WebAuthnError::AttestationInvalidPublicKeyAlgorithm(
                FORMAT_ANDROID_SAFETYNET,
            ));
        }
        let signature = URL_SAFE_NO_PAD.decode(parts[2]).map_err(|_| malformed())?;
        let signed_message = format!("{}.{}", parts[0], parts[1]);
        verify_certificate_signature(
            FORMAT_ANDROID_SAFETYNET,
            CoseAlgorithm::Rs256,
            leaf,
            signed_message.as_bytes(),
            &signature,
        )?;

        verify_trust_path(FORMAT_ANDROID_SAFETYNET, &chain, roots)?;

        Ok(AttestationResult {
            attestation_type: AttestationType::Basic,
            trust_path: chain,
            metadata: None,
        })
    }
}

/// The signing certificate must present a DNS subject-alternative-name of
/// `attest.android.com`.
fn check_hostname(leaf_der: &[u8]) -> Result<(), WebAuthnError> {
    let invalid = || WebAuthnError::AttestationInvalidCertificate(FORMAT_ANDROID_SAFETYNET);
    let (_, cert) = x509_parser::parse_x509_certificate(leaf_der).map_err(|_| invalid())?;

    let matches = cert.extensions().iter().any(|ext| {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            san.general_names
                .iter()
                .any(|name| matches!(name, GeneralName::DNSName(dns) if *dns == ATTEST_HOSTNAME))
        } else {
            false
        }
    });

    if matches {
        Ok(())
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLAG_USER_PRESENT;

    fn statement(ver: &str, response: &[u8]) -> Value {
        Value::Map(vec![
            (
                Value::Text("ver".to_string()),
                Value::Text(ver.to_string()),
            ),
            (
                Value::Text("response".to_string()),
                Value::Bytes(response.to_vec()),
            ),
        ])
    }

    fn auth_data() -> AuthenticatorData {
        let mut bytes = vec![0xcd; 32];
        bytes.push(FLAG_USER_PRESENT);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        AuthenticatorData::parse(&bytes).unwrap()
    }

    fn jws(payload: &serde_json::Value) -> Vec<u8> {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","x5c":[]}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
        let signature = URL_SAFE_NO_PAD.encode(b"not-a-signature");
        format!("{header}.{payload}.{signature}").into_bytes()
    }

    #[test]
    fn pinned_root_parses() {
        let root = openssl::x509::X509::from_pem(GLOBALSIGN_ROOT_R2_PEM.as_bytes()).unwrap();
        let ou = root
            .subject_name()
            .entries_by_nid(openssl::nid::Nid::ORGANIZATIONALUNITNAME)
            .next()
            .unwrap();
        assert_eq!(
            ou.data().as_utf8().unwrap().to_string(),
            "GlobalSign Root CA - R2"
        );
    }

    #[test]
    fn statement_shape_is_ver_and_response() {
        let parsed = parse(&statement("14799021", b"abc.def.ghi")).unwrap();
        assert_eq!(parsed.ver, "14799021");

        let extra = Value::Map(vec![(
            Value::Text("ver".to_string()),
            Value::Text("1".to_string()),
        )]);
        assert_eq!(parse(&extra).unwrap_err(), malformed());
    }

    #[test]
    fn rejects_non_jws_response() {
        let stmt = parse(&statement("1", b"only-one-part")).unwrap();
        assert_eq!(
            stmt.verify_with_roots(&auth_data(), &[0u8; 32], &[])
                .unwrap_err(),
            malformed()
        );
    }

    #[test]
    fn rejects_cts_profile_mismatch() {
        let stmt = SafetynetStatement {
            ver: "1".to_string(),
            response: jws(&serde_json::json!({
                "nonce": "AAAA",
                "ctsProfileMatch": false,
                "basicIntegrity": true,
            })),
        };
        assert_eq!(
            stmt.verify_with_roots(&auth_data(), &[0u8; 32], &[])
                .unwrap_err(),
            WebAuthnError::AttestationSafetynetCtsProfileNotMatched
        );
    }

    #[test]
    fn verifies_a_minted_safetynet_response() {
        use openssl::asn1::Asn1Time;
        use openssl::bn::BigNum;
        use openssl::hash::MessageDigest;
        use openssl::pkey::{PKey, Private};
        use openssl::rsa::Rsa;
        use openssl::sign::Signer;
        use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
        use openssl::x509::{X509Builder, X509NameBuilder, X509};

        fn mint(
            serial: u32,
            cn: &str,
            key: &PKey<Private>,
            issuer: Option<(&PKey<Private>, &X509)>,
            san: Option<&str>,
        ) -> X509 {
            let mut name = X509NameBuilder::new().unwrap();
            name.append_entry_by_text("CN", cn).unwrap();
            let name = name.build();

            let mut builder = X509Builder::new().unwrap();
            builder.set_version(2).unwrap();
            let serial = BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap();
            builder.set_serial_number(&serial).unwrap();
            builder.set_subject_name(&name).unwrap();
            builder.set_pubkey(key).unwrap();
            builder
                .set_not_before(&Asn1Time::days_from_now(0).unwrap())
                .unwrap();
            builder
                .set_not_after(&Asn1Time::days_from_now(30).unwrap())
                .unwrap();
            match issuer {
                Some((issuer_key, issuer_cert)) => {
                    builder.set_issuer_name(issuer_cert.subject_name()).unwrap();
                    builder
                        .append_extension(BasicConstraints::new().critical().build().unwrap())
                        .unwrap();
                    if let Some(dns) = san {
                        let san = SubjectAlternativeName::new()
                            .dns(dns)
                            .build(&builder.x509v3_context(Some(issuer_cert), None))
                            .unwrap();
                        builder.append_extension(san).unwrap();
                    }
                    builder.sign(issuer_key, MessageDigest::sha256()).unwrap();
                }
                None => {
                    builder.set_issuer_name(&name).unwrap();
                    builder
                        .append_extension(
                            BasicConstraints::new().critical().ca().build().unwrap(),
                        )
                        .unwrap();
                    builder.sign(key, MessageDigest::sha256()).unwrap();
                }
            }
            builder.build()
        }

        let root_key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let root = mint(1, "SafetyNet Test Root", &root_key, None, None);
        let leaf_key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let leaf = mint(
            2,
            ATTEST_HOSTNAME,
            &leaf_key,
            Some((&root_key, &root)),
            Some(ATTEST_HOSTNAME),
        );

        let auth = auth_data();
        let client_data_hash = [5u8; 32];
        let mut nonce_input = auth.raw_bytes().to_vec();
        nonce_input.extend_from_slice(&client_data_hash);
        let nonce = STANDARD.encode(digest::digest(&digest::SHA256, &nonce_input));

        let header = serde_json::json!({
            "alg": "RS256",
            "x5c": [
                STANDARD.encode(leaf.to_der().unwrap()),
                STANDARD.encode(root.to_der().unwrap()),
            ],
        });
        let payload = serde_json::json!({
            "nonce": nonce,
            "timestampMs": 1_700_000_000_000u64,
            "apkPackageName": "com.google.android.gms",
            "ctsProfileMatch": true,
            "basicIntegrity": true,
        });
        let signed_part = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap()),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap())
        );
        let mut signer = Signer::new(MessageDigest::sha256(), &leaf_key).unwrap();
        let sig = signer.sign_oneshot_to_vec(signed_part.as_bytes()).unwrap();
        let token = format!("{signed_part}.{}", URL_SAFE_NO_PAD.encode(sig));

        let stmt = SafetynetStatement {
            ver: "14799021".to_string(),
            response: token.clone().into_bytes(),
        };
        let result = stmt
            .verify_with_roots(&auth, &client_data_hash, &[root.to_der().unwrap()])
            .unwrap();
        assert_eq!(result.attestation_type, AttestationType::Basic);
        assert_eq!(result.trust_path.len(), 2);

        // The same response does not verify against an unrelated root.
        let other_key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let other_root = mint(3, "Unrelated Root", &other_key, None, None);
        assert_eq!(
            stmt.verify_with_roots(&auth, &client_data_hash, &[other_root.to_der().unwrap()])
                .unwrap_err(),
            WebAuthnError::AttestationChainNotTrusted("android-safetynet")
        );

        // And a tampered payload breaks the JWS signature.
        let mut tampered = token.into_bytes();
        let dot = tampered.iter().position(|&b| b == b'.').unwrap();
        tampered[dot + 1] ^= 0x01;
        let stmt = SafetynetStatement {
            ver: "14799021".to_string(),
            response: tampered,
        };
        assert!(stmt
            .verify_with_roots(&auth, &client_data_hash, &[root.to_der().unwrap()])
            .is_err());
    }

    #[test]
    fn rejects_nonce_mismatch() {
        let stmt = SafetynetStatement {
            ver: "1".to_string(),
            response: jws(&serde_json::json!({
                "nonce": STANDARD.encode([0u8; 32]),
                "ctsProfileMatch": true,
                "basicIntegrity": true,
            })),
        };
        assert_eq!(
            stmt.verify_with_roots(&auth_data(), &[0u8; 32], &[])
                .unwrap_err(),
            WebAuthnError::AttestationSafetynetNonceMismatch
        );
    }
}
