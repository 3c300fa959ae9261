//! Shared fixtures for the ceremony tests.
//!
//! Real signatures are required end to end, so these helpers mint fresh
//! credentials and certificate chains at test time and build the
//! authenticator-data and attestation-object blobs byte by byte, exactly
//! as an authenticator would.

#![allow(dead_code)]

use attestrs::{Challenge, ChallengeOptions, CoseKey, WebAuthnSettings};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ciborium::value::Value;
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, BigNumContext};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::sign::Signer;
use openssl::x509::extension::BasicConstraints;
use openssl::x509::{X509Builder, X509NameBuilder, X509};

pub const ORIGIN: &str = "https://example.com";
pub const RP_ID: &str = "example.com";
pub const AAGUID: [u8; 16] = *b"test-aaguid-0001";

pub const FLAG_UP: u8 = 0x01;
pub const FLAG_UV: u8 = 0x04;
pub const FLAG_AT: u8 = 0x40;

pub fn settings() -> WebAuthnSettings {
    WebAuthnSettings {
        origin: Some(ORIGIN.to_string()),
        ..WebAuthnSettings::default()
    }
}

pub fn registration_challenge() -> Challenge {
    Challenge::new_registration(&settings(), ChallengeOptions::default()).unwrap()
}

fn pad32(bytes: Vec<u8>) -> Vec<u8> {
    let mut out = vec![0u8; 32 - bytes.len()];
    out.extend_from_slice(&bytes);
    out
}

/// A fresh P-256 credential: the signing key and its COSE form.
pub fn p256_credential() -> (PKey<Private>, CoseKey) {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let ec_key = EcKey::generate(&group).unwrap();

    let mut ctx = BigNumContext::new().unwrap();
    let mut x = BigNum::new().unwrap();
    let mut y = BigNum::new().unwrap();
    ec_key
        .public_key()
        .affine_coordinates_gfp(&group, &mut x, &mut y, &mut ctx)
        .unwrap();

    let cose_key = CoseKey::Ec2 {
        x: pad32(x.to_vec()),
        y: pad32(y.to_vec()),
    };
    (PKey::from_ec_key(ec_key).unwrap(), cose_key)
}

pub fn ed25519_credential() -> (PKey<Private>, CoseKey) {
    let pkey = PKey::generate_ed25519().unwrap();
    let cose_key = CoseKey::Okp {
        x: pkey.raw_public_key().unwrap(),
    };
    (pkey, cose_key)
}

pub fn rsa_credential() -> (PKey<Private>, CoseKey) {
    let rsa = openssl::rsa::Rsa::generate(2048).unwrap();
    let cose_key = CoseKey::Rsa {
        n: rsa.n().to_vec(),
        e: rsa.e().to_vec(),
    };
    (PKey::from_rsa(rsa).unwrap(), cose_key)
}

/// ECDSA/RSA signing with SHA-256.
pub fn sign(pkey: &PKey<Private>, message: &[u8]) -> Vec<u8> {
    let mut signer = Signer::new(MessageDigest::sha256(), pkey).unwrap();
    signer.sign_oneshot_to_vec(message).unwrap()
}

/// Ed25519 signing (no prehash).
pub fn sign_eddsa(pkey: &PKey<Private>, message: &[u8]) -> Vec<u8> {
    let mut signer = Signer::new_without_digest(pkey).unwrap();
    signer.sign_oneshot_to_vec(message).unwrap()
}

/// CBOR-encode a COSE key the way an authenticator embeds it.
pub fn cose_key_bytes(key: &CoseKey) -> Vec<u8> {
    let map = match key {
        CoseKey::Ec2 { x, y } => Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(2.into())),
            (Value::Integer(3.into()), Value::Integer((-7).into())),
            (Value::Integer((-1).into()), Value::Integer(1.into())),
            (Value::Integer((-2).into()), Value::Bytes(x.clone())),
            (Value::Integer((-3).into()), Value::Bytes(y.clone())),
        ]),
        CoseKey::Rsa { n, e } => Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(3.into())),
            (Value::Integer(3.into()), Value::Integer((-257).into())),
            (Value::Integer((-1).into()), Value::Bytes(n.clone())),
            (Value::Integer((-2).into()), Value::Bytes(e.clone())),
        ]),
        CoseKey::Okp { x } => Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(1.into())),
            (Value::Integer(3.into()), Value::Integer((-8).into())),
            (Value::Integer((-1).into()), Value::Integer(6.into())),
            (Value::Integer((-2).into()), Value::Bytes(x.clone())),
        ]),
    };
    let mut buf = Vec::new();
    ciborium::into_writer(&map, &mut buf).unwrap();
    buf
}

/// Build an authenticator-data blob. With a key, the attested-credential
/// flag layout is produced; without, the assertion form.
pub fn build_auth_data(
    rp_id: &str,
    flags: u8,
    sign_count: u32,
    credential_id: &[u8],
    key: Option<&CoseKey>,
) -> Vec<u8> {
    let rp_id_hash = openssl::sha::sha256(rp_id.as_bytes());
    let mut data = Vec::new();
    data.extend_from_slice(&rp_id_hash);
    data.push(flags);
    data.extend_from_slice(&sign_count.to_be_bytes());
    if let Some(key) = key {
        data.extend_from_slice(&AAGUID);
        data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
        data.extend_from_slice(credential_id);
        data.extend_from_slice(&cose_key_bytes(key));
    }
    data
}

/// The client-data JSON document the browser would sign over.
pub fn client_data_json(ceremony: &str, challenge: &[u8], origin: &str) -> Vec<u8> {
    format!(
        r#"{{"type":"{ceremony}","challenge":"{}","origin":"{origin}","crossOrigin":false}}"#,
        URL_SAFE_NO_PAD.encode(challenge)
    )
    .into_bytes()
}

/// The outer attestation object: `{fmt, attStmt, authData}`.
pub fn attestation_object(fmt: &str, auth_data: &[u8], att_stmt: Value) -> Vec<u8> {
    let map = Value::Map(vec![
        (
            Value::Text("fmt".to_string()),
            Value::Text(fmt.to_string()),
        ),
        (Value::Text("attStmt".to_string()), att_stmt),
        (
            Value::Text("authData".to_string()),
            Value::Bytes(auth_data.to_vec()),
        ),
    ]);
    let mut buf = Vec::new();
    ciborium::into_writer(&map, &mut buf).unwrap();
    buf
}

/// `authData || SHA-256(clientDataJSON)`, the message attestation and
/// assertion signatures cover.
pub fn signed_message(auth_data: &[u8], client_data_json: &[u8]) -> Vec<u8> {
    let mut message = auth_data.to_vec();
    message.extend_from_slice(&openssl::sha::sha256(client_data_json));
    message
}

fn subject(entries: &[(&str, &str)]) -> openssl::x509::X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    for (field, value) in entries {
        builder.append_entry_by_text(field, value).unwrap();
    }
    builder.build()
}

/// A self-signed CA over the given key.
pub fn mint_ca(key: &PKey<Private>, common_name: &str) -> X509 {
    let name = subject(&[("C", "US"), ("O", "Example Corp"), ("CN", common_name)]);
    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// An end-entity certificate for `leaf_key`, issued by the CA, with the
/// given subject and optional DNS subject-alternative-name.
pub fn mint_leaf(
    ca_key: &PKey<Private>,
    ca_cert: &X509,
    leaf_key: &PKey<Private>,
    subject_entries: &[(&str, &str)],
    dns_san: Option<&str>,
) -> X509 {
    let name = subject(subject_entries);
    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(2).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(ca_cert.subject_name()).unwrap();
    builder.set_pubkey(leaf_key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().build().unwrap())
        .unwrap();
    if let Some(dns) = dns_san {
        let san = openssl::x509::extension::SubjectAlternativeName::new()
            .dns(dns)
            .build(&builder.x509v3_context(Some(ca_cert), None))
            .unwrap();
        builder.append_extension(san).unwrap();
    }
    builder.sign(ca_key, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// The subject the packed attestation certificate requirements demand.
pub fn packed_leaf_subject<'a>(common_name: &'a str) -> Vec<(&'static str, &'a str)> {
    vec![
        ("C", "US"),
        ("O", "Example Corp"),
        ("OU", "Authenticator Attestation"),
        ("CN", common_name),
    ]
}
