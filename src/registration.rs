//! The registration ceremony.
//!
//! Turns an attestation object and client-data blob into a registered
//! credential, failing fast on the first cross-check or verification that
//! does not hold. The caller persists the returned credential id, public
//! key and signature counter.

use log::{debug, warn};
use ring::digest;

use crate::attestation::{AttestationObject, AttestationResult, AttestationStatement};
use crate::authenticator_data::AuthenticatorData;
use crate::challenge::Challenge;
use crate::client_data::{CeremonyType, ClientData};
use crate::cose::CoseKey;
use crate::errors::WebAuthnError;
use crate::metadata::MetadataSource;

/// The outcome of a successful registration.
#[derive(Debug, Clone)]
pub struct RegisteredCredential {
    pub credential_id: Vec<u8>,
    pub public_key: CoseKey,
    /// Initial signature counter; compare against it at authentication.
    pub sign_count: u32,
    pub attestation: AttestationResult,
    pub authenticator_data: AuthenticatorData,
}

/// Verify a registration ceremony.
///
/// `attestation_object` is the raw CBOR blob produced by the authenticator
/// and `client_data_json` the exact bytes the browser signed over; neither
/// may be re-encoded by the transport.
pub fn verify_registration(
    attestation_object: &[u8],
    client_data_json: &[u8],
    challenge: &Challenge,
    metadata: &dyn MetadataSource,
) -> Result<RegisteredCredential, WebAuthnError> {
    // 1. The client data must describe a create ceremony.
    let client_data = ClientData::parse(client_data_json)?;
    if client_data.ceremony != CeremonyType::Create {
        return Err(WebAuthnError::InvalidCeremonyType);
    }

    // 2. It must echo our challenge, from our origin.
    if client_data.challenge != challenge.bytes {
        warn!("registration rejected: challenge mismatch");
        return Err(WebAuthnError::InvalidChallenge);
    }
    if client_data.origin != challenge.origin {
        warn!(
            "registration rejected: origin {} != {}",
            client_data.origin, challenge.origin
        );
        return Err(WebAuthnError::InvalidOrigin);
    }

    // 3. Token binding is reserved: any reported state is accepted.

    // 4. The hash over the raw client data participates in the
    //    attestation signature.
    let client_data_hash = client_data.hash();

    // 5. Decode the attestation object.
    let attestation_object = AttestationObject::parse(attestation_object)?;
    let auth_data = attestation_object.auth_data;
    debug!("registration attestation format: {}", attestation_object.fmt);

    // 6. The authenticator must be bound to our RP id, with a present
    //    (and, when policy demands, verified) user, and must have minted
    //    credential data.
    let rp_id_hash = digest::digest(&digest::SHA256, challenge.rp_id.as_bytes());
    if rp_id_hash.as_ref() != auth_data.rp_id_hash {
        return Err(WebAuthnError::InvalidRpId);
    }
    if !auth_data.user_present() {
        return Err(WebAuthnError::UserPresentFlagNotSet);
    }
    if challenge.user_verified_required && !auth_data.user_verified() {
        return Err(WebAuthnError::UserNotVerified);
    }
    let acd = auth_data
        .attested_credential_data
        .as_ref()
        .ok_or(WebAuthnError::InvalidAuthenticatorData)?;

    // 7. Format-specific attestation verification.
    let statement = AttestationStatement::parse(&attestation_object.fmt, &attestation_object.att_stmt)?;
    let attestation = statement.verify(
        &auth_data,
        &client_data_hash,
        challenge.verify_trust_root,
        metadata,
    )?;

    // 8. The verified attestation type must be acceptable to policy.
    if !challenge
        .trusted_attestation_types
        .contains(&attestation.attestation_type)
    {
        warn!(
            "registration rejected: attestation type {:?} not trusted",
            attestation.attestation_type
        );
        return Err(WebAuthnError::UntrustedAttestationType);
    }

    let credential_id = acd.credential_id.clone();
    let public_key = acd.public_key.clone();
    debug!(
        "registered credential ({} byte id, {:?} attestation)",
        credential_id.len(),
        attestation.attestation_type
    );

    Ok(RegisteredCredential {
        credential_id,
        public_key,
        sign_count: auth_data.sign_count,
        attestation,
        authenticator_data: auth_data,
    })
}
