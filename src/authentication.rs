//! The authentication ceremony.
//!
//! A shorter pipeline than registration: select the credential from the
//! challenge's allow-list, run the same cross-checks, and verify the
//! assertion signature over the authenticator data and client-data hash
//! with the stored public key. The returned signature counter feeds the
//! caller's anti-cloning decision; this library does not make it.

use log::{debug, warn};
use ring::digest;

use crate::authenticator_data::AuthenticatorData;
use crate::challenge::Challenge;
use crate::client_data::{CeremonyType, ClientData};
use crate::errors::WebAuthnError;

/// The outcome of a successful authentication.
#[derive(Debug, Clone)]
pub struct Authentication {
    /// Counter as asserted by the authenticator. The caller compares it
    /// against the stored value to detect cloned authenticators.
    pub sign_count: u32,
    pub authenticator_data: AuthenticatorData,
}

/// Verify an authentication ceremony.
pub fn verify_authentication(
    credential_id: &[u8],
    authenticator_data: &[u8],
    signature: &[u8],
    client_data_json: &[u8],
    challenge: &Challenge,
) -> Result<Authentication, WebAuthnError> {
    // 1. The asserted credential must be one we offered.
    let allowed = challenge
        .find_allowed(credential_id)
        .ok_or(WebAuthnError::IncorrectCredentialId)?;

    // 2. Decode both blobs; the client data must describe a get ceremony.
    let auth_data = AuthenticatorData::parse(authenticator_data)?;
    let client_data = ClientData::parse(client_data_json)?;
    if client_data.ceremony != CeremonyType::Get {
        return Err(WebAuthnError::InvalidCeremonyType);
    }

    // 3. Same cross-checks as registration: challenge, origin, token
    //    binding (reserved), RP id binding, and the flag policy.
    if client_data.challenge != challenge.bytes {
        warn!("authentication rejected: challenge mismatch");
        return Err(WebAuthnError::InvalidChallenge);
    }
    if client_data.origin != challenge.origin {
        warn!(
            "authentication rejected: origin {} != {}",
            client_data.origin, challenge.origin
        );
        return Err(WebAuthnError::InvalidOrigin);
    }
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

    // 4.–5. The signature covers the verbatim authenticator data followed
    // by the client-data hash, under the key stored at registration.
    let client_data_hash = client_data.hash();
    let mut message = auth_data.raw_bytes().to_vec();
    message.extend_from_slice(&client_data_hash);
    allowed.public_key.verify_signature(&message, signature)?;

    debug!("authenticated, sign count {}", auth_data.sign_count);

    // 6. The counter decision belongs to the caller.
    Ok(Authentication {
        sign_count: auth_data.sign_count,
        authenticator_data: auth_data,
    })
}
