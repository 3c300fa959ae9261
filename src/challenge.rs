//! Challenge generation.
//!
//! A challenge carries the server-chosen nonce together with the frozen
//! policy for one ceremony. It is created here, typically serialized into
//! the caller's session store, and handed back by value when the browser's
//! response arrives. It is never mutated.

use chrono::{DateTime, Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::attestation::AttestationType;
use crate::constants::CHALLENGE_LENGTH;
use crate::cose::CoseKey;
use crate::errors::WebAuthnError;
use crate::settings::{self, ChallengeOptions, WebAuthnSettings};

/// A credential the authentication ceremony may assert with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowCredential {
    pub credential_id: Vec<u8>,
    /// The public key persisted at registration.
    pub public_key: CoseKey,
}

/// The server-side half of a ceremony: nonce plus frozen policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// 32 cryptographically random bytes the browser signs over.
    pub bytes: Vec<u8>,
    /// Expected fully qualified origin, e.g. `https://example.com`.
    pub origin: String,
    pub rp_id: String,
    pub user_verified_required: bool,
    pub trusted_attestation_types: Vec<AttestationType>,
    pub verify_trust_root: bool,
    /// Empty for registration, the permitted credentials for
    /// authentication.
    pub allow_credentials: Vec<AllowCredential>,
    /// Reserved: expected token-binding state. Currently never enforced.
    pub token_binding_status: Option<String>,
    /// Advisory expiry for the caller's session layer; verification does
    /// not enforce it.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Challenge {
    /// Generate a challenge for a registration ceremony.
    pub fn new_registration(
        settings: &WebAuthnSettings,
        opts: ChallengeOptions,
    ) -> Result<Challenge, WebAuthnError> {
        Challenge::build(Vec::new(), settings, opts)
    }

    /// Generate a challenge for an authentication ceremony over the given
    /// allow-list.
    pub fn new_authentication(
        allow_credentials: Vec<AllowCredential>,
        settings: &WebAuthnSettings,
        opts: ChallengeOptions,
    ) -> Result<Challenge, WebAuthnError> {
        Challenge::build(allow_credentials, settings, opts)
    }

    fn build(
        allow_credentials: Vec<AllowCredential>,
        settings: &WebAuthnSettings,
        opts: ChallengeOptions,
    ) -> Result<Challenge, WebAuthnError> {
        let resolved = settings::resolve(settings, &opts)?;

        let mut bytes = vec![0u8; CHALLENGE_LENGTH];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| WebAuthnError::RandomFailure)?;

        let expires_at = resolved
            .timeout_seconds
            .map(|secs| Utc::now() + Duration::seconds(secs as i64));

        Ok(Challenge {
            bytes,
            origin: resolved.origin,
            rp_id: resolved.rp_id,
            user_verified_required: resolved.user_verified_required,
            trusted_attestation_types: resolved.trusted_attestation_types,
            verify_trust_root: resolved.verify_trust_root,
            allow_credentials,
            token_binding_status: resolved.token_binding_status,
            expires_at,
        })
    }

    /// Look up a credential in the allow-list by id.
    pub(crate) fn find_allowed(&self, credential_id: &[u8]) -> Option<&AllowCredential> {
        self.allow_credentials
            .iter()
            .find(|allowed| allowed.credential_id == credential_id)
    }
}
