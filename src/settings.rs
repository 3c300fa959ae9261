//! Process-wide configuration and per-call options.
//!
//! Challenge generation resolves every policy value with the precedence
//! caller-provided > process-wide settings > built-in default, then freezes
//! the result inside the [`Challenge`](crate::challenge::Challenge). Nothing
//! in this module is consulted again after a challenge exists, so changing
//! settings mid-flight never affects an in-progress ceremony.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::attestation::AttestationType;
use crate::errors::WebAuthnError;

/// How the relying-party identifier is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RpId {
    /// Derive the RP id from the origin host.
    Auto,
    /// Use this identifier; it must be the origin host or a registrable
    /// suffix of it.
    Explicit(String),
}

impl From<String> for RpId {
    fn from(value: String) -> Self {
        if value == "auto" {
            RpId::Auto
        } else {
            RpId::Explicit(value)
        }
    }
}

impl From<RpId> for String {
    fn from(value: RpId) -> Self {
        match value {
            RpId::Auto => "auto".to_string(),
            RpId::Explicit(id) => id,
        }
    }
}

/// Process-wide WebAuthn configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebAuthnSettings {
    /// Expected web origin, e.g. `https://example.com`.
    pub origin: Option<String>,
    pub rp_id: RpId,
    pub user_verified_required: bool,
    pub verify_trust_root: bool,
    pub trusted_attestation_types: Vec<AttestationType>,
    /// Drives the advisory `expires_at` on generated challenges.
    pub timeout_seconds: Option<u64>,
}

impl Default for WebAuthnSettings {
    fn default() -> Self {
        Self {
            origin: None,
            rp_id: RpId::Auto,
            user_verified_required: false,
            verify_trust_root: true,
            trusted_attestation_types: AttestationType::full_set(),
            timeout_seconds: None,
        }
    }
}

/// Per-call overrides for challenge generation. Unset fields fall back to
/// [`WebAuthnSettings`], then to the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ChallengeOptions {
    pub origin: Option<String>,
    pub rp_id: Option<RpId>,
    pub user_verified_required: Option<bool>,
    pub verify_trust_root: Option<bool>,
    pub trusted_attestation_types: Option<Vec<AttestationType>>,
    pub timeout_seconds: Option<u64>,
    pub token_binding_status: Option<String>,
}

/// Fully resolved, validated policy for one challenge.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedOptions {
    pub origin: String,
    pub rp_id: String,
    pub user_verified_required: bool,
    pub verify_trust_root: bool,
    pub trusted_attestation_types: Vec<AttestationType>,
    pub timeout_seconds: Option<u64>,
    pub token_binding_status: Option<String>,
}

pub(crate) fn resolve(
    settings: &WebAuthnSettings,
    opts: &ChallengeOptions,
) -> Result<ResolvedOptions, WebAuthnError> {
    let origin = opts
        .origin
        .clone()
        .or_else(|| settings.origin.clone())
        .ok_or_else(|| WebAuthnError::InvalidConfiguration("origin is not set".to_string()))?;

    let host = validate_origin(&origin)?;

    let rp_id = match opts.rp_id.clone().unwrap_or_else(|| settings.rp_id.clone()) {
        RpId::Auto => host,
        RpId::Explicit(rp_id) => {
            // Registrable-suffix semantics stay with the caller; the
            // generator enforces the suffix relation itself.
            if host != rp_id && !host.ends_with(&format!(".{rp_id}")) {
                return Err(WebAuthnError::InvalidRpId);
            }
            rp_id
        }
    };

    Ok(ResolvedOptions {
        origin,
        rp_id,
        user_verified_required: opts
            .user_verified_required
            .unwrap_or(settings.user_verified_required),
        verify_trust_root: opts.verify_trust_root.unwrap_or(settings.verify_trust_root),
        trusted_attestation_types: opts
            .trusted_attestation_types
            .clone()
            .unwrap_or_else(|| settings.trusted_attestation_types.clone()),
        timeout_seconds: opts.timeout_seconds.or(settings.timeout_seconds),
        token_binding_status: opts.token_binding_status.clone(),
    })
}

/// An origin must be an absolute URL with scheme `https`, or have host
/// `localhost` (for development). Returns the host.
fn validate_origin(origin: &str) -> Result<String, WebAuthnError> {
    let url = Url::parse(origin).map_err(|_| WebAuthnError::InvalidOrigin)?;
    let host = url.host_str().ok_or(WebAuthnError::InvalidOrigin)?;
    if url.scheme() != "https" && host != "localhost" {
        return Err(WebAuthnError::InvalidOrigin);
    }
    Ok(host.to_string())
}
