//! The `WebAuthn` verification service.
//!
//! A thin facade over the ceremony pipelines that carries the metadata
//! index, so callers hold one value instead of threading the index through
//! every verification call. The service is stateless between ceremonies
//! and can be shared freely across threads.

use crate::authentication::{self, Authentication};
use crate::challenge::Challenge;
use crate::errors::WebAuthnError;
use crate::metadata::MetadataSource;
use crate::registration::{self, RegisteredCredential};

/// Core verification service.
pub struct WebAuthnService<'a> {
    metadata: &'a dyn MetadataSource,
}

impl<'a> WebAuthnService<'a> {
    /// Create a service over a metadata snapshot.
    pub fn new(metadata: &'a dyn MetadataSource) -> Self {
        Self { metadata }
    }

    /// Verify a registration ceremony.
    ///
    /// # Errors
    /// Returns a [`WebAuthnError`] when any parse, cross-check,
    /// attestation verification, or policy check fails.
    pub fn register(
        &self,
        attestation_object: &[u8],
        client_data_json: &[u8],
        challenge: &Challenge,
    ) -> Result<RegisteredCredential, WebAuthnError> {
        registration::verify_registration(
            attestation_object,
            client_data_json,
            challenge,
            self.metadata,
        )
    }

    /// Verify an authentication ceremony.
    ///
    /// # Errors
    /// Returns a [`WebAuthnError`] when the credential is not allowed, a
    /// parse or cross-check fails, or the assertion signature is invalid.
    pub fn authenticate(
        &self,
        credential_id: &[u8],
        authenticator_data: &[u8],
        signature: &[u8],
        client_data_json: &[u8],
        challenge: &Challenge,
    ) -> Result<Authentication, WebAuthnError> {
        authentication::verify_authentication(
            credential_id,
            authenticator_data,
            signature,
            client_data_json,
            challenge,
        )
    }
}
