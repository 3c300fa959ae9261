//! Server-side `WebAuthn` (FIDO2) relying-party verification core.
//!
//! This crate generates the cryptographic challenges a browser's `WebAuthn`
//! API signs over and verifies the responses it produces, yielding either a
//! newly registered credential (credential id plus public key) or an
//! authentication decision with the authenticator's signature counter. It
//! implements the W3C `WebAuthn` specification using standard cryptography
//! libraries.
//!
//! The HTTP surface, challenge session storage, the credential database and
//! the FIDO metadata download job are the caller's collaborators; the core
//! is stateless between ceremonies and purely functional over its inputs.
//!
//! ```no_run
//! use attestrs::{Challenge, ChallengeOptions, StaticMetadataIndex, WebAuthnService, WebAuthnSettings};
//!
//! # fn main() -> Result<(), attestrs::WebAuthnError> {
//! let settings = WebAuthnSettings {
//!     origin: Some("https://example.com".to_string()),
//!     ..WebAuthnSettings::default()
//! };
//!
//! // Store the challenge in the user's session, send `challenge.bytes`
//! // to the browser...
//! let challenge = Challenge::new_registration(&settings, ChallengeOptions::default())?;
//!
//! // ...and when the response arrives:
//! # let (attestation_object, client_data_json): (Vec<u8>, Vec<u8>) = (vec![], vec![]);
//! let metadata = StaticMetadataIndex::default();
//! let service = WebAuthnService::new(&metadata);
//! let credential = service.register(&attestation_object, &client_data_json, &challenge)?;
//! // Persist (credential.credential_id, credential.public_key, credential.sign_count).
//! # Ok(())
//! # }
//! ```

mod attestation;
mod authentication;
mod authenticator_data;
mod cbor;
mod challenge;
mod client_data;
pub mod constants;
mod cose;
mod errors;
mod metadata;
mod registration;
mod service;
mod settings;

// Re-exports for public use
pub use attestation::{AttestationResult, AttestationType};
pub use authentication::{verify_authentication, Authentication};
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData};
pub use challenge::{AllowCredential, Challenge};
pub use client_data::{CeremonyType, ClientData, TokenBinding};
pub use cose::{CoseAlgorithm, CoseKey};
pub use errors::WebAuthnError;
pub use metadata::{
    MetadataAttestationType, MetadataSource, MetadataStatement, StaticMetadataIndex,
};
pub use registration::{verify_registration, RegisteredCredential};
pub use service::WebAuthnService;
pub use settings::{ChallengeOptions, RpId, WebAuthnSettings};
