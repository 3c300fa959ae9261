//! Authenticator-data parsing.
//!
//! The authenticator-data blob has a fixed binary layout: a 32-byte RP id
//! hash, one flag byte, a 4-byte big-endian signature counter, optional
//! attested-credential-data and optional CBOR extensions. Attestation and
//! assertion signatures cover these bytes verbatim, so the parser keeps
//! the exact input range and never re-encodes.

use ciborium::value::Value;

use crate::cbor;
use crate::constants::{
    AAGUID_LENGTH, FLAG_ATTESTED_CREDENTIAL_DATA, FLAG_EXTENSION_DATA, FLAG_USER_PRESENT,
    FLAG_USER_VERIFIED, RP_ID_HASH_LENGTH,
};
use crate::cose::CoseKey;
use crate::errors::WebAuthnError;

/// Credential information minted by the authenticator at registration.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestedCredentialData {
    /// Authenticator model identifier.
    pub aaguid: [u8; AAGUID_LENGTH],
    /// Opaque handle used to re-select the credential later.
    pub credential_id: Vec<u8>,
    /// The freshly generated credential public key.
    pub public_key: CoseKey,
}

/// A parsed authenticator-data blob.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatorData {
    /// SHA-256 of the relying-party identifier the credential is scoped to.
    pub rp_id_hash: [u8; RP_ID_HASH_LENGTH],
    /// Signature counter, big-endian on the wire.
    pub sign_count: u32,
    /// Present when the attested-credential-data flag is set.
    pub attested_credential_data: Option<AttestedCredentialData>,
    /// Decoded but not semantically verified.
    pub extensions: Option<Value>,
    flags: u8,
    raw: Vec<u8>,
}

impl AuthenticatorData {
    /// Parse an authenticator-data blob, enforcing the fixed layout.
    ///
    /// Short buffers, a bad credential-id length prefix, and trailing bytes
    /// not accounted for by the flags all fail with
    /// [`WebAuthnError::InvalidAuthenticatorData`].
    pub fn parse(bytes: &[u8]) -> Result<Self, WebAuthnError> {
        const HEADER_LENGTH: usize = RP_ID_HASH_LENGTH + 1 + 4;

        if bytes.len() < HEADER_LENGTH {
            return Err(WebAuthnError::InvalidAuthenticatorData);
        }

        let mut rp_id_hash = [0u8; RP_ID_HASH_LENGTH];
        rp_id_hash.copy_from_slice(&bytes[..RP_ID_HASH_LENGTH]);
        let flags = bytes[RP_ID_HASH_LENGTH];
        let sign_count = u32::from_be_bytes(
            bytes[RP_ID_HASH_LENGTH + 1..HEADER_LENGTH]
                .try_into()
                .map_err(|_| WebAuthnError::InvalidAuthenticatorData)?,
        );

        let mut rest = &bytes[HEADER_LENGTH..];

        let attested_credential_data = if flags & FLAG_ATTESTED_CREDENTIAL_DATA != 0 {
            if rest.len() < AAGUID_LENGTH + 2 {
                return Err(WebAuthnError::InvalidAuthenticatorData);
            }
            let mut aaguid = [0u8; AAGUID_LENGTH];
            aaguid.copy_from_slice(&rest[..AAGUID_LENGTH]);

            let id_len =
                u16::from_be_bytes([rest[AAGUID_LENGTH], rest[AAGUID_LENGTH + 1]]) as usize;
            rest = &rest[AAGUID_LENGTH + 2..];
            if rest.len() < id_len {
                return Err(WebAuthnError::InvalidAuthenticatorData);
            }
            let credential_id = rest[..id_len].to_vec();
            rest = &rest[id_len..];

            // The COSE key consumes exactly one CBOR item; anything after
            // it belongs to the extensions.
            let (key_value, tail) =
                cbor::decode_prefix(rest).map_err(|_| WebAuthnError::InvalidAuthenticatorData)?;
            rest = tail;

            Some(AttestedCredentialData {
                aaguid,
                credential_id,
                public_key: CoseKey::from_cbor(&key_value)?,
            })
        } else {
            None
        };

        let extensions = if flags & FLAG_EXTENSION_DATA != 0 {
            let (value, tail) =
                cbor::decode_prefix(rest).map_err(|_| WebAuthnError::InvalidAuthenticatorData)?;
            rest = tail;
            Some(value)
        } else {
            None
        };

        if !rest.is_empty() {
            return Err(WebAuthnError::InvalidAuthenticatorData);
        }

        Ok(AuthenticatorData {
            rp_id_hash,
            sign_count,
            attested_credential_data,
            extensions,
            flags,
            raw: bytes.to_vec(),
        })
    }

    /// The exact byte range this structure was parsed from. Attestation and
    /// assertion signatures are computed over these bytes.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn user_present(&self) -> bool {
        self.flags & FLAG_USER_PRESENT != 0
    }

    pub fn user_verified(&self) -> bool {
        self.flags & FLAG_USER_VERIFIED != 0
    }

    pub fn attested_credential_data_included(&self) -> bool {
        self.flags & FLAG_ATTESTED_CREDENTIAL_DATA != 0
    }

    pub fn extension_data_included(&self) -> bool {
        self.flags & FLAG_EXTENSION_DATA != 0
    }
}
