//! Client-data JSON parsing.
//!
//! The browser serializes the collected client data as JSON, signs over the
//! exact bytes, and sends both. The SHA-256 of the raw bytes participates in
//! every signature, so the parser keeps the input verbatim and never
//! normalises whitespace or field order. Unknown members are ignored.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::digest;
use serde::{Deserialize, Serialize};

use crate::constants::{CHALLENGE_LENGTH, CLIENT_DATA_TYPE_CREATE, CLIENT_DATA_TYPE_GET};
use crate::errors::WebAuthnError;

/// Which ceremony the client data belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyType {
    /// `webauthn.create` — registration.
    Create,
    /// `webauthn.get` — authentication.
    Get,
}

/// Token-binding information reported by the browser. Parsed and carried,
/// but not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBinding {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Deserialize)]
struct WireClientData {
    #[serde(rename = "type")]
    type_: String,
    challenge: String,
    origin: String,
    #[serde(rename = "tokenBinding", default)]
    token_binding: Option<TokenBinding>,
}

/// A parsed client-data blob.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientData {
    pub ceremony: CeremonyType,
    /// The echoed challenge, decoded from padless base64url.
    pub challenge: Vec<u8>,
    pub origin: String,
    pub token_binding: Option<TokenBinding>,
    raw: Vec<u8>,
}

impl ClientData {
    /// Parse the raw UTF-8 JSON bytes the browser signed over.
    pub fn parse(raw: &[u8]) -> Result<Self, WebAuthnError> {
        let wire: WireClientData =
            serde_json::from_slice(raw).map_err(|_| WebAuthnError::InvalidClientDataJson)?;

        let ceremony = match wire.type_.as_str() {
            CLIENT_DATA_TYPE_CREATE => CeremonyType::Create,
            CLIENT_DATA_TYPE_GET => CeremonyType::Get,
            _ => return Err(WebAuthnError::InvalidClientDataJson),
        };

        let challenge = URL_SAFE_NO_PAD
            .decode(&wire.challenge)
            .map_err(|_| WebAuthnError::InvalidClientDataJson)?;
        if challenge.len() != CHALLENGE_LENGTH {
            return Err(WebAuthnError::InvalidClientDataJson);
        }

        Ok(ClientData {
            ceremony,
            challenge,
            origin: wire.origin,
            token_binding: wire.token_binding,
            raw: raw.to_vec(),
        })
    }

    /// SHA-256 over the exact raw bytes. Reparsing the same input always
    /// reproduces this value.
    pub fn hash(&self) -> Vec<u8> {
        digest::digest(&digest::SHA256, &self.raw).as_ref().to_vec()
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(type_: &str) -> String {
        let challenge = URL_SAFE_NO_PAD.encode([7u8; 32]);
        format!(
            r#"{{"type":"{type_}","challenge":"{challenge}","origin":"https://example.com","crossOrigin":false}}"#
        )
    }

    #[test]
    fn classifies_create_and_get() {
        let create = ClientData::parse(sample_json("webauthn.create").as_bytes()).unwrap();
        assert_eq!(create.ceremony, CeremonyType::Create);
        assert_eq!(create.challenge, vec![7u8; 32]);
        assert_eq!(create.origin, "https://example.com");

        let get = ClientData::parse(sample_json("webauthn.get").as_bytes()).unwrap();
        assert_eq!(get.ceremony, CeremonyType::Get);
    }

    #[test]
    fn rejects_unknown_type() {
        assert_eq!(
            ClientData::parse(sample_json("webauthn.unknown").as_bytes()),
            Err(WebAuthnError::InvalidClientDataJson)
        );
    }

    #[test]
    fn rejects_padded_challenge() {
        let challenge = base64::engine::general_purpose::URL_SAFE.encode([7u8; 32]);
        let json = format!(
            r#"{{"type":"webauthn.create","challenge":"{challenge}","origin":"https://example.com"}}"#
        );
        assert_eq!(
            ClientData::parse(json.as_bytes()),
            Err(WebAuthnError::InvalidClientDataJson)
        );
    }

    #[test]
    fn hash_is_over_raw_bytes() {
        // Two documents with the same fields but different whitespace must
        // hash differently: no normalisation is allowed anywhere.
        let compact = sample_json("webauthn.get");
        let spaced = compact.replace(':', ": ");
        let a = ClientData::parse(compact.as_bytes()).unwrap();
        let b = ClientData::parse(spaced.as_bytes()).unwrap();
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash().len(), 32);
        assert_eq!(
            a.hash(),
            ClientData::parse(a.raw_bytes()).unwrap().hash()
        );
    }

    #[test]
    fn carries_token_binding() {
        let challenge = URL_SAFE_NO_PAD.encode([7u8; 32]);
        let json = format!(
            r#"{{"type":"webauthn.get","challenge":"{challenge}","origin":"https://example.com","tokenBinding":{{"status":"supported"}}}}"#
        );
        let parsed = ClientData::parse(json.as_bytes()).unwrap();
        assert_eq!(
            parsed.token_binding,
            Some(TokenBinding {
                status: "supported".to_string(),
                id: None
            })
        );
    }
}
