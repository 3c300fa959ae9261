//! Metadata statements and the trust-anchor lookup interface.
//!
//! The FIDO metadata service maps authenticator identifiers to root
//! certificates and capability descriptors. Downloading and refreshing the
//! metadata bundle is an external concern; the verification core only
//! consumes a read-only snapshot through [`MetadataSource`]. A lookup
//! returns the statement current at the moment of the call, and the
//! returned `Arc` keeps it valid for the rest of the ceremony even if the
//! publisher swaps in a newer snapshot concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{AAGUID_LENGTH, ACKI_LENGTH};

/// Attestation types a metadata statement can certify for an authenticator
/// model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataAttestationType {
    /// Full basic attestation with a model-wide certificate.
    #[serde(rename = "basic_full")]
    BasicFull,
    /// Attestation through a privacy CA.
    #[serde(rename = "attca")]
    AttCa,
}

/// The subset of a FIDO metadata statement the verification core consumes.
///
/// Capability descriptors (`key_protection`, `user_verification_details`)
/// are opaque here: they are carried through to the caller unchanged so the
/// registration policy layer can inspect them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataStatement {
    /// Model identifier for FIDO2 authenticators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaguid: Option<Uuid>,
    /// Attestation-certificate key identifier for U2F authenticators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acki: Option<Vec<u8>>,
    #[serde(default)]
    pub description: String,
    /// DER-encoded trust anchors for this model.
    #[serde(default)]
    pub attestation_root_certificates: Vec<Vec<u8>>,
    #[serde(default)]
    pub attestation_types: Vec<MetadataAttestationType>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub key_protection: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub user_verification_details: serde_json::Value,
}

impl MetadataStatement {
    pub fn certifies(&self, attestation_type: MetadataAttestationType) -> bool {
        self.attestation_types.contains(&attestation_type)
    }
}

/// Read-only, thread-safe trust-anchor lookups.
///
/// Absence is not an error: a missing statement surfaces as attestation
/// type `Uncertain` unless the challenge policy forbids it.
pub trait MetadataSource: Send + Sync {
    fn by_aaguid(&self, aaguid: &[u8; AAGUID_LENGTH]) -> Option<Arc<MetadataStatement>>;
    fn by_acki(&self, acki: &[u8; ACKI_LENGTH]) -> Option<Arc<MetadataStatement>>;
}

/// An immutable in-memory metadata snapshot.
///
/// Built once from a list of statements; the publisher replaces the whole
/// index to update it, so readers never observe a partial state.
#[derive(Debug, Default, Clone)]
pub struct StaticMetadataIndex {
    by_aaguid: HashMap<[u8; AAGUID_LENGTH], Arc<MetadataStatement>>,
    by_acki: HashMap<[u8; ACKI_LENGTH], Arc<MetadataStatement>>,
}

impl StaticMetadataIndex {
    pub fn new(statements: impl IntoIterator<Item = MetadataStatement>) -> Self {
        let mut index = StaticMetadataIndex::default();
        for statement in statements {
            let statement = Arc::new(statement);
            if let Some(aaguid) = statement.aaguid {
                index
                    .by_aaguid
                    .insert(*aaguid.as_bytes(), Arc::clone(&statement));
            }
            if let Some(acki) = statement.acki.as_deref() {
                if let Ok(acki) = <[u8; ACKI_LENGTH]>::try_from(acki) {
                    index.by_acki.insert(acki, Arc::clone(&statement));
                }
            }
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.by_aaguid.is_empty() && self.by_acki.is_empty()
    }
}

impl MetadataSource for StaticMetadataIndex {
    fn by_aaguid(&self, aaguid: &[u8; AAGUID_LENGTH]) -> Option<Arc<MetadataStatement>> {
        self.by_aaguid.get(aaguid).cloned()
    }

    fn by_acki(&self, acki: &[u8; ACKI_LENGTH]) -> Option<Arc<MetadataStatement>> {
        self.by_acki.get(acki).cloned()
    }
}
