// Wire-format constants shared across the parsing and verification layers.

/// Length of the server-generated challenge nonce.
pub const CHALLENGE_LENGTH: usize = 32;

/// Length of the SHA-256 relying-party identifier hash.
pub const RP_ID_HASH_LENGTH: usize = 32;

/// Length of an authenticator model identifier (AAGUID).
pub const AAGUID_LENGTH: usize = 16;

/// Length of an attestation-certificate key identifier (SHA-1).
pub const ACKI_LENGTH: usize = 20;

pub const FLAG_USER_PRESENT: u8 = 0b0000_0001;
pub const FLAG_USER_VERIFIED: u8 = 0b0000_0100;
pub const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 0b0100_0000;
pub const FLAG_EXTENSION_DATA: u8 = 0b1000_0000;

pub const FORMAT_NONE: &str = "none";
pub const FORMAT_PACKED: &str = "packed";
pub const FORMAT_FIDO_U2F: &str = "fido-u2f";
pub const FORMAT_ANDROID_SAFETYNET: &str = "android-safetynet";
pub const FORMAT_TPM: &str = "tpm";

pub const CLIENT_DATA_TYPE_CREATE: &str = "webauthn.create";
pub const CLIENT_DATA_TYPE_GET: &str = "webauthn.get";

pub const COSE_KEY_TYPE_OKP: i128 = 1;
pub const COSE_KEY_TYPE_EC2: i128 = 2;
pub const COSE_KEY_TYPE_RSA: i128 = 3;

pub const COSE_ALG_ES256: i128 = -7;
pub const COSE_ALG_EDDSA: i128 = -8;
pub const COSE_ALG_RS256: i128 = -257;

pub const COSE_EC2_CURVE_P256: i128 = 1;
pub const COSE_OKP_CURVE_ED25519: i128 = 6;

/// Coordinate length for P-256 points and Ed25519 public keys.
pub const COSE_COORDINATE_LENGTH: usize = 32;
