//! Error types for WebAuthn ceremony verification.
//!
//! Every failure is classified by kind and surfaced as a single value; the
//! pipelines never retry or recover locally, so the first failing step
//! short-circuits the ceremony and its error reaches the caller unchanged.

use std::fmt;

/// Errors that can occur while generating challenges or verifying
/// registration and authentication ceremonies.
///
/// Format-specific variants carry the attestation statement format name
/// (`"packed"`, `"fido-u2f"`, ...) so callers can log or map them without
/// string parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebAuthnError {
    /// The attestation object, statement, or an embedded structure is not
    /// decodable CBOR.
    InvalidCbor,

    /// The authenticator-data blob violates its fixed binary layout.
    InvalidAuthenticatorData,

    /// The client-data blob is not the expected JSON document.
    InvalidClientDataJson,

    /// A COSE public key is malformed or inconsistent with its algorithm.
    InvalidCoseKey,

    /// The client data reports a different ceremony than the one underway.
    InvalidCeremonyType,

    /// The challenge echoed by the browser differs from the one issued.
    InvalidChallenge,

    /// The origin reported by the browser differs from the expected origin.
    InvalidOrigin,

    /// The relying-party identifier hash does not match, or a configured
    /// RP id is not a domain suffix of the origin host.
    InvalidRpId,

    /// The authenticator did not set the user-present flag.
    UserPresentFlagNotSet,

    /// Policy requires user verification and the flag is not set.
    UserNotVerified,

    /// The verified attestation type is not in the challenge's trusted set.
    UntrustedAttestationType,

    /// An assertion signature did not verify under the credential key.
    InvalidSignature,

    /// An attestation statement signature did not verify.
    AttestationInvalidSignature(&'static str),

    /// An attestation certificate failed its format-specific requirements.
    AttestationInvalidCertificate(&'static str),

    /// An attestation public key uses an algorithm the format forbids.
    AttestationInvalidPublicKeyAlgorithm(&'static str),

    /// The attestation statement map has the wrong shape for its format.
    AttestationStatementMalformed(&'static str),

    /// The SafetyNet payload nonce does not commit to this ceremony.
    AttestationSafetynetNonceMismatch,

    /// The SafetyNet payload reports `ctsProfileMatch: false`.
    AttestationSafetynetCtsProfileNotMatched,

    /// No trust-anchor entry was found for the attestation certificate.
    RootTrustCertificateNotFound(&'static str),

    /// A PKIX path could not be built from the trust path to any
    /// configured attestation root.
    AttestationChainNotTrusted(&'static str),

    /// No metadata statement is known for the authenticator's AAGUID.
    NoAttestationMetadataStatement,

    /// The metadata statement lists no usable attestation root certificate.
    NoAttestationRootCertificate,

    /// The asserted credential id is not in the challenge's allow-list.
    IncorrectCredentialId,

    /// The attestation object carries a `fmt` this library does not know.
    UnsupportedAttestationFormat(String),

    /// The format is recognised but its verification is not implemented.
    AttestationUnimplemented(&'static str),

    /// Challenge generation was asked to work from unusable configuration.
    InvalidConfiguration(String),

    /// The system CSPRNG could not produce challenge bytes.
    RandomFailure,
}

impl fmt::Display for WebAuthnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebAuthnError::InvalidCbor => write!(f, "invalid CBOR"),
            WebAuthnError::InvalidAuthenticatorData => write!(f, "invalid authenticator data"),
            WebAuthnError::InvalidClientDataJson => write!(f, "invalid client data JSON"),
            WebAuthnError::InvalidCoseKey => write!(f, "invalid COSE key"),
            WebAuthnError::InvalidCeremonyType => write!(f, "client data type mismatch"),
            WebAuthnError::InvalidChallenge => write!(f, "challenge mismatch"),
            WebAuthnError::InvalidOrigin => write!(f, "origin mismatch"),
            WebAuthnError::InvalidRpId => write!(f, "relying party id mismatch"),
            WebAuthnError::UserPresentFlagNotSet => write!(f, "user present flag not set"),
            WebAuthnError::UserNotVerified => write!(f, "user not verified"),
            WebAuthnError::UntrustedAttestationType => write!(f, "untrusted attestation type"),
            WebAuthnError::InvalidSignature => write!(f, "signature verification failed"),
            WebAuthnError::AttestationInvalidSignature(fmt_name) => {
                write!(f, "{fmt_name} attestation: invalid signature")
            }
            WebAuthnError::AttestationInvalidCertificate(fmt_name) => {
                write!(f, "{fmt_name} attestation: invalid attestation certificate")
            }
            WebAuthnError::AttestationInvalidPublicKeyAlgorithm(fmt_name) => {
                write!(f, "{fmt_name} attestation: invalid public key algorithm")
            }
            WebAuthnError::AttestationStatementMalformed(fmt_name) => {
                write!(f, "{fmt_name} attestation: malformed statement")
            }
            WebAuthnError::AttestationSafetynetNonceMismatch => {
                write!(f, "android-safetynet attestation: nonce mismatch")
            }
            WebAuthnError::AttestationSafetynetCtsProfileNotMatched => {
                write!(f, "android-safetynet attestation: CTS profile not matched")
            }
            WebAuthnError::RootTrustCertificateNotFound(fmt_name) => {
                write!(f, "{fmt_name} attestation: root trust certificate not found")
            }
            WebAuthnError::AttestationChainNotTrusted(fmt_name) => {
                write!(f, "{fmt_name} attestation: certificate chain not trusted")
            }
            WebAuthnError::NoAttestationMetadataStatement => {
                write!(f, "no attestation metadata statement found")
            }
            WebAuthnError::NoAttestationRootCertificate => {
                write!(f, "no attestation root certificate found")
            }
            WebAuthnError::IncorrectCredentialId => {
                write!(f, "credential id not in allow list")
            }
            WebAuthnError::UnsupportedAttestationFormat(fmt_name) => {
                write!(f, "unsupported attestation format: {fmt_name}")
            }
            WebAuthnError::AttestationUnimplemented(fmt_name) => {
                write!(f, "{fmt_name} attestation: not implemented")
            }
            WebAuthnError::InvalidConfiguration(msg) => {
                write!(f, "invalid configuration: {msg}")
            }
            WebAuthnError::RandomFailure => write!(f, "random source failure"),
        }
    }
}

impl std::error::Error for WebAuthnError {}
