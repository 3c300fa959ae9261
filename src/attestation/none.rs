//! The `none` attestation statement format.
//!
//! Used when the relying party asked for no attestation or the
//! authenticator has none to give. The statement must be an empty map.

use ciborium::value::Value;

use super::{AttestationResult, AttestationType};
use crate::cbor;
use crate::constants::FORMAT_NONE;
use crate::errors::WebAuthnError;

pub(crate) fn parse(att_stmt: &Value) -> Result<(), WebAuthnError> {
    let entries = cbor::as_map(att_stmt)
        .map_err(|_| WebAuthnError::AttestationStatementMalformed(FORMAT_NONE))?;
    if !entries.is_empty() {
        return Err(WebAuthnError::AttestationStatementMalformed(FORMAT_NONE));
    }
    Ok(())
}

pub(crate) fn verify() -> Result<AttestationResult, WebAuthnError> {
    Ok(AttestationResult {
        attestation_type: AttestationType::None,
        trust_path: Vec::new(),
        metadata: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_the_empty_map() {
        assert!(parse(&Value::Map(Vec::new())).is_ok());

        let nonempty = Value::Map(vec![(
            Value::Text("alg".to_string()),
            Value::Integer((-7).into()),
        )]);
        assert_eq!(
            parse(&nonempty),
            Err(WebAuthnError::AttestationStatementMalformed("none"))
        );
        assert_eq!(
            parse(&Value::Text("none".to_string())),
            Err(WebAuthnError::AttestationStatementMalformed("none"))
        );
    }
}
