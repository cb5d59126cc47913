//! Account envelope validation.
//!
//! Both the HTTP `getAccountInfo` result and the WS `accountNotification`
//! payload share the same shape:
//!
//! ```text
//! { "context": { "slot": 52287 },
//!   "value": {
//!     "data": ["<base64>", "base64"],
//!     "executable": false,
//!     "lamports": 1141440,
//!     "owner": "...",
//!     "rentEpoch": 0 } }
//! ```
//!
//! `parse_account_envelope` checks the structure and decodes the data blob;
//! whether the account may be used as a data account is a separate check so
//! the same parser serves the program-account verification at startup.

use base64::Engine as _;
use serde_json::Value;
use thiserror::Error;

/// Errors produced while decoding account payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The response carries no account value (account does not exist).
    #[error("account envelope has no value field")]
    MissingValue,

    /// A field the envelope must carry is absent or has the wrong type.
    #[error("malformed account envelope: {0}")]
    Malformed(String),

    /// The account is executable where a data account was expected.
    #[error("expected a data account but the account is executable")]
    ExecutableAccount,

    /// The base64 data blob failed to decode.
    #[error("account data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes do not match the fixed counter layout.
    #[error("account data length {actual} does not match counter layout ({expected} bytes)")]
    Length { expected: usize, actual: usize },
}

/// A validated, decoded account observation.
#[derive(Debug, Clone)]
pub struct AccountEnvelope {
    /// Slot at which the observation was taken.
    pub slot: u64,
    /// Account balance in lamports.
    pub lamports: u64,
    /// Whether the account holds executable program code.
    pub executable: bool,
    /// Raw account data, base64-decoded.
    pub data: Vec<u8>,
}

impl AccountEnvelope {
    /// Reject envelopes that cannot hold program state.
    pub fn require_data_account(&self) -> Result<&Self, CodecError> {
        if self.executable {
            return Err(CodecError::ExecutableAccount);
        }
        Ok(self)
    }
}

/// Parse a `{context, value}` account payload into an [`AccountEnvelope`].
pub fn parse_account_envelope(payload: &Value) -> Result<AccountEnvelope, CodecError> {
    let slot = payload
        .pointer("/context/slot")
        .and_then(Value::as_u64)
        .ok_or_else(|| CodecError::Malformed("missing context.slot".to_string()))?;

    let value = match payload.get("value") {
        Some(v) if !v.is_null() => v,
        _ => return Err(CodecError::MissingValue),
    };

    let executable = value
        .get("executable")
        .and_then(Value::as_bool)
        .ok_or_else(|| CodecError::Malformed("missing value.executable".to_string()))?;

    let lamports = value
        .get("lamports")
        .and_then(Value::as_u64)
        .ok_or_else(|| CodecError::Malformed("missing value.lamports".to_string()))?;

    let data_b64 = value
        .pointer("/data/0")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::Malformed("missing value.data[0]".to_string()))?;

    let data = base64::engine::general_purpose::STANDARD.decode(data_b64)?;

    Ok(AccountEnvelope {
        slot,
        lamports,
        executable,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(executable: bool) -> Value {
        json!({
            "context": { "slot": 52287 },
            "value": {
                "data": ["AQAAAAAAAAAAAAAAAAAAAAAAAAA=", "base64"],
                "executable": executable,
                "lamports": 1_141_440u64,
                "owner": "BPFLoaderUpgradeab1e11111111111111111111111",
                "rentEpoch": 0
            }
        })
    }

    #[test]
    fn parses_well_formed_envelope() {
        let env = parse_account_envelope(&sample(false)).unwrap();
        assert_eq!(env.slot, 52287);
        assert_eq!(env.lamports, 1_141_440);
        assert!(!env.executable);
        assert_eq!(env.data.len(), 20);
        assert!(env.require_data_account().is_ok());
    }

    #[test]
    fn rejects_executable_as_data_account() {
        let env = parse_account_envelope(&sample(true)).unwrap();
        assert!(matches!(
            env.require_data_account(),
            Err(CodecError::ExecutableAccount)
        ));
    }

    #[test]
    fn missing_value_is_typed_error() {
        let payload = json!({ "context": { "slot": 1 }, "value": null });
        assert!(matches!(
            parse_account_envelope(&payload),
            Err(CodecError::MissingValue)
        ));
    }

    #[test]
    fn garbage_base64_is_rejected() {
        let payload = json!({
            "context": { "slot": 1 },
            "value": {
                "data": ["not-base-64!!", "base64"],
                "executable": false,
                "lamports": 0
            }
        });
        assert!(matches!(
            parse_account_envelope(&payload),
            Err(CodecError::Base64(_))
        ));
    }
}
