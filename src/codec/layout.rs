//! Fixed-layout decode of the counter account and instruction encoding.

use crate::codec::envelope::CodecError;

/// Serialized size of the counter account: u32 counter + i64 timestamp
/// + i64 client timestamp, all little-endian.
pub const COUNTER_ACCOUNT_LEN: usize = 4 + 8 + 8;

/// Instruction tag for the counter increment. The program rejects tag 0
/// as invalid.
pub const INCREMENT_TAG: u8 = 1;
/// Instruction tag for closing the data account.
pub const CLOSE_ACCOUNT_TAG: u8 = 2;

/// Decoded on-chain counter state. Immutable; one fresh instance per
/// observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterAccountSnapshot {
    /// Number of increments processed by the program.
    pub counter: u32,
    /// Validator clock at the last update (unix seconds).
    pub block_timestamp: i64,
    /// Echo of the client-supplied timestamp from the triggering instruction.
    pub client_timestamp: i64,
}

/// Decode the raw account bytes into a [`CounterAccountSnapshot`].
///
/// Fails when the byte length does not match the fixed layout.
pub fn decode_counter_account(bytes: &[u8]) -> Result<CounterAccountSnapshot, CodecError> {
    if bytes.len() != COUNTER_ACCOUNT_LEN {
        return Err(CodecError::Length {
            expected: COUNTER_ACCOUNT_LEN,
            actual: bytes.len(),
        });
    }

    // Slice bounds are guaranteed by the length check above.
    let mut counter = [0u8; 4];
    counter.copy_from_slice(&bytes[0..4]);
    let mut block_timestamp = [0u8; 8];
    block_timestamp.copy_from_slice(&bytes[4..12]);
    let mut client_timestamp = [0u8; 8];
    client_timestamp.copy_from_slice(&bytes[12..20]);

    let counter = u32::from_le_bytes(counter);
    let block_timestamp = i64::from_le_bytes(block_timestamp);
    let client_timestamp = i64::from_le_bytes(client_timestamp);

    Ok(CounterAccountSnapshot {
        counter,
        block_timestamp,
        client_timestamp,
    })
}

/// Encode the increment instruction payload: tag byte followed by the
/// client timestamp in little-endian seconds.
pub fn encode_increment_instruction(client_timestamp: i64) -> Vec<u8> {
    let mut data = Vec::with_capacity(1 + 8);
    data.push(INCREMENT_TAG);
    data.extend_from_slice(&client_timestamp.to_le_bytes());
    data
}

/// Encode the close-account instruction payload (tag only).
pub fn encode_close_instruction() -> Vec<u8> {
    vec![CLOSE_ACCOUNT_TAG]
}
