//! Transaction building and signing.
//!
//! # Responsibilities
//! - Compile instructions into a legacy wire message
//! - Sign messages with the required keypairs
//! - Encode the counter and system-program instructions
//!
//! The wire layout is the legacy format: a 3-byte header, compact-length
//! ("shortvec") account key array, the recent blockhash, and compact-length
//! instruction array. Transaction ids are the base58 of the first signature.

use base64::Engine as _;
use thiserror::Error;

use crate::codec::layout;
use crate::rpc::types::{Blockhash, Pubkey};
use crate::rpc::wallet::{self, Wallet};

/// Errors raised while compiling or signing a transaction.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("account {0} must sign but no keypair was provided")]
    MissingSigner(Pubkey),

    #[error("transaction references {0} accounts, the wire format allows 256")]
    TooManyAccounts(usize),
}

/// How one instruction touches one account.
#[derive(Debug, Clone)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool, is_writable: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable,
        }
    }
}

/// A single program invocation before compilation.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct CompiledInstruction {
    program_id_index: u8,
    account_indexes: Vec<u8>,
    data: Vec<u8>,
}

/// A compiled message ready to be serialized and signed.
#[derive(Debug, Clone)]
pub struct CompiledMessage {
    num_required_signatures: u8,
    num_readonly_signed: u8,
    num_readonly_unsigned: u8,
    account_keys: Vec<Pubkey>,
    recent_blockhash: Blockhash,
    instructions: Vec<CompiledInstruction>,
}

impl CompiledMessage {
    /// Compile instructions against a fee payer and blockhash.
    ///
    /// Account keys are ordered writable signers first (fee payer leading),
    /// then readonly signers, writable non-signers and readonly non-signers;
    /// duplicate references merge their signer/writable flags.
    pub fn compile(
        fee_payer: &Pubkey,
        instructions: &[Instruction],
        recent_blockhash: Blockhash,
    ) -> Result<Self, TxError> {
        let mut metas: Vec<AccountMeta> = vec![AccountMeta::new(*fee_payer, true, true)];

        let mut merge = |meta: AccountMeta| {
            if let Some(existing) = metas.iter_mut().find(|m| m.pubkey == meta.pubkey) {
                existing.is_signer |= meta.is_signer;
                existing.is_writable |= meta.is_writable;
            } else {
                metas.push(meta);
            }
        };
        for instruction in instructions {
            for meta in &instruction.accounts {
                merge(meta.clone());
            }
            merge(AccountMeta::new(instruction.program_id, false, false));
        }

        // Stable partition keeps the fee payer at index 0.
        let mut ordered: Vec<AccountMeta> = Vec::with_capacity(metas.len());
        for (signer, writable) in [(true, true), (true, false), (false, true), (false, false)] {
            ordered.extend(
                metas
                    .iter()
                    .filter(|m| m.is_signer == signer && m.is_writable == writable)
                    .cloned(),
            );
        }

        if ordered.len() > u8::MAX as usize + 1 {
            return Err(TxError::TooManyAccounts(ordered.len()));
        }

        let num_required_signatures = ordered.iter().filter(|m| m.is_signer).count() as u8;
        let num_readonly_signed = ordered
            .iter()
            .filter(|m| m.is_signer && !m.is_writable)
            .count() as u8;
        let num_readonly_unsigned = ordered
            .iter()
            .filter(|m| !m.is_signer && !m.is_writable)
            .count() as u8;

        let account_keys: Vec<Pubkey> = ordered.iter().map(|m| m.pubkey).collect();
        let index_of = |key: &Pubkey| -> u8 {
            // The key is always present: every referenced account was merged
            // into `ordered` above.
            account_keys.iter().position(|k| k == key).unwrap_or(0) as u8
        };

        let compiled = instructions
            .iter()
            .map(|instruction| CompiledInstruction {
                program_id_index: index_of(&instruction.program_id),
                account_indexes: instruction
                    .accounts
                    .iter()
                    .map(|m| index_of(&m.pubkey))
                    .collect(),
                data: instruction.data.clone(),
            })
            .collect();

        Ok(Self {
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    /// Serialize the message for signing and wire transfer.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        out.push(self.num_required_signatures);
        out.push(self.num_readonly_signed);
        out.push(self.num_readonly_unsigned);

        encode_len(&mut out, self.account_keys.len());
        for key in &self.account_keys {
            out.extend_from_slice(&key.0);
        }

        out.extend_from_slice(&self.recent_blockhash.0);

        encode_len(&mut out, self.instructions.len());
        for instruction in &self.instructions {
            out.push(instruction.program_id_index);
            encode_len(&mut out, instruction.account_indexes.len());
            out.extend_from_slice(&instruction.account_indexes);
            encode_len(&mut out, instruction.data.len());
            out.extend_from_slice(&instruction.data);
        }
        out
    }

    /// Sign with the provided keypairs, matched to the required signer keys
    /// by public key.
    pub fn sign(&self, wallets: &[&Wallet]) -> Result<SignedTransaction, TxError> {
        let message = self.serialize();
        let mut signatures: Vec<[u8; 64]> =
            Vec::with_capacity(self.num_required_signatures as usize);

        for key in &self.account_keys[..self.num_required_signatures as usize] {
            let wallet = wallets
                .iter()
                .find(|w| w.pubkey() == *key)
                .ok_or(TxError::MissingSigner(*key))?;
            signatures.push(wallet.sign(&message));
        }

        let mut bytes = Vec::with_capacity(1 + signatures.len() * 64 + message.len());
        encode_len(&mut bytes, signatures.len());
        for signature in &signatures {
            bytes.extend_from_slice(signature);
        }
        bytes.extend_from_slice(&message);

        let first_signature = signatures.first().copied().unwrap_or([0u8; 64]);
        Ok(SignedTransaction {
            bytes,
            first_signature,
        })
    }
}

/// A fully signed transaction ready for submission.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    bytes: Vec<u8>,
    first_signature: [u8; 64],
}

impl SignedTransaction {
    /// Base64 wire encoding used by `sendTransaction`.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// The transaction id (base58 of the first signature).
    pub fn id(&self) -> String {
        bs58::encode(self.first_signature).into_string()
    }

    /// Serialized length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Compact-u16 length prefix (7-bit little-endian varint).
fn encode_len(out: &mut Vec<u8>, len: usize) {
    let mut rem = len as u16;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            break;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

/// Build and sign a counter-increment transaction.
///
/// Account order matches what the program verifies: the data account first
/// (writable), then the program keypair as signer.
pub fn increment_counter_transaction(
    payer: &Wallet,
    program: &Wallet,
    data_account: &Pubkey,
    client_timestamp: i64,
    recent_blockhash: Blockhash,
) -> Result<SignedTransaction, TxError> {
    let instruction = Instruction {
        program_id: program.pubkey(),
        accounts: vec![
            AccountMeta::new(*data_account, false, true),
            AccountMeta::new(program.pubkey(), true, false),
        ],
        data: layout::encode_increment_instruction(client_timestamp),
    };
    let message = CompiledMessage::compile(&payer.pubkey(), &[instruction], recent_blockhash)?;
    message.sign(&[payer, program])
}

/// Build and sign a system-program `CreateAccountWithSeed` transaction for
/// the counter data account.
pub fn create_data_account_transaction(
    payer: &Wallet,
    program_id: &Pubkey,
    data_account: &Pubkey,
    lamports: u64,
    space: u64,
    recent_blockhash: Blockhash,
) -> Result<SignedTransaction, TxError> {
    // Bincode layout: u32 tag (3 = CreateAccountWithSeed), base pubkey,
    // length-prefixed seed, lamports, space, owner.
    let seed = wallet::DERIVED_ADDRESS_SEED;
    let mut data = Vec::with_capacity(4 + 32 + 8 + seed.len() + 8 + 8 + 32);
    data.extend_from_slice(&3u32.to_le_bytes());
    data.extend_from_slice(&payer.pubkey().0);
    data.extend_from_slice(&(seed.len() as u64).to_le_bytes());
    data.extend_from_slice(seed.as_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    data.extend_from_slice(&space.to_le_bytes());
    data.extend_from_slice(&program_id.0);

    let instruction = Instruction {
        program_id: Pubkey::system_program(),
        accounts: vec![
            AccountMeta::new(payer.pubkey(), true, true),
            AccountMeta::new(*data_account, false, true),
        ],
        data,
    };
    let message = CompiledMessage::compile(&payer.pubkey(), &[instruction], recent_blockhash)?;
    message.sign(&[payer])
}
