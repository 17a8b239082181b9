//! Error types for the star registry core.

use thiserror::Error;

use crate::types::BlockHash;

/// Errors from encoding or decoding block contents.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Reasons a Bitcoin signed-message proof is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature is not valid base64")]
    InvalidEncoding,

    #[error("signature must be 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("signature header byte {0} is out of range")]
    InvalidHeader(u8),

    #[error("signature does not recover a public key")]
    RecoveryFailed,

    #[error("address {0} is not a valid base58check or bech32 address")]
    InvalidAddress(String),

    #[error("address {0} uses an unsupported format")]
    UnsupportedAddress(String),

    #[error("signature was not produced by the key behind {0}")]
    AddressMismatch(String),

    #[error("challenge was issued for {challenge}, not {address}")]
    ChallengeForOtherAddress { challenge: String, address: String },
}

/// One integrity violation found while validating the chain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("block {hash} is invalid: stored hash does not match its contents")]
    HashMismatch { height: u64, hash: BlockHash },

    #[error("block {hash} has an invalid previous-hash link")]
    BrokenLink { height: u64, hash: BlockHash },

    #[error("block {hash} sits at position {expected} but claims height {got}")]
    HeightMismatch {
        hash: BlockHash,
        expected: u64,
        got: u64,
    },

    #[error("genesis block {0} must not carry a previous hash")]
    GenesisHasPrevious(BlockHash),

    #[error("block {hash} at height {height} repeats the hash of height {first}")]
    DuplicateHash {
        hash: BlockHash,
        first: u64,
        height: u64,
    },
}

impl ValidationError {
    /// Height of the block the violation was found on.
    pub fn height(&self) -> u64 {
        match self {
            ValidationError::HashMismatch { height, .. }
            | ValidationError::BrokenLink { height, .. }
            | ValidationError::DuplicateHash { height, .. } => *height,
            ValidationError::HeightMismatch { expected, .. } => *expected,
            ValidationError::GenesisHasPrevious(_) => 0,
        }
    }
}
