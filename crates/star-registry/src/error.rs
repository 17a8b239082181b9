//! Error types for the Ledger.

use star_registry_core::{CoreError, SignatureError, ValidationError};
use star_registry_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Ledger operations.
///
/// Every variant is terminal for the request that produced it; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Requested height is negative or past the tip.
    #[error("invalid height {requested}: chain height is {current}")]
    InvalidHeight { requested: i64, current: u64 },

    /// No block matches the lookup.
    #[error("block not found: {0}")]
    NotFound(String),

    /// The address owns no stars.
    #[error("no stars found for address {0}")]
    NoStarsFound(String),

    /// The challenge is outside the freshness window or unreadable.
    #[error("challenge expired: {0}")]
    ChallengeExpired(String),

    /// The ownership proof does not check out.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    /// The challenge was already used for an earlier star.
    #[error("challenge already used: {0}")]
    ChallengeReused(String),

    /// A stored payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] CoreError),

    /// An append would have left the chain failing its own validator.
    #[error("chain integrity violated: {}", join_errors(.0))]
    ChainIntegrity(Vec<ValidationError>),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Whether this error signals a defect in the ledger itself rather than
    /// bad caller input.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, LedgerError::ChainIntegrity(_) | LedgerError::Store(_))
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for Ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use star_registry_core::BlockHash;

    #[test]
    fn test_chain_integrity_joins_messages() {
        let hash = BlockHash::from_bytes([0x01; 32]);
        let err = LedgerError::ChainIntegrity(vec![
            ValidationError::HashMismatch { height: 1, hash },
            ValidationError::BrokenLink { height: 2, hash },
        ]);

        let text = err.to_string();
        assert!(text.starts_with("chain integrity violated: "));
        assert!(text.contains("is invalid, "));
        assert!(text.contains("invalid previous-hash link"));
        assert!(err.is_integrity_failure());
    }

    #[test]
    fn test_user_errors_are_not_integrity_failures() {
        assert!(!LedgerError::NoStarsFound("1Abc".into()).is_integrity_failure());
        assert!(!LedgerError::InvalidHeight {
            requested: -1,
            current: 0
        }
        .is_integrity_failure());
    }
}
