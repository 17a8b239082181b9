//! # Star Registry Core
//!
//! Pure primitives for the star registry ledger: blocks, canonical encoding,
//! chain validation and wallet ownership proofs.
//!
//! This crate contains no I/O, no storage, no async. It is pure computation
//! over hash-linked data.
//!
//! ## Key Types
//!
//! - [`Block`] - One sealed, hash-linked unit of ledger data
//! - [`UnsealedBlock`] - A block before the ledger assigns its position
//! - [`BlockPayload`] - Genesis marker or star submission
//! - [`BlockHash`] - Content hash (Blake3) used as identity and link target
//! - [`Challenge`] - A parsed ownership challenge
//!
//! ## Canonicalization
//!
//! Block bodies and the hashed header use deterministic CBOR. See the
//! [`canonical`] module.

pub mod block;
pub mod canonical;
pub mod challenge;
pub mod crypto;
pub mod error;
pub mod types;
pub mod validation;

pub use block::{Block, BlockPayload, StarRecord, UnsealedBlock, GENESIS_MARKER};
pub use canonical::canonical_header_bytes;
pub use challenge::{
    format_challenge, Challenge, Freshness, DEFAULT_CHALLENGE_WINDOW_SECS, DEFAULT_REGISTRY_TAG,
};
pub use crypto::{verify_message, Address, AddressKind, MessageSignature, Network, SignerKind};
pub use error::{CoreError, SignatureError, ValidationError};
pub use types::BlockHash;
pub use validation::{validate_block, validate_chain};
