//! Block: one immutable, hash-linked unit of ledger data.
//!
//! A block starts life as an [`UnsealedBlock`] holding only its encoded
//! payload. The ledger seals it by fixing height, timestamp and previous hash,
//! which also fixes the content hash. Once sealed it is never edited.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::canonical::{canonical_header_bytes, decode_payload, encode_payload};
use crate::error::CoreError;
use crate::types::BlockHash;

/// The marker carried by the genesis block unless configured otherwise.
pub const GENESIS_MARKER: &str = "Genesis Block";

/// Decoded block payload.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockPayload {
    /// Fixed payload of the first block.
    Genesis { marker: String },
    /// A star registered by a wallet.
    Star(StarRecord),
}

impl BlockPayload {
    /// The default genesis payload.
    pub fn genesis() -> Self {
        Self::Genesis {
            marker: GENESIS_MARKER.to_string(),
        }
    }

    /// Build a star payload.
    pub fn star(star: JsonValue, message: impl Into<String>) -> Self {
        Self::Star(StarRecord {
            star,
            message: message.into(),
        })
    }

    /// Get the star record, if this is one.
    pub fn as_star(&self) -> Option<&StarRecord> {
        match self {
            BlockPayload::Star(record) => Some(record),
            BlockPayload::Genesis { .. } => None,
        }
    }
}

/// A star submission: the client's star data plus the challenge it signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRecord {
    /// Opaque star data supplied by the client.
    pub star: JsonValue,
    /// The signed ownership challenge.
    pub message: String,
}

impl StarRecord {
    /// The wallet address embedded at the front of the challenge.
    pub fn owner(&self) -> &str {
        self.message.split(':').next().unwrap_or_default()
    }
}

/// A block whose linkage fields are not yet assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsealedBlock {
    body: Bytes,
}

impl UnsealedBlock {
    /// The encoded payload.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Fix the remaining fields and compute the content hash.
    pub fn seal(self, height: u64, timestamp: i64, previous_hash: Option<BlockHash>) -> Block {
        let hash = compute_hash(height, timestamp, previous_hash.as_ref(), &self.body);
        Block {
            height,
            timestamp,
            previous_hash,
            body: self.body,
            hash,
        }
    }
}

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Zero-based position in the chain.
    pub height: u64,

    /// Seconds since the Unix epoch at append time.
    pub timestamp: i64,

    /// Hash of the preceding block (None only for genesis).
    pub previous_hash: Option<BlockHash>,

    /// Canonical CBOR encoding of the payload.
    #[serde(with = "hex_body")]
    pub body: Bytes,

    /// Blake3 hash over (height, timestamp, previous_hash, body).
    pub hash: BlockHash,
}

impl Block {
    /// Start a block from a decoded payload.
    pub fn create(payload: &BlockPayload) -> UnsealedBlock {
        UnsealedBlock {
            body: encode_payload(payload).into(),
        }
    }

    /// Recompute the content hash from the current field values.
    pub fn compute_hash(&self) -> BlockHash {
        compute_hash(
            self.height,
            self.timestamp,
            self.previous_hash.as_ref(),
            &self.body,
        )
    }

    /// Check that the stored hash matches the block's contents.
    pub fn self_validate(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Decode the stored payload.
    pub fn decode_payload(&self) -> Result<BlockPayload, CoreError> {
        decode_payload(&self.body)
    }

    /// Check if this is the first block.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }
}

fn compute_hash(
    height: u64,
    timestamp: i64,
    previous_hash: Option<&BlockHash>,
    body: &[u8],
) -> BlockHash {
    BlockHash::digest(&canonical_header_bytes(height, timestamp, previous_hash, body))
}

/// Serde adapter writing the body as hex text.
mod hex_body {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
