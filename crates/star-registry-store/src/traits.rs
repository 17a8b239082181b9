//! Store trait: the abstract interface for the block sequence.
//!
//! The ledger owns exactly one store and serializes access to it: reads go
//! through `&self`, the two mutations through `&mut self`.

use async_trait::async_trait;
use star_registry_core::{Block, BlockHash};

use crate::error::Result;

/// The ChainStore trait: async interface over an ordered block sequence.
///
/// All methods are async so backends that do I/O fit behind the same seam.
///
/// # Design Notes
///
/// - **Dense heights**: `push` only accepts the block whose height equals
///   the current length.
/// - **Undo**: `pop` removes the newest block; the ledger uses it to roll
///   back an append that failed validation.
/// - **First match**: `get_by_hash` returns the lowest block with that hash.
#[async_trait]
pub trait ChainStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a block at the end of the sequence.
    async fn push(&mut self, block: Block) -> Result<()>;

    /// Remove and return the newest block.
    async fn pop(&mut self) -> Result<Option<Block>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Number of blocks stored.
    async fn len(&self) -> Result<u64>;

    /// Whether the store holds no blocks.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// The newest block.
    async fn tip(&self) -> Result<Option<Block>>;

    /// Block at a height.
    async fn get_by_height(&self, height: u64) -> Result<Option<Block>>;

    /// First block carrying a hash.
    async fn get_by_hash(&self, hash: &BlockHash) -> Result<Option<Block>>;

    /// Every block, in height order.
    async fn blocks(&self) -> Result<Vec<Block>>;
}
