//! In-memory implementation of the ChainStore trait.
//!
//! This is the store the ledger runs on. Nothing survives the process; the
//! chain is rebuilt from genesis on every start.

use std::collections::HashMap;

use async_trait::async_trait;

use star_registry_core::{Block, BlockHash};

use crate::error::{Result, StoreError};
use crate::traits::ChainStore;

/// In-memory store implementation.
///
/// Not internally synchronized: the owner (the ledger) wraps it in a lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Blocks in height order.
    blocks: Vec<Block>,

    /// Hash index: hash -> lowest height carrying it.
    by_hash: HashMap<BlockHash, u64>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load blocks exactly as given, without any checks.
    ///
    /// Used to audit chains obtained elsewhere; the ledger's validator
    /// reports whatever is wrong with them.
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        let mut by_hash = HashMap::with_capacity(blocks.len());
        for (position, block) in blocks.iter().enumerate() {
            by_hash.entry(block.hash).or_insert(position as u64);
        }
        Self { blocks, by_hash }
    }
}

#[async_trait]
impl ChainStore for MemoryStore {
    async fn push(&mut self, block: Block) -> Result<()> {
        let expected = self.blocks.len() as u64;
        if block.height != expected {
            return Err(StoreError::HeightConflict {
                expected,
                got: block.height,
            });
        }

        self.by_hash.entry(block.hash).or_insert(expected);
        self.blocks.push(block);
        Ok(())
    }

    async fn pop(&mut self) -> Result<Option<Block>> {
        let Some(block) = self.blocks.pop() else {
            return Ok(None);
        };

        let position = self.blocks.len() as u64;
        if self.by_hash.get(&block.hash) == Some(&position) {
            self.by_hash.remove(&block.hash);
        }
        tracing::debug!(height = position, hash = %block.hash, "block removed from store");
        Ok(Some(block))
    }

    async fn len(&self) -> Result<u64> {
        Ok(self.blocks.len() as u64)
    }

    async fn tip(&self) -> Result<Option<Block>> {
        Ok(self.blocks.last().cloned())
    }

    async fn get_by_height(&self, height: u64) -> Result<Option<Block>> {
        let Ok(index) = usize::try_from(height) else {
            return Ok(None);
        };
        Ok(self.blocks.get(index).cloned())
    }

    async fn get_by_hash(&self, hash: &BlockHash) -> Result<Option<Block>> {
        let Some(&height) = self.by_hash.get(hash) else {
            return Ok(None);
        };
        let block = self.blocks.get(height as usize).ok_or_else(|| {
            StoreError::InvalidData(format!("hash index points past the chain: {}", height))
        })?;
        Ok(Some(block.clone()))
    }

    async fn blocks(&self) -> Result<Vec<Block>> {
        Ok(self.blocks.clone())
    }
}
