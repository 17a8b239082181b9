//! The Ledger: the star registry's single-writer, hash-linked chain.
//!
//! The Ledger owns the block sequence, assigns heights, links every block to
//! its predecessor and re-validates the whole chain on each append. It also
//! runs the ownership workflow that gates star submissions.

use std::time::Duration;

use serde_json::Value as JsonValue;
use star_registry_core::{
    format_challenge, validation, verify_message, Block, BlockHash, BlockPayload, Challenge,
    Freshness, SignatureError, UnsealedBlock, ValidationError, DEFAULT_CHALLENGE_WINDOW_SECS,
    DEFAULT_REGISTRY_TAG, GENESIS_MARKER,
};
use star_registry_store::{ChainStore, MemoryStore};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::error::{LedgerError, Result};

/// Configuration for the Ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// How old a challenge may be when a star is submitted.
    pub challenge_window: Duration,
    /// Tag closing every challenge string.
    pub registry_tag: String,
    /// Marker stored in the genesis block.
    pub genesis_marker: String,
    /// Reject submissions whose challenge names a different address than
    /// the one the signature is checked against.
    pub require_matching_address: bool,
    /// Reject a challenge that already backs a block in the chain.
    pub single_use_challenges: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            challenge_window: Duration::from_secs(DEFAULT_CHALLENGE_WINDOW_SECS),
            registry_tag: DEFAULT_REGISTRY_TAG.to_string(),
            genesis_marker: GENESIS_MARKER.to_string(),
            require_matching_address: false,
            single_use_challenges: false,
        }
    }
}

/// The main Ledger struct.
///
/// Provides a unified API for:
/// - Registering stars behind a signed challenge (always re-validated)
/// - Querying blocks by height or hash
/// - Listing the stars owned by an address
/// - Issuing and checking ownership challenges
/// - Auditing the whole chain
///
/// Writers hold the store's write lock for the whole append, so readers see
/// the chain either before or after it, never in between.
///
/// [`Ledger::submit_star`] is the only way to add a star; raw blocks cannot
/// be appended from outside:
///
/// ```compile_fail
/// use star_registry::{Block, BlockPayload, Ledger};
///
/// async fn forge(ledger: &Ledger) {
///     let star = BlockPayload::star(serde_json::json!({}), "1Abc:0:starRegistry");
///     let _ = ledger.append(Block::create(&star)).await;
/// }
/// ```
pub struct Ledger<S: ChainStore = MemoryStore> {
    /// The block sequence.
    chain: RwLock<S>,
    /// Configuration.
    config: LedgerConfig,
}

impl Ledger<MemoryStore> {
    /// Create a ledger on a fresh in-memory store.
    pub async fn in_memory(config: LedgerConfig) -> Result<Self> {
        Self::new(MemoryStore::new(), config).await
    }
}

impl<S: ChainStore> Ledger<S> {
    /// Create a ledger over `store`.
    ///
    /// Returns only once the chain has its genesis block.
    pub async fn new(store: S, config: LedgerConfig) -> Result<Self> {
        let ledger = Self {
            chain: RwLock::new(store),
            config,
        };
        ledger.initialize().await?;
        Ok(ledger)
    }

    /// Get the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    async fn initialize(&self) -> Result<()> {
        let empty = self.chain.read().await.is_empty().await?;
        if empty {
            let genesis = Block::create(&BlockPayload::Genesis {
                marker: self.config.genesis_marker.clone(),
            });
            let block = self.append(genesis).await?;
            debug!(hash = %block.hash, "genesis block created");
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Append
    // ─────────────────────────────────────────────────────────────────────────

    /// Link, seal and store a block, then re-validate the chain.
    ///
    /// If validation reports anything the block is removed again and the
    /// violations are returned as [`LedgerError::ChainIntegrity`].
    async fn append(&self, block: UnsealedBlock) -> Result<Block> {
        let mut chain = self.chain.write().await;
        append_locked(&mut *chain, block).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Height of the newest block.
    pub async fn chain_height(&self) -> Result<u64> {
        let chain = self.chain.read().await;
        Ok(chain.len().await?.saturating_sub(1))
    }

    /// Get the block at `height`.
    pub async fn get_by_height(&self, height: i64) -> Result<Block> {
        let chain = self.chain.read().await;
        let current = chain.len().await?.saturating_sub(1);

        let requested = u64::try_from(height)
            .ok()
            .filter(|h| *h <= current)
            .ok_or(LedgerError::InvalidHeight {
                requested: height,
                current,
            })?;

        chain
            .get_by_height(requested)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("block at height {}", height)))
    }

    /// Get the block whose hash is `hash` (hex).
    pub async fn get_by_hash(&self, hash: &str) -> Result<Block> {
        let not_found = || LedgerError::NotFound(format!("block with hash {}", hash));

        let Ok(parsed) = hash.parse::<BlockHash>() else {
            debug!(hash, "lookup with malformed hash");
            return Err(not_found());
        };

        let chain = self.chain.read().await;
        chain.get_by_hash(&parsed).await?.ok_or_else(not_found)
    }

    /// Stars registered by `address`, in chain order.
    pub async fn get_stars_by_address(&self, address: &str) -> Result<Vec<JsonValue>> {
        let blocks = {
            let chain = self.chain.read().await;
            chain.blocks().await?
        };

        let mut stars = Vec::new();
        for block in blocks.iter().filter(|b| !b.is_genesis()) {
            if let BlockPayload::Star(record) = block.decode_payload()? {
                if record.owner() == address {
                    stars.push(record.star);
                }
            }
        }

        if stars.is_empty() {
            debug!(address, "no stars registered");
            return Err(LedgerError::NoStarsFound(address.to_string()));
        }
        Ok(stars)
    }

    /// Audit the whole chain. An empty list means it is intact.
    pub async fn validate_chain(&self) -> Result<Vec<ValidationError>> {
        let chain = self.chain.read().await;
        let blocks = chain.blocks().await?;
        Ok(validation::validate_chain(&blocks))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ownership Workflow
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue the message a wallet must sign to register a star.
    pub fn request_challenge(&self, address: &str) -> String {
        format_challenge(address, now_secs(), &self.config.registry_tag)
    }

    /// Register `star` for `address` after checking the signed challenge.
    ///
    /// Checks, in order: challenge age, (optionally) that the challenge names
    /// `address`, the Bitcoin message signature, and (optionally) that the
    /// challenge was not used before. Then appends the star block.
    pub async fn submit_star(
        &self,
        address: &str,
        message: &str,
        signature: &str,
        star: JsonValue,
    ) -> Result<Block> {
        let challenge = Challenge::parse(message);
        let window = self.config.challenge_window.as_secs();

        match challenge.freshness(now_secs(), window) {
            Freshness::Fresh { .. } => {}
            Freshness::Expired { elapsed } => {
                warn!(address, elapsed, window, "star rejected: challenge expired");
                return Err(LedgerError::ChallengeExpired(format!(
                    "issued {}s ago, window is {}s",
                    elapsed, window
                )));
            }
            Freshness::Unreadable => {
                warn!(address, message, "star rejected: unreadable challenge timestamp");
                return Err(LedgerError::ChallengeExpired(
                    "challenge timestamp is unreadable".into(),
                ));
            }
        }

        if self.config.require_matching_address && challenge.address != address {
            warn!(address, challenge = challenge.address, "star rejected: challenge for another address");
            return Err(SignatureError::ChallengeForOtherAddress {
                challenge: challenge.address.to_string(),
                address: address.to_string(),
            }
            .into());
        }

        if let Err(e) = verify_message(address, message, signature) {
            warn!(address, error = %e, "star rejected: bad signature");
            return Err(e.into());
        }

        let block = Block::create(&BlockPayload::star(star, message));

        let mut chain = self.chain.write().await;
        if self.config.single_use_challenges && challenge_used(&*chain, message).await? {
            warn!(address, "star rejected: challenge reused");
            return Err(LedgerError::ChallengeReused(message.to_string()));
        }
        append_locked(&mut *chain, block).await
    }
}

/// Append with the write lock already held.
async fn append_locked<S: ChainStore>(chain: &mut S, block: UnsealedBlock) -> Result<Block> {
    let previous_hash = chain.tip().await?.map(|tip| tip.hash);
    let height = chain.len().await?;
    let block = block.seal(height, now_secs(), previous_hash);

    chain.push(block.clone()).await?;

    let errors = validation::validate_chain(&chain.blocks().await?);
    if !errors.is_empty() {
        chain.pop().await?;
        error!(
            height,
            hash = %block.hash,
            violations = errors.len(),
            "append rolled back: chain failed validation"
        );
        return Err(LedgerError::ChainIntegrity(errors));
    }

    info!(height, hash = %block.hash, "block appended");
    Ok(block)
}

/// Whether a star block already carries `message`.
async fn challenge_used<S: ChainStore>(chain: &S, message: &str) -> Result<bool> {
    for block in chain.blocks().await? {
        if let BlockPayload::Star(record) = block.decode_payload()? {
            if record.message == message {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Get current time in whole seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_new_ledger_has_genesis() {
        let ledger = Ledger::in_memory(LedgerConfig::default()).await.unwrap();
        assert_eq!(ledger.chain_height().await.unwrap(), 0);

        let genesis = ledger.get_by_height(0).await.unwrap();
        assert!(genesis.previous_hash.is_none());
        assert_eq!(
            genesis.decode_payload().unwrap(),
            BlockPayload::Genesis {
                marker: "Genesis Block".into()
            }
        );
    }

    #[tokio::test]
    async fn test_custom_genesis_marker() {
        let config = LedgerConfig {
            genesis_marker: "First Light".into(),
            ..LedgerConfig::default()
        };
        let ledger = Ledger::in_memory(config).await.unwrap();
        let genesis = ledger.get_by_height(0).await.unwrap();
        assert_eq!(
            genesis.decode_payload().unwrap(),
            BlockPayload::Genesis {
                marker: "First Light".into()
            }
        );
    }

    #[tokio::test]
    async fn test_existing_chain_is_not_reinitialized() {
        let genesis = Block::create(&BlockPayload::genesis()).seal(0, 1, None);
        let store = MemoryStore::with_blocks(vec![genesis.clone()]);

        let ledger = Ledger::new(store, LedgerConfig::default()).await.unwrap();
        assert_eq!(ledger.chain_height().await.unwrap(), 0);
        assert_eq!(ledger.get_by_height(0).await.unwrap(), genesis);
    }

    #[tokio::test]
    async fn test_append_links_blocks() {
        let ledger = Ledger::in_memory(LedgerConfig::default()).await.unwrap();
        let genesis = ledger.get_by_height(0).await.unwrap();

        let block = ledger
            .append(Block::create(&BlockPayload::star(json!(1), "1Abc:0:starRegistry")))
            .await
            .unwrap();

        assert_eq!(block.height, 1);
        assert_eq!(block.previous_hash, Some(genesis.hash));
        assert!(block.self_validate());
    }

    #[tokio::test]
    async fn test_append_on_corrupt_chain_rolls_back() {
        let genesis = Block::create(&BlockPayload::genesis()).seal(0, 1, None);
        let mut forged = Block::create(&BlockPayload::star(json!(1), "1Abc:0:starRegistry"))
            .seal(1, 2, Some(genesis.hash));
        forged.timestamp = 3;
        let store = MemoryStore::with_blocks(vec![genesis, forged]);

        let ledger = Ledger::new(store, LedgerConfig::default()).await.unwrap();
        let result = ledger
            .append(Block::create(&BlockPayload::star(json!(2), "1Abc:0:starRegistry")))
            .await;

        match result {
            Err(LedgerError::ChainIntegrity(errors)) => {
                assert!(matches!(
                    errors.as_slice(),
                    [ValidationError::HashMismatch { height: 1, .. }]
                ));
            }
            other => panic!("expected ChainIntegrity, got {:?}", other),
        }
        assert_eq!(ledger.chain_height().await.unwrap(), 1);
        assert_eq!(ledger.validate_chain().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_request_challenge_format() {
        let ledger = Ledger::in_memory(LedgerConfig::default()).await.unwrap();
        let before = now_secs();
        let message = ledger.request_challenge("1Abc");
        let after = now_secs();

        let challenge = Challenge::parse(&message);
        assert_eq!(challenge.address, "1Abc");
        assert_eq!(challenge.tag, Some("starRegistry"));
        let issued = challenge.issued_at.unwrap();
        assert!(before <= issued && issued <= after);
    }
}
