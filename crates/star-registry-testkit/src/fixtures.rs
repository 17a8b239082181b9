//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: wallets that sign challenges the
//! way real Bitcoin wallets do, and hand-built chains for audit tests.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde_json::Value as JsonValue;
use star_registry_core::{
    format_challenge, Address, Block, BlockPayload, MessageSignature, Network, SignerKind,
    DEFAULT_REGISTRY_TAG,
};

/// Address format a wallet signs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStyle {
    /// `1...` address over the compressed key.
    Legacy,
    /// `1...` address over the uncompressed key.
    LegacyUncompressed,
    /// `3...` address wrapping a segwit key hash.
    NestedSegwit,
    /// `bc1q...` native segwit key hash.
    NativeSegwit,
}

/// A test wallet holding one secp256k1 key.
#[derive(Clone)]
pub struct Wallet {
    secret: SecretKey,
    style: AddressStyle,
    network: Network,
}

impl Wallet {
    /// Create a wallet with a random key.
    pub fn new() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// Create with a deterministic key from seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let mut rng = StdRng::from_seed(seed);
        let secret = loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            if let Ok(secret) = SecretKey::from_slice(&bytes) {
                break secret;
            }
        };
        Self {
            secret,
            style: AddressStyle::Legacy,
            network: Network::Mainnet,
        }
    }

    /// Switch the address format.
    pub fn with_style(mut self, style: AddressStyle) -> Self {
        self.style = style;
        self
    }

    /// Use testnet addresses.
    pub fn testnet(mut self) -> Self {
        self.network = Network::Testnet;
        self
    }

    /// The wallet's public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&Secp256k1::signing_only(), &self.secret)
    }

    /// The wallet's address in its style's encoding.
    pub fn address(&self) -> String {
        let pubkey = self.public_key();
        let address = match self.style {
            AddressStyle::Legacy => Address::p2pkh(&pubkey, true, self.network),
            AddressStyle::LegacyUncompressed => Address::p2pkh(&pubkey, false, self.network),
            AddressStyle::NestedSegwit => Address::p2sh_p2wpkh(&pubkey, self.network),
            AddressStyle::NativeSegwit => Address::p2wpkh(&pubkey, self.network),
        };
        address.to_string()
    }

    /// Sign a message; returns the base64 signature a wallet would print.
    pub fn sign(&self, message: &str) -> String {
        let kind = match self.style {
            AddressStyle::Legacy => SignerKind::P2pkhCompressed,
            AddressStyle::LegacyUncompressed => SignerKind::P2pkhUncompressed,
            AddressStyle::NestedSegwit => SignerKind::P2shP2wpkh,
            AddressStyle::NativeSegwit => SignerKind::P2wpkh,
        };
        MessageSignature::sign(&self.secret, message, kind).to_base64()
    }

    /// Build a challenge for this wallet issued at `issued_at` and sign it.
    ///
    /// Returns `(message, signature)`.
    pub fn signed_challenge(&self, issued_at: i64) -> (String, String) {
        let message = format_challenge(&self.address(), issued_at, DEFAULT_REGISTRY_TAG);
        let signature = self.sign(&message);
        (message, signature)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Create multiple deterministic wallets for multi-party tests.
pub fn multi_wallet_fixtures(count: usize) -> Vec<Wallet> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[..8].copy_from_slice(&(i as u64).to_le_bytes());
            Wallet::from_seed(seed)
        })
        .collect()
}

/// A correctly linked chain: genesis followed by one block per star, all
/// owned by `wallet`. Timestamps count up from `start`.
pub fn sealed_chain(wallet: &Wallet, stars: &[JsonValue], start: i64) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::with_capacity(stars.len() + 1);
    blocks.push(Block::create(&BlockPayload::genesis()).seal(0, start, None));

    for (i, star) in stars.iter().enumerate() {
        let height = i as u64 + 1;
        let timestamp = start + height as i64;
        let (message, _) = wallet.signed_challenge(timestamp);
        let previous = blocks.last().map(|b| b.hash);
        let block = Block::create(&BlockPayload::star(star.clone(), message))
            .seal(height, timestamp, previous);
        blocks.push(block);
    }
    blocks
}

/// Get current time in seconds.
pub fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}
