//! # Star Registry
//!
//! A hash-linked ledger of star registrations. Each star is stored in its own
//! block, tied to the Bitcoin address that proved ownership by signing a
//! short-lived challenge.
//!
//! ## Overview
//!
//! - **Blocks**: Sealed with a content hash and linked to their predecessor
//! - **Chain**: Starts with a genesis block; heights are dense from zero
//! - **Audit**: The whole chain is re-validated on every append
//! - **Ownership**: Challenges expire after a window; signatures use the
//!   Bitcoin signed-message scheme
//!
//! ## Usage
//!
//! ```rust,no_run
//! use star_registry::{Ledger, LedgerConfig};
//! use serde_json::json;
//!
//! async fn example(address: &str, sign: impl Fn(&str) -> String) {
//!     let ledger = Ledger::in_memory(LedgerConfig::default()).await.unwrap();
//!
//!     // The wallet signs the challenge
//!     let message = ledger.request_challenge(address);
//!     let signature = sign(&message);
//!
//!     // Register the star
//!     let star = json!({ "dec": "89° 15' 51\"", "ra": "2h 31m 49s", "story": "Polaris" });
//!     ledger.submit_star(address, &message, &signature, star).await.unwrap();
//!
//!     let stars = ledger.get_stars_by_address(address).await.unwrap();
//!     assert_eq!(stars.len(), 1);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `star_registry::core` - Core primitives (Block, BlockHash, signatures)
//! - `star_registry::store` - Storage abstraction

pub mod error;
pub mod ledger;

// Re-export component crates
pub use star_registry_core as core;
pub use star_registry_store as store;

// Re-export main types for convenience
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, LedgerConfig};

// Re-export commonly used core types
pub use star_registry_core::{
    Block, BlockHash, BlockPayload, SignatureError, StarRecord, UnsealedBlock, ValidationError,
};
