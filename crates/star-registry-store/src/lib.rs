//! # Star Registry Store
//!
//! Storage abstraction for the star registry ledger. Provides a trait-based
//! interface over the ordered block sequence, with an in-memory
//! implementation.
//!
//! ## Key Types
//!
//! - [`ChainStore`] - The async trait for all storage operations
//! - [`MemoryStore`] - In-memory storage; the chain lives for the process
//!
//! ## Usage
//!
//! ```rust,no_run
//! use star_registry_core::{Block, BlockPayload};
//! use star_registry_store::{ChainStore, MemoryStore};
//!
//! async fn example() {
//!     let mut store = MemoryStore::new();
//!     let genesis = Block::create(&BlockPayload::genesis()).seal(0, 0, None);
//!     store.push(genesis).await.unwrap();
//!     assert_eq!(store.len().await.unwrap(), 1);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Dense heights**: a block is only accepted at the next free height
//! - **Single owner**: stores are not internally locked; the ledger
//!   serializes writers around them

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use traits::ChainStore;
