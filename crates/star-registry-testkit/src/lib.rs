//! # Star Registry Testkit
//!
//! Testing utilities for the star registry.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Wallets that sign challenges like real Bitcoin wallets,
//!   and hand-built chains for audit tests
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! ```rust
//! use star_registry_testkit::fixtures::Wallet;
//!
//! let wallet = Wallet::from_seed([1u8; 32]);
//! let (message, signature) = wallet.signed_challenge(1736870400);
//! assert!(message.starts_with(&wallet.address()));
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use star_registry_testkit::generators::{star, wallet};
//!
//! proptest! {
//!     #[test]
//!     fn signatures_verify(w in wallet()) {
//!         let sig = w.sign("hello");
//!         prop_assert!(star_registry_core::verify_message(&w.address(), "hello", &sig).is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{multi_wallet_fixtures, now_secs, sealed_chain, AddressStyle, Wallet};
