//! Devote Core - Core types and cryptography
//!
//! This crate provides the foundational types for the Devote
//! delegated-proof-of-stake consensus engine: hashes, addresses,
//! recoverable ECDSA signatures and the block header model.

pub mod address;
pub mod error;
pub mod hash;
pub mod header;
pub mod keys;

pub use address::{Address, ADDRESS_LENGTH};
pub use error::CoreError;
pub use hash::{keccak256, H256};
pub use header::{empty_uncle_hash, Header, EXTRA_SEAL, EXTRA_VANITY};
pub use keys::{recover_signer, Keypair, Signature, SIGNATURE_LENGTH};
