//! Devote Consensus - Delegated-proof-of-stake engine
//!
//! This crate provides slot-based witness scheduling, header and seal
//! validation, block sealing, supermajority finality tracking and
//! per-witness mint-count accounting.

pub mod chain;
pub mod engine;
pub mod error;
pub mod finality;
pub mod mint;
pub mod sigcache;
pub mod slot;

pub use chain::{ChainReader, ContextFactory, EpochContext, ForkRules, SealSigner};
pub use engine::Devote;
pub use error::ConsensusError;
pub use finality::{FinalityTracker, CONFIRMED_BLOCK_HEAD_KEY};
pub use mint::{update_mint_count, MintCountLedger, StorageMintLedger};
pub use sigcache::{SignatureCache, INMEMORY_SIGNATURES};
pub use slot::{next_slot, previous_slot, BLOCK_INTERVAL};

/// Length of an epoch in seconds; validator sets and mint counters are
/// scoped to epochs.
pub const EPOCH_INTERVAL: u64 = 86400;

/// Maximum size of the elected validator set
pub const MAX_VALIDATOR_SIZE: usize = 21;

/// Distinct recent witnesses required before a header is considered final
pub const CONSENSUS_SIZE: usize = MAX_VALIDATOR_SIZE * 2 / 3 + 1;
