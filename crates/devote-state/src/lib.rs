//! Devote State - Key-value storage collaborator
//!
//! This crate provides the persistent key-value contract the consensus
//! engine relies on for its finality marker and mint-count ledger.

pub mod error;
pub mod storage;

pub use error::StateError;
pub use storage::{MemoryStorage, Storage};
