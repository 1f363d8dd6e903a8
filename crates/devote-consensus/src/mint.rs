//! Per-epoch, per-witness mint-count accounting.
//!
//! The ledger is consumed externally for validator-performance
//! bookkeeping; it does not gate consensus validity.

use devote_core::Address;
use devote_state::{StateError, Storage};

use crate::EPOCH_INTERVAL;

/// Persisted ledger of how many blocks each witness authored per epoch
pub trait MintCountLedger {
    fn mint_count(&self, epoch: u64, witness: &Address) -> Result<Option<u64>, StateError>;

    fn set_mint_count(
        &mut self,
        epoch: u64,
        witness: &Address,
        count: u64,
    ) -> Result<(), StateError>;
}

/// Record a freshly finalized block for its witness.
///
/// Within one epoch the count is the stored count plus one; crossing an
/// epoch boundary resets it to one regardless of prior totals. Returns the
/// stored count.
pub fn update_mint_count(
    parent_time: u64,
    block_time: u64,
    witness: &Address,
    ledger: &mut dyn MintCountLedger,
) -> Result<u64, StateError> {
    let current_epoch = parent_time / EPOCH_INTERVAL;
    let new_epoch = block_time / EPOCH_INTERVAL;

    let mut count = 1;
    if current_epoch == new_epoch {
        if let Some(prev) = ledger.mint_count(current_epoch, witness)? {
            count = prev + 1;
        }
    }

    ledger.set_mint_count(new_epoch, witness, count)?;
    Ok(count)
}

/// Ledger backed by key-value storage under `mint:<epoch><address>` keys
pub struct StorageMintLedger<S: Storage> {
    db: S,
}

impl<S: Storage> StorageMintLedger<S> {
    pub fn new(db: S) -> Self {
        StorageMintLedger { db }
    }

    fn key(epoch: u64, witness: &Address) -> Vec<u8> {
        let mut key = Vec::with_capacity(5 + 8 + 20);
        key.extend_from_slice(b"mint:");
        key.extend_from_slice(&epoch.to_be_bytes());
        key.extend_from_slice(witness.as_bytes());
        key
    }
}

impl<S: Storage> MintCountLedger for StorageMintLedger<S> {
    fn mint_count(&self, epoch: u64, witness: &Address) -> Result<Option<u64>, StateError> {
        let Some(bytes) = self.db.get(&Self::key(epoch, witness))? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = bytes
            .try_into()
            .map_err(|_| StateError::Storage("malformed mint count".into()))?;
        Ok(Some(u64::from_be_bytes(bytes)))
    }

    fn set_mint_count(
        &mut self,
        epoch: u64,
        witness: &Address,
        count: u64,
    ) -> Result<(), StateError> {
        self.db
            .put(&Self::key(epoch, witness), &count.to_be_bytes())
    }
}
