//! Supermajority finality tracking.
//!
//! After each seal-verified header the tracker walks parent links from the
//! chain head toward the last confirmed header, collecting distinct
//! witnesses. The walk header becomes the new confirmed header the moment
//! the set reaches [`CONSENSUS_SIZE`](crate::CONSENSUS_SIZE) distinct
//! members within one epoch.

use std::collections::HashSet;

use devote_core::{Address, Header, H256};
use devote_state::Storage;
use tracing::debug;

use crate::chain::ChainReader;
use crate::error::ConsensusError;
use crate::{CONSENSUS_SIZE, EPOCH_INTERVAL};

/// Fixed storage key holding the hash of the confirmed header
pub const CONFIRMED_BLOCK_HEAD_KEY: &[u8] = b"confirmed-block-head";

/// Tracks and persists the most recent header proven final.
///
/// One instance is owned per engine; the confirmed pointer only ever moves
/// forward and is persisted before the in-memory pointer is advanced.
pub struct FinalityTracker<S: Storage> {
    db: S,
    confirmed: Option<Header>,
}

impl<S: Storage> FinalityTracker<S> {
    pub fn new(db: S) -> Self {
        FinalityTracker {
            db,
            confirmed: None,
        }
    }

    /// The confirmed header, lazily loaded from storage and degrading to
    /// genesis when no confirmation was ever persisted.
    pub fn current(&mut self, chain: &dyn ChainReader) -> Result<Header, ConsensusError> {
        if let Some(header) = &self.confirmed {
            return Ok(header.clone());
        }
        let header = match self.load_confirmed(chain) {
            Ok(header) => header,
            Err(_) => chain.header_by_number(0).ok_or(ConsensusError::NilHeader)?,
        };
        self.confirmed = Some(header.clone());
        Ok(header)
    }

    /// Opportunistically advance the confirmed header toward the current
    /// chain head.
    ///
    /// Stops without advancing when the remaining block distance cannot
    /// supply the distinct witnesses still needed; a missing ancestor
    /// mid-walk is a fatal consistency error and leaves the pointer
    /// untouched.
    pub fn update(&mut self, chain: &dyn ChainReader) -> Result<(), ConsensusError> {
        let confirmed = self.current(chain)?;
        let confirmed_hash = confirmed.hash();

        let mut cur = chain.current_header();
        let mut epoch: Option<u64> = None;
        let mut witnesses: HashSet<Address> = HashSet::new();

        while cur.hash() != confirmed_hash && confirmed.number < cur.number {
            let cur_epoch = cur.timestamp / EPOCH_INTERVAL;
            if epoch != Some(cur_epoch) {
                epoch = Some(cur_epoch);
                witnesses.clear();
            }

            // Fast return: the unconfirmed range is too short to ever reach
            // quorum from here.
            let needed = (CONSENSUS_SIZE - witnesses.len()) as u64;
            if cur.number - confirmed.number < needed {
                debug!(
                    current = cur.number,
                    confirmed = confirmed.number,
                    witness_count = witnesses.len(),
                    "finality fast return"
                );
                return Ok(());
            }

            witnesses.insert(cur.witness);
            if witnesses.len() >= CONSENSUS_SIZE {
                self.store_confirmed(&cur.hash())?;
                debug!(number = cur.number, "confirmed block header advanced");
                self.confirmed = Some(cur);
                return Ok(());
            }

            cur = chain
                .header_by_hash(&cur.parent_hash)
                .ok_or(ConsensusError::NilHeader)?;
        }
        Ok(())
    }

    fn load_confirmed(&self, chain: &dyn ChainReader) -> Result<Header, ConsensusError> {
        let bytes = self
            .db
            .get(CONFIRMED_BLOCK_HEAD_KEY)?
            .ok_or(ConsensusError::NilHeader)?;
        let hash = H256::from_slice(&bytes).ok_or(ConsensusError::NilHeader)?;
        chain
            .header_by_hash(&hash)
            .ok_or(ConsensusError::NilHeader)
    }

    fn store_confirmed(&mut self, hash: &H256) -> Result<(), ConsensusError> {
        self.db.put(CONFIRMED_BLOCK_HEAD_KEY, hash.as_bytes())?;
        Ok(())
    }
}
