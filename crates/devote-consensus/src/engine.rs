//! The Devote engine: header validation, seal verification and creation,
//! witness scheduling checks and finality hand-off.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use devote_core::{
    empty_uncle_hash, recover_signer, Address, Header, EXTRA_SEAL, EXTRA_VANITY,
};
use devote_state::Storage;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::chain::{ChainReader, ContextFactory, ForkRules, SealSigner};
use crate::error::ConsensusError;
use crate::finality::FinalityTracker;
use crate::sigcache::SignatureCache;
use crate::slot::{next_slot, previous_slot, BLOCK_INTERVAL};

struct LocalSigner {
    address: Address,
    sign_fn: Arc<dyn SealSigner>,
}

/// The delegated-proof-of-stake consensus engine.
///
/// Chain traversal and epoch state are injected; the engine owns only its
/// signature cache, the local signer identity and the finality tracker.
pub struct Devote<S: Storage> {
    signer: RwLock<Option<LocalSigner>>,
    signatures: SignatureCache,
    finality: Mutex<FinalityTracker<S>>,
    context_factory: Arc<dyn ContextFactory>,
    fork_rules: Option<Arc<dyn ForkRules>>,
}

impl<S: Storage + 'static> Devote<S> {
    pub fn new(db: S, context_factory: Arc<dyn ContextFactory>) -> Self {
        Devote {
            signer: RwLock::new(None),
            signatures: SignatureCache::default(),
            finality: Mutex::new(FinalityTracker::new(db)),
            context_factory,
            fork_rules: None,
        }
    }

    pub fn with_fork_rules(mut self, fork_rules: Arc<dyn ForkRules>) -> Self {
        self.fork_rules = Some(fork_rules);
        self
    }

    /// Inject the local witness identity and signing capability.
    ///
    /// May be called again at runtime to rotate the identity; readers are
    /// safe against concurrent reassignment.
    pub fn authorize(&self, address: Address, sign_fn: Arc<dyn SealSigner>) {
        let mut signer = self.signer.write();
        *signer = Some(LocalSigner { address, sign_fn });
        info!(signer = %address, "devote signer authorized");
    }

    /// The currently authorized local witness, if any
    pub fn signer_address(&self) -> Option<Address> {
        self.signer.read().as_ref().map(|s| s.address)
    }

    /// The verified author of a header is its declared witness
    pub fn author(&self, header: &Header) -> Address {
        header.witness
    }

    /// Difficulty carries no weight in this scheme and is always 1
    pub fn calc_difficulty(&self) -> u64 {
        1
    }

    /// Initialize the consensus fields of a header being assembled: vanity
    /// padding, an empty seal slot, the difficulty constant and the local
    /// witness.
    pub fn prepare(&self, chain: &dyn ChainReader, header: &mut Header) -> Result<(), ConsensusError> {
        if header.extra.len() < EXTRA_VANITY {
            header.extra.resize(EXTRA_VANITY, 0);
        }
        header.extra.truncate(EXTRA_VANITY);
        header.extra.extend_from_slice(&[0u8; EXTRA_SEAL]);

        let parent_number = header
            .number
            .checked_sub(1)
            .ok_or(ConsensusError::UnknownBlock)?;
        if chain.header(&header.parent_hash, parent_number).is_none() {
            return Err(ConsensusError::UnknownAncestor);
        }

        header.difficulty = self.calc_difficulty();
        header.witness = self
            .signer_address()
            .ok_or(ConsensusError::SignerNotAuthorized)?;
        Ok(())
    }

    /// Validate the structural, temporal and ancestry rules of a candidate
    /// header.
    pub fn verify_header(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
    ) -> Result<(), ConsensusError> {
        self.verify_header_with_parents(chain, header, &[])
    }

    fn verify_header_with_parents(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
        parents: &[Header],
    ) -> Result<(), ConsensusError> {
        // Blocks from the future cannot be verified yet
        if header.timestamp > unix_now() {
            return Err(ConsensusError::FutureBlock);
        }
        // The extra-data has to contain both the vanity and the seal
        if header.extra.len() < EXTRA_VANITY {
            return Err(ConsensusError::MissingVanity);
        }
        if header.extra.len() < EXTRA_VANITY + EXTRA_SEAL {
            return Err(ConsensusError::MissingSignature);
        }
        if !header.mix_digest.is_zero() {
            return Err(ConsensusError::InvalidMixDigest);
        }
        if header.difficulty != 1 {
            return Err(ConsensusError::InvalidDifficulty);
        }
        // Uncles are meaningless in DPoS
        if header.uncle_hash != empty_uncle_hash() {
            return Err(ConsensusError::InvalidUncleHash);
        }
        if let Some(fork_rules) = &self.fork_rules {
            fork_rules.verify(header)?;
        }

        let parent_number = header
            .number
            .checked_sub(1)
            .ok_or(ConsensusError::UnknownAncestor)?;
        let parent = match parents.last() {
            Some(parent) => parent.clone(),
            None => chain
                .header(&header.parent_hash, parent_number)
                .ok_or(ConsensusError::UnknownAncestor)?,
        };
        if parent.number != parent_number || parent.hash() != header.parent_hash {
            return Err(ConsensusError::UnknownAncestor);
        }
        // One full slot of real time must separate consecutive blocks
        if parent.timestamp + BLOCK_INTERVAL > header.timestamp {
            return Err(ConsensusError::InvalidTimestamp);
        }
        Ok(())
    }

    /// Validate an ordered batch of headers concurrently.
    ///
    /// A single background worker walks the batch in order, treating
    /// earlier entries as parent context for later ones, and streams one
    /// result per header. Cancelling `abort` stops further work; results
    /// already delivered are never retracted.
    pub fn verify_headers(
        self: &Arc<Self>,
        chain: Arc<dyn ChainReader>,
        headers: Vec<Header>,
        abort: CancellationToken,
    ) -> mpsc::Receiver<Result<(), ConsensusError>> {
        let (results, receiver) = mpsc::channel(headers.len().max(1));
        let engine = Arc::clone(self);

        tokio::spawn(async move {
            for i in 0..headers.len() {
                let result =
                    engine.verify_header_with_parents(chain.as_ref(), &headers[i], &headers[..i]);
                tokio::select! {
                    _ = abort.cancelled() => return,
                    sent = results.send(result) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        receiver
    }

    /// Check that the seal embedded in a header was produced by the witness
    /// scheduled for its timestamp, then let the finality tracker advance.
    pub fn verify_seal(
        &self,
        chain: &dyn ChainReader,
        header: &Header,
    ) -> Result<(), ConsensusError> {
        // Verifying the genesis block is not supported
        let parent_number = header
            .number
            .checked_sub(1)
            .ok_or(ConsensusError::UnknownBlock)?;
        let parent = chain
            .header(&header.parent_hash, parent_number)
            .ok_or(ConsensusError::UnknownAncestor)?;

        let context = self.context_factory.context_at(&parent.context_root)?;
        let witness = context.lookup_witness(header.timestamp)?;
        self.verify_block_signer(&witness, header)?;

        self.finality.lock().update(chain)
    }

    fn verify_block_signer(
        &self,
        scheduled: &Address,
        header: &Header,
    ) -> Result<(), ConsensusError> {
        let signer = self.ecrecover(header)?;
        if signer != *scheduled {
            return Err(ConsensusError::InvalidBlockWitness);
        }
        if signer != header.witness {
            return Err(ConsensusError::MismatchSignerAndWitness);
        }
        Ok(())
    }

    /// Recover the address that sealed a header, consulting the signature
    /// cache first.
    pub fn ecrecover(&self, header: &Header) -> Result<Address, ConsensusError> {
        let hash = header.hash();
        if let Some(signer) = self.signatures.get(&hash) {
            return Ok(signer);
        }
        let signature = header.seal_signature()?;
        let signer = recover_signer(&header.seal_hash()?, &signature)?;
        self.signatures.insert(hash, signer);
        Ok(signer)
    }

    /// Gate local block production: the previous block must have arrived
    /// and the local signer must be the witness scheduled at `now`.
    pub fn check_witness(&self, last_header: &Header, now: u64) -> Result<(), ConsensusError> {
        Self::check_deadline(last_header, now)?;

        let context = self.context_factory.context_at(&last_header.context_root)?;
        let witness = context.lookup_witness(now)?;
        if witness.is_zero() || self.signer_address() != Some(witness) {
            return Err(ConsensusError::InvalidBlockWitness);
        }
        Ok(())
    }

    fn check_deadline(last_header: &Header, now: u64) -> Result<(), ConsensusError> {
        if last_header.timestamp >= next_slot(now) {
            return Err(ConsensusError::MintFutureBlock);
        }
        // Last block has arrived, or time's up
        if last_header.timestamp == previous_slot(now) || next_slot(now) - now <= 1 {
            return Ok(());
        }
        Err(ConsensusError::WaitForPrevBlock)
    }

    /// Wait for the next slot and place the local witness's seal on the
    /// header.
    ///
    /// Cancellation while waiting is an expected abstention and yields
    /// `Ok(None)`. Sealing the genesis block is not supported.
    pub async fn seal(
        &self,
        header: &Header,
        abort: &CancellationToken,
    ) -> Result<Option<Header>, ConsensusError> {
        if header.number == 0 {
            return Err(ConsensusError::UnknownBlock);
        }

        let now = unix_now();
        let delay = next_slot(now).saturating_sub(now);
        if delay > 0 {
            tokio::select! {
                _ = abort.cancelled() => return Ok(None),
                _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
            }
        }

        let mut sealed = header.clone();
        sealed.timestamp = unix_now();

        // Time's up, sign the block
        let (address, sign_fn) = {
            let signer = self.signer.read();
            let signer = signer
                .as_ref()
                .ok_or(ConsensusError::SignerNotAuthorized)?;
            (signer.address, Arc::clone(&signer.sign_fn))
        };
        let sighash = sealed.seal_hash()?;
        let signature = sign_fn.sign(&address, &sighash)?;

        let extra_len = sealed.extra.len();
        sealed.extra[extra_len - EXTRA_SEAL..].copy_from_slice(signature.as_bytes());
        Ok(Some(sealed))
    }

    /// The most recent header proven final, lazily loaded from storage
    pub fn confirmed_header(&self, chain: &dyn ChainReader) -> Result<Header, ConsensusError> {
        self.finality.lock().current(chain)
    }

    /// The witness scheduled at `timestamp`, resolved through the current
    /// head's context root.
    pub fn scheduled_witness(
        &self,
        chain: &dyn ChainReader,
        timestamp: u64,
    ) -> Result<Address, ConsensusError> {
        let head = chain.current_header();
        let context = self.context_factory.context_at(&head.context_root)?;
        context.lookup_witness(timestamp)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
