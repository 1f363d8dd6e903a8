//! Collaborator contracts the engine depends on.
//!
//! Chain traversal, epoch/validator-set state and key custody all live
//! outside the consensus core and are injected through these traits.

use devote_core::{Address, CoreError, Header, Keypair, Signature, H256};

use crate::error::ConsensusError;

/// Read access to the locally known header chain
pub trait ChainReader: Send + Sync {
    /// Header at a canonical block number
    fn header_by_number(&self, number: u64) -> Option<Header>;

    /// Header with the given hash
    fn header_by_hash(&self, hash: &H256) -> Option<Header>;

    /// Header with the given hash at the given number
    fn header(&self, hash: &H256, number: u64) -> Option<Header> {
        self.header_by_hash(hash).filter(|h| h.number == number)
    }

    /// Current chain head
    fn current_header(&self) -> Header;
}

/// Epoch-scoped validator-set state, reconstructed from a header's
/// context root.
pub trait EpochContext: Send + Sync {
    /// The witness scheduled to produce a block at `timestamp`
    fn lookup_witness(&self, timestamp: u64) -> Result<Address, ConsensusError>;

    /// Run the epoch election against the parent header, if due
    fn try_elect(&mut self, genesis: &Header, parent: &Header) -> Result<(), ConsensusError>;

    /// Root committing to this context's state
    fn root(&self) -> H256;
}

/// Reconstructs an [`EpochContext`] from a header's embedded context root
pub trait ContextFactory: Send + Sync {
    fn context_at(&self, root: &H256) -> Result<Box<dyn EpochContext>, ConsensusError>;
}

/// Chain-specific fork-activation invariants checked during header
/// validation.
pub trait ForkRules: Send + Sync {
    fn verify(&self, header: &Header) -> Result<(), ConsensusError>;
}

/// Signing capability supplied out-of-band when a witness is authorized
pub trait SealSigner: Send + Sync {
    fn sign(&self, identity: &Address, message: &H256) -> Result<Signature, CoreError>;
}

impl SealSigner for Keypair {
    fn sign(&self, _identity: &Address, message: &H256) -> Result<Signature, CoreError> {
        self.sign_prehash(message)
    }
}
