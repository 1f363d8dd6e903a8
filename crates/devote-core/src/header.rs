use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::address::Address;
use crate::error::CoreError;
use crate::hash::H256;
use crate::keys::{Signature, SIGNATURE_LENGTH};

/// Fixed number of extra-data prefix bytes reserved for witness vanity
pub const EXTRA_VANITY: usize = 32;
/// Fixed number of extra-data suffix bytes reserved for the witness seal
pub const EXTRA_SEAL: usize = 65;

/// Hash of an empty uncle list (Keccak-256 of the RLP empty list byte).
/// Uncles are meaningless under delegated proof of stake, so every valid
/// header carries exactly this value.
pub fn empty_uncle_hash() -> H256 {
    crate::hash::keccak256(&[0xc0])
}

/// A block header as seen by the consensus engine.
///
/// Created by block assembly, mutated only while being sealed (timestamp and
/// the trailing signature bytes of `extra`), immutable once on the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Hash of the parent header
    pub parent_hash: H256,
    /// Block number (0 for genesis)
    pub number: u64,
    /// Unix timestamp in seconds
    pub timestamp: u64,
    /// Address of the witness that produced this block
    pub witness: Address,
    /// Vanity prefix plus trailing 65-byte seal signature
    pub extra: Vec<u8>,
    /// Always 1; retained as a sanity constant
    pub difficulty: u64,
    /// Must be zero; vestigial proof-of-work field
    pub mix_digest: H256,
    /// Must equal `empty_uncle_hash()`
    pub uncle_hash: H256,
    /// Commitment to the epoch / validator-set / mint-count state
    pub context_root: H256,
}

impl Header {
    /// Hash of the full header, including the embedded seal
    pub fn hash(&self) -> H256 {
        let mut hasher = Keccak256::new();
        self.hash_fields(&mut hasher, &self.extra);
        finalize(hasher)
    }

    /// Hash used as signing input for the seal: every field except the
    /// trailing signature bytes of the extra-data.
    ///
    /// Errors when the extra-data cannot hold a signature, so a header can
    /// never be ambiguous about whether its seal bytes were included.
    pub fn seal_hash(&self) -> Result<H256, CoreError> {
        if self.extra.len() < EXTRA_SEAL {
            return Err(CoreError::MissingSignature);
        }
        let mut hasher = Keccak256::new();
        self.hash_fields(&mut hasher, &self.extra[..self.extra.len() - EXTRA_SEAL]);
        Ok(finalize(hasher))
    }

    /// The detached seal signature stored in the extra-data suffix
    pub fn seal_signature(&self) -> Result<Signature, CoreError> {
        if self.extra.len() < EXTRA_SEAL {
            return Err(CoreError::MissingSignature);
        }
        Signature::from_slice(&self.extra[self.extra.len() - SIGNATURE_LENGTH..])
    }

    // Fields are fed to the hasher in a fixed order with the extra bytes
    // length-prefixed, keeping the encoding injective.
    fn hash_fields(&self, hasher: &mut Keccak256, extra: &[u8]) {
        hasher.update(self.parent_hash.as_bytes());
        hasher.update(self.uncle_hash.as_bytes());
        hasher.update(self.witness.as_bytes());
        hasher.update(self.number.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(self.difficulty.to_be_bytes());
        hasher.update((extra.len() as u64).to_be_bytes());
        hasher.update(extra);
        hasher.update(self.mix_digest.as_bytes());
        hasher.update(self.context_root.as_bytes());
    }
}

fn finalize(hasher: Keccak256) -> H256 {
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    H256(bytes)
}
