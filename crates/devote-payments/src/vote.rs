use devote_core::{keccak256, recover_signer, Address, CoreError, Keypair, Signature, H256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::PaymentsError;

/// Identity and payout details of a registered masternode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasternodeInfo {
    /// Stable masternode identifier
    pub id: H256,
    /// Account currently owed this masternode's payouts
    pub account: Address,
    /// Address whose key signs this masternode's votes
    pub signer: Address,
}

/// Resolves a vote's originating masternode to its registered details
pub trait MasternodeRegistry: Send + Sync {
    fn info(&self, id: &H256) -> Option<MasternodeInfo>;
}

/// A single masternode's reward-distribution vote for one block height.
///
/// The identity hash deliberately excludes the nominated account: two votes
/// by the same masternode for the same height occupy the same vote slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasternodePaymentVote {
    pub block_height: u64,
    pub masternode_id: H256,
    pub signature: Option<Signature>,
}

impl MasternodePaymentVote {
    pub fn new(block_height: u64, masternode_id: H256) -> Self {
        MasternodePaymentVote {
            block_height,
            masternode_id,
            signature: None,
        }
    }

    /// Identity hash: Keccak-256 over (block height, masternode id)
    pub fn hash(&self) -> H256 {
        let mut hasher = Keccak256::new();
        hasher.update(self.block_height.to_be_bytes());
        hasher.update(self.masternode_id.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        H256::new(bytes)
    }

    /// Attach a detached signature over the vote's identity hash
    pub fn sign(&mut self, keypair: &Keypair) -> Result<(), CoreError> {
        self.signature = Some(keypair.sign_prehash(&self.hash())?);
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Verify the vote was signed by the expected masternode key
    pub fn verify(&self, expected_signer: &Address) -> Result<(), PaymentsError> {
        let signature = self.signature.ok_or(PaymentsError::MissingSignature)?;
        let signer = recover_signer(&self.hash(), &signature)?;
        if signer != *expected_signer {
            return Err(PaymentsError::InvalidSignature);
        }
        Ok(())
    }
}

/// Convenience for deriving a masternode id in tests and tooling
pub fn masternode_id(seed: &[u8]) -> H256 {
    keccak256(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_excludes_signature() {
        let mut vote = MasternodePaymentVote::new(100, masternode_id(b"mn-1"));
        let unsigned_hash = vote.hash();

        let keypair = Keypair::generate();
        vote.sign(&keypair).unwrap();
        assert_eq!(vote.hash(), unsigned_hash);
    }

    #[test]
    fn test_same_identity_same_hash() {
        let a = MasternodePaymentVote::new(100, masternode_id(b"mn-1"));
        let b = MasternodePaymentVote::new(100, masternode_id(b"mn-1"));
        assert_eq!(a.hash(), b.hash());

        let c = MasternodePaymentVote::new(101, masternode_id(b"mn-1"));
        let d = MasternodePaymentVote::new(100, masternode_id(b"mn-2"));
        assert_ne!(a.hash(), c.hash());
        assert_ne!(a.hash(), d.hash());
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = Keypair::generate();
        let mut vote = MasternodePaymentVote::new(100, masternode_id(b"mn-1"));
        vote.sign(&keypair).unwrap();

        assert!(vote.verify(&keypair.address()).is_ok());
        assert!(matches!(
            vote.verify(&Keypair::generate().address()),
            Err(PaymentsError::InvalidSignature)
        ));
    }

    #[test]
    fn test_unsigned_vote_fails_verification() {
        let vote = MasternodePaymentVote::new(100, masternode_id(b"mn-1"));
        assert!(matches!(
            vote.verify(&Address::ZERO),
            Err(PaymentsError::MissingSignature)
        ));
    }
}
