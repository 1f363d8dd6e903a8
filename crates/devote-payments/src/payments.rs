//! Per-height ballot boxes and the top-level vote registry.

use std::collections::HashMap;
use std::sync::Arc;

use devote_core::{Address, H256};
use parking_lot::Mutex;
use tracing::debug;

use crate::vote::{MasternodePaymentVote, MasternodeRegistry};

/// One nominated account and the votes it has received at a height
#[derive(Debug, Clone)]
pub struct MasternodePayee {
    account: Address,
    votes: Vec<MasternodePaymentVote>,
}

impl MasternodePayee {
    pub fn new(account: Address, vote: MasternodePaymentVote) -> Self {
        MasternodePayee {
            account,
            votes: vec![vote],
        }
    }

    pub fn add(&mut self, vote: MasternodePaymentVote) {
        self.votes.push(vote);
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn count(&self) -> usize {
        self.votes.len()
    }

    pub fn votes(&self) -> &[MasternodePaymentVote] {
        &self.votes
    }
}

/// The ballot box for one block height.
///
/// An account appears at most once; repeat votes for the same account
/// accumulate onto the existing payee. Payees keep vote-arrival order,
/// which doubles as the tie-break order for [`best`](Self::best).
#[derive(Debug, Clone)]
pub struct MasternodeBlockPayees {
    height: u64,
    payees: Vec<MasternodePayee>,
}

impl MasternodeBlockPayees {
    pub fn new(height: u64) -> Self {
        MasternodeBlockPayees {
            height,
            payees: Vec::new(),
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn payees(&self) -> &[MasternodePayee] {
        &self.payees
    }

    /// Attach a vote nominating `account`
    pub fn add(&mut self, account: Address, vote: MasternodePaymentVote) {
        for payee in &mut self.payees {
            if payee.account == account {
                payee.add(vote);
                return;
            }
        }
        self.payees.push(MasternodePayee::new(account, vote));
    }

    /// The account with the strictly highest vote count, ties broken by
    /// first arrival; `None` only when no payee exists at all.
    pub fn best(&self) -> Option<Address> {
        let mut best: Option<Address> = None;
        let mut best_votes = 0;
        for payee in &self.payees {
            if payee.count() > best_votes {
                best = Some(payee.account);
                best_votes = payee.count();
            }
        }
        best
    }

    /// Whether `account` holds at least `min_votes` votes at this height
    pub fn has(&self, min_votes: usize, account: &Address) -> bool {
        self.payees
            .iter()
            .any(|payee| payee.count() >= min_votes && payee.account == *account)
    }
}

struct PaymentsInner {
    votes: HashMap<H256, MasternodePaymentVote>,
    blocks: HashMap<u64, MasternodeBlockPayees>,
}

/// Keeps track of who should get paid for which blocks.
///
/// All operations serialize on one internal lock since `add` reads and
/// then writes the ballot-box map.
pub struct MasternodePayments {
    registry: Arc<dyn MasternodeRegistry>,
    min_blocks_to_store: u64,
    storage_coeff: u64,
    inner: Mutex<PaymentsInner>,
}

impl MasternodePayments {
    pub fn new(registry: Arc<dyn MasternodeRegistry>) -> Self {
        MasternodePayments {
            registry,
            min_blocks_to_store: 1,
            storage_coeff: 1,
            inner: Mutex::new(PaymentsInner {
                votes: HashMap::new(),
                blocks: HashMap::new(),
            }),
        }
    }

    /// Ingest a vote.
    ///
    /// Returns `false` without error for the expected network noise:
    /// duplicate deliveries, votes from unregistered masternodes and votes
    /// whose signature does not verify. Only verified votes are ever
    /// stored, so membership in the vote map doubles as the
    /// verified-duplicate test.
    pub fn add(&self, vote: MasternodePaymentVote) -> bool {
        let Some(info) = self.registry.info(&vote.masternode_id) else {
            debug!(masternode = %vote.masternode_id, "payment vote from unknown masternode");
            return false;
        };
        if let Err(err) = vote.verify(&info.signer) {
            debug!(masternode = %vote.masternode_id, %err, "rejecting payment vote");
            return false;
        }

        let hash = vote.hash();
        let mut inner = self.inner.lock();
        if inner.votes.contains_key(&hash) {
            debug!(height = vote.block_height, "duplicate payment vote ignored");
            return false;
        }
        inner.votes.insert(hash, vote.clone());

        let height = vote.block_height;
        inner
            .blocks
            .entry(height)
            .or_insert_with(|| MasternodeBlockPayees::new(height))
            .add(info.account, vote);
        true
    }

    /// Whether a verified vote with this identity hash is present
    pub fn has_vote(&self, hash: &H256) -> bool {
        self.inner.lock().votes.contains_key(hash)
    }

    pub fn vote_count(&self) -> usize {
        self.inner.lock().votes.len()
    }

    pub fn block_count(&self) -> usize {
        self.inner.lock().blocks.len()
    }

    /// The plurality winner at a height, if any votes were cast there
    pub fn best(&self, height: u64) -> Option<Address> {
        self.inner.lock().blocks.get(&height).and_then(|b| b.best())
    }

    /// Whether `account` holds at least `min_votes` votes at `height`
    pub fn has(&self, height: u64, min_votes: usize, account: &Address) -> bool {
        self.inner
            .lock()
            .blocks
            .get(&height)
            .is_some_and(|b| b.has(min_votes, account))
    }

    /// Atomically discard all votes and ballot boxes (resync/reorg)
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.votes = HashMap::new();
        inner.blocks = HashMap::new();
    }

    /// Minimum number of ballot boxes worth retaining when pruning
    pub fn min_blocks_to_store(&self) -> u64 {
        self.min_blocks_to_store
    }

    /// Masternode count times this coefficient bounds stored payment blocks
    pub fn storage_coeff(&self) -> u64 {
        self.storage_coeff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vote::{masternode_id, MasternodeInfo};
    use devote_core::Keypair;
    use std::collections::HashMap as StdHashMap;

    struct TestRegistry {
        nodes: StdHashMap<H256, MasternodeInfo>,
    }

    impl MasternodeRegistry for TestRegistry {
        fn info(&self, id: &H256) -> Option<MasternodeInfo> {
            self.nodes.get(id).copied()
        }
    }

    struct TestNet {
        payments: MasternodePayments,
        keys: StdHashMap<H256, Keypair>,
    }

    impl TestNet {
        /// Registry of `n` masternodes, each paying out to a distinct account
        fn new(n: usize) -> Self {
            Self::with_accounts((0..n).map(|i| Address::new([i as u8 + 1; 20])).collect())
        }

        /// Registry with one masternode per entry, paying out to the given
        /// account (accounts may repeat)
        fn with_accounts(accounts: Vec<Address>) -> Self {
            let mut nodes = StdHashMap::new();
            let mut keys = StdHashMap::new();
            for (i, account) in accounts.into_iter().enumerate() {
                let id = masternode_id(format!("mn-{i}").as_bytes());
                let keypair = Keypair::generate();
                nodes.insert(
                    id,
                    MasternodeInfo {
                        id,
                        account,
                        signer: keypair.address(),
                    },
                );
                keys.insert(id, keypair);
            }
            TestNet {
                payments: MasternodePayments::new(Arc::new(TestRegistry { nodes })),
                keys,
            }
        }

        fn account(&self, i: usize) -> Address {
            Address::new([i as u8 + 1; 20])
        }

        fn vote(&self, i: usize, height: u64) -> MasternodePaymentVote {
            let id = masternode_id(format!("mn-{i}").as_bytes());
            let mut vote = MasternodePaymentVote::new(height, id);
            vote.sign(&self.keys[&id]).unwrap();
            vote
        }
    }

    #[test]
    fn test_first_vote_into_fresh_ballot_box_is_retained() {
        let net = TestNet::new(1);
        assert!(net.payments.add(net.vote(0, 100)));

        assert_eq!(net.payments.vote_count(), 1);
        assert_eq!(net.payments.block_count(), 1);
        assert_eq!(net.payments.best(100), Some(net.account(0)));
    }

    #[test]
    fn test_duplicate_identity_inserts_once() {
        let net = TestNet::new(1);
        let vote = net.vote(0, 100);

        assert!(net.payments.add(vote.clone()));
        assert!(!net.payments.add(vote));
        assert_eq!(net.payments.vote_count(), 1);

        // A fresh signature over the same (height, masternode) identity is
        // still the same vote slot
        assert!(!net.payments.add(net.vote(0, 100)));
        assert_eq!(net.payments.vote_count(), 1);
    }

    #[test]
    fn test_unknown_masternode_rejected() {
        let net = TestNet::new(1);
        let mut vote = MasternodePaymentVote::new(100, masternode_id(b"stranger"));
        vote.sign(&Keypair::generate()).unwrap();

        assert!(!net.payments.add(vote));
        assert_eq!(net.payments.vote_count(), 0);
    }

    #[test]
    fn test_bad_signature_rejected() {
        let net = TestNet::new(2);
        let id = masternode_id(b"mn-0");
        let mut vote = MasternodePaymentVote::new(100, id);
        // Signed by the wrong masternode's key
        vote.sign(&net.keys[&masternode_id(b"mn-1")]).unwrap();

        assert!(!net.payments.add(vote));
        assert_eq!(net.payments.vote_count(), 0);
    }

    #[test]
    fn test_best_breaks_ties_by_arrival() {
        // Masternodes 0,1 pay account A; 2,3,4 pay B; 5,6,7 pay C.
        // A:2 votes, B:3, C:3 -- B leads because it reached the box first.
        let a = Address::new([0xaa; 20]);
        let b = Address::new([0xbb; 20]);
        let c = Address::new([0xcc; 20]);
        let net = TestNet::with_accounts(vec![a, a, b, b, b, c, c, c]);

        for i in 0..8 {
            assert!(net.payments.add(net.vote(i, 42)));
        }

        assert_eq!(net.payments.best(42), Some(b));
        assert!(net.payments.has(42, 3, &c));
        assert!(!net.payments.has(42, 4, &c));
        assert!(net.payments.has(42, 2, &a));
    }

    #[test]
    fn test_best_on_empty_box_is_none() {
        let net = TestNet::new(1);
        assert_eq!(net.payments.best(7), None);
        assert!(!net.payments.has(7, 1, &net.account(0)));
    }

    #[test]
    fn test_heights_are_independent() {
        let net = TestNet::new(2);
        assert!(net.payments.add(net.vote(0, 100)));
        assert!(net.payments.add(net.vote(0, 101)));
        assert!(net.payments.add(net.vote(1, 100)));

        assert_eq!(net.payments.vote_count(), 3);
        assert_eq!(net.payments.block_count(), 2);
    }

    #[test]
    fn test_clear_discards_everything() {
        let net = TestNet::new(2);
        assert!(net.payments.add(net.vote(0, 100)));
        assert!(net.payments.add(net.vote(1, 100)));

        net.payments.clear();
        assert_eq!(net.payments.vote_count(), 0);
        assert_eq!(net.payments.block_count(), 0);
        assert_eq!(net.payments.best(100), None);

        // The same votes are accepted again after a clear
        assert!(net.payments.add(net.vote(0, 100)));
    }
}
