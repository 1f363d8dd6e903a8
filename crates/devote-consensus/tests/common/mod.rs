//! Shared fixtures: an in-memory header chain, a round-robin witness
//! schedule and helpers for producing sealed headers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use devote_consensus::{
    ChainReader, ConsensusError, ContextFactory, EpochContext, BLOCK_INTERVAL,
};
use devote_core::{
    empty_uncle_hash, keccak256, Address, Header, Keypair, H256, EXTRA_SEAL, EXTRA_VANITY,
};
use devote_state::{MemoryStorage, StateError, Storage};
use parking_lot::Mutex;

/// Start of an arbitrary epoch well in the past, so generated headers never
/// trip the future-block check.
pub const BASE_TIME: u64 = 86_400 * 100;

pub struct MockChain {
    by_hash: HashMap<H256, Header>,
    by_number: HashMap<u64, Header>,
    head: Header,
}

impl MockChain {
    pub fn new(genesis: Header) -> Self {
        let mut chain = MockChain {
            by_hash: HashMap::new(),
            by_number: HashMap::new(),
            head: genesis.clone(),
        };
        chain.insert(genesis);
        chain
    }

    pub fn insert(&mut self, header: Header) {
        if header.number >= self.head.number {
            self.head = header.clone();
        }
        self.by_number.insert(header.number, header.clone());
        self.by_hash.insert(header.hash(), header);
    }

    /// Drop a header from both lookup maps, leaving a hole in the chain
    pub fn remove(&mut self, header: &Header) {
        self.by_number.remove(&header.number);
        self.by_hash.remove(&header.hash());
    }

    pub fn head(&self) -> Header {
        self.head.clone()
    }
}

impl ChainReader for MockChain {
    fn header_by_number(&self, number: u64) -> Option<Header> {
        self.by_number.get(&number).cloned()
    }

    fn header_by_hash(&self, hash: &H256) -> Option<Header> {
        self.by_hash.get(hash).cloned()
    }

    fn current_header(&self) -> Header {
        self.head.clone()
    }
}

/// Round-robin schedule: the witness of a slot is picked by slot index
/// modulo the witness-list length.
pub struct RoundRobinContext {
    witnesses: Vec<Address>,
    root: H256,
}

impl EpochContext for RoundRobinContext {
    fn lookup_witness(&self, timestamp: u64) -> Result<Address, ConsensusError> {
        let slot = (timestamp / BLOCK_INTERVAL) as usize;
        Ok(self.witnesses[slot % self.witnesses.len()])
    }

    fn try_elect(&mut self, _genesis: &Header, _parent: &Header) -> Result<(), ConsensusError> {
        Ok(())
    }

    fn root(&self) -> H256 {
        self.root
    }
}

pub struct RoundRobinFactory {
    pub witnesses: Vec<Address>,
}

impl RoundRobinFactory {
    pub fn new(keys: &[Keypair]) -> Self {
        RoundRobinFactory {
            witnesses: keys.iter().map(|k| k.address()).collect(),
        }
    }
}

impl ContextFactory for RoundRobinFactory {
    fn context_at(&self, root: &H256) -> Result<Box<dyn EpochContext>, ConsensusError> {
        Ok(Box::new(RoundRobinContext {
            witnesses: self.witnesses.clone(),
            root: *root,
        }))
    }
}

/// `MemoryStorage` behind a shared handle, letting two tracker instances
/// observe the same persisted state.
#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<Mutex<MemoryStorage>>,
}

impl SharedStorage {
    pub fn new() -> Self {
        SharedStorage {
            inner: Arc::new(Mutex::new(MemoryStorage::new())),
        }
    }
}

impl Storage for SharedStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        self.inner.lock().get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.inner.lock().put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.inner.lock().delete(key)
    }
}

pub fn genesis_header() -> Header {
    Header {
        parent_hash: H256::ZERO,
        number: 0,
        timestamp: BASE_TIME,
        witness: Address::ZERO,
        extra: vec![0u8; EXTRA_VANITY + EXTRA_SEAL],
        difficulty: 1,
        mix_digest: H256::ZERO,
        uncle_hash: empty_uncle_hash(),
        context_root: keccak256(b"test-context"),
    }
}

/// An unsealed child of `parent`, one slot later
pub fn child_header(parent: &Header, witness: Address) -> Header {
    Header {
        parent_hash: parent.hash(),
        number: parent.number + 1,
        timestamp: parent.timestamp + BLOCK_INTERVAL,
        witness,
        extra: vec![0u8; EXTRA_VANITY + EXTRA_SEAL],
        difficulty: 1,
        mix_digest: H256::ZERO,
        uncle_hash: empty_uncle_hash(),
        context_root: parent.context_root,
    }
}

/// Place `keypair`'s seal in the extra-data suffix
pub fn seal_header(header: &mut Header, keypair: &Keypair) {
    let sighash = header.seal_hash().unwrap();
    let signature = keypair.sign_prehash(&sighash).unwrap();
    let extra_len = header.extra.len();
    header.extra[extra_len - EXTRA_SEAL..].copy_from_slice(signature.as_bytes());
}

/// A chain of `count` sealed blocks on top of genesis, each produced by
/// the witness the round-robin schedule assigns to its slot.
pub fn build_chain(keys: &[Keypair], count: usize) -> MockChain {
    let mut chain = MockChain::new(genesis_header());
    extend_chain(&mut chain, keys, count);
    chain
}

/// Append `count` sealed blocks to the current head
pub fn extend_chain(chain: &mut MockChain, keys: &[Keypair], count: usize) {
    let mut parent = chain.head();
    for _ in 0..count {
        let mut header = child_header(&parent, Address::ZERO);
        let slot = (header.timestamp / BLOCK_INTERVAL) as usize;
        let producer = &keys[slot % keys.len()];
        header.witness = producer.address();
        seal_header(&mut header, producer);
        chain.insert(header.clone());
        parent = header;
    }
}

pub fn generate_keys(n: usize) -> Vec<Keypair> {
    (0..n).map(|_| Keypair::generate()).collect()
}
