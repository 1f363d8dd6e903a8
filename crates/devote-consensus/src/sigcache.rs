//! Bounded cache of recovered seal signers.
//!
//! Absence never changes correctness, only the cost of re-running signature
//! recovery for a header.

use std::collections::{HashMap, VecDeque};

use devote_core::{Address, H256};
use parking_lot::Mutex;

/// Number of recent block signatures to keep in memory
pub const INMEMORY_SIGNATURES: usize = 4096;

/// Concurrent bounded map from header hash to recovered signer address,
/// evicting the oldest entry once full.
pub struct SignatureCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    map: HashMap<H256, Address>,
    order: VecDeque<H256>,
}

impl SignatureCache {
    pub fn new(capacity: usize) -> Self {
        SignatureCache {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, hash: &H256) -> Option<Address> {
        self.inner.lock().map.get(hash).copied()
    }

    pub fn insert(&self, hash: H256, signer: Address) {
        let mut inner = self.inner.lock();
        if inner.map.insert(hash, signer).is_none() {
            inner.order.push_back(hash);
            while inner.order.len() > self.capacity {
                if let Some(evicted) = inner.order.pop_front() {
                    inner.map.remove(&evicted);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SignatureCache {
    fn default() -> Self {
        Self::new(INMEMORY_SIGNATURES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(n: u8) -> H256 {
        H256::new([n; 32])
    }

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_insert_and_get() {
        let cache = SignatureCache::new(4);
        cache.insert(hash(1), addr(1));

        assert_eq!(cache.get(&hash(1)), Some(addr(1)));
        assert_eq!(cache.get(&hash(2)), None);
    }

    #[test]
    fn test_eviction_at_capacity() {
        let cache = SignatureCache::new(2);
        cache.insert(hash(1), addr(1));
        cache.insert(hash(2), addr(2));
        cache.insert(hash(3), addr(3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&hash(1)), None);
        assert_eq!(cache.get(&hash(2)), Some(addr(2)));
        assert_eq!(cache.get(&hash(3)), Some(addr(3)));
    }

    #[test]
    fn test_reinsert_does_not_duplicate() {
        let cache = SignatureCache::new(2);
        cache.insert(hash(1), addr(1));
        cache.insert(hash(1), addr(1));
        cache.insert(hash(2), addr(2));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&hash(1)), Some(addr(1)));
    }
}
