pub mod memory;

use crate::error::StateError;

/// Key-value storage for consensus bookkeeping
pub trait Storage: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError>;

    /// Put a key-value pair
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError>;

    /// Delete a key
    fn delete(&mut self, key: &[u8]) -> Result<(), StateError>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> Result<bool, StateError> {
        Ok(self.get(key)?.is_some())
    }
}

pub use memory::MemoryStorage;
