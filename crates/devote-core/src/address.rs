use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::hash::keccak256;

/// Size of a witness address in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// A 20-byte account address derived from a secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    pub fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, CoreError> {
        if slice.len() != ADDRESS_LENGTH {
            return Err(CoreError::InvalidLength {
                expected: ADDRESS_LENGTH,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(slice);
        Ok(Address(bytes))
    }

    /// Derive an address from an uncompressed secp256k1 public key.
    ///
    /// Takes the last 20 bytes of the Keccak-256 hash of the public key,
    /// skipping the leading 0x04 point-encoding tag.
    pub fn from_public_key(pubkey: &[u8]) -> Result<Self, CoreError> {
        if pubkey.len() != 65 || pubkey[0] != 0x04 {
            return Err(CoreError::InvalidPublicKey);
        }
        let hash = keccak256(&pubkey[1..]);
        Self::from_slice(&hash.as_bytes()[12..])
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}
