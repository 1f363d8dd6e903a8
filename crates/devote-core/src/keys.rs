use k256::ecdsa::{
    RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;
use std::fmt;

use crate::address::Address;
use crate::error::CoreError;
use crate::hash::H256;

/// Size of a recoverable seal signature: r (32) || s (32) || v (1)
pub const SIGNATURE_LENGTH: usize = 65;

/// A 65-byte recoverable secp256k1 signature
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "BigArray")] pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, CoreError> {
        if slice.len() != SIGNATURE_LENGTH {
            return Err(CoreError::InvalidLength {
                expected: SIGNATURE_LENGTH,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes.copy_from_slice(slice);
        Ok(Signature(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

/// A secp256k1 keypair used by witnesses and masternodes
/// Not serializable to prevent accidental exposure
#[derive(Clone)]
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        Keypair {
            signing: SigningKey::random(&mut OsRng),
        }
    }

    /// Create from a 32-byte secret scalar
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CoreError> {
        let signing =
            SigningKey::from_slice(bytes).map_err(|_| CoreError::InvalidPrivateKey)?;
        Ok(Keypair { signing })
    }

    /// The address controlled by this key
    pub fn address(&self) -> Address {
        let point = self.signing.verifying_key().to_encoded_point(false);
        // The encoded point of a valid key is always a 65-byte uncompressed
        // representation, so this cannot fail.
        Address::from_public_key(point.as_bytes()).unwrap_or(Address::ZERO)
    }

    /// Sign a 32-byte message hash, producing a recoverable signature
    pub fn sign_prehash(&self, message: &H256) -> Result<Signature, CoreError> {
        let (signature, recovery_id) = self
            .signing
            .sign_prehash_recoverable(message.as_bytes())
            .map_err(|_| CoreError::InvalidSignature)?;

        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte();
        Ok(Signature(bytes))
    }

    /// Export the raw secret scalar (use with caution)
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing.to_bytes().into()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Recover the signing address from a detached signature over a message hash
pub fn recover_signer(message: &H256, signature: &Signature) -> Result<Address, CoreError> {
    let sig = EcdsaSignature::from_slice(&signature.0[..64])
        .map_err(|_| CoreError::InvalidSignature)?;
    let recovery_id =
        RecoveryId::from_byte(signature.0[64]).ok_or(CoreError::InvalidSignature)?;

    let verifying_key = VerifyingKey::recover_from_prehash(message.as_bytes(), &sig, recovery_id)
        .map_err(|_| CoreError::InvalidSignature)?;

    let point = verifying_key.to_encoded_point(false);
    Address::from_public_key(point.as_bytes())
}
