//! Symmetric payload keys.

use crate::error::{CryptoError, CryptoResult};
use rand::TryRngCore;
use rand::rngs::OsRng;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of a payload key in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// A 256-bit key that encrypts exactly one crate's payload.
///
/// The key bytes are zeroed when the value is dropped. `Debug` only ever
/// prints the masked prefix.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Draws a fresh key from the operating system CSPRNG.
    pub fn generate() -> CryptoResult<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::Rng(e.to_string()))?;
        let key = Self(bytes);
        bytes.zeroize();
        Ok(key)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a slice, which must be exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let array: [u8; KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Parses the 64-character hex form produced by [`EncryptionKey::to_hex`].
    pub fn from_hex(encoded: &str) -> CryptoResult<Self> {
        let bytes = Zeroizing::new(
            hex::decode(encoded).map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?,
        );
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Lowercase hex encoding; this is the secret handed to the splitter.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    /// First four hex characters followed by an ellipsis, for operator logs.
    pub fn masked(&self) -> String {
        format!("{}…", hex::encode(&self.0[..2]))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKey({})", self.masked())
    }
}

/// Generates a fresh random payload key.
pub fn generate_key() -> CryptoResult<EncryptionKey> {
    EncryptionKey::generate()
}
