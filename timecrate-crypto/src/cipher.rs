//! AES-256-GCM payload encryption with a 16-byte random nonce.
//!
//! The output blob is `nonce || ciphertext || tag` and is treated as one
//! opaque value by the content store.

use crate::error::{CryptoError, CryptoResult};
use crate::key::EncryptionKey;
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use rand::TryRngCore;
use rand::rngs::OsRng;

/// AES-256-GCM instantiated with a 128-bit nonce.
type PayloadCipher = AesGcm<Aes256, U16>;

/// Nonce size in bytes.
pub const NONCE_SIZE: usize = 16;

/// GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts `plaintext` under `key` with a fresh random nonce.
///
/// Returns `nonce || ciphertext || tag`.
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = PayloadCipher::new_from_slice(key.as_bytes()).map_err(|_| {
        CryptoError::InvalidKeyLength {
            expected: crate::KEY_SIZE,
            actual: key.as_bytes().len(),
        }
    })?;

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::Rng(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(Nonce::<U16>::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypts a blob produced by [`encrypt`].
///
/// Fails with [`CryptoError::CiphertextTooShort`] when the blob cannot hold a
/// nonce and tag, and with [`CryptoError::Decryption`] when authentication
/// fails (wrong key or corrupted blob).
pub fn decrypt(key: &EncryptionKey, blob: &[u8]) -> CryptoResult<Vec<u8>> {
    let minimum = NONCE_SIZE + TAG_SIZE;
    if blob.len() < minimum {
        return Err(CryptoError::CiphertextTooShort {
            minimum,
            actual: blob.len(),
        });
    }

    let cipher = PayloadCipher::new_from_slice(key.as_bytes()).map_err(|_| {
        CryptoError::InvalidKeyLength {
            expected: crate::KEY_SIZE,
            actual: key.as_bytes().len(),
        }
    })?;

    let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
    cipher
        .decrypt(Nonce::<U16>::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}

/// Decrypts with a raw key slice, checking its length first.
pub fn decrypt_with_key_bytes(key: &[u8], blob: &[u8]) -> CryptoResult<Vec<u8>> {
    let key = EncryptionKey::from_slice(key)?;
    decrypt(&key, blob)
}
