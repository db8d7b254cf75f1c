//! Crypto layer for timecrate.
//!
//! Provides the two primitives a crate is built from:
//! - AES-256-GCM payload encryption with a per-call random 16-byte nonce
//! - Shamir secret sharing over GF(256) for splitting the payload key
//!
//! # Architecture
//!
//! A crate's payload is encrypted once under a fresh [`EncryptionKey`].
//! The key's hex form is then split into `n` shares with threshold `k`:
//!
//! 1. **Payload**: `nonce || ciphertext || tag`, stored by the content store.
//!    It is useless without the key.
//!
//! 2. **Shares**: each keeper holds one share. Any `k` shares rebuild the key;
//!    `k - 1` reveal nothing about it.
//!
//! Keys and shares zero their memory on drop and never print their contents
//! through `Debug`.

mod cipher;
mod error;
mod key;
pub mod shamir;

pub use cipher::{NONCE_SIZE, TAG_SIZE, decrypt, decrypt_with_key_bytes, encrypt};
pub use error::{CryptoError, CryptoResult, ReconstructionError};
pub use key::{EncryptionKey, KEY_SIZE, generate_key};
pub use shamir::{Share, combine, combine_encoded, split};
