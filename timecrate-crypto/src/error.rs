//! Error types for the crypto layer.

use thiserror::Error;

/// Result type for cipher and key operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from key handling, encryption and decryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("ciphertext too short: {actual} bytes, need at least {minimum}")]
    CiphertextTooShort { minimum: usize, actual: usize },

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed (wrong key or tampered data)")]
    Decryption,

    #[error("random number generator failure: {0}")]
    Rng(String),

    #[error("invalid sharing parameters: threshold {threshold} of {total} shares")]
    InvalidSharingParameters { threshold: u8, total: u8 },

    #[error("cannot split an empty secret")]
    EmptySecret,
}

/// Errors from decoding shares or recombining them into a secret.
///
/// Messages never include share material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconstructionError {
    #[error("not enough shares: got {got}, need {need}")]
    InsufficientShares { got: usize, need: usize },

    #[error("duplicate share x-coordinate {0}")]
    DuplicateShare(u8),

    #[error("share length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("shares were produced under different thresholds ({0} and {1})")]
    ThresholdMismatch(u8, u8),

    #[error("malformed share: {0}")]
    MalformedShare(&'static str),
}
