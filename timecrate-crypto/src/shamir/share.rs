//! Share value type and its string encoding.

use crate::error::ReconstructionError;
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One point on each of the per-byte polynomials of a split secret.
///
/// Encoded as `{threshold:02x}{x:02x}{y bytes as hex}`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    threshold: u8,
    x: u8,
    y: Vec<u8>,
}

impl Share {
    pub(crate) fn new(threshold: u8, x: u8, y: Vec<u8>) -> Self {
        Self { threshold, x, y }
    }

    /// Threshold the share was produced under.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// The share's x-coordinate, in `1..=255`.
    pub fn index(&self) -> u8 {
        self.x
    }

    /// Number of secret bytes this share covers.
    pub fn secret_len(&self) -> usize {
        self.y.len()
    }

    pub(crate) fn values(&self) -> &[u8] {
        &self.y
    }

    /// Encodes the share as a lowercase hex string.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(4 + self.y.len() * 2);
        out.push_str(&format!("{:02x}{:02x}", self.threshold, self.x));
        out.push_str(&hex::encode(&self.y));
        out
    }
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("threshold", &self.threshold)
            .field("index", &self.x)
            .field("secret_len", &self.y.len())
            .finish_non_exhaustive()
    }
}

impl FromStr for Share {
    type Err = ReconstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() % 2 != 0 {
            return Err(ReconstructionError::MalformedShare("odd number of hex digits"));
        }
        let mut bytes =
            hex::decode(s).map_err(|_| ReconstructionError::MalformedShare("not hex"))?;
        if bytes.len() < 3 {
            bytes.zeroize();
            return Err(ReconstructionError::MalformedShare("missing payload"));
        }
        let threshold = bytes[0];
        let x = bytes[1];
        if threshold == 0 {
            bytes.zeroize();
            return Err(ReconstructionError::MalformedShare("zero threshold"));
        }
        if x == 0 {
            bytes.zeroize();
            return Err(ReconstructionError::MalformedShare("zero x-coordinate"));
        }
        let y = bytes[2..].to_vec();
        bytes.zeroize();
        Ok(Share::new(threshold, x, y))
    }
}
