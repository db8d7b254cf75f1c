//! Shamir secret sharing over GF(256).
//!
//! Every byte of the secret gets its own random polynomial of degree
//! `threshold - 1` whose constant term is that byte. Share `i` holds the
//! evaluations of all polynomials at `x = i`, so any `threshold` shares
//! recover the secret by interpolating at zero and fewer reveal nothing.
//!
//! Shares carry the threshold they were produced under; [`combine`] refuses
//! sets smaller than that instead of interpolating a lower-degree polynomial
//! and returning a wrong secret.

mod field;
mod share;

pub use share::Share;

use crate::error::{CryptoError, CryptoResult, ReconstructionError};
use field::Gf256;
use rand::TryRngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Splits `secret` into `total` shares, any `threshold` of which recombine it.
///
/// Shares use x-coordinates `1..=total` in order.
pub fn split(secret: &[u8], total: u8, threshold: u8) -> CryptoResult<Vec<Share>> {
    if secret.is_empty() {
        return Err(CryptoError::EmptySecret);
    }
    if threshold == 0 || total == 0 || threshold > total {
        return Err(CryptoError::InvalidSharingParameters { threshold, total });
    }

    let degree = (threshold - 1) as usize;
    let mut randomness = Zeroizing::new(vec![0u8; degree * secret.len()]);
    OsRng
        .try_fill_bytes(&mut randomness)
        .map_err(|e| CryptoError::Rng(e.to_string()))?;

    let mut values: Vec<Zeroizing<Vec<u8>>> = (0..total)
        .map(|_| Zeroizing::new(Vec::with_capacity(secret.len())))
        .collect();
    let mut coeffs = vec![Gf256::ZERO; threshold as usize];

    for (pos, &byte) in secret.iter().enumerate() {
        coeffs[0] = Gf256(byte);
        for (c, &r) in coeffs[1..]
            .iter_mut()
            .zip(&randomness[pos * degree..(pos + 1) * degree])
        {
            *c = Gf256(r);
        }
        for (i, ys) in values.iter_mut().enumerate() {
            let x = Gf256(i as u8 + 1);
            ys.push(Gf256::eval_polynomial(&coeffs, x).0);
        }
    }
    coeffs.iter_mut().for_each(|c| *c = Gf256::ZERO);

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, ys)| Share::new(threshold, i as u8 + 1, ys.to_vec()))
        .collect())
}

/// Recombines a set of shares into the secret.
///
/// Every share must come from the same split: same threshold, same length,
/// distinct x-coordinates. At least `threshold` shares are required, and at
/// least two unless the split used a threshold of one. The result does not
/// depend on which shares are supplied or in what order.
pub fn combine(shares: &[Share]) -> Result<Vec<u8>, ReconstructionError> {
    let first = shares
        .first()
        .ok_or(ReconstructionError::InsufficientShares { got: 0, need: 2 })?;

    let threshold = first.threshold();
    let secret_len = first.secret_len();

    let mut seen = [false; 256];
    for share in shares {
        if share.threshold() != threshold {
            return Err(ReconstructionError::ThresholdMismatch(
                threshold,
                share.threshold(),
            ));
        }
        if share.secret_len() != secret_len {
            return Err(ReconstructionError::LengthMismatch {
                expected: secret_len,
                actual: share.secret_len(),
            });
        }
        let x = share.index();
        if seen[x as usize] {
            return Err(ReconstructionError::DuplicateShare(x));
        }
        seen[x as usize] = true;
    }

    // a 1-of-n split is a constant polynomial: any single share is the secret
    let need = usize::from(threshold.max(1));
    if shares.len() < need {
        return Err(ReconstructionError::InsufficientShares {
            got: shares.len(),
            need,
        });
    }
    if secret_len == 0 {
        return Err(ReconstructionError::MalformedShare("missing payload"));
    }

    let mut points = vec![(Gf256::ZERO, Gf256::ZERO); shares.len()];
    let mut secret = Vec::with_capacity(secret_len);
    for pos in 0..secret_len {
        for (point, share) in points.iter_mut().zip(shares) {
            *point = (Gf256(share.index()), Gf256(share.values()[pos]));
        }
        secret.push(Gf256::interpolate_at_zero(&points).0);
    }
    points
        .iter_mut()
        .for_each(|p| *p = (Gf256::ZERO, Gf256::ZERO));

    Ok(secret)
}

/// Parses encoded shares and recombines them.
pub fn combine_encoded<S: AsRef<str>>(shares: &[S]) -> Result<Vec<u8>, ReconstructionError> {
    let parsed = shares
        .iter()
        .map(|s| s.as_ref().parse::<Share>())
        .collect::<Result<Vec<_>, _>>()?;
    combine(&parsed)
}
