//! Arithmetic in GF(2^8) with the AES reduction polynomial
//! x^8 + x^4 + x^3 + x + 1 (0x11b).
//!
//! Addition and subtraction are XOR. Multiplication and inversion go through
//! log/antilog tables over the generator 0x03, built at compile time.

use std::ops::{Add, Mul, Sub};

const fn xtime(a: u8) -> u8 {
    let shifted = a << 1;
    if a & 0x80 != 0 { shifted ^ 0x1b } else { shifted }
}

const fn build_tables() -> ([u8; 256], [u8; 256]) {
    let mut exp = [0u8; 256];
    let mut log = [0u8; 256];
    let mut x: u8 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x;
        log[x as usize] = i as u8;
        // multiply by the generator 0x03
        x ^= xtime(x);
        i += 1;
    }
    exp[255] = exp[0];
    (exp, log)
}

const TABLES: ([u8; 256], [u8; 256]) = build_tables();
const EXP: [u8; 256] = TABLES.0;
const LOG: [u8; 256] = TABLES.1;

/// An element of GF(256).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Gf256(pub(crate) u8);

impl Gf256 {
    pub(crate) const ZERO: Self = Gf256(0);
    pub(crate) const ONE: Self = Gf256(1);

    /// Multiplicative inverse, `None` for zero.
    pub(crate) fn inverse(self) -> Option<Self> {
        if self.0 == 0 {
            return None;
        }
        let log = LOG[self.0 as usize] as usize;
        Some(Gf256(EXP[(255 - log) % 255]))
    }

    /// Evaluates `coeffs[0] + coeffs[1]·x + …` at `x` (Horner).
    pub(crate) fn eval_polynomial(coeffs: &[Gf256], x: Gf256) -> Gf256 {
        coeffs
            .iter()
            .rev()
            .fold(Gf256::ZERO, |acc, &c| acc * x + c)
    }

    /// Lagrange interpolation of the polynomial through `points`, evaluated at 0.
    ///
    /// All x-coordinates must be distinct and non-zero; callers validate this.
    pub(crate) fn interpolate_at_zero(points: &[(Gf256, Gf256)]) -> Gf256 {
        let mut acc = Gf256::ZERO;
        for (i, &(xi, yi)) in points.iter().enumerate() {
            let mut num = Gf256::ONE;
            let mut den = Gf256::ONE;
            for (j, &(xj, _)) in points.iter().enumerate() {
                if i != j {
                    num = num * xj;
                    den = den * (xj - xi);
                }
            }
            let basis = match den.inverse() {
                Some(inv) => num * inv,
                None => Gf256::ZERO,
            };
            acc = acc + yi * basis;
        }
        acc
    }
}

impl Add for Gf256 {
    type Output = Gf256;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Gf256) -> Gf256 {
        Gf256(self.0 ^ rhs.0)
    }
}

impl Sub for Gf256 {
    type Output = Gf256;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn sub(self, rhs: Gf256) -> Gf256 {
        Gf256(self.0 ^ rhs.0)
    }
}

impl Mul for Gf256 {
    type Output = Gf256;

    fn mul(self, rhs: Gf256) -> Gf256 {
        if self.0 == 0 || rhs.0 == 0 {
            return Gf256::ZERO;
        }
        let sum = LOG[self.0 as usize] as usize + LOG[rhs.0 as usize] as usize;
        Gf256(EXP[sum % 255])
    }
}
