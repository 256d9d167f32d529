//! Scalar field operations backed by the product table.

use std::sync::OnceLock;

use crate::tables::{EXP, INVERSE, LOG};

/// Full 256x256 product table. Row `c` holds `c * x` for every `x`, which
/// is what the vector kernel wants: one row lookup per coefficient, then
/// one indexed load per byte.
static MUL: OnceLock<Box<[[u8; 256]; 256]>> = OnceLock::new();

/// The product table, built on first use. Subsequent calls are an atomic
/// load. Racing first calls all observe the same fully-written table.
pub(crate) fn mul_table() -> &'static [[u8; 256]; 256] {
    MUL.get_or_init(|| {
        let mut table = Box::new([[0u8; 256]; 256]);
        for a in 1..256 {
            for b in 1..256 {
                table[a][b] = EXP[(LOG[a] as usize + LOG[b] as usize) % 255];
            }
        }
        table
    })
}

/// Field addition. Subtraction is the same operation.
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Field multiplication.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    mul_table()[a as usize][b as usize]
}

/// Multiplicative inverse. `inv(0)` returns the sentinel 0; callers must
/// not divide by zero.
#[inline]
pub fn inv(a: u8) -> u8 {
    debug_assert!(a != 0, "inverse of zero");
    INVERSE[a as usize]
}

/// Field division `a / b` for `b != 0`.
#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    debug_assert!(b != 0, "division by zero");
    mul(a, INVERSE[b as usize])
}

/// `2^i` with the exponent reduced mod 255, so any usize power is valid.
#[inline]
pub const fn exp(i: usize) -> u8 {
    EXP[i % 255]
}
