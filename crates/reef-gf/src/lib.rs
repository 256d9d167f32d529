//! GF(2^8) arithmetic for Reed-Solomon erasure coding.
//!
//! This crate provides:
//! - scalar field operations ([`add`], [`mul`], [`div`], [`inv`], [`exp`])
//!   over GF(2^8) with the primitive polynomial `x^8 + x^4 + x^3 + x^2 + 1`
//!   (0x11D) and primitive element 2,
//! - the vector kernel ([`addmul`], [`addmul_k`]) that does all per-byte
//!   work during encoding and decoding.
//!
//! Exponent and log tables are evaluated at compile time from the
//! polynomial. The 64 KiB product table backing [`mul`] and [`addmul`] is
//! built once per process on first use; initialization is safe under
//! concurrent first access.

mod field;
mod kernel;
mod tables;

pub use field::{add, div, exp, inv, mul};
pub use kernel::{addmul, addmul_k};
pub use tables::POLYNOMIAL;
