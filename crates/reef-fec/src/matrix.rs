//! Dense matrix operations over GF(2^8).
//!
//! Matrices are row-major `&[u8]` slices. Two inverters are provided: the
//! general Gauss-Jordan [`invert_mat`] used on decode matrices, and the
//! `O(k^2)` [`invert_vdm`] that exploits the polynomial structure of the
//! Vandermonde block built at codec construction.

use reef_gf::{addmul, inv, mul};

use crate::error::CodecError;

/// `c = a * b`, with `a` shaped `n x k`, `b` shaped `k x m` and `c`
/// shaped `n x m`.
pub(crate) fn matmul(a: &[u8], b: &[u8], c: &mut [u8], n: usize, k: usize, m: usize) {
    debug_assert_eq!(a.len(), n * k);
    debug_assert_eq!(b.len(), k * m);
    debug_assert_eq!(c.len(), n * m);

    for row in 0..n {
        for col in 0..m {
            let mut acc = 0u8;
            for i in 0..k {
                acc ^= mul(a[row * k + i], b[i * m + col]);
            }
            c[row * m + col] = acc;
        }
    }
}

/// Locate a pivot for column `col`: prefer the diagonal, otherwise scan
/// unused rows for any entry in an unused column.
fn find_pivot(m: &[u8], ipiv: &[u8], k: usize, col: usize) -> Result<(usize, usize), CodecError> {
    if ipiv[col] != 1 && m[col * k + col] != 0 {
        return Ok((col, col));
    }
    for row in 0..k {
        if ipiv[row] == 1 {
            continue;
        }
        for ix in 0..k {
            match ipiv[ix] {
                0 => {
                    if m[row * k + ix] != 0 {
                        return Ok((row, ix));
                    }
                }
                1 => {}
                // A column used as pivot more than once means the
                // bookkeeping is inconsistent; the matrix cannot be
                // inverted.
                _ => return Err(CodecError::SingularMatrix),
            }
        }
    }
    Err(CodecError::SingularMatrix)
}

/// In-place Gauss-Jordan inversion of the `k x k` matrix `m`.
///
/// Full-pivoting variant after Numerical Recipes: the inverse is built in
/// the same storage, with row swaps undone as column swaps at the end.
pub(crate) fn invert_mat(m: &mut [u8], k: usize) -> Result<(), CodecError> {
    debug_assert_eq!(m.len(), k * k);

    let mut indxr = vec![0usize; k];
    let mut indxc = vec![0usize; k];
    let mut ipiv = vec![0u8; k];
    let mut pivot_row = vec![0u8; k];

    for col in 0..k {
        let (irow, icol) = find_pivot(m, &ipiv, k, col)?;
        ipiv[icol] += 1;

        // Swap so the pivot lands on the diagonal.
        if irow != icol {
            for i in 0..k {
                m.swap(irow * k + i, icol * k + i);
            }
        }
        indxr[col] = irow;
        indxc[col] = icol;

        // Normalize: the diagonal entry ends up holding the pivot's
        // inverse, which is what builds the inverse in place.
        let c = m[icol * k + icol];
        if c == 0 {
            return Err(CodecError::SingularMatrix);
        }
        if c != 1 {
            let c_inv = inv(c);
            m[icol * k + icol] = 1;
            for v in &mut m[icol * k..(icol + 1) * k] {
                *v = mul(c_inv, *v);
            }
        }

        pivot_row.copy_from_slice(&m[icol * k..(icol + 1) * k]);

        // When the pivot row is a unit row the eliminations are no-ops.
        let is_unit = pivot_row
            .iter()
            .enumerate()
            .all(|(i, &v)| v == u8::from(i == icol));
        if !is_unit {
            for row in 0..k {
                if row == icol {
                    continue;
                }
                let c = m[row * k + icol];
                m[row * k + icol] = 0;
                addmul(&mut m[row * k..(row + 1) * k], &pivot_row, c);
            }
        }
    }

    // Undo the row swaps as column swaps, in reverse order.
    for col in (0..k).rev() {
        if indxr[col] != indxc[col] {
            for row in 0..k {
                m.swap(row * k + indxr[col], row * k + indxc[col]);
            }
        }
    }

    Ok(())
}

/// In-place inversion of a `k x k` Vandermonde matrix, `O(k^2)`.
///
/// Only column 1 (the evaluation points `p_i`) is read; the matrix is
/// assumed non-singular and genuinely Vandermonde. The coefficients of
/// `P(x) = prod (x - p_i)` are built first, then each row of the inverse
/// comes from synthetic division of `P` by `(x - p_row)`, scaled by the
/// inverse of `prod_{j != row} (p_row - p_j)`.
pub(crate) fn invert_vdm(v: &mut [u8], k: usize) {
    debug_assert_eq!(v.len(), k * k);

    // Degenerate case: the matrix must be [p^0] = [1].
    if k == 1 {
        return;
    }

    let p: Vec<u8> = (0..k).map(|i| v[i * k + 1]).collect();

    // P(x) coefficients, built by multiplying in (x - p_i) one at a
    // time. In GF(2^8) negation is the identity, so -p_i == p_i.
    let mut c = vec![0u8; k];
    c[k - 1] = p[0];
    for i in 1..k {
        let p_i = p[i];
        for j in (k - i)..(k - 1) {
            c[j] ^= mul(p_i, c[j + 1]);
        }
        c[k - 1] ^= p_i;
    }

    let mut b = vec![0u8; k];
    for row in 0..k {
        let xx = p[row];
        let mut t = 1u8;
        b[k - 1] = 1; // implicit leading coefficient of P(x)
        for i in (0..k - 1).rev() {
            b[i] = c[i + 1] ^ mul(xx, b[i + 1]);
            t = mul(xx, t) ^ b[i];
        }
        let t_inv = inv(t);
        for col in 0..k {
            v[col * k + row] = mul(t_inv, b[col]);
        }
    }
}
