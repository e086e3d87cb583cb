//! Eigen-decomposition of symmetric 3×3 matrices.
//!
//! Hyperelastic laws are written in terms of principal stretches, which
//! are the square roots of the eigenvalues of the left Cauchy-Green
//! tensor `B = F·Fᵀ`. The cyclic Jacobi method is used because it is
//! unconditionally convergent for symmetric input and returns an
//! orthonormal eigenbasis even when eigenvalues repeat (the common
//! case for uniaxial compression, where two stretches are equal).

use glam::{DMat3, DVec3};

/// Upper bound on Jacobi sweeps. Quadratic convergence means 3×3
/// input settles in well under ten.
const MAX_SWEEPS: usize = 50;

/// Result of a symmetric eigen-decomposition `A = V · diag(λ) · Vᵀ`.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricEigen {
    /// Eigenvalues, in the order of the columns of `vectors`.
    pub values: DVec3,
    /// Orthonormal eigenvectors stored as columns.
    pub vectors: DMat3,
}

impl SymmetricEigen {
    /// Rebuilds a symmetric tensor sharing this eigenbasis:
    /// `V · diag(d) · Vᵀ`.
    pub fn compose(&self, diagonal: DVec3) -> DMat3 {
        self.vectors * DMat3::from_diagonal(diagonal) * self.vectors.transpose()
    }
}

/// Decompose a symmetric matrix with cyclic Jacobi rotations.
///
/// Only the upper triangle is read; the input is assumed symmetric.
pub fn symmetric_eigen(m: &DMat3) -> SymmetricEigen {
    // a[r][c], symmetric so row/column order does not matter
    let cols = m.to_cols_array_2d();
    let mut a = [[0.0f64; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            a[r][c] = if r <= c { cols[c][r] } else { cols[r][c] };
        }
    }
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    let scale = a.iter().flatten().map(|x| x * x).sum::<f64>().sqrt();
    let tolerance = f64::EPSILON * scale;

    for _ in 0..MAX_SWEEPS {
        let off = a[0][1].abs() + a[0][2].abs() + a[1][2].abs();
        if off <= tolerance || off == 0.0 {
            break;
        }

        for (p, q) in [(0usize, 1usize), (0, 2), (1, 2)] {
            if a[p][q].abs() <= f64::MIN_POSITIVE {
                continue;
            }
            let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            for row in a.iter_mut() {
                let (akp, akq) = (row[p], row[q]);
                row[p] = c * akp - s * akq;
                row[q] = s * akp + c * akq;
            }
            for k in 0..3 {
                let (apk, aqk) = (a[p][k], a[q][k]);
                a[p][k] = c * apk - s * aqk;
                a[q][k] = s * apk + c * aqk;
            }
            for row in v.iter_mut() {
                let (vkp, vkq) = (row[p], row[q]);
                row[p] = c * vkp - s * vkq;
                row[q] = s * vkp + c * vkq;
            }
        }
    }

    SymmetricEigen {
        values: DVec3::new(a[0][0], a[1][1], a[2][2]),
        vectors: DMat3::from_cols(
            DVec3::new(v[0][0], v[1][0], v[2][0]),
            DVec3::new(v[0][1], v[1][1], v[2][1]),
            DVec3::new(v[0][2], v[1][2], v[2][2]),
        ),
    }
}
