//! Small tensor helpers shared by the constitutive and result code.

use glam::{DMat3, DVec3};

/// Symmetric part `(A + Aᵀ) / 2`.
#[inline]
pub fn symmetric_part(m: &DMat3) -> DMat3 {
    (*m + m.transpose()) * 0.5
}

/// Trace of a 3×3 matrix.
#[inline]
pub fn trace(m: &DMat3) -> f64 {
    m.x_axis.x + m.y_axis.y + m.z_axis.z
}

/// Outer product `a ⊗ b` (column `c` is `a * b[c]`).
#[inline]
pub fn outer(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// Double contraction `A : B`.
#[inline]
pub fn ddot(a: &DMat3, b: &DMat3) -> f64 {
    a.x_axis.dot(b.x_axis) + a.y_axis.dot(b.y_axis) + a.z_axis.dot(b.z_axis)
}

/// Voigt packing of a symmetric tensor: `[xx, yy, zz, xy, yz, zx]`.
pub fn to_voigt(m: &DMat3) -> [f64; 6] {
    [
        m.x_axis.x,
        m.y_axis.y,
        m.z_axis.z,
        0.5 * (m.y_axis.x + m.x_axis.y),
        0.5 * (m.z_axis.y + m.y_axis.z),
        0.5 * (m.x_axis.z + m.z_axis.x),
    ]
}

/// Von Mises equivalent stress of a symmetric stress tensor.
pub fn von_mises(sigma: &DMat3) -> f64 {
    let [xx, yy, zz, xy, yz, zx] = to_voigt(sigma);
    let normal = (xx - yy).powi(2) + (yy - zz).powi(2) + (zz - xx).powi(2);
    let shear = 6.0 * (xy * xy + yz * yz + zx * zx);
    (0.5 * (normal + shear)).sqrt()
}

/// True when every component is finite.
#[inline]
pub fn is_finite_mat(m: &DMat3) -> bool {
    m.x_axis.is_finite() && m.y_axis.is_finite() && m.z_axis.is_finite()
}
