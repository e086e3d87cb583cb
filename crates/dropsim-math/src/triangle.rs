//! Triangle geometry for node-to-surface contact.

use glam::DVec3;

/// Area and unit normal of the triangle `(a, b, c)` (counter-clockwise
/// winding gives the normal by the right-hand rule). Degenerate
/// triangles return a zero normal.
pub fn area_normal(a: DVec3, b: DVec3, c: DVec3) -> (f64, DVec3) {
    let cross = (b - a).cross(c - a);
    let len = cross.length();
    if len <= f64::MIN_POSITIVE {
        return (0.0, DVec3::ZERO);
    }
    (0.5 * len, cross / len)
}

/// Projection of a point onto the plane of a triangle.
#[derive(Debug, Clone, Copy)]
pub struct TriangleProjection {
    /// Distance along the unit normal. Negative means the point is
    /// behind the face.
    pub signed_distance: f64,
    /// Barycentric coordinates of the foot point, unclamped.
    pub barycentric: [f64; 3],
    /// Unit normal of the triangle.
    pub normal: DVec3,
}

impl TriangleProjection {
    /// True when the foot point lies inside the triangle, allowing a
    /// small relative tolerance on each coordinate.
    #[inline]
    pub fn is_inside(&self, tolerance: f64) -> bool {
        self.barycentric.iter().all(|&w| w >= -tolerance)
    }
}

/// Project `p` onto the plane of `(a, b, c)`.
///
/// Returns `None` for degenerate triangles.
pub fn project_point(p: DVec3, a: DVec3, b: DVec3, c: DVec3) -> Option<TriangleProjection> {
    let (area, normal) = area_normal(a, b, c);
    if area == 0.0 {
        return None;
    }

    let signed_distance = (p - a).dot(normal);
    let foot = p - normal * signed_distance;

    // Sub-triangle areas signed against the face normal
    let twice_area = 2.0 * area;
    let wa = (b - foot).cross(c - foot).dot(normal) / twice_area;
    let wb = (c - foot).cross(a - foot).dot(normal) / twice_area;
    let wc = 1.0 - wa - wb;

    Some(TriangleProjection {
        signed_distance,
        barycentric: [wa, wb, wc],
        normal,
    })
}
