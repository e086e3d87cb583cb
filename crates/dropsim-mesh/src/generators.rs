//! Structured tetrahedral generators for benchmarks and testing.
//!
//! Production meshes come from an external mesher. These generators
//! produce deterministic, conforming meshes for validation scenarios:
//! every hexahedral cell is split into six tetrahedra along its main
//! diagonal (Kuhn subdivision), so neighbouring cells share faces
//! exactly and every element is positively oriented.

use dropsim_math::tet::signed_volume;
use dropsim_math::DVec3;
use dropsim_types::{DropError, DropResult, MaterialId};

use crate::mesh::TetMesh;

/// Axis orderings of the six Kuhn tetrahedra of a unit cell.
const KUHN_PATHS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// Generates an axis-aligned box of `cells[0] × cells[1] × cells[2]` hexahedral
/// cells, each split into 6 tetrahedra.
///
/// The box spans `origin` to `origin + size`.
///
/// # Example
/// ```
/// use dropsim_math::DVec3;
/// use dropsim_mesh::generators::box_mesh;
/// use dropsim_types::MaterialId;
///
/// let mesh = box_mesh([1, 1, 1], DVec3::splat(0.05), DVec3::ZERO, MaterialId(0));
/// assert_eq!(mesh.node_count(), 8);
/// assert_eq!(mesh.element_count(), 6);
/// assert!(mesh.validate().is_ok());
/// ```
pub fn box_mesh(cells: [usize; 3], size: DVec3, origin: DVec3, material: MaterialId) -> TetMesh {
    let levels = |count: usize, extent: f64, start: f64| -> Vec<f64> {
        (0..=count)
            .map(|i| start + extent * i as f64 / count as f64)
            .collect()
    };
    let xs = levels(cells[0], size.x, origin.x);
    let ys = levels(cells[1], size.y, origin.y);
    let zs = levels(cells[2], size.z, origin.z);
    structured(&xs, &ys, &zs, |_| material)
}

/// Generates a box whose horizontal layers sit at explicit heights and
/// carry their own material, e.g. a foam cushion under a product.
///
/// `levels` lists the layer boundaries bottom to top (strictly
/// increasing, one more entry than `layer_materials`).
///
/// # Example
/// ```
/// use dropsim_math::DVec3;
/// use dropsim_mesh::generators::layered_box;
/// use dropsim_types::MaterialId;
///
/// let mesh = layered_box(
///     [2, 2],
///     [0.1, 0.1],
///     DVec3::ZERO,
///     &[0.0, 0.025, 0.05, 0.075],
///     &[MaterialId(0), MaterialId(0), MaterialId(1)],
/// ).unwrap();
/// assert_eq!(mesh.element_count(), 2 * 2 * 3 * 6);
/// ```
pub fn layered_box(
    cells_xz: [usize; 2],
    footprint: [f64; 2],
    origin: DVec3,
    levels: &[f64],
    layer_materials: &[MaterialId],
) -> DropResult<TetMesh> {
    if levels.len() < 2 || levels.len() != layer_materials.len() + 1 {
        return Err(DropError::InvalidConfig(format!(
            "Layered box needs one more level than layers (got {} levels, {} materials)",
            levels.len(),
            layer_materials.len()
        )));
    }
    if levels.iter().any(|y| !y.is_finite()) || levels.windows(2).any(|w| w[1] <= w[0]) {
        return Err(DropError::InvalidConfig(
            "Layer levels must be strictly increasing".into(),
        ));
    }
    if cells_xz.contains(&0) || footprint.iter().any(|&s| !s.is_finite() || s <= 0.0) {
        return Err(DropError::InvalidConfig(
            "Layered box needs at least one cell and a positive footprint".into(),
        ));
    }

    let axis = |count: usize, extent: f64, start: f64| -> Vec<f64> {
        (0..=count)
            .map(|i| start + extent * i as f64 / count as f64)
            .collect()
    };
    let xs = axis(cells_xz[0], footprint[0], origin.x);
    let zs = axis(cells_xz[1], footprint[1], origin.z);
    let ys: Vec<f64> = levels.iter().map(|y| origin.y + y).collect();

    Ok(structured(&xs, &ys, &zs, |layer| layer_materials[layer]))
}

/// Shared Kuhn subdivision over a tensor-product grid.
fn structured(
    xs: &[f64],
    ys: &[f64],
    zs: &[f64],
    material_of_layer: impl Fn(usize) -> MaterialId,
) -> TetMesh {
    let (nx, ny, nz) = (xs.len() - 1, ys.len() - 1, zs.len() - 1);
    let index = |c: [usize; 3]| -> u32 { ((c[2] * (ny + 1) + c[1]) * (nx + 1) + c[0]) as u32 };

    let mut mesh = TetMesh::with_capacity(xs.len() * ys.len() * zs.len(), nx * ny * nz * 6);

    for &z in zs {
        for &y in ys {
            for &x in xs {
                mesh.push_node(DVec3::new(x, y, z));
            }
        }
    }

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let material = material_of_layer(j);
                for path in KUHN_PATHS {
                    let mut corner = [i, j, k];
                    let mut tet = [index(corner); 4];
                    for (slot, axis) in path.iter().enumerate() {
                        corner[*axis] += 1;
                        tet[slot + 1] = index(corner);
                    }
                    let points = tet.map(|n| mesh.position(n as usize));
                    if signed_volume(&points) < 0.0 {
                        tet.swap(1, 2);
                    }
                    mesh.push_element(tet, material);
                }
            }
        }
    }

    mesh
}
