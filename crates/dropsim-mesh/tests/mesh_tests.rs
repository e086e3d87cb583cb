//! Integration tests for dropsim-mesh.

use approx::assert_relative_eq;
use dropsim_math::DVec3;
use dropsim_mesh::generators::{box_mesh, layered_box};
use dropsim_mesh::{IndexBase, SurfaceGeometry, TetMesh, Topology};
use dropsim_types::{BodyId, DropError, MaterialId};

fn single_tet() -> TetMesh {
    TetMesh {
        pos_x: vec![0.0, 1.0, 0.0, 0.0],
        pos_y: vec![0.0, 0.0, 1.0, 0.0],
        pos_z: vec![0.0, 0.0, 0.0, 1.0],
        fixed: vec![false; 4],
        elements: vec![[0, 1, 2, 3]],
        material_ids: vec![MaterialId(0)],
    }
}

fn unit_cube() -> TetMesh {
    box_mesh([1, 1, 1], DVec3::ONE, DVec3::ZERO, MaterialId(0))
}

fn expect_invalid_mesh(mesh: &TetMesh, fragment: &str) {
    match mesh.validate() {
        Err(DropError::InvalidMesh(msg)) => {
            assert!(msg.contains(fragment), "message {msg:?} lacks {fragment:?}")
        }
        other => panic!("expected InvalidMesh, got {other:?}"),
    }
}

// ─── TetMesh Tests ────────────────────────────────────────────

#[test]
fn basic_counts() {
    let mesh = single_tet();
    assert_eq!(mesh.node_count(), 4);
    assert_eq!(mesh.element_count(), 1);
    assert_relative_eq!(mesh.element_volume(0), 1.0 / 6.0);
}

#[test]
fn validate_ok() {
    assert!(single_tet().validate().is_ok());
    assert!(unit_cube().validate().is_ok());
}

#[test]
fn validation_is_idempotent() {
    let mesh = box_mesh([3, 2, 2], DVec3::new(0.3, 0.1, 0.2), DVec3::ZERO, MaterialId(0));
    let first = mesh.validate().is_ok();
    let second = mesh.validate().is_ok();
    assert!(first && second);

    let mut broken = mesh.clone();
    broken.elements[5] = [0, 0, 1, 2];
    let a = broken.validate().unwrap_err().to_string();
    let b = broken.validate().unwrap_err().to_string();
    assert_eq!(a, b);
}

#[test]
fn validate_catches_inconsistent_lengths() {
    let mut mesh = single_tet();
    mesh.pos_y.push(99.0);
    expect_invalid_mesh(&mesh, "inconsistent lengths");
}

#[test]
fn validate_catches_dangling_reference() {
    let mut mesh = single_tet();
    mesh.elements[0][3] = 99;
    expect_invalid_mesh(&mesh, "out of range");
}

#[test]
fn validate_catches_repeated_node() {
    let mut mesh = single_tet();
    mesh.elements[0] = [0, 1, 1, 3];
    expect_invalid_mesh(&mesh, "repeated node");
}

#[test]
fn validate_catches_zero_volume() {
    let mut mesh = single_tet();
    // Flatten node 3 into the base plane
    mesh.pos_z[3] = 0.0;
    mesh.pos_x[3] = 0.5;
    mesh.pos_y[3] = 0.5;
    expect_invalid_mesh(&mesh, "degenerate");
}

#[test]
fn validate_catches_inverted_element() {
    let mut mesh = single_tet();
    mesh.elements[0].swap(1, 2);
    expect_invalid_mesh(&mesh, "inverted");
}

#[test]
fn orient_elements_repairs_inversion() {
    let mut mesh = single_tet();
    mesh.elements[0].swap(1, 2);
    assert_eq!(mesh.orient_elements(), 1);
    assert!(mesh.validate().is_ok());
}

#[test]
fn validate_catches_orphan_node() {
    let mut mesh = single_tet();
    mesh.push_node(DVec3::new(5.0, 5.0, 5.0));
    expect_invalid_mesh(&mesh, "not referenced");
}

#[test]
fn validate_catches_non_finite_coordinate() {
    let mut mesh = single_tet();
    mesh.pos_x[1] = f64::NAN;
    expect_invalid_mesh(&mesh, "non-finite");
}

#[test]
fn validate_catches_non_manifold_face() {
    // Three tetrahedra hanging off the same triangle (0, 1, 2)
    let mut mesh = TetMesh::with_capacity(6, 3);
    for p in [
        DVec3::ZERO,
        DVec3::X,
        DVec3::Z,
        DVec3::Y,
        -DVec3::Y,
        DVec3::new(0.2, 2.0, 0.2),
    ] {
        mesh.push_node(p);
    }
    mesh.push_element([0, 2, 1, 3], MaterialId(0));
    mesh.push_element([0, 1, 2, 4], MaterialId(0));
    mesh.push_element([0, 2, 1, 5], MaterialId(0));
    expect_invalid_mesh(&mesh, "Non-manifold");
}

#[test]
fn validate_catches_duplicate_element() {
    let mut mesh = single_tet();
    mesh.push_element([1, 2, 0, 3], MaterialId(0));
    expect_invalid_mesh(&mesh, "duplicates");
}

#[test]
fn from_interleaved_one_based() {
    let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
    let mesh = TetMesh::from_interleaved(&positions, &[1, 2, 3, 4], &[2], IndexBase::One).unwrap();
    assert_eq!(mesh.elements[0], [0, 1, 2, 3]);
    assert_eq!(mesh.material_ids[0], MaterialId(2));
}

#[test]
fn from_interleaved_rejects_zero_under_one_base() {
    let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
    let result = TetMesh::from_interleaved(&positions, &[0, 1, 2, 3], &[0], IndexBase::One);
    assert!(matches!(result, Err(DropError::InvalidMesh(_))));
}

#[test]
fn index_base_wire_values() {
    assert_eq!(IndexBase::from_u8(1).unwrap(), IndexBase::One);
    assert!(IndexBase::from_u8(2).is_err());
}

#[test]
fn fix_nodes_on_base() {
    let mut mesh = box_mesh([2, 1, 2], DVec3::ONE, DVec3::ZERO, MaterialId(0));
    let fixed = mesh.fix_nodes_where(|p| p.y == 0.0);
    assert_eq!(fixed, 9);
    assert_eq!(mesh.fixed_count(), 9);
}

#[test]
fn centroid_of_box() {
    let mesh = box_mesh([2, 3, 2], DVec3::new(2.0, 1.0, 4.0), DVec3::splat(1.0), MaterialId(0));
    let c = mesh.centroid();
    assert_relative_eq!(c.x, 2.0, epsilon = 1e-12);
    assert_relative_eq!(c.y, 1.5, epsilon = 1e-12);
    assert_relative_eq!(c.z, 3.0, epsilon = 1e-12);
}

// ─── Generator Tests ──────────────────────────────────────────

#[test]
fn box_mesh_volume_is_exact() {
    let mesh = box_mesh([3, 2, 4], DVec3::new(0.3, 0.2, 0.4), DVec3::ZERO, MaterialId(0));
    assert_eq!(mesh.element_count(), 3 * 2 * 4 * 6);
    assert_eq!(mesh.node_count(), 4 * 3 * 5);
    assert_relative_eq!(mesh.total_volume(), 0.3 * 0.2 * 0.4, epsilon = 1e-14);
    assert!((0..mesh.element_count()).all(|e| mesh.element_volume(e) > 0.0));
}

#[test]
fn layered_box_assigns_layer_materials() {
    let mesh = layered_box(
        [2, 2],
        [0.08, 0.08],
        DVec3::ZERO,
        &[0.0, 0.02, 0.04, 0.05],
        &[MaterialId(0), MaterialId(0), MaterialId(1)],
    )
    .unwrap();
    assert!(mesh.validate().is_ok());
    let top = mesh.material_ids.iter().filter(|&&m| m == MaterialId(1)).count();
    assert_eq!(top, 2 * 2 * 6);
    let top_nodes = mesh.nodes_with_material(MaterialId(1));
    assert_eq!(top_nodes.len(), 2 * 9);
}

#[test]
fn layered_box_rejects_bad_levels() {
    let err = layered_box([1, 1], [1.0, 1.0], DVec3::ZERO, &[0.0, 0.5, 0.4], &[MaterialId(0), MaterialId(0)]);
    assert!(matches!(err, Err(DropError::InvalidConfig(_))));
}

// ─── Topology Tests ───────────────────────────────────────────

#[test]
fn cube_boundary_is_twelve_triangles() {
    let mesh = unit_cube();
    let topo = Topology::build(&mesh);
    assert_eq!(topo.boundary_face_count(), 12);
    assert_eq!(topo.boundary_nodes.len(), 8);
    assert!(topo.is_watertight());
}

#[test]
fn boundary_faces_point_outward() {
    let mesh = box_mesh([2, 2, 2], DVec3::ONE, DVec3::ZERO, MaterialId(0));
    let topo = Topology::build(&mesh);
    let surface = SurfaceGeometry::from_reference(&mesh, &topo);
    let center = DVec3::splat(0.5);
    for (face, normal) in topo.boundary_faces.iter().zip(&surface.face_normal) {
        let centroid = face
            .nodes
            .iter()
            .map(|&n| mesh.position(n as usize))
            .sum::<DVec3>()
            / 3.0;
        assert!((centroid - center).dot(*normal) > 0.0);
    }
    assert_relative_eq!(surface.total_area(), 6.0, epsilon = 1e-12);
}

#[test]
fn interior_nodes_are_not_boundary() {
    let mesh = box_mesh([2, 2, 2], DVec3::ONE, DVec3::ZERO, MaterialId(0));
    let topo = Topology::build(&mesh);
    // Node at the center of the 3×3×3 lattice
    let center = 13;
    assert!(!topo.is_boundary_node(center));
    assert_eq!(topo.boundary_nodes.len(), 26);
}

#[test]
fn separate_parts_get_separate_bodies() {
    let mut mesh = box_mesh([1, 1, 1], DVec3::ONE, DVec3::ZERO, MaterialId(0));
    let other = box_mesh([1, 1, 1], DVec3::ONE, DVec3::new(3.0, 0.0, 0.0), MaterialId(0));
    let offset = mesh.append(&other);
    assert_eq!(offset, 8);
    let topo = Topology::build(&mesh);
    assert_eq!(topo.body_count, 2);
    assert_eq!(topo.body_of(0), BodyId(0));
    assert_eq!(topo.body_of(8), BodyId(1));
    assert_eq!(topo.nodes_of_body(BodyId(1)).len(), 8);
}

#[test]
fn tributary_area_of_bottom_face() {
    let mesh = box_mesh([2, 1, 2], DVec3::new(0.2, 0.1, 0.2), DVec3::ZERO, MaterialId(0));
    let topo = Topology::build(&mesh);
    let surface = SurfaceGeometry::from_reference(&mesh, &topo);
    let bottom: f64 = (0..mesh.node_count() as u32)
        .filter(|&n| mesh.pos_y[n as usize] == 0.0)
        .map(|n| surface.tributary_area(&topo, n, DVec3::Y))
        .sum();
    assert_relative_eq!(bottom, 0.04, epsilon = 1e-12);
}

#[test]
fn new_validates_input() {
    let positions = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
    let mesh = TetMesh::new(&positions, vec![[0, 1, 2, 3]], vec![MaterialId(0)]).unwrap();
    assert_eq!(mesh.fixed_count(), 0);
    let err = TetMesh::new(&positions, vec![[0, 1, 2, 7]], vec![MaterialId(0)]);
    assert!(matches!(err, Err(DropError::InvalidMesh(_))));
}

#[test]
fn merge_keeps_parts_apart() {
    let a = unit_cube();
    let mut b = unit_cube();
    b.translate(DVec3::new(0.0, 2.0, 0.0));
    let merged = TetMesh::merge(&[a, b]);
    assert_eq!(merged.node_count(), 16);
    assert_eq!(merged.element_count(), 12);
    assert!(merged.validate().is_ok());
    assert_eq!(Topology::build(&merged).body_count, 2);
}
