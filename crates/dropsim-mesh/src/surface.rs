//! Boundary surface geometry.
//!
//! Penalty contact is a pressure law, so every contacting node needs the
//! patch of surface it stands for. The tributary area of a node is one
//! third of each adjacent boundary face, weighted by how squarely that
//! face meets the contact normal.

use dropsim_math::triangle::area_normal;
use dropsim_math::DVec3;

use crate::mesh::TetMesh;
use crate::topology::Topology;

/// Per-face area and outward normal of the boundary.
#[derive(Debug, Clone)]
pub struct SurfaceGeometry {
    /// Area of each boundary face.
    pub face_area: Vec<f64>,
    /// Outward unit normal of each boundary face.
    pub face_normal: Vec<DVec3>,
}

impl SurfaceGeometry {
    /// Surface geometry of the reference configuration.
    pub fn from_reference(mesh: &TetMesh, topology: &Topology) -> Self {
        Self::from_positions(&mesh.positions(), topology)
    }

    /// Surface geometry of an arbitrary configuration.
    pub fn from_positions(positions: &[DVec3], topology: &Topology) -> Self {
        let mut face_area = Vec::with_capacity(topology.boundary_faces.len());
        let mut face_normal = Vec::with_capacity(topology.boundary_faces.len());
        for face in &topology.boundary_faces {
            let [a, b, c] = face.nodes.map(|n| positions[n as usize]);
            let (area, normal) = area_normal(a, b, c);
            face_area.push(area);
            face_normal.push(normal);
        }
        Self {
            face_area,
            face_normal,
        }
    }

    /// Unprojected tributary area of every node (zero for interior nodes).
    pub fn nodal_areas(&self, topology: &Topology) -> Vec<f64> {
        topology
            .node_faces
            .iter()
            .map(|faces| faces.iter().map(|&f| self.face_area[f as usize] / 3.0).sum())
            .collect()
    }

    /// Tributary area of `node` projected onto a contact whose normal
    /// points from the obstacle toward the node's body.
    ///
    /// Only faces looking into the obstacle contribute. If none do (a
    /// node on a sharp edge hitting at a grazing angle), the unprojected
    /// area is returned so the node still carries load.
    pub fn tributary_area(&self, topology: &Topology, node: u32, contact_normal: DVec3) -> f64 {
        let faces = &topology.node_faces[node as usize];
        let mut projected = 0.0;
        let mut total = 0.0;
        for &f in faces {
            let share = self.face_area[f as usize] / 3.0;
            total += share;
            projected += share * (-self.face_normal[f as usize].dot(contact_normal)).max(0.0);
        }
        if projected > 0.0 {
            projected
        } else {
            total
        }
    }

    /// Total boundary area.
    pub fn total_area(&self) -> f64 {
        self.face_area.iter().sum()
    }
}
