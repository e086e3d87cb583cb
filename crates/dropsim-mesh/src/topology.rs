//! Mesh topology queries.
//!
//! Built once per mesh. Provides the adjacency data the solver and the
//! contact detector need:
//! - Node → element fan (mass lumping, nodal stress averaging)
//! - Boundary faces with outward winding (contact surfaces)
//! - Node → boundary face fan (tributary areas)
//! - Body labels: each connected component is one physical part, and
//!   contact is only sought between different parts.

use std::collections::HashMap;

use dropsim_math::tet::TET_FACES;
use dropsim_types::BodyId;

use crate::mesh::TetMesh;

/// A triangle on the mesh boundary, wound so its normal points out
/// of the owning element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryFace {
    /// Node indices in outward counter-clockwise order.
    pub nodes: [u32; 3],
    /// Element the face belongs to.
    pub element: u32,
    /// Body (connected component) of the owning element.
    pub body: BodyId,
}

/// Precomputed topology information for a tetrahedral mesh.
#[derive(Debug, Clone)]
pub struct Topology {
    /// For each node, the elements that contain it.
    pub node_elements: Vec<Vec<u32>>,
    /// Faces used by exactly one element, in element order.
    pub boundary_faces: Vec<BoundaryFace>,
    /// For each node, indices into `boundary_faces` touching it.
    pub node_faces: Vec<Vec<u32>>,
    /// Sorted list of nodes lying on the boundary.
    pub boundary_nodes: Vec<u32>,
    /// Body label per node.
    pub node_body: Vec<BodyId>,
    /// Number of connected components.
    pub body_count: usize,
}

impl Topology {
    /// Build topology from a validated mesh.
    pub fn build(mesh: &TetMesh) -> Self {
        let node_count = mesh.node_count();

        let mut node_elements: Vec<Vec<u32>> = vec![Vec::new(); node_count];
        for (e, tet) in mesh.elements.iter().enumerate() {
            for &n in tet {
                node_elements[n as usize].push(e as u32);
            }
        }

        let (node_body, body_count) = label_bodies(mesh);

        // Count face usage keyed by sorted node triple
        let mut face_use: HashMap<[u32; 3], u32> = HashMap::with_capacity(mesh.element_count() * 2);
        for tet in &mesh.elements {
            for f in TET_FACES {
                let mut key = [tet[f[0]], tet[f[1]], tet[f[2]]];
                key.sort_unstable();
                *face_use.entry(key).or_insert(0) += 1;
            }
        }

        // Collect single-use faces in deterministic element order
        let mut boundary_faces = Vec::new();
        let mut node_faces: Vec<Vec<u32>> = vec![Vec::new(); node_count];
        for (e, tet) in mesh.elements.iter().enumerate() {
            for f in TET_FACES {
                let nodes = [tet[f[0]], tet[f[1]], tet[f[2]]];
                let mut key = nodes;
                key.sort_unstable();
                if face_use.get(&key) == Some(&1) {
                    let index = boundary_faces.len() as u32;
                    for &n in &nodes {
                        node_faces[n as usize].push(index);
                    }
                    boundary_faces.push(BoundaryFace {
                        nodes,
                        element: e as u32,
                        body: node_body[nodes[0] as usize],
                    });
                }
            }
        }

        let boundary_nodes = (0..node_count as u32)
            .filter(|&n| !node_faces[n as usize].is_empty())
            .collect();

        Self {
            node_elements,
            boundary_faces,
            node_faces,
            boundary_nodes,
            node_body,
            body_count,
        }
    }

    /// Body label of node `n`.
    #[inline]
    pub fn body_of(&self, n: u32) -> BodyId {
        self.node_body[n as usize]
    }

    /// Returns true if node `n` lies on the boundary.
    #[inline]
    pub fn is_boundary_node(&self, n: u32) -> bool {
        !self.node_faces[n as usize].is_empty()
    }

    /// Sorted nodes belonging to `body`.
    pub fn nodes_of_body(&self, body: BodyId) -> Vec<u32> {
        (0..self.node_body.len() as u32)
            .filter(|&n| self.node_body[n as usize] == body)
            .collect()
    }

    /// Returns the number of boundary faces.
    pub fn boundary_face_count(&self) -> usize {
        self.boundary_faces.len()
    }

    /// Returns true if the boundary is closed (every boundary edge is
    /// shared by exactly two boundary faces).
    pub fn is_watertight(&self) -> bool {
        let mut edge_use: HashMap<(u32, u32), u32> = HashMap::new();
        for face in &self.boundary_faces {
            let [a, b, c] = face.nodes;
            for (v0, v1) in [(a, b), (b, c), (c, a)] {
                let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
                *edge_use.entry(key).or_insert(0) += 1;
            }
        }
        edge_use.values().all(|&uses| uses == 2)
    }
}

/// Union-find over element connectivity. Labels are assigned in order
/// of the lowest node index of each component.
fn label_bodies(mesh: &TetMesh) -> (Vec<BodyId>, usize) {
    let n = mesh.node_count();
    let mut parent: Vec<u32> = (0..n as u32).collect();

    fn find(parent: &mut [u32], mut x: u32) -> u32 {
        while parent[x as usize] != x {
            let grand = parent[parent[x as usize] as usize];
            parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    for tet in &mesh.elements {
        for &other in &tet[1..] {
            let a = find(&mut parent, tet[0]);
            let b = find(&mut parent, other);
            if a != b {
                let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                parent[hi as usize] = lo;
            }
        }
    }

    let mut label_of_root: HashMap<u32, u32> = HashMap::new();
    let mut labels = Vec::with_capacity(n);
    for node in 0..n as u32 {
        let root = find(&mut parent, node);
        let next = label_of_root.len() as u32;
        let label = *label_of_root.entry(root).or_insert(next);
        labels.push(BodyId(label));
    }
    let count = label_of_root.len();
    (labels, count)
}
