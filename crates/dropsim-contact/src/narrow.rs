//! Narrow phase: exact node-to-face penetration tests.

use std::collections::BTreeMap;

use dropsim_math::triangle::project_point;
use dropsim_math::DVec3;
use dropsim_mesh::Topology;
use dropsim_types::{BodyId, FaceId};

use crate::broad::CandidatePair;
use crate::contact::{ContactPair, ContactSurface};

/// Trait for narrow phase contact detection.
///
/// Takes candidate pairs from the broad phase and performs exact
/// geometric tests against the current configuration.
pub trait NarrowPhase: Send + Sync {
    /// Returns contacts with penetration in `(0, max_depth]`, sorted by
    /// node. Areas are left at zero for the caller to fill in.
    fn detect(
        &self,
        candidates: &[CandidatePair],
        positions: &[DVec3],
        topology: &Topology,
        max_depth: f64,
    ) -> Vec<ContactPair>;

    /// Returns the narrow phase strategy name.
    fn name(&self) -> &str;
}

/// Signed node-to-face distance test.
///
/// A node is in contact with a face when it lies behind the face
/// (against its outward normal), no deeper than `max_depth`, and its
/// foot point falls inside the triangle. Only the deepest face per
/// (node, body) pair is kept, so a node sinking near an edge of the
/// other body is not pushed twice.
#[derive(Debug, Clone, Copy)]
pub struct NodeFaceTest {
    /// Relative barycentric tolerance for the inside test.
    pub edge_tolerance: f64,
}

impl Default for NodeFaceTest {
    fn default() -> Self {
        Self {
            edge_tolerance: 1.0e-6,
        }
    }
}

impl NarrowPhase for NodeFaceTest {
    fn detect(
        &self,
        candidates: &[CandidatePair],
        positions: &[DVec3],
        topology: &Topology,
        max_depth: f64,
    ) -> Vec<ContactPair> {
        let mut deepest: BTreeMap<(u32, BodyId), ContactPair> = BTreeMap::new();

        for pair in candidates {
            let face = &topology.boundary_faces[pair.face as usize];
            if face.nodes.contains(&pair.node) {
                continue;
            }
            let p = positions[pair.node as usize];
            let [a, b, c] = face.nodes.map(|n| positions[n as usize]);
            let Some(proj) = project_point(p, a, b, c) else {
                continue;
            };

            let depth = -proj.signed_distance;
            if depth <= 0.0 || depth > max_depth || !proj.is_inside(self.edge_tolerance) {
                continue;
            }

            let contact = ContactPair {
                node: pair.node,
                surface: ContactSurface::Face {
                    face: FaceId(pair.face),
                    nodes: face.nodes,
                },
                penetration_depth: depth,
                normal: proj.normal,
                barycentric: proj.barycentric,
                area: 0.0,
            };

            deepest
                .entry((pair.node, face.body))
                .and_modify(|existing| {
                    if depth > existing.penetration_depth {
                        *existing = contact;
                    }
                })
                .or_insert(contact);
        }

        deepest.into_values().collect()
    }

    fn name(&self) -> &str {
        "node_face"
    }
}

/// No-op narrow phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNarrowPhase;

impl NarrowPhase for NullNarrowPhase {
    fn detect(
        &self,
        _candidates: &[CandidatePair],
        _positions: &[DVec3],
        _topology: &Topology,
        _max_depth: f64,
    ) -> Vec<ContactPair> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "null_narrow_phase"
    }
}
