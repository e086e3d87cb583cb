//! Broad phase collision detection trait.
//!
//! Quickly identifies *candidate* node-face pairs between different
//! bodies. The narrow phase then refines these into actual contacts.

use dropsim_math::DVec3;
use dropsim_mesh::Topology;
use dropsim_types::DropResult;

/// Candidate pair from the broad phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidatePair {
    /// Boundary node index.
    pub node: u32,
    /// Index into `Topology::boundary_faces`.
    pub face: u32,
}

/// Trait for broad phase collision detection.
///
/// Implementations must return candidates sorted by `(node, face)` and
/// free of duplicates, so contact forces are accumulated in the same
/// order on every run.
///
/// # Implementations
/// - [`SpatialHash`](crate::SpatialHash) — Uniform grid over boundary nodes
/// - [`BruteForce`] — Every boundary node against every foreign face
pub trait BroadPhase: Send + Sync {
    /// Build or update the acceleration structure from current positions.
    fn update(&mut self, positions: &[DVec3], topology: &Topology) -> DropResult<()>;

    /// Query candidate pairs against the current face positions.
    fn query(&self, positions: &[DVec3], topology: &Topology) -> Vec<CandidatePair>;

    /// Returns the broad phase strategy name.
    fn name(&self) -> &str;
}

/// Quadratic reference broad phase, for verification and tiny meshes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl BroadPhase for BruteForce {
    fn update(&mut self, _positions: &[DVec3], _topology: &Topology) -> DropResult<()> {
        Ok(())
    }

    fn query(&self, _positions: &[DVec3], topology: &Topology) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();
        for &node in &topology.boundary_nodes {
            let body = topology.body_of(node);
            for (f, face) in topology.boundary_faces.iter().enumerate() {
                if face.body != body {
                    pairs.push(CandidatePair {
                        node,
                        face: f as u32,
                    });
                }
            }
        }
        pairs
    }

    fn name(&self) -> &str {
        "brute_force"
    }
}

/// No-op broad phase for single-body runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBroadPhase;

impl BroadPhase for NullBroadPhase {
    fn update(&mut self, _positions: &[DVec3], _topology: &Topology) -> DropResult<()> {
        Ok(())
    }

    fn query(&self, _positions: &[DVec3], _topology: &Topology) -> Vec<CandidatePair> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "null_broad_phase"
    }
}
