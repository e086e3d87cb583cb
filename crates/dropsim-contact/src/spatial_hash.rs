//! Spatial hash broad phase for uniform-grid contact detection.
//!
//! Bins boundary nodes into cells. Each boundary face queries the cells
//! its bounding box overlaps, grown by one cell so nodes that moved
//! since the last rebuild are still found.

use std::collections::HashMap;

use dropsim_math::DVec3;
use dropsim_mesh::Topology;
use dropsim_types::{DropError, DropResult};

use crate::broad::{BroadPhase, CandidatePair};

/// Spatial hash broad phase using a uniform grid.
///
/// Cell size should be about the smallest element edge.
pub struct SpatialHash {
    /// Inverse cell size (cached for performance).
    inv_cell_size: f64,
    /// Hash map from cell key to boundary node indices.
    grid: HashMap<(i64, i64, i64), Vec<u32>>,
}

impl SpatialHash {
    /// Create a new spatial hash with the given cell size.
    pub fn new(cell_size: f64) -> DropResult<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(DropError::InvalidConfig(format!(
                "spatial hash cell size must be positive, got {cell_size}"
            )));
        }
        Ok(Self {
            inv_cell_size: 1.0 / cell_size,
            grid: HashMap::new(),
        })
    }

    /// Hash a position to a cell key.
    fn cell_key(&self, p: DVec3) -> (i64, i64, i64) {
        let c = (p * self.inv_cell_size).floor();
        (c.x as i64, c.y as i64, c.z as i64)
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.grid.len()
    }
}

impl BroadPhase for SpatialHash {
    fn update(&mut self, positions: &[DVec3], topology: &Topology) -> DropResult<()> {
        self.grid.clear();
        for &n in &topology.boundary_nodes {
            let p = positions[n as usize];
            // The integrator reports non-finite state itself
            if !p.is_finite() {
                continue;
            }
            let key = self.cell_key(p);
            self.grid.entry(key).or_default().push(n);
        }
        Ok(())
    }

    fn query(&self, positions: &[DVec3], topology: &Topology) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();

        for (f, face) in topology.boundary_faces.iter().enumerate() {
            let [a, b, c] = face.nodes.map(|n| positions[n as usize]);
            let lo = self.cell_key(a.min(b).min(c));
            let hi = self.cell_key(a.max(b).max(c));

            for cx in (lo.0 - 1)..=(hi.0 + 1) {
                for cy in (lo.1 - 1)..=(hi.1 + 1) {
                    for cz in (lo.2 - 1)..=(hi.2 + 1) {
                        let Some(nodes) = self.grid.get(&(cx, cy, cz)) else {
                            continue;
                        };
                        for &node in nodes {
                            if topology.body_of(node) != face.body {
                                pairs.push(CandidatePair {
                                    node,
                                    face: f as u32,
                                });
                            }
                        }
                    }
                }
            }
        }

        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    fn name(&self) -> &str {
        "spatial_hash"
    }
}
