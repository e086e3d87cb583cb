//! Core tetrahedral mesh type with SoA (Structure of Arrays) node layout.
//!
//! Reference coordinates are stored per channel:
//! - `pos_x: [x0, x1, x2, ...]`
//! - `pos_y: [y0, y1, y2, ...]`
//! - `pos_z: [z0, z1, z2, ...]`
//!
//! Elements are 4-node tetrahedra holding node indices, never references,
//! so many elements can share a node without any ownership graph. The
//! mesh is immutable once validated and is shared read-only (`Arc`)
//! between every job that simulates it.

use std::collections::HashMap;

use dropsim_math::tet::{max_edge_length, signed_volume};
use dropsim_math::DVec3;
use dropsim_types::constants::DEGENERATE_VOLUME_RATIO;
use dropsim_types::{DropError, DropResult, MaterialId};
use serde::{Deserialize, Serialize};

/// Whether element connectivity counts nodes from 0 or from 1.
///
/// External meshers disagree on this, so it must always be declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBase {
    #[default]
    Zero,
    One,
}

impl IndexBase {
    /// Value subtracted from incoming indices.
    #[inline]
    pub fn offset(self) -> u32 {
        match self {
            IndexBase::Zero => 0,
            IndexBase::One => 1,
        }
    }

    /// Parses the wire representation (`0` or `1`).
    pub fn from_u8(value: u8) -> DropResult<Self> {
        match value {
            0 => Ok(IndexBase::Zero),
            1 => Ok(IndexBase::One),
            other => Err(DropError::InvalidMesh(format!(
                "Index base must be 0 or 1, got {other}"
            ))),
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self.offset() as u8
    }
}

/// A tetrahedral mesh stored in Structure-of-Arrays layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TetMesh {
    // --- Node data (SoA) ---
    /// Reference X coordinates of all nodes.
    pub pos_x: Vec<f64>,
    /// Reference Y coordinates of all nodes (Y is up).
    pub pos_y: Vec<f64>,
    /// Reference Z coordinates of all nodes.
    pub pos_z: Vec<f64>,
    /// Dirichlet flag per node. Fixed nodes never move.
    pub fixed: Vec<bool>,

    // --- Element data ---
    /// Element connectivity, 0-based.
    pub elements: Vec<[u32; 4]>,
    /// Per-element material assignment.
    pub material_ids: Vec<MaterialId>,
}

impl TetMesh {
    /// Returns the number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.pos_x.len()
    }

    /// Returns the number of elements.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Returns the reference position of node `i`.
    #[inline]
    pub fn position(&self, i: usize) -> DVec3 {
        DVec3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i])
    }

    /// Returns all reference positions as vectors.
    pub fn positions(&self) -> Vec<DVec3> {
        (0..self.node_count()).map(|i| self.position(i)).collect()
    }

    /// Returns the four reference node positions of element `e`.
    #[inline]
    pub fn element_points(&self, e: usize) -> [DVec3; 4] {
        self.elements[e].map(|n| self.position(n as usize))
    }

    /// Reference volume of element `e` (signed).
    #[inline]
    pub fn element_volume(&self, e: usize) -> f64 {
        signed_volume(&self.element_points(e))
    }

    /// Builds and validates a mesh from reference positions, 0-based
    /// connectivity and per-element material ids. All nodes start free.
    pub fn new(
        positions: &[DVec3],
        elements: Vec<[u32; 4]>,
        material_ids: Vec<MaterialId>,
    ) -> DropResult<Self> {
        let mesh = Self {
            pos_x: positions.iter().map(|p| p.x).collect(),
            pos_y: positions.iter().map(|p| p.y).collect(),
            pos_z: positions.iter().map(|p| p.z).collect(),
            fixed: vec![false; positions.len()],
            elements,
            material_ids,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Creates an empty mesh with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, element_capacity: usize) -> Self {
        Self {
            pos_x: Vec::with_capacity(node_capacity),
            pos_y: Vec::with_capacity(node_capacity),
            pos_z: Vec::with_capacity(node_capacity),
            fixed: Vec::with_capacity(node_capacity),
            elements: Vec::with_capacity(element_capacity),
            material_ids: Vec::with_capacity(element_capacity),
        }
    }

    /// Appends a free node and returns its index.
    pub fn push_node(&mut self, p: DVec3) -> u32 {
        let index = self.pos_x.len() as u32;
        self.pos_x.push(p.x);
        self.pos_y.push(p.y);
        self.pos_z.push(p.z);
        self.fixed.push(false);
        index
    }

    /// Appends an element.
    pub fn push_element(&mut self, nodes: [u32; 4], material: MaterialId) {
        self.elements.push(nodes);
        self.material_ids.push(material);
    }

    /// Constructs a mesh from the flat arrays an external mesher delivers.
    ///
    /// `positions` is `[x0, y0, z0, x1, ...]`, `connectivity` holds four
    /// indices per element counted from `base`, and `material_ids` holds
    /// one id per element. The result is validated.
    pub fn from_interleaved(
        positions: &[f64],
        connectivity: &[u32],
        material_ids: &[u16],
        base: IndexBase,
    ) -> DropResult<Self> {
        if positions.len() % 3 != 0 {
            return Err(DropError::InvalidMesh(
                "Interleaved positions length not divisible by 3".into(),
            ));
        }
        if connectivity.len() % 4 != 0 {
            return Err(DropError::InvalidMesh(
                "Connectivity length not divisible by 4".into(),
            ));
        }

        let n = positions.len() / 3;
        let element_count = connectivity.len() / 4;
        let mut mesh = Self::with_capacity(n, element_count);

        for p in positions.chunks_exact(3) {
            mesh.push_node(DVec3::new(p[0], p[1], p[2]));
        }

        let offset = base.offset();
        for (e, tet) in connectivity.chunks_exact(4).enumerate() {
            let mut nodes = [0u32; 4];
            for (slot, &raw) in nodes.iter_mut().zip(tet) {
                *slot = raw.checked_sub(offset).ok_or_else(|| {
                    DropError::InvalidMesh(format!(
                        "Element {e} references node {raw}, below the declared index base {offset}"
                    ))
                })?;
            }
            mesh.elements.push(nodes);
        }

        mesh.material_ids = material_ids.iter().map(|&m| MaterialId(m)).collect();

        mesh.validate()?;
        Ok(mesh)
    }

    /// Validates mesh integrity.
    ///
    /// Checks:
    /// - All SoA arrays have consistent lengths
    /// - Coordinates are finite
    /// - Element indices are in range and distinct within an element
    /// - Every node belongs to at least one element (no massless nodes)
    /// - No degenerate, zero-volume, or inverted elements
    /// - No duplicate elements, and no face shared by more than two elements
    ///
    /// Validation is a pure function of the mesh, so repeated calls on the
    /// same input always return the same verdict.
    pub fn validate(&self) -> DropResult<()> {
        let n = self.pos_x.len();

        if self.pos_y.len() != n || self.pos_z.len() != n {
            return Err(DropError::InvalidMesh(
                "Position arrays have inconsistent lengths".into(),
            ));
        }
        if self.fixed.len() != n {
            return Err(DropError::InvalidMesh(format!(
                "Fixed flag count ({}) != node count ({n})",
                self.fixed.len()
            )));
        }
        if self.material_ids.len() != self.elements.len() {
            return Err(DropError::InvalidMesh(format!(
                "Material IDs count ({}) != element count ({})",
                self.material_ids.len(),
                self.elements.len()
            )));
        }
        if self.elements.is_empty() {
            return Err(DropError::InvalidMesh("Mesh has no elements".into()));
        }

        for i in 0..n {
            if !self.position(i).is_finite() {
                return Err(DropError::InvalidMesh(format!(
                    "Node {i} has a non-finite coordinate"
                )));
            }
        }

        let mut referenced = vec![false; n];
        for (e, tet) in self.elements.iter().enumerate() {
            for &idx in tet {
                if idx as usize >= n {
                    return Err(DropError::InvalidMesh(format!(
                        "Element {e} references node {idx}, out of range (node count: {n})"
                    )));
                }
                referenced[idx as usize] = true;
            }
            for a in 0..4 {
                for b in (a + 1)..4 {
                    if tet[a] == tet[b] {
                        return Err(DropError::InvalidMesh(format!(
                            "Element {e} has repeated node indices: {tet:?}"
                        )));
                    }
                }
            }
        }

        if let Some(orphan) = referenced.iter().position(|&r| !r) {
            return Err(DropError::InvalidMesh(format!(
                "Node {orphan} is not referenced by any element"
            )));
        }

        for e in 0..self.elements.len() {
            let points = self.element_points(e);
            let volume = signed_volume(&points);
            let scale = max_edge_length(&points).powi(3);
            if volume.abs() <= DEGENERATE_VOLUME_RATIO * scale {
                return Err(DropError::InvalidMesh(format!(
                    "Element {e} is degenerate (volume {volume:.3e})"
                )));
            }
            if volume < 0.0 {
                return Err(DropError::InvalidMesh(format!(
                    "Element {e} is inverted (volume {volume:.3e})"
                )));
            }
        }

        self.check_manifold()?;

        tracing::debug!(
            nodes = n,
            elements = self.elements.len(),
            "mesh validated"
        );
        Ok(())
    }

    /// Rejects duplicate elements and faces shared by more than two elements.
    fn check_manifold(&self) -> DropResult<()> {
        let mut seen_elements: HashMap<[u32; 4], usize> = HashMap::with_capacity(self.elements.len());
        let mut face_use: HashMap<[u32; 3], u32> = HashMap::with_capacity(self.elements.len() * 2);

        for (e, tet) in self.elements.iter().enumerate() {
            let mut key = *tet;
            key.sort_unstable();
            if let Some(first) = seen_elements.insert(key, e) {
                return Err(DropError::InvalidMesh(format!(
                    "Element {e} duplicates element {first}"
                )));
            }
            for face in face_keys(tet) {
                *face_use.entry(face).or_insert(0) += 1;
            }
        }

        // Report the first offending face in element order
        for (e, tet) in self.elements.iter().enumerate() {
            for face in face_keys(tet) {
                let uses = face_use.get(&face).copied().unwrap_or(0);
                if uses > 2 {
                    return Err(DropError::InvalidMesh(format!(
                        "Non-manifold connectivity: face {face:?} of element {e} is shared by {uses} elements"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Swaps two nodes of every negatively oriented element.
    ///
    /// Returns the number of elements flipped. Useful when ingesting
    /// meshes from tools with the opposite orientation convention.
    pub fn orient_elements(&mut self) -> usize {
        let mut flipped = 0;
        for e in 0..self.elements.len() {
            if self.element_volume(e) < 0.0 {
                self.elements[e].swap(1, 2);
                flipped += 1;
            }
        }
        flipped
    }

    /// Axis-aligned bounds `(min, max)` of the reference configuration.
    pub fn bounding_box(&self) -> (DVec3, DVec3) {
        let mut lo = DVec3::splat(f64::INFINITY);
        let mut hi = DVec3::splat(f64::NEG_INFINITY);
        for i in 0..self.node_count() {
            let p = self.position(i);
            lo = lo.min(p);
            hi = hi.max(p);
        }
        (lo, hi)
    }

    /// Volume-weighted centroid of the reference configuration.
    pub fn centroid(&self) -> DVec3 {
        let mut weighted = DVec3::ZERO;
        let mut total = 0.0;
        for e in 0..self.elements.len() {
            let points = self.element_points(e);
            let volume = signed_volume(&points).abs();
            let center = (points[0] + points[1] + points[2] + points[3]) * 0.25;
            weighted += center * volume;
            total += volume;
        }
        if total > 0.0 {
            weighted / total
        } else {
            DVec3::ZERO
        }
    }

    /// Total reference volume.
    pub fn total_volume(&self) -> f64 {
        (0..self.elements.len()).map(|e| self.element_volume(e)).sum()
    }

    /// Applies `f` to every reference position.
    pub fn transform(&mut self, f: impl Fn(DVec3) -> DVec3) {
        for i in 0..self.node_count() {
            let p = f(self.position(i));
            self.pos_x[i] = p.x;
            self.pos_y[i] = p.y;
            self.pos_z[i] = p.z;
        }
    }

    /// Translates the whole mesh.
    pub fn translate(&mut self, offset: DVec3) {
        self.transform(|p| p + offset);
    }

    /// Marks every node whose reference position satisfies `predicate`
    /// as fixed. Returns how many nodes were newly fixed.
    pub fn fix_nodes_where(&mut self, predicate: impl Fn(DVec3) -> bool) -> usize {
        let mut count = 0;
        for i in 0..self.node_count() {
            if !self.fixed[i] && predicate(self.position(i)) {
                self.fixed[i] = true;
                count += 1;
            }
        }
        count
    }

    /// Number of fixed nodes.
    pub fn fixed_count(&self) -> usize {
        self.fixed.iter().filter(|&&f| f).count()
    }

    /// Sorted, de-duplicated nodes of all elements with material `id`.
    pub fn nodes_with_material(&self, id: MaterialId) -> Vec<u32> {
        let mut nodes: Vec<u32> = self
            .elements
            .iter()
            .zip(&self.material_ids)
            .filter(|(_, m)| **m == id)
            .flat_map(|(tet, _)| tet.iter().copied())
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Appends another mesh as a separate part. Returns the node offset
    /// applied to the appended elements.
    pub fn append(&mut self, other: &TetMesh) -> u32 {
        let offset = self.node_count() as u32;
        self.pos_x.extend_from_slice(&other.pos_x);
        self.pos_y.extend_from_slice(&other.pos_y);
        self.pos_z.extend_from_slice(&other.pos_z);
        self.fixed.extend_from_slice(&other.fixed);
        self.elements
            .extend(other.elements.iter().map(|tet| tet.map(|n| n + offset)));
        self.material_ids.extend_from_slice(&other.material_ids);
        offset
    }

    /// Combines several parts into one mesh, one body per part.
    pub fn merge(parts: &[TetMesh]) -> TetMesh {
        let nodes = parts.iter().map(TetMesh::node_count).sum();
        let elements = parts.iter().map(TetMesh::element_count).sum();
        let mut merged = TetMesh::with_capacity(nodes, elements);
        for part in parts {
            merged.append(part);
        }
        merged
    }
}

/// Sorted node triples of the four faces of `tet`.
fn face_keys(tet: &[u32; 4]) -> [[u32; 3]; 4] {
    dropsim_math::tet::TET_FACES.map(|f| {
        let mut key = [tet[f[0]], tet[f[1]], tet[f[2]]];
        key.sort_unstable();
        key
    })
}
