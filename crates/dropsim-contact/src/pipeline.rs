//! Contact pipeline: ground plane, then broad → narrow → response.
//!
//! Owned by the integrator and called once per step after internal and
//! gravity forces are assembled.

use dropsim_math::DVec3;
use dropsim_mesh::{SurfaceGeometry, TetMesh, Topology};
use dropsim_types::DropResult;

use crate::broad::{BroadPhase, NullBroadPhase};
use crate::config::ContactConfig;
use crate::contact::ContactPair;
use crate::ground::GroundPlane;
use crate::narrow::{NarrowPhase, NodeFaceTest, NullNarrowPhase};
use crate::response::{ContactResponse, ContactResult, HertzPenalty};
use crate::spatial_hash::SpatialHash;
use crate::surface_type::SurfaceType;

/// Result of a full contact pipeline step.
#[derive(Debug, Clone, Default)]
pub struct ContactStepResult {
    /// Number of broad-phase candidate pairs.
    pub candidate_pairs: u32,
    /// Nodes below the impact plane.
    pub ground_contacts: u32,
    /// Node-to-face contacts between bodies.
    pub body_contacts: u32,
    /// Response summary.
    pub response: ContactResult,
    /// All contacts of this step, ground first, each group in node order.
    pub contacts: Vec<ContactPair>,
}

/// Unified contact pipeline.
pub struct ContactPipeline {
    config: ContactConfig,
    ground: Option<GroundPlane>,
    broad: Box<dyn BroadPhase>,
    narrow: Box<dyn NarrowPhase>,
    response: Box<dyn ContactResponse>,
    topology: Topology,
    surface: SurfaceGeometry,
    stiffness: f64,
    max_depth: f64,
    steps_since_rebuild: u32,
}

impl ContactPipeline {
    /// Builds the pipeline for `mesh`.
    ///
    /// `softest_modulus` is the smallest effective modulus of the
    /// materials in use and only matters when the configuration leaves
    /// the penalty stiffness to be derived.
    pub fn new(
        mesh: &TetMesh,
        config: ContactConfig,
        ground: Option<GroundPlane>,
        softest_modulus: f64,
    ) -> DropResult<Self> {
        config.validate()?;

        let topology = Topology::build(mesh);
        let surface = SurfaceGeometry::from_reference(mesh, &topology);
        let min_edge = min_edge_length(mesh);
        let surface_type = ground.map_or(SurfaceType::Rigid, |g| g.surface);
        let stiffness = config.resolve_stiffness(softest_modulus, surface_type, min_edge);
        let ground_friction = config.friction.unwrap_or_else(|| surface_type.friction());

        let (broad, narrow): (Box<dyn BroadPhase>, Box<dyn NarrowPhase>) =
            if config.inter_body && topology.body_count > 1 {
                (Box::new(SpatialHash::new(min_edge)?), Box::new(NodeFaceTest::default()))
            } else {
                (Box::new(NullBroadPhase), Box::new(NullNarrowPhase))
            };

        let response = HertzPenalty {
            stiffness,
            damping: config.damping,
            ground_friction,
            body_friction: config.friction.unwrap_or(ground_friction),
            regularization: config.friction_regularization,
        };

        tracing::debug!(
            stiffness,
            min_edge,
            bodies = topology.body_count,
            boundary_faces = topology.boundary_face_count(),
            broad = broad.name(),
            "contact pipeline ready"
        );

        Ok(Self {
            max_depth: config.max_depth_ratio * min_edge,
            config,
            ground,
            broad,
            narrow,
            response: Box::new(response),
            topology,
            surface,
            stiffness,
            steps_since_rebuild: 0,
        })
    }

    /// Replace the broad phase (e.g. with [`BruteForce`](crate::BruteForce)
    /// for verification).
    pub fn with_broad_phase(mut self, broad: Box<dyn BroadPhase>) -> Self {
        self.broad = broad;
        self.narrow = Box::new(NodeFaceTest::default());
        self.steps_since_rebuild = 0;
        self
    }

    /// Resolved penalty coefficient (Pa/m^1.5).
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn config(&self) -> &ContactConfig {
        &self.config
    }

    pub fn ground(&self) -> Option<&GroundPlane> {
        self.ground.as_ref()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Name of the active broad phase.
    pub fn broad_phase_name(&self) -> &str {
        self.broad.name()
    }

    /// Detect contacts at `positions` and add penalty forces to `forces`.
    pub fn step(
        &mut self,
        positions: &[DVec3],
        velocities: &[DVec3],
        forces: &mut [DVec3],
    ) -> DropResult<ContactStepResult> {
        let mut contacts = match &self.ground {
            Some(ground) => ground.detect(positions, &self.topology.boundary_nodes),
            None => Vec::new(),
        };
        let ground_contacts = contacts.len() as u32;

        if self.steps_since_rebuild == 0 {
            self.broad.update(positions, &self.topology)?;
        }
        self.steps_since_rebuild = (self.steps_since_rebuild + 1) % self.config.rebuild_interval;

        let candidates = self.broad.query(positions, &self.topology);
        let body = self
            .narrow
            .detect(&candidates, positions, &self.topology, self.max_depth);
        let body_contacts = body.len() as u32;
        contacts.extend(body);

        for contact in &mut contacts {
            contact.area = self
                .surface
                .tributary_area(&self.topology, contact.node, contact.normal);
        }

        let response = self.response.apply(&contacts, velocities, forces);

        if !contacts.is_empty() {
            tracing::trace!(
                ground = ground_contacts,
                bodies = body_contacts,
                candidates = candidates.len(),
                max_penetration = response.max_penetration,
                normal_force = response.total_normal_force,
                "contacts resolved"
            );
        }

        Ok(ContactStepResult {
            candidate_pairs: candidates.len() as u32,
            ground_contacts,
            body_contacts,
            response,
            contacts,
        })
    }
}

/// Shortest element edge of the mesh.
pub fn min_edge_length(mesh: &TetMesh) -> f64 {
    (0..mesh.element_count())
        .map(|e| {
            let p = mesh.element_points(e);
            let mut shortest = f64::INFINITY;
            for a in 0..4 {
                for b in (a + 1)..4 {
                    shortest = shortest.min(p[a].distance(p[b]));
                }
            }
            shortest
        })
        .fold(f64::INFINITY, f64::min)
}
