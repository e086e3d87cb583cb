//! Drop placement.
//!
//! Turns a reference mesh plus a drop height and orientation into the
//! initial configuration of a run: the body is rotated about its
//! centroid, lowered until its lowest node touches the impact plane, and
//! given the free-fall impact velocity.

use dropsim_math::{DQuat, DVec3};
use dropsim_mesh::TetMesh;
use dropsim_types::constants::STANDARD_GRAVITY;
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

/// Impact orientation of the body.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Orientation {
    /// Lands on a face as meshed.
    #[default]
    FlatFace,
    /// Lands on an edge: 45° about X.
    Edge,
    /// Lands on a corner: 45° about X, then atan(1/√2) ≈ 35.26° about Z.
    Corner,
    /// Arbitrary tilt in degrees: X first, then Y.
    Custom { angle_x: f64, angle_y: f64 },
}

impl Orientation {
    /// Rotation applied to the body about its centroid.
    pub fn rotation(&self) -> DQuat {
        match *self {
            Orientation::FlatFace => DQuat::IDENTITY,
            Orientation::Edge => DQuat::from_rotation_x(45f64.to_radians()),
            Orientation::Corner => {
                let tilt = (1.0 / 2f64.sqrt()).atan();
                DQuat::from_rotation_z(tilt) * DQuat::from_rotation_x(45f64.to_radians())
            }
            Orientation::Custom { angle_x, angle_y } => {
                DQuat::from_rotation_y(angle_y.to_radians()) * DQuat::from_rotation_x(angle_x.to_radians())
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Orientation::FlatFace => "flat_face",
            Orientation::Edge => "edge",
            Orientation::Corner => "corner",
            Orientation::Custom { .. } => "custom",
        }
    }
}

/// Drop-test initial conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropSetup {
    /// Drop height of the lowest point above the surface (m).
    pub height: f64,
    pub orientation: Orientation,
    /// Gravitational acceleration magnitude (m/s²).
    pub gravity: f64,
    /// Height of the impact plane.
    pub surface_height: f64,
}

impl Default for DropSetup {
    fn default() -> Self {
        Self {
            height: 0.762,
            orientation: Orientation::FlatFace,
            gravity: STANDARD_GRAVITY,
            surface_height: 0.0,
        }
    }
}

/// Body ready to be handed to the integrator.
#[derive(Debug, Clone)]
pub struct PlacedBody {
    /// Rotated and translated mesh, touching the impact plane.
    pub mesh: TetMesh,
    /// Uniform initial velocity (downward).
    pub initial_velocity: DVec3,
    /// Impact speed `sqrt(2 g h)` (m/s).
    pub impact_speed: f64,
}

impl DropSetup {
    /// Creates a setup for a drop from `height` metres.
    pub fn new(height: f64, orientation: Orientation) -> Self {
        Self {
            height,
            orientation,
            ..Default::default()
        }
    }

    /// Free-fall speed at contact.
    pub fn impact_speed(&self) -> f64 {
        (2.0 * self.gravity * self.height).sqrt()
    }

    pub fn validate(&self) -> DropResult<()> {
        if !self.height.is_finite() || self.height < 0.0 {
            return Err(DropError::InvalidConfig(format!(
                "drop height must be non-negative, got {}",
                self.height
            )));
        }
        if !self.gravity.is_finite() || self.gravity <= 0.0 {
            return Err(DropError::InvalidConfig(format!(
                "gravity must be positive, got {}",
                self.gravity
            )));
        }
        if let Orientation::Custom { angle_x, angle_y } = self.orientation {
            if !angle_x.is_finite() || !angle_y.is_finite() {
                return Err(DropError::InvalidConfig("orientation angles must be finite".into()));
            }
        }
        Ok(())
    }

    /// Places `mesh` for the drop. The reference mesh is not modified.
    ///
    /// ```
    /// use dropsim_math::DVec3;
    /// use dropsim_mesh::generators::box_mesh;
    /// use dropsim_solver::{DropSetup, Orientation};
    /// use dropsim_types::MaterialId;
    ///
    /// let mesh = box_mesh([1, 1, 1], DVec3::ONE, DVec3::new(0.0, 3.0, 0.0), MaterialId(0));
    /// let placed = DropSetup::new(0.5, Orientation::FlatFace).place(&mesh).unwrap();
    /// assert!(placed.mesh.bounding_box().0.y.abs() < 1e-12);
    /// assert!(placed.initial_velocity.y < 0.0);
    /// ```
    pub fn place(&self, mesh: &TetMesh) -> DropResult<PlacedBody> {
        self.validate()?;
        if mesh.node_count() == 0 {
            return Err(DropError::InvalidMesh("Cannot place an empty mesh".into()));
        }

        let mut placed = mesh.clone();
        let centroid = placed.centroid();
        let rotation = self.orientation.rotation();
        placed.transform(|p| centroid + rotation * (p - centroid));

        let (min, _) = placed.bounding_box();
        placed.translate(DVec3::new(0.0, self.surface_height - min.y, 0.0));

        let impact_speed = self.impact_speed();
        tracing::debug!(
            height = self.height,
            orientation = self.orientation.name(),
            impact_speed,
            "body placed for drop"
        );

        Ok(PlacedBody {
            mesh: placed,
            initial_velocity: DVec3::new(0.0, -impact_speed, 0.0),
            impact_speed,
        })
    }
}
