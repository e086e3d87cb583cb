//! Benchmark scenarios: mesh, materials, initial conditions and the
//! expected outcome for each test case.
//!
//! Five canonical scenarios:
//! 1. **Free fall**: soft cube falling without contact (energy drift)
//! 2. **Bare cube**: 2-inch steel cube dropped 12 inches (≈19 G)
//! 3. **Cushioned product**: 5 lb product on 2 inches of Ogden foam, 30 inches (45–55 G)
//! 4. **Head-on collision**: two elastic cubes, one at rest (momentum exchange)
//! 5. **Stability column**: clamped block stepped at a multiple of the critical timestep

use dropsim_contact::{ContactConfig, GroundPlane, SurfaceType};
use dropsim_material::{Material, MaterialTable};
use dropsim_math::DVec3;
use dropsim_mesh::generators::{box_mesh, layered_box};
use dropsim_mesh::TetMesh;
use dropsim_results::{SamplingConfig, SensorSet};
use dropsim_solver::{DropSetup, Orientation, SolverConfig};
use dropsim_types::units::{inches_to_meters, pounds_to_kilograms, psi_to_pascals};
use dropsim_types::{DropResult, MaterialId};
use serde::{Deserialize, Serialize};

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    FreeFall,
    BareCube,
    CushionedProduct,
    HeadOnCollision,
    /// Clamped block at 0.99 × the critical timestep.
    StabilityColumn,
}

impl ScenarioKind {
    /// Returns all scenario kinds.
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::FreeFall,
            ScenarioKind::BareCube,
            ScenarioKind::CushionedProduct,
            ScenarioKind::HeadOnCollision,
            ScenarioKind::StabilityColumn,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::FreeFall => "free_fall",
            ScenarioKind::BareCube => "bare_cube",
            ScenarioKind::CushionedProduct => "cushioned_product",
            ScenarioKind::HeadOnCollision => "head_on_collision",
            ScenarioKind::StabilityColumn => "stability_column",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// A fully specified benchmark scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub kind: ScenarioKind,
    /// Mesh in its initial (placed) configuration.
    pub mesh: TetMesh,
    pub materials: MaterialTable,
    /// Duration, gravity and divergence settings. The timestep is set by
    /// the runner from `timestep_factor`.
    pub solver: SolverConfig,
    /// Timestep as a multiple of the critical timestep.
    pub timestep_factor: f64,
    /// Fixed step count. Overrides the duration when set.
    pub steps: Option<u64>,
    pub contact: ContactConfig,
    pub ground: Option<GroundPlane>,
    /// Initial velocity per node.
    pub velocities: Vec<DVec3>,
    pub sensor: SensorSet,
    pub sampling: SamplingConfig,
    /// Acceptable peak-G band.
    pub expected_peak_g: Option<(f64, f64)>,
}

const CUBE_EDGE: f64 = 0.0508;

/// Penalty stiffness of the bare steel cube against the rigid plate
/// (N/m^3.5, contact force `k·A·δ^{3/2}`).
///
/// Calibrated with [`flat_impact_peak_g`] rather than from the steel
/// modulus: for the 1.029 kg cube (7850 kg/m³, 2-inch edge, face area
/// 2.58e-3 m²) falling 12 inches, `k = 8.5e6` gives a maximum
/// penetration δ ≈ 43.8 mm and a peak of ≈ 18.9 G, which is the ≈ 19 G
/// a bare steel cube registers on an instrumented drop table.
pub const STEEL_CONTACT_STIFFNESS: f64 = 8.5e6;

impl Scenario {
    /// 0.1 m cube of soft rubber released from rest 1 m up, no ground.
    pub fn free_fall() -> Self {
        let mesh = box_mesh([2; 3], DVec3::splat(0.1), DVec3::new(0.0, 1.0, 0.0), MaterialId(0));
        let n = mesh.node_count();
        Self {
            kind: ScenarioKind::FreeFall,
            sensor: SensorSet::whole_body(&mesh),
            mesh,
            materials: MaterialTable::new(vec![Material::linear_elastic(1.0e6, 0.3, 1000.0)]),
            solver: SolverConfig::default().with_duration(0.05),
            timestep_factor: 0.25,
            steps: None,
            contact: ContactConfig::default(),
            ground: None,
            velocities: vec![DVec3::ZERO; n],
            sampling: SamplingConfig::default(),
            expected_peak_g: Some((0.99, 1.01)),
        }
    }

    /// Bare 2-inch steel cube, one cell, flat onto a rigid plate from
    /// 12 inches with a fixed penalty stiffness.
    ///
    /// The stiffness is [`STEEL_CONTACT_STIFFNESS`]; see there for how it
    /// maps to the ≈ 19 G reading.
    pub fn bare_cube() -> DropResult<Self> {
        let mesh = box_mesh([1; 3], DVec3::splat(CUBE_EDGE), DVec3::ZERO, MaterialId(0));
        let placed = DropSetup::new(inches_to_meters(12.0), Orientation::FlatFace).place(&mesh)?;
        let n = placed.mesh.node_count();
        Ok(Self {
            kind: ScenarioKind::BareCube,
            sensor: SensorSet::whole_body(&placed.mesh),
            mesh: placed.mesh,
            materials: MaterialTable::new(vec![Material::linear_elastic(2.0e11, 0.3, 7850.0)]),
            solver: SolverConfig::default().with_duration(0.06),
            timestep_factor: 0.9,
            steps: None,
            contact: ContactConfig {
                stiffness: Some(STEEL_CONTACT_STIFFNESS),
                ..ContactConfig::default()
            },
            ground: Some(GroundPlane::new(SurfaceType::Rigid)),
            velocities: vec![placed.initial_velocity; n],
            sampling: SamplingConfig::default(),
            expected_peak_g: Some((17.0, 21.0)),
        })
    }

    /// 5 lb product on a 2-inch Ogden cushion (μ = 15 psi, α = 3.5)
    /// dropped 30 inches onto a rigid surface. The sensor is the
    /// product layer.
    pub fn cushioned_product() -> DropResult<Self> {
        let footprint = 0.0806;
        let cushion = inches_to_meters(2.0);
        let product = inches_to_meters(1.0);
        let levels = [0.0, cushion / 3.0, 2.0 * cushion / 3.0, cushion, cushion + product];
        let layers = [MaterialId(0), MaterialId(0), MaterialId(0), MaterialId(1)];
        let mesh = layered_box([2, 2], [footprint, footprint], DVec3::ZERO, &levels, &layers)?;

        let product_density = pounds_to_kilograms(5.0) / (footprint * footprint * product);
        let materials = MaterialTable::new(vec![
            Material::ogden(psi_to_pascals(15.0), 3.5, 0.0, 32.0),
            Material::linear_elastic(5.0e7, 0.3, product_density),
        ]);

        let placed = DropSetup::new(inches_to_meters(30.0), Orientation::FlatFace).place(&mesh)?;
        let n = placed.mesh.node_count();
        Ok(Self {
            kind: ScenarioKind::CushionedProduct,
            sensor: SensorSet::from_material("product", &placed.mesh, MaterialId(1)),
            mesh: placed.mesh,
            materials,
            solver: SolverConfig::default().with_duration(0.03),
            timestep_factor: 0.25,
            steps: None,
            contact: ContactConfig::default(),
            ground: Some(GroundPlane::new(SurfaceType::Rigid)),
            velocities: vec![placed.initial_velocity; n],
            sampling: SamplingConfig::default(),
            expected_peak_g: Some((45.0, 55.0)),
        })
    }

    /// Two 0.1 m elastic cubes 2 mm apart; the left one moves at 2 m/s
    /// toward the right one, which is at rest. No gravity or ground.
    pub fn head_on_collision() -> Self {
        let left = box_mesh([2; 3], DVec3::splat(0.1), DVec3::ZERO, MaterialId(0));
        let right = box_mesh([2; 3], DVec3::splat(0.1), DVec3::new(0.102, 0.0, 0.0), MaterialId(0));
        let split = left.node_count();
        let mesh = TetMesh::merge(&[left, right]);
        let velocities = (0..mesh.node_count())
            .map(|i| if i < split { DVec3::new(2.0, 0.0, 0.0) } else { DVec3::ZERO })
            .collect();
        let sensor = SensorSet::new("struck", (split as u32..mesh.node_count() as u32).collect());

        let mut solver = SolverConfig::default().with_duration(0.01);
        solver.gravity = DVec3::ZERO;
        Self {
            kind: ScenarioKind::HeadOnCollision,
            mesh,
            materials: MaterialTable::new(vec![Material::linear_elastic(1.0e6, 0.3, 1000.0)]),
            solver,
            timestep_factor: 0.25,
            steps: None,
            contact: ContactConfig::frictionless(),
            ground: None,
            velocities,
            sensor,
            sampling: SamplingConfig::default(),
            expected_peak_g: None,
        }
    }

    /// 0.3 × 0.1 × 0.3 m block clamped at its base, sagging under
    /// gravity for 3000 steps at `factor` × the critical timestep.
    pub fn stability_column(factor: f64) -> Self {
        let mut mesh = box_mesh([3, 2, 3], DVec3::new(0.3, 0.1, 0.3), DVec3::ZERO, MaterialId(0));
        mesh.fix_nodes_where(|p| p.y.abs() < 1e-12);
        let n = mesh.node_count();
        Self {
            kind: ScenarioKind::StabilityColumn,
            sensor: SensorSet::whole_body(&mesh),
            mesh,
            materials: MaterialTable::new(vec![Material::linear_elastic(1.0e6, 0.3, 1000.0)]),
            solver: SolverConfig::default(),
            timestep_factor: factor,
            steps: Some(3000),
            contact: ContactConfig::default(),
            ground: None,
            velocities: vec![DVec3::ZERO; n],
            sampling: SamplingConfig::default(),
            expected_peak_g: None,
        }
    }

    /// Create a scenario from its kind.
    pub fn from_kind(kind: ScenarioKind) -> DropResult<Self> {
        Ok(match kind {
            ScenarioKind::FreeFall => Self::free_fall(),
            ScenarioKind::BareCube => Self::bare_cube()?,
            ScenarioKind::CushionedProduct => Self::cushioned_product()?,
            ScenarioKind::HeadOnCollision => Self::head_on_collision(),
            ScenarioKind::StabilityColumn => Self::stability_column(0.99),
        })
    }
}

/// Peak G of a rigid block landing flat on a Hertz penalty surface.
///
/// Energy balance `(2/5)·k·A·δ^{5/2} = M·g·(h + δ)` gives the maximum
/// penetration δ; the peak reading is then `k·A·δ^{3/2} / (M·g) − 1`
/// (the accelerometer subtracts gravity).
///
/// ```
/// use dropsim_bench::flat_impact_peak_g;
///
/// let mass = 7850.0 * 0.0508f64.powi(3);
/// let g = flat_impact_peak_g(8.5e6, 0.0508 * 0.0508, mass, 9.80665, 0.3048);
/// assert!((g - 18.9).abs() < 0.3);
/// ```
pub fn flat_impact_peak_g(stiffness: f64, area: f64, mass: f64, gravity: f64, height: f64) -> f64 {
    let weight = mass * gravity;
    let residual = |d: f64| 0.4 * stiffness * area * d.powf(2.5) - weight * (height + d);

    let mut hi = 1e-6;
    while residual(hi) < 0.0 && hi < 1e3 {
        hi *= 2.0;
    }
    let mut lo = 0.0;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if residual(mid) < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let depth = 0.5 * (lo + hi);
    stiffness * area * depth.powf(1.5) / weight - 1.0
}
