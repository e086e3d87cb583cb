//! Explicit central-difference integrator.
//!
//! Owns the per-run [`SimulationState`] and drives it through the
//! lifecycle:
//!
//! ```text
//! Uninitialized ─initialize─▶ Initialized ─run─▶ Running ⇄ Paused
//!                                                   │
//!                      Completed | Diverged | Failed | Cancelled
//! ```
//!
//! Each step assembles internal element forces, gravity and contact
//! penalties into the force buffer, then advances velocities and
//! positions with the leapfrog update. The very first step uses a half
//! velocity increment so velocities stay staggered by `Δt/2`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dropsim_contact::{ContactConfig, ContactPipeline, GroundPlane};
use dropsim_material::MaterialTable;
use dropsim_math::DVec3;
use dropsim_mesh::TetMesh;
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

use crate::checkpoint::Checkpoint;
use crate::config::SolverConfig;
use crate::element::ElementData;
use crate::mass::lumped_masses;
use crate::observer::{NullObserver, StepControl, StepObserver, StepView};
use crate::state::SimulationState;
use crate::timestep::{critical_timestep, TimestepEstimate};

/// Lifecycle state of an [`Integrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorStatus {
    Uninitialized,
    Initialized,
    Running,
    Paused,
    Completed,
    Diverged,
    /// A constitutive evaluation failed (inverted element, non-finite stress).
    Failed,
    Cancelled,
}

impl IntegratorStatus {
    pub fn name(&self) -> &str {
        match self {
            IntegratorStatus::Uninitialized => "uninitialized",
            IntegratorStatus::Initialized => "initialized",
            IntegratorStatus::Running => "running",
            IntegratorStatus::Paused => "paused",
            IntegratorStatus::Completed => "completed",
            IntegratorStatus::Diverged => "diverged",
            IntegratorStatus::Failed => "failed",
            IntegratorStatus::Cancelled => "cancelled",
        }
    }

    /// No further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IntegratorStatus::Completed
                | IntegratorStatus::Diverged
                | IntegratorStatus::Failed
                | IntegratorStatus::Cancelled
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: IntegratorStatus) -> bool {
        use IntegratorStatus::*;
        matches!(
            (self, next),
            (Uninitialized, Initialized)
                | (Initialized, Running)
                | (Initialized, Cancelled)
                | (Running, Paused)
                | (Running, Completed)
                | (Running, Diverged)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Paused, Running)
                | (Paused, Cancelled)
        )
    }
}

impl std::fmt::Display for IntegratorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary of one completed step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Index of the step just completed (1-based).
    pub step: u64,
    /// Simulated time after the step (s).
    pub time: f64,
    pub dt: f64,
    /// Active contacts (ground and inter-body).
    pub contacts: u32,
    /// Normal force transmitted to the impact surface (N).
    pub ground_force: f64,
    /// Fastest node after the update (m/s).
    pub max_speed: f64,
}

/// Explicit dynamics integrator for one run.
pub struct Integrator {
    mesh: Arc<TetMesh>,
    materials: Arc<MaterialTable>,
    config: SolverConfig,
    contact_config: ContactConfig,
    ground: Option<GroundPlane>,

    status: IntegratorStatus,
    elements: Vec<ElementData>,
    state: Option<SimulationState>,
    pipeline: Option<ContactPipeline>,
    estimate: Option<TimestepEstimate>,
    first_step: bool,
    impact_speed: f64,
    last_report: Option<StepReport>,
    cancel: Arc<AtomicBool>,
}

impl Integrator {
    /// Creates an integrator over shared, read-only mesh and material data.
    pub fn new(mesh: Arc<TetMesh>, materials: Arc<MaterialTable>, config: SolverConfig) -> Self {
        Self {
            mesh,
            materials,
            config,
            contact_config: ContactConfig::default(),
            ground: None,
            status: IntegratorStatus::Uninitialized,
            elements: Vec::new(),
            state: None,
            pipeline: None,
            estimate: None,
            first_step: true,
            impact_speed: 0.0,
            last_report: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Builder: contact parameters and the impact surface (none for free flight).
    pub fn with_contact(mut self, config: ContactConfig, ground: Option<GroundPlane>) -> Self {
        self.contact_config = config;
        self.ground = ground;
        self
    }

    /// Builder: share an external cancellation token.
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels the run cooperatively when set. Checked between steps.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Validates inputs and precomputes everything the step loop needs.
    ///
    /// Every non-fixed node starts with `initial_velocity`; its magnitude
    /// also scales the divergence threshold.
    pub fn initialize(&mut self, initial_velocity: DVec3) -> DropResult<()> {
        let velocities = vec![initial_velocity; self.mesh.node_count()];
        self.initialize_with_velocities(velocities)
    }

    /// Like [`initialize`](Self::initialize) with one initial velocity per
    /// node, e.g. two bodies approaching each other.
    pub fn initialize_with_velocities(&mut self, velocities: Vec<DVec3>) -> DropResult<()> {
        self.ensure_transition(IntegratorStatus::Initialized)?;
        self.config.validate()?;
        if velocities.iter().any(|v| !v.is_finite()) {
            return Err(DropError::InvalidConfig("initial velocities must be finite".into()));
        }
        let impact_speed = velocities.iter().map(|v| v.length()).fold(0.0, f64::max);

        self.mesh.validate()?;
        self.materials.validate()?;
        self.materials.validate_assignments(&self.mesh.material_ids)?;

        let elements = ElementData::from_mesh(&self.mesh)?;
        let masses = lumped_masses(self.mesh.node_count(), &elements, &self.materials)?;
        let estimate = critical_timestep(&elements, &self.materials)?;

        let dt = match self.config.timestep {
            Some(dt) => {
                if dt > estimate.critical {
                    tracing::warn!(
                        dt,
                        critical = estimate.critical,
                        element = estimate.controlling_element,
                        "timestep exceeds the stability limit"
                    );
                }
                dt
            }
            None => self.config.timestep_safety * estimate.critical,
        };

        let softest = self
            .materials
            .softest_modulus(&self.mesh.material_ids)
            .ok_or_else(|| DropError::InvalidMaterial("No material is referenced by the mesh".into()))?;
        let pipeline = ContactPipeline::new(&self.mesh, self.contact_config.clone(), self.ground, softest)?;
        let state = SimulationState::from_mesh(&self.mesh, masses, velocities, dt)?;

        tracing::info!(
            nodes = self.mesh.node_count(),
            elements = elements.len(),
            mass = state.total_mass(),
            dt,
            critical = estimate.critical,
            contact_stiffness = pipeline.stiffness(),
            backend = self.config.backend.name(),
            "integrator initialized"
        );

        self.elements = elements;
        self.estimate = Some(estimate);
        self.pipeline = Some(pipeline);
        self.state = Some(state);
        self.impact_speed = impact_speed;
        self.first_step = true;
        self.last_report = None;
        self.status = IntegratorStatus::Initialized;
        Ok(())
    }

    /// Advances a single step.
    ///
    /// From `Initialized` this starts the run; from `Paused` it single-steps
    /// without resuming.
    pub fn step(&mut self) -> DropResult<StepReport> {
        match self.status {
            IntegratorStatus::Initialized => self.transition(IntegratorStatus::Running)?,
            IntegratorStatus::Running | IntegratorStatus::Paused => {}
            other => {
                return Err(DropError::InvalidState(format!("cannot step while {other}")));
            }
        }
        self.advance()
    }

    /// Runs to the configured duration without an observer.
    pub fn run(&mut self) -> DropResult<IntegratorStatus> {
        self.run_with(&mut NullObserver)
    }

    /// Runs until the duration is reached, the observer pauses or stops
    /// the run, or the cancel token is set.
    ///
    /// Returns the status the run ended in (`Completed`, `Paused` or
    /// `Cancelled`). Divergence and material failure are returned as
    /// errors after the status has been recorded.
    pub fn run_with(&mut self, observer: &mut dyn StepObserver) -> DropResult<IntegratorStatus> {
        match self.status {
            IntegratorStatus::Initialized | IntegratorStatus::Paused => {
                self.transition(IntegratorStatus::Running)?
            }
            IntegratorStatus::Running => {}
            other => {
                return Err(DropError::InvalidState(format!("cannot run while {other}")));
            }
        }

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                self.transition(IntegratorStatus::Cancelled)?;
                return Ok(self.status);
            }
            if self.is_finished() {
                self.transition(IntegratorStatus::Completed)?;
                return Ok(self.status);
            }

            let report = self.advance()?;
            let control = match &self.state {
                Some(state) => observer.on_step(&StepView {
                    state,
                    report: &report,
                    mesh: &self.mesh,
                    elements: &self.elements,
                    materials: &self.materials,
                }),
                None => StepControl::Continue,
            };

            match control {
                StepControl::Continue => {}
                StepControl::Pause => {
                    self.transition(IntegratorStatus::Paused)?;
                    return Ok(self.status);
                }
                StepControl::Stop => {
                    self.transition(IntegratorStatus::Completed)?;
                    return Ok(self.status);
                }
            }
        }
    }

    /// `Running → Paused`.
    pub fn pause(&mut self) -> DropResult<()> {
        self.transition(IntegratorStatus::Paused)
    }

    /// `Paused → Running`. Call [`run_with`](Self::run_with) to continue stepping.
    pub fn resume(&mut self) -> DropResult<()> {
        self.transition(IntegratorStatus::Running)
    }

    /// Cancels the run and sets the cancel token.
    pub fn cancel(&mut self) -> DropResult<()> {
        self.transition(IntegratorStatus::Cancelled)?;
        self.cancel.store(true, Ordering::Relaxed);
        Ok(())
    }

    // ─── Accessors ───────────────────────────────────────────

    pub fn status(&self) -> IntegratorStatus {
        self.status
    }

    pub fn state(&self) -> Option<&SimulationState> {
        self.state.as_ref()
    }

    pub fn mesh(&self) -> &Arc<TetMesh> {
        &self.mesh
    }

    pub fn materials(&self) -> &Arc<MaterialTable> {
        &self.materials
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn elements(&self) -> &[ElementData] {
        &self.elements
    }

    /// Critical timestep of the mesh, once initialized.
    pub fn critical_timestep(&self) -> Option<f64> {
        self.estimate.map(|e| e.critical)
    }

    /// Timestep in use, once initialized.
    pub fn timestep(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.dt)
    }

    /// Resolved contact penalty coefficient, once initialized.
    pub fn contact_stiffness(&self) -> Option<f64> {
        self.pipeline.as_ref().map(|p| p.stiffness())
    }

    pub fn impact_speed(&self) -> f64 {
        self.impact_speed
    }

    pub fn last_report(&self) -> Option<&StepReport> {
        self.last_report.as_ref()
    }

    // ─── Diagnostics ─────────────────────────────────────────

    /// Kinetic energy from the stored velocities.
    pub fn kinetic_energy(&self) -> DropResult<f64> {
        Ok(self.require_state()?.kinetic_energy())
    }

    /// Gravitational potential energy relative to `y = 0`.
    pub fn potential_energy(&self) -> DropResult<f64> {
        Ok(self.require_state()?.potential_energy(self.config.gravity))
    }

    /// Elastic energy stored in all elements.
    pub fn strain_energy(&self) -> DropResult<f64> {
        let state = self.require_state()?;
        let elements = &self.elements;
        let materials = &*self.materials;
        let per_element = self.config.backend.try_map(elements.len(), |e| {
            let element = &elements[e];
            let material = materials.get(element.material).ok_or_else(|| {
                DropError::InvalidMaterial(format!("Element {e} has an unknown material"))
            })?;
            element
                .strain_energy(&state.positions, material)
                .map_err(|err| err.at_element(e as u32))
        })?;
        Ok(per_element.into_iter().sum())
    }

    pub fn total_momentum(&self) -> DropResult<DVec3> {
        Ok(self.require_state()?.total_momentum())
    }

    // ─── Checkpoints ─────────────────────────────────────────

    /// Serializes the current state.
    pub fn checkpoint(&self) -> DropResult<Vec<u8>> {
        let state = self.require_state()?;
        Checkpoint::new(state.clone(), self.first_step, self.impact_speed).to_bytes()
    }

    /// Replaces the current state with a checkpoint taken on the same mesh.
    /// Allowed while `Initialized` or `Paused`; the status is kept.
    pub fn restore(&mut self, bytes: &[u8]) -> DropResult<()> {
        if !matches!(self.status, IntegratorStatus::Initialized | IntegratorStatus::Paused) {
            return Err(DropError::InvalidState(format!(
                "cannot restore a checkpoint while {}",
                self.status
            )));
        }
        let checkpoint = Checkpoint::from_bytes(bytes)?;
        let n = self.mesh.node_count();
        let state = &checkpoint.state;
        let lengths = [
            state.positions.len(),
            state.velocities.len(),
            state.accelerations.len(),
            state.forces.len(),
            state.masses.len(),
            state.fixed.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(DropError::InvalidState(format!(
                "checkpoint does not match the mesh ({n} nodes)"
            )));
        }

        tracing::info!(step = state.step, time = state.time, "checkpoint restored");
        self.first_step = checkpoint.first_step;
        self.impact_speed = checkpoint.impact_speed;
        self.state = Some(checkpoint.state);
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────

    fn require_state(&self) -> DropResult<&SimulationState> {
        self.state
            .as_ref()
            .ok_or_else(|| DropError::InvalidState("integrator is not initialized".into()))
    }

    fn is_finished(&self) -> bool {
        self.state
            .as_ref()
            .map_or(true, |s| self.config.duration - s.time <= 1e-6 * s.dt)
    }

    fn ensure_transition(&self, next: IntegratorStatus) -> DropResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(DropError::InvalidState(format!(
                "cannot go from {} to {next}",
                self.status
            )))
        }
    }

    fn transition(&mut self, next: IntegratorStatus) -> DropResult<()> {
        self.ensure_transition(next)?;
        let step = self.state.as_ref().map_or(0, |s| s.step);
        tracing::info!(from = %self.status, to = %next, step, "integrator status changed");
        self.status = next;
        Ok(())
    }

    /// Runs one step and records terminal failures in the status.
    fn advance(&mut self) -> DropResult<StepReport> {
        match self.integrate() {
            Ok(report) => {
                self.last_report = Some(report);
                Ok(report)
            }
            Err(err) => {
                let next = match err {
                    DropError::Divergence { .. } => IntegratorStatus::Diverged,
                    _ => IntegratorStatus::Failed,
                };
                tracing::warn!(error = %err, "run terminated");
                // Single-stepping from Paused goes through Running first.
                if self.status == IntegratorStatus::Paused {
                    self.status = IntegratorStatus::Running;
                }
                self.transition(next)?;
                Err(err)
            }
        }
    }

    /// The central-difference update.
    fn integrate(&mut self) -> DropResult<StepReport> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| DropError::InvalidState("integrator is not initialized".into()))?;
        let pipeline = self
            .pipeline
            .as_mut()
            .ok_or_else(|| DropError::InvalidState("integrator is not initialized".into()))?;

        // 1. Internal forces, computed per element then scattered in element order.
        let elements = &self.elements;
        let materials = &*self.materials;
        let positions = &state.positions;
        let nodal = self.config.backend.try_map(elements.len(), |e| {
            let element = &elements[e];
            let material = materials.get(element.material).ok_or_else(|| {
                DropError::InvalidMaterial(format!("Element {e} has an unknown material"))
            })?;
            element
                .internal_forces(positions, material)
                .map_err(|err| err.at_element(e as u32))
        });
        let nodal = match nodal {
            Ok(nodal) => nodal,
            // An element turned inside out by the update is the explicit
            // instability showing up, not a material problem.
            Err(DropError::MaterialFailure { element: Some(e), reason })
                if !self.first_step && is_inverted(elements[e as usize].jacobian(positions)) =>
            {
                return Err(DropError::Divergence {
                    last_good_step: state.step.saturating_sub(1),
                    reason: format!("element {e} inverted at step {}: {reason}", state.step),
                });
            }
            Err(err) => return Err(err),
        };

        state.forces.iter_mut().for_each(|f| *f = DVec3::ZERO);
        for (element, forces) in elements.iter().zip(&nodal) {
            for (&n, f) in element.nodes.iter().zip(forces) {
                state.forces[n as usize] += *f;
            }
        }

        // 2. Gravity.
        let gravity = self.config.gravity;
        for i in 0..state.node_count() {
            if !state.fixed[i] {
                state.forces[i] += gravity * state.masses[i];
            }
        }

        // 3. Contact.
        let contact = pipeline.step(&state.positions, &state.velocities, &mut state.forces)?;

        // 4. Leapfrog update.
        let dt = state.dt;
        let kick = if self.first_step { 0.5 * dt } else { dt };
        for i in 0..state.node_count() {
            if state.fixed[i] {
                state.velocities[i] = DVec3::ZERO;
                state.accelerations[i] = DVec3::ZERO;
                continue;
            }
            let a = state.forces[i] / state.masses[i];
            state.accelerations[i] = a;
            state.velocities[i] += a * kick;
            state.positions[i] += state.velocities[i] * dt;
        }
        state.accel_time = state.time;
        self.first_step = false;

        // 5. Advance the clock, then check for blow-up.
        state.step += 1;
        state.time = state.step as f64 * dt;

        let limit = self.config.divergence_factor * self.impact_speed.max(1.0);
        let mut max_speed = 0.0_f64;
        for i in 0..state.node_count() {
            let (x, v) = (state.positions[i], state.velocities[i]);
            if !x.is_finite() || !v.is_finite() {
                return Err(DropError::Divergence {
                    last_good_step: state.step - 1,
                    reason: format!("non-finite position or velocity at node {i}"),
                });
            }
            let speed = v.length();
            if speed > limit {
                return Err(DropError::Divergence {
                    last_good_step: state.step - 1,
                    reason: format!("node {i} moves at {speed:.3e} m/s, limit is {limit:.3e} m/s"),
                });
            }
            max_speed = max_speed.max(speed);
        }

        Ok(StepReport {
            step: state.step,
            time: state.time,
            dt,
            contacts: contact.contacts.len() as u32,
            ground_force: contact.response.ground_normal_force,
            max_speed,
        })
    }
}

fn is_inverted(j: f64) -> bool {
    j.is_nan() || j <= 0.0
}
