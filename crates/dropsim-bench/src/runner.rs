//! Benchmark runner: executes scenarios and collects metrics.

use std::sync::Arc;
use std::time::Instant;

use dropsim_compute::Backend;
use dropsim_math::DVec3;
use dropsim_results::ResultRecorder;
use dropsim_solver::{critical_timestep, Chain, ElementData, Integrator, StepControl, StepObserver, StepView};
use dropsim_types::constants::EPSILON;
use dropsim_types::{DropError, DropResult};

use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Wall-clock time of each step.
struct StepTimer {
    last: Instant,
    times: Vec<f64>,
}

impl StepObserver for StepTimer {
    fn on_step(&mut self, _view: &StepView<'_>) -> StepControl {
        let now = Instant::now();
        self.times.push(now.duration_since(self.last).as_secs_f64());
        self.last = now;
        StepControl::Continue
    }
}

fn total_energy(integrator: &Integrator) -> f64 {
    let parts = [
        integrator.kinetic_energy(),
        integrator.potential_energy(),
        integrator.strain_energy(),
    ];
    parts.into_iter().map(|e| e.unwrap_or(f64::NAN)).sum()
}

fn relative_change(before: f64, after: f64) -> f64 {
    (after - before).abs() / before.abs().max(EPSILON)
}

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Run a single scenario on the given backend.
    ///
    /// A run that diverges or fails during stepping still produces
    /// metrics, with the terminal status recorded; only setup errors
    /// are returned.
    pub fn run(scenario: &Scenario, backend: Backend) -> DropResult<BenchmarkMetrics> {
        let elements = ElementData::from_mesh(&scenario.mesh)?;
        let critical = critical_timestep(&elements, &scenario.materials)?.critical;
        let dt = scenario.timestep_factor * critical;

        let mut config = scenario.solver.clone().with_timestep(dt).with_backend(backend);
        if let Some(steps) = scenario.steps {
            config = config.with_duration(steps as f64 * dt);
        }

        let mut integrator = Integrator::new(
            Arc::new(scenario.mesh.clone()),
            Arc::new(scenario.materials.clone()),
            config,
        )
        .with_contact(scenario.contact.clone(), scenario.ground);
        integrator.initialize_with_velocities(scenario.velocities.clone())?;

        let energy_before = total_energy(&integrator);
        let momentum_before = integrator.total_momentum()?;
        let recorder = ResultRecorder::new(vec![scenario.sensor.clone()], scenario.sampling.clone())?;
        let timer = StepTimer {
            last: Instant::now(),
            times: Vec::new(),
        };

        let started = Instant::now();
        let mut observers = Chain(recorder, timer);
        let result = integrator.run_with(&mut observers);
        let total_wall_time = started.elapsed().as_secs_f64();
        let Chain(recorder, timer) = observers;

        let error = match result {
            Ok(_) => None,
            Err(e) if e.is_terminal_for_job() => {
                tracing::warn!(scenario = scenario.kind.name(), error = %e, "scenario ended early");
                Some(e)
            }
            Err(e) => return Err(e),
        };

        let momentum_after = integrator.total_momentum().unwrap_or(DVec3::NAN);
        let state = integrator
            .state()
            .ok_or_else(|| DropError::InvalidState("integrator has no state".into()))?;
        let artifact = recorder.finish(integrator.status(), error.as_ref());
        let summary = &artifact.summary;

        let times = &timer.times;
        let (avg_step_time, min_step_time) = if times.is_empty() {
            (0.0, 0.0)
        } else {
            (
                times.iter().sum::<f64>() / times.len() as f64,
                times.iter().copied().fold(f64::INFINITY, f64::min),
            )
        };

        let metrics = BenchmarkMetrics {
            scenario: scenario.kind.name().to_string(),
            backend: backend.name().to_string(),
            node_count: scenario.mesh.node_count(),
            element_count: scenario.mesh.element_count(),
            timesteps: state.step,
            dt,
            critical_dt: critical,
            total_wall_time,
            avg_step_time,
            min_step_time,
            max_step_time: times.iter().copied().fold(0.0, f64::max),
            status: integrator.status(),
            peak_g: summary.peak_g,
            peak_g_time: summary.peak_g_time,
            energy_drift: relative_change(energy_before, total_energy(&integrator)),
            momentum_drift: (momentum_after - momentum_before).length()
                / momentum_before.length().max(EPSILON),
            max_speed: state.max_speed(),
            within_band: scenario
                .expected_peak_g
                .map(|(lo, hi)| (lo..=hi).contains(&summary.peak_g)),
        };
        tracing::info!(
            scenario = %metrics.scenario,
            steps = metrics.timesteps,
            status = %metrics.status,
            peak_g = metrics.peak_g,
            wall_time = metrics.total_wall_time,
            "scenario finished"
        );
        Ok(metrics)
    }

    /// Run all scenarios and return metrics for each.
    pub fn run_all(backend: Backend) -> DropResult<Vec<BenchmarkMetrics>> {
        ScenarioKind::all()
            .iter()
            .map(|&kind| Self::run(&Scenario::from_kind(kind)?, backend))
            .collect()
    }
}

