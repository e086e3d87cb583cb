//! Bridges the integrator's step hook onto the event bus.

use std::time::Instant;

use dropsim_math::DVec3;
use dropsim_solver::{Integrator, IntegratorStatus, StepControl, StepObserver, StepView};
use dropsim_types::constants::DEFAULT_PROGRESS_INTERVAL;
use dropsim_types::DropError;

use crate::bus::EventSender;
use crate::events::{EventKind, SimulationEvent};

/// [`StepObserver`] that reports progress, contact changes and
/// (optionally) the energy balance.
pub struct TelemetryObserver {
    sender: EventSender,
    duration: f64,
    progress_interval: u64,
    energy: Option<(u64, DVec3)>,
    started: Instant,
    in_contact: bool,
}

impl TelemetryObserver {
    pub fn new(sender: EventSender, duration: f64) -> Self {
        Self {
            sender,
            duration,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            energy: None,
            started: Instant::now(),
            in_contact: false,
        }
    }

    /// Builder: progress every `interval` steps.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Builder: energy balance every `interval` steps under `gravity`.
    pub fn with_energy(mut self, interval: u64, gravity: DVec3) -> Self {
        self.energy = Some((interval.max(1), gravity));
        self
    }

    /// Announces an initialized integrator and restarts the wall clock.
    pub fn emit_started(&mut self, integrator: &Integrator) {
        self.started = Instant::now();
        let step = integrator.state().map_or(0, |s| s.step);
        self.sender.emit(SimulationEvent::new(
            step,
            EventKind::RunStarted {
                nodes: integrator.mesh().node_count(),
                elements: integrator.mesh().element_count(),
                dt: integrator.timestep().unwrap_or(0.0),
                duration: integrator.config().duration,
            },
        ));
    }

    /// Announces the end of a run.
    pub fn emit_finished(&self, integrator: &Integrator, peak_g: Option<f64>, error: Option<&DropError>) {
        let step = integrator.state().map_or(0, |s| s.step);
        self.sender.emit(SimulationEvent::new(
            step,
            EventKind::Finished {
                status: integrator.status().to_string(),
                peak_g,
                error: error.map(ToString::to_string),
            },
        ));
    }

    /// Announces a lifecycle transition made outside the step loop.
    pub fn emit_status(&self, step: u64, from: IntegratorStatus, to: IntegratorStatus) {
        self.sender.emit(SimulationEvent::new(
            step,
            EventKind::StatusChanged {
                from: from.to_string(),
                to: to.to_string(),
            },
        ));
    }

    fn strain_energy(view: &StepView<'_>) -> f64 {
        view.elements
            .iter()
            .filter_map(|e| {
                let material = view.materials.get(e.material)?;
                e.strain_energy(&view.state.positions, material).ok()
            })
            .sum()
    }
}

impl StepObserver for TelemetryObserver {
    fn on_step(&mut self, view: &StepView<'_>) -> StepControl {
        let report = view.report;
        let step = report.step;

        let touching = report.contacts > 0;
        if touching != self.in_contact {
            self.in_contact = touching;
            self.sender.emit(SimulationEvent::new(
                step,
                EventKind::Contact {
                    contact_count: report.contacts,
                    ground_force: report.ground_force,
                },
            ));
        }

        if step % self.progress_interval == 0 {
            let progress_pct = if self.duration > 0.0 {
                (100.0 * report.time / self.duration).min(100.0)
            } else {
                100.0
            };
            self.sender.emit(SimulationEvent::new(
                step,
                EventKind::Progress {
                    time: report.time,
                    progress_pct,
                    elapsed_time: self.started.elapsed().as_secs_f64(),
                },
            ));
        }

        if let Some((interval, gravity)) = self.energy {
            if step % interval == 0 {
                self.sender.emit(SimulationEvent::new(
                    step,
                    EventKind::Energy {
                        kinetic: view.state.kinetic_energy(),
                        potential: view.state.potential_energy(gravity),
                        strain: Self::strain_energy(view),
                    },
                ));
            }
        }

        StepControl::Continue
    }
}
