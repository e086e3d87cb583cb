//! Result recording while the integrator runs.

use dropsim_material::MaterialTable;
use dropsim_math::DVec3;
use dropsim_mesh::TetMesh;
use dropsim_solver::{ElementData, IntegratorStatus, SimulationState, StepControl, StepObserver, StepView};
use dropsim_types::{DropError, DropResult};

use crate::artifact::{ResultsArtifact, SensorSummary, Summary};
use crate::sampling::{Cadence, SamplingConfig};
use crate::sensor::SensorSet;
use crate::series::{PeakG, TimeSeries};
use crate::snapshot::{FieldSnapshot, SnapshotStore};

/// Slack when comparing simulated times against sampling instants.
const TIME_TOLERANCE: f64 = 1e-12;

/// Open averaging window of one sensor.
#[derive(Debug, Clone, Copy)]
struct Window {
    start_velocity: DVec3,
    elapsed: f64,
    steps: u64,
}

#[derive(Debug, Clone)]
struct Channel {
    sensor: SensorSet,
    series: TimeSeries,
    window: Option<Window>,
    next_sample_time: f64,
}

/// Records sensor series and requested snapshots as a
/// [`StepObserver`]. Survives a failed run, so partial series stay
/// available.
#[derive(Debug, Clone)]
pub struct ResultRecorder {
    sampling: SamplingConfig,
    channels: Vec<Channel>,
    snapshot_times: Vec<f64>,
    next_snapshot: usize,
    snapshots: SnapshotStore,
}

impl ResultRecorder {
    pub fn new(sensors: Vec<SensorSet>, sampling: SamplingConfig) -> DropResult<Self> {
        sampling.validate()?;
        if sensors.is_empty() {
            return Err(DropError::InvalidConfig("at least one sensor set is required".into()));
        }
        let channels = sensors
            .into_iter()
            .map(|sensor| Channel {
                series: TimeSeries::new(sensor.name.clone()),
                sensor,
                window: None,
                next_sample_time: 0.0,
            })
            .collect();
        Ok(Self {
            sampling,
            channels,
            snapshot_times: Vec::new(),
            next_snapshot: 0,
            snapshots: SnapshotStore::new(),
        })
    }

    /// Builder: capture full-field snapshots at these simulated times.
    pub fn with_snapshot_times(mut self, mut times: Vec<f64>) -> Self {
        times.retain(|t| t.is_finite() && *t >= 0.0);
        times.sort_by(f64::total_cmp);
        times.dedup();
        self.snapshot_times = times;
        self
    }

    /// Checks sensor node references against the mesh.
    pub fn validate(&self, node_count: usize) -> DropResult<()> {
        self.channels
            .iter()
            .try_for_each(|c| c.sensor.validate(node_count))
    }

    pub fn series(&self) -> impl Iterator<Item = &TimeSeries> {
        self.channels.iter().map(|c| &c.series)
    }

    /// Peak G of the first sensor set.
    pub fn peak(&self) -> Option<PeakG> {
        self.channels.first().and_then(|c| c.series.peak())
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Captures a snapshot of the current state on demand.
    pub fn capture_snapshot(
        &mut self,
        state: &SimulationState,
        mesh: &TetMesh,
        elements: &[ElementData],
        materials: &MaterialTable,
    ) -> DropResult<usize> {
        let snapshot = FieldSnapshot::capture(state, mesh, elements, materials)?;
        self.snapshots.insert(&snapshot)
    }

    /// Builds the results artifact. `error` is the failure that ended
    /// the run, if any.
    pub fn finish(self, status: IntegratorStatus, error: Option<&DropError>) -> ResultsArtifact {
        let sensors: Vec<SensorSummary> = self
            .channels
            .iter()
            .map(|c| SensorSummary {
                sensor: c.sensor.name.clone(),
                peak: c.series.peak(),
                samples: c.series.len(),
            })
            .collect();
        let primary = sensors.first();
        let peak = primary.and_then(|s| s.peak);
        let summary = Summary {
            peak_g: peak.map_or(0.0, |p| p.peak_g),
            peak_g_time: peak.map_or(0.0, |p| p.time),
            samples_used: primary.map_or(0, |s| s.samples),
            status,
            error: error.map(ToString::to_string),
        };

        ResultsArtifact {
            summary,
            sensors,
            snapshots: self.snapshots.index(),
            series: self.channels.into_iter().map(|c| c.series).collect(),
        }
    }

    fn sample(&mut self, view: &StepView<'_>) {
        let state = view.state;
        let dt = view.report.dt;
        let kick = if view.report.step == 1 { 0.5 * dt } else { dt };
        let time = state.accel_time;

        for channel in &mut self.channels {
            let acceleration = channel.sensor.cg_acceleration(state);

            if self.sampling.averaging {
                let velocity = channel.sensor.cg_velocity(state);
                let window = channel.window.get_or_insert(Window {
                    start_velocity: velocity - acceleration * kick,
                    elapsed: 0.0,
                    steps: 0,
                });
                window.elapsed += kick;
                window.steps += 1;

                let close = match self.sampling.cadence {
                    Cadence::EverySteps(n) => window.steps >= n,
                    Cadence::Interval(s) => window.elapsed + TIME_TOLERANCE >= s - 0.5 * dt,
                };
                if close {
                    let mean = (velocity - window.start_velocity) / window.elapsed;
                    channel.series.push(time, mean.length());
                    channel.window = None;
                }
            } else {
                let due = match self.sampling.cadence {
                    Cadence::EverySteps(n) => view.report.step % n == 0,
                    Cadence::Interval(s) => {
                        let due = time + TIME_TOLERANCE >= channel.next_sample_time - 0.5 * dt;
                        if due {
                            while channel.next_sample_time - 0.5 * dt <= time + TIME_TOLERANCE {
                                channel.next_sample_time += s;
                            }
                        }
                        due
                    }
                };
                if due {
                    channel.series.push(time, acceleration.length());
                }
            }
        }
    }

    fn snapshot_if_due(&mut self, view: &StepView<'_>) {
        let half_step = 0.5 * view.report.dt;
        while let Some(&requested) = self.snapshot_times.get(self.next_snapshot) {
            if view.state.time + TIME_TOLERANCE < requested - half_step {
                break;
            }
            self.next_snapshot += 1;
            match FieldSnapshot::capture(view.state, view.mesh, view.elements, view.materials)
                .and_then(|s| self.snapshots.insert(&s))
            {
                Ok(index) => tracing::debug!(index, requested, time = view.state.time, "snapshot captured"),
                Err(err) => tracing::warn!(requested, error = %err, "snapshot skipped"),
            }
        }
    }
}

impl StepObserver for ResultRecorder {
    fn on_step(&mut self, view: &StepView<'_>) -> StepControl {
        self.sample(view);
        self.snapshot_if_due(view);
        StepControl::Continue
    }
}
