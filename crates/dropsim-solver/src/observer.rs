//! Per-step observation hook.
//!
//! Result sampling, progress reporting and interactive pausing all hang
//! off this trait, so the integrator itself stays free of I/O.

use dropsim_material::MaterialTable;
use dropsim_mesh::TetMesh;

use crate::element::ElementData;
use crate::integrator::StepReport;
use crate::state::SimulationState;

/// What the integrator should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepControl {
    #[default]
    Continue,
    /// Stop stepping and enter `Paused`; `run_with` may be called again.
    Pause,
    /// End the run early as `Completed`.
    Stop,
}

/// Read-only view of the run after a completed step.
#[derive(Clone, Copy)]
pub struct StepView<'a> {
    pub state: &'a SimulationState,
    pub report: &'a StepReport,
    pub mesh: &'a TetMesh,
    pub elements: &'a [ElementData],
    pub materials: &'a MaterialTable,
}

/// Hook called after every completed step.
pub trait StepObserver {
    fn on_step(&mut self, view: &StepView<'_>) -> StepControl;
}

impl<F> StepObserver for F
where
    F: FnMut(&StepView<'_>) -> StepControl,
{
    fn on_step(&mut self, view: &StepView<'_>) -> StepControl {
        self(view)
    }
}

/// Observer that never interferes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl StepObserver for NullObserver {
    fn on_step(&mut self, _view: &StepView<'_>) -> StepControl {
        StepControl::Continue
    }
}

/// Runs two observers in sequence. The stronger request wins
/// (`Stop` over `Pause` over `Continue`).
pub struct Chain<A, B>(pub A, pub B);

impl<A: StepObserver, B: StepObserver> StepObserver for Chain<A, B> {
    fn on_step(&mut self, view: &StepView<'_>) -> StepControl {
        let a = self.0.on_step(view);
        let b = self.1.on_step(view);
        match (a, b) {
            (StepControl::Stop, _) | (_, StepControl::Stop) => StepControl::Stop,
            (StepControl::Pause, _) | (_, StepControl::Pause) => StepControl::Pause,
            _ => StepControl::Continue,
        }
    }
}
