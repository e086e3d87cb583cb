//! Execution of one prepared run, shared by the local path and the
//! server workers. The integrator is the same in both; only the
//! backend, the progress sink and the wall-clock cap differ.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dropsim_io::PreparedRun;
use dropsim_results::ResultsArtifact;
use dropsim_solver::{Chain, Integrator, IntegratorStatus, StepControl, StepObserver, StepView};
use dropsim_types::{DropError, DropResult};

use crate::job::{JobId, JobStatus};
use crate::policy::{ExecutionMode, SchedulerConfig};
use crate::progress::{CallbackSink, ProgressMessage, ProgressReporter, ProgressSink};

/// Result of executing a run to a terminal state.
#[derive(Debug)]
pub struct RunOutcome {
    pub job_id: JobId,
    pub mode: ExecutionMode,
    pub status: JobStatus,
    /// Series recorded up to the end of the run, partial on failure.
    pub artifact: ResultsArtifact,
    pub error: Option<DropError>,
    pub steps: u64,
    pub wall_time: f64,
}

/// Stops the run once the wall-clock cap is exceeded.
struct WallClockGuard {
    started: Instant,
    limit: Option<f64>,
    timed_out: bool,
}

impl StepObserver for WallClockGuard {
    fn on_step(&mut self, _view: &StepView<'_>) -> StepControl {
        match self.limit {
            Some(limit) if self.started.elapsed().as_secs_f64() > limit => {
                self.timed_out = true;
                StepControl::Stop
            }
            _ => StepControl::Continue,
        }
    }
}

/// Per-run execution parameters.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub mode: ExecutionMode,
    pub progress_interval: u64,
    pub cancel: Arc<AtomicBool>,
    /// Wall-clock cap (s). `None` runs to the end.
    pub wall_clock_limit: Option<f64>,
}

/// Runs `run` to a terminal state.
///
/// Setup problems (a run that cannot be initialized) are returned as
/// errors. Failures during stepping end the run as `Failed` and are
/// reported in the outcome together with the partial results.
pub fn execute(
    job_id: JobId,
    run: &PreparedRun,
    options: &ExecuteOptions,
    sink: &mut dyn ProgressSink,
) -> DropResult<RunOutcome> {
    let started = Instant::now();
    let solver = run.solver.clone().with_backend(options.mode.backend());
    let mut integrator = Integrator::new(Arc::clone(&run.mesh), Arc::clone(&run.materials), solver)
        .with_contact(run.contact.clone(), Some(run.ground))
        .with_cancel_token(Arc::clone(&options.cancel));
    integrator.initialize(run.initial_velocity)?;
    let recorder = run.recorder()?;

    tracing::info!(
        job = %job_id,
        mode = %options.mode,
        elements = run.element_count(),
        backend = options.mode.backend().name(),
        "run started"
    );

    let mut reporter = ProgressReporter::new(job_id, sink, options.progress_interval, run.solver.duration);
    reporter.send_status(JobStatus::Running);
    let guard = WallClockGuard {
        started,
        limit: options.wall_clock_limit,
        timed_out: false,
    };

    let mut observers = Chain(recorder, Chain(reporter, guard));
    let result = integrator.run_with(&mut observers);
    let Chain(recorder, Chain(mut reporter, guard)) = observers;

    let (status, error) = match result {
        Ok(_) if guard.timed_out => (
            JobStatus::Failed,
            Some(DropError::Timeout {
                limit_secs: guard.limit.unwrap_or_default(),
            }),
        ),
        Ok(IntegratorStatus::Completed) => (JobStatus::Completed, None),
        Ok(IntegratorStatus::Cancelled) => (JobStatus::Cancelled, Some(DropError::Cancelled)),
        Ok(other) => (
            JobStatus::Failed,
            Some(DropError::InvalidState(format!("run ended while {other}"))),
        ),
        Err(e) => (JobStatus::Failed, Some(e)),
    };

    let integrator_status = if guard.timed_out {
        IntegratorStatus::Failed
    } else {
        integrator.status()
    };
    let artifact = recorder.finish(integrator_status, error.as_ref());
    reporter.send_status(status);

    let steps = integrator.state().map_or(0, |s| s.step);
    let wall_time = started.elapsed().as_secs_f64();
    match &error {
        Some(e) if status == JobStatus::Failed => {
            tracing::warn!(job = %job_id, steps, error = %e, "run failed");
        }
        _ => tracing::info!(
            job = %job_id,
            status = %status,
            steps,
            wall_time,
            peak_g = artifact.summary.peak_g,
            "run finished"
        ),
    }

    Ok(RunOutcome {
        job_id,
        mode: options.mode,
        status,
        artifact,
        error,
        steps,
        wall_time,
    })
}

/// Runs in the caller's process on the caller's thread (`Wasm` mode).
///
/// Progress goes to `callback` every `config.progress_interval` steps.
/// Setting `cancel` stops the run between steps. Local runs have no
/// wall-clock cap.
pub fn run_local<F>(
    run: &PreparedRun,
    config: &SchedulerConfig,
    cancel: Arc<AtomicBool>,
    callback: F,
) -> DropResult<RunOutcome>
where
    F: FnMut(&ProgressMessage) + Send,
{
    if cancel.load(Ordering::Relaxed) {
        return Err(DropError::Cancelled);
    }
    let options = ExecuteOptions {
        mode: ExecutionMode::Wasm,
        progress_interval: config.progress_interval,
        cancel,
        wall_clock_limit: None,
    };
    let mut sink = CallbackSink::new(callback);
    execute(JobId::new(), run, &options, &mut sink)
}
