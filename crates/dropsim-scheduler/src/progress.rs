//! Progress protocol.
//!
//! Runs report `{job_id, iteration, elapsed_time, progress_pct, status}`
//! at a bounded cadence. Server workers push messages into a channel;
//! a local run hands them to a callback on the caller's thread.

use std::sync::mpsc::Sender;
use std::time::Instant;

use dropsim_solver::{StepControl, StepObserver, StepView};
use serde::{Deserialize, Serialize};

use crate::job::{JobId, JobStatus};

/// One progress update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub job_id: JobId,
    /// Integrator step count.
    pub iteration: u64,
    /// Simulated time (s).
    pub time: f64,
    /// Wall-clock time since the run started (s).
    pub elapsed_time: f64,
    pub progress_pct: f64,
    pub status: JobStatus,
}

/// Destination of progress messages.
pub trait ProgressSink: Send {
    fn send(&mut self, message: &ProgressMessage);

    fn name(&self) -> &str;
}

/// Drops every message.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn send(&mut self, _message: &ProgressMessage) {}

    fn name(&self) -> &str {
        "null"
    }
}

/// Forwards messages into an `mpsc` channel. A closed receiver is not
/// an error for the run.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<ProgressMessage>,
}

impl ChannelSink {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelSink {
    fn send(&mut self, message: &ProgressMessage) {
        let _ = self.sender.send(message.clone());
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// Calls a closure for each message.
pub struct CallbackSink<F: FnMut(&ProgressMessage) + Send> {
    callback: F,
}

impl<F: FnMut(&ProgressMessage) + Send> CallbackSink<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: FnMut(&ProgressMessage) + Send> ProgressSink for CallbackSink<F> {
    fn send(&mut self, message: &ProgressMessage) {
        (self.callback)(message);
    }

    fn name(&self) -> &str {
        "callback"
    }
}

/// Step observer that emits a [`ProgressMessage`] every `interval` steps.
pub struct ProgressReporter<'a> {
    job_id: JobId,
    sink: &'a mut dyn ProgressSink,
    interval: u64,
    duration: f64,
    started: Instant,
    last: Option<ProgressMessage>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(job_id: JobId, sink: &'a mut dyn ProgressSink, interval: u64, duration: f64) -> Self {
        Self {
            job_id,
            sink,
            interval: interval.max(1),
            duration,
            started: Instant::now(),
            last: None,
        }
    }

    /// Sends a status message outside the step cadence, carrying the
    /// last known iteration and progress.
    pub fn send_status(&mut self, status: JobStatus) {
        let mut message = self.last.clone().unwrap_or(ProgressMessage {
            job_id: self.job_id,
            iteration: 0,
            time: 0.0,
            elapsed_time: 0.0,
            progress_pct: 0.0,
            status,
        });
        message.status = status;
        message.elapsed_time = self.started.elapsed().as_secs_f64();
        if status == JobStatus::Completed {
            message.progress_pct = 100.0;
        }
        self.sink.send(&message);
    }

    pub fn last(&self) -> Option<&ProgressMessage> {
        self.last.as_ref()
    }
}

impl StepObserver for ProgressReporter<'_> {
    fn on_step(&mut self, view: &StepView<'_>) -> StepControl {
        let step = view.report.step;
        let message = ProgressMessage {
            job_id: self.job_id,
            iteration: step,
            time: view.report.time,
            elapsed_time: self.started.elapsed().as_secs_f64(),
            progress_pct: (100.0 * view.report.time / self.duration).clamp(0.0, 100.0),
            status: JobStatus::Running,
        };
        if step % self.interval == 0 {
            tracing::debug!(
                job = %self.job_id,
                step,
                progress = message.progress_pct,
                "progress"
            );
            self.sink.send(&message);
        }
        self.last = Some(message);
        StepControl::Continue
    }
}
