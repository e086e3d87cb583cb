//! Job records.

use std::time::Instant;

use dropsim_results::Summary;
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::PlanTier;
use crate::policy::ExecutionMode;

/// Unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn name(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Cancelled) | (Running, Completed) | (Running, Failed) | (Running, Cancelled)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One simulation job as the scheduler tracks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub plan: PlanTier,
    pub mode: ExecutionMode,
    pub priority: u32,
    pub element_count: usize,
    pub status: JobStatus,
    pub progress_pct: f64,
    /// Human-readable failure, set for `Failed` and `Cancelled`.
    pub error: Option<String>,
    pub summary: Option<Summary>,
    /// Wall-clock run time once the job has finished (s).
    pub wall_time: Option<f64>,
    #[serde(skip)]
    started: Option<Instant>,
}

impl Job {
    pub fn new(name: impl Into<String>, plan: PlanTier, mode: ExecutionMode, element_count: usize) -> Self {
        Self {
            id: JobId::new(),
            name: name.into(),
            plan,
            mode,
            priority: plan.entitlements().priority,
            element_count,
            status: JobStatus::Pending,
            progress_pct: 0.0,
            error: None,
            summary: None,
            wall_time: None,
            started: None,
        }
    }

    /// Moves the job to `next`, rejecting transitions the lifecycle
    /// does not allow.
    pub fn transition(&mut self, next: JobStatus) -> DropResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DropError::InvalidState(format!(
                "job {} cannot go from {} to {next}",
                self.id, self.status
            )));
        }
        tracing::info!(job = %self.id, from = %self.status, to = %next, "job status");
        match next {
            JobStatus::Running => self.started = Some(Instant::now()),
            _ if next.is_terminal() => {
                self.wall_time = self.started.map(|t| t.elapsed().as_secs_f64());
            }
            _ => {}
        }
        self.status = next;
        Ok(())
    }

    /// Records the end of a run.
    pub fn finish(&mut self, status: JobStatus, summary: Option<Summary>, error: Option<&DropError>) -> DropResult<()> {
        self.transition(status)?;
        if status == JobStatus::Completed {
            self.progress_pct = 100.0;
        }
        self.summary = summary;
        self.error = error.map(|e| e.to_string());
        Ok(())
    }
}
