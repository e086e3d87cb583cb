//! # dropsim-scheduler
//!
//! Decides where a drop simulation runs and manages the server-side
//! job lifecycle.
//!
//! Small meshes run in the caller's process on the caller's thread
//! ([`run_local`]); larger ones are queued and picked up by CPU workers
//! or the GPU slot ([`Scheduler`]). Both paths execute the same
//! integrator through [`execute`].
//!
//! ## Key Types
//!
//! - [`schedule`] / [`SchedulerConfig`] — Dispatch policy and thresholds
//! - [`PlanTier`] — Free / Professional / Enterprise entitlements
//! - [`Job`] — Job record with its `Pending → Running → …` lifecycle
//! - [`JobQueue`] — Priority queue, FIFO within a priority
//! - [`Scheduler`] — Worker pool with cancellation and wall-clock caps
//! - [`ProgressMessage`] — Progress protocol for channels and callbacks

pub mod job;
pub mod plan;
pub mod policy;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod runner;

pub use job::{Job, JobId, JobStatus};
pub use plan::{Entitlements, PlanTier};
pub use policy::{schedule, ExecutionMode, SchedulerConfig};
pub use pool::Scheduler;
pub use progress::{CallbackSink, ChannelSink, NullSink, ProgressMessage, ProgressReporter, ProgressSink};
pub use queue::{JobQueue, QueuedJob};
pub use runner::{execute, run_local, ExecuteOptions, RunOutcome};
