//! Server-side worker pool.
//!
//! One CPU worker per core pulls from the CPU queue; a single GPU slot
//! pulls from the GPU queue, so at most one GPU job runs at a time.
//! Jobs never preempt each other: priority only decides who is taken
//! next from a queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use dropsim_io::PreparedRun;
use dropsim_results::ResultsArtifact;
use dropsim_types::{DropError, DropResult};
use parking_lot::{Condvar, Mutex};

use crate::job::{Job, JobId, JobStatus};
use crate::plan::PlanTier;
use crate::policy::{ExecutionMode, SchedulerConfig};
use crate::progress::{ChannelSink, ProgressMessage, ProgressSink};
use crate::queue::{JobQueue, QueuedJob};
use crate::runner::{execute, ExecuteOptions};

struct JobEntry {
    job: Job,
    artifact: Option<ResultsArtifact>,
    cancel: Arc<AtomicBool>,
}

struct Shared {
    config: SchedulerConfig,
    jobs: Mutex<HashMap<JobId, JobEntry>>,
    changed: Condvar,
    cpu_queue: JobQueue,
    gpu_queue: JobQueue,
}

impl Shared {
    fn queue(&self, mode: ExecutionMode) -> &JobQueue {
        match mode {
            ExecutionMode::ServerGpu => &self.gpu_queue,
            _ => &self.cpu_queue,
        }
    }
}

/// Forwards progress to the channel and mirrors it into the job record.
struct WorkerSink {
    channel: ChannelSink,
    shared: Arc<Shared>,
}

impl ProgressSink for WorkerSink {
    fn send(&mut self, message: &ProgressMessage) {
        if message.status == JobStatus::Running {
            if let Some(entry) = self.shared.jobs.lock().get_mut(&message.job_id) {
                entry.job.progress_pct = message.progress_pct;
            }
        }
        self.channel.send(message);
    }

    fn name(&self) -> &str {
        "worker"
    }
}

/// Job queue with its worker threads.
pub struct Scheduler {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    progress: Option<Receiver<ProgressMessage>>,
}

impl Scheduler {
    /// Spawns the CPU workers and the GPU slot.
    pub fn start(config: SchedulerConfig) -> DropResult<Self> {
        config.validate()?;
        let cpu_workers = config.worker_count();
        let shared = Arc::new(Shared {
            config,
            jobs: Mutex::new(HashMap::new()),
            changed: Condvar::new(),
            cpu_queue: JobQueue::new(),
            gpu_queue: JobQueue::new(),
        });
        let (sender, receiver) = mpsc::channel();

        let mut workers = Vec::with_capacity(cpu_workers + 1);
        for i in 0..cpu_workers {
            workers.push(spawn_worker(
                format!("dropsim-cpu-{i}"),
                ExecutionMode::ServerCpu,
                Arc::clone(&shared),
                sender.clone(),
            )?);
        }
        workers.push(spawn_worker(
            "dropsim-gpu".into(),
            ExecutionMode::ServerGpu,
            Arc::clone(&shared),
            sender,
        )?);
        tracing::info!(cpu_workers, gpu_slots = 1, "scheduler started");

        Ok(Self {
            shared,
            workers,
            progress: Some(receiver),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Takes the progress channel. Only the first call returns it.
    pub fn take_progress(&mut self) -> Option<Receiver<ProgressMessage>> {
        self.progress.take()
    }

    /// Creates a job for `run` and queues it.
    ///
    /// The mesh size is checked against the plan before anything is
    /// queued. The job always runs on the server; use
    /// [`SchedulerConfig::schedule`] first to decide whether it should run
    /// locally instead.
    pub fn submit(&self, name: impl Into<String>, run: PreparedRun, plan: PlanTier) -> DropResult<JobId> {
        let element_count = run.element_count();
        let mode = self.shared.config.server_schedule(element_count, plan)?;
        let job = Job::new(name, plan, mode, element_count);
        let (id, priority) = (job.id, job.priority);

        self.shared.jobs.lock().insert(
            id,
            JobEntry {
                job,
                artifact: None,
                cancel: Arc::new(AtomicBool::new(false)),
            },
        );
        self.shared.queue(mode).push(id, priority, Arc::new(run));
        tracing::info!(job = %id, mode = %mode, plan = plan.name(), element_count, "job queued");
        Ok(id)
    }

    pub fn job(&self, id: JobId) -> Option<Job> {
        self.shared.jobs.lock().get(&id).map(|e| e.job.clone())
    }

    /// All jobs, in no particular order.
    pub fn jobs(&self) -> Vec<Job> {
        self.shared.jobs.lock().values().map(|e| e.job.clone()).collect()
    }

    /// Results of a finished job.
    pub fn artifact(&self, id: JobId) -> Option<ResultsArtifact> {
        self.shared.jobs.lock().get(&id).and_then(|e| e.artifact.clone())
    }

    /// Removes a finished job, returning its record and results.
    ///
    /// Finished jobs are otherwise kept until the scheduler shuts down.
    /// Pending and running jobs cannot be taken.
    pub fn take_finished(&self, id: JobId) -> DropResult<(Job, Option<ResultsArtifact>)> {
        let mut jobs = self.shared.jobs.lock();
        let status = jobs.get(&id).map(|e| e.job.status).ok_or_else(|| unknown_job(id))?;
        if !status.is_terminal() {
            return Err(DropError::InvalidState(format!("job {id} is still {status}")));
        }
        let entry = jobs.remove(&id).ok_or_else(|| unknown_job(id))?;
        tracing::debug!(job = %id, %status, "job released");
        Ok((entry.job, entry.artifact))
    }

    /// Jobs waiting in the CPU and GPU queues.
    pub fn queued(&self) -> usize {
        self.shared.cpu_queue.len() + self.shared.gpu_queue.len()
    }

    /// Cancels a job. A pending job is removed from its queue; a running
    /// job stops at its next step boundary.
    pub fn cancel(&self, id: JobId) -> DropResult<()> {
        let mut jobs = self.shared.jobs.lock();
        let entry = jobs
            .get_mut(&id)
            .ok_or_else(|| unknown_job(id))?;
        match entry.job.status {
            JobStatus::Pending => {
                self.shared.queue(entry.job.mode).remove(id);
                entry.cancel.store(true, Ordering::Relaxed);
                entry.job.finish(JobStatus::Cancelled, None, Some(&DropError::Cancelled))?;
                self.shared.changed.notify_all();
            }
            JobStatus::Running => entry.cancel.store(true, Ordering::Relaxed),
            status => {
                return Err(DropError::InvalidState(format!("job {id} is already {status}")));
            }
        }
        Ok(())
    }

    /// Blocks until the job reaches a terminal status.
    pub fn wait(&self, id: JobId, timeout: Duration) -> DropResult<Job> {
        let deadline = Instant::now() + timeout;
        let mut jobs = self.shared.jobs.lock();
        loop {
            let entry = jobs
                .get(&id)
                .ok_or_else(|| unknown_job(id))?;
            if entry.job.status.is_terminal() {
                return Ok(entry.job.clone());
            }
            if self.shared.changed.wait_until(&mut jobs, deadline).timed_out() {
                return Err(DropError::Timeout {
                    limit_secs: timeout.as_secs_f64(),
                });
            }
        }
    }

    /// Stops accepting work, cancels waiting and running jobs, joins the
    /// workers, and returns the final job records.
    pub fn shutdown(mut self) -> Vec<Job> {
        self.stop();
        self.jobs()
    }

    fn stop(&mut self) {
        let mut waiting: Vec<QueuedJob> = self.shared.cpu_queue.close();
        waiting.extend(self.shared.gpu_queue.close());
        {
            let mut jobs = self.shared.jobs.lock();
            for queued in &waiting {
                if let Some(entry) = jobs.get_mut(&queued.job_id) {
                    if entry.job.status == JobStatus::Pending {
                        let _ = entry.job.finish(JobStatus::Cancelled, None, Some(&DropError::Cancelled));
                    }
                }
            }
            for entry in jobs.values().filter(|e| !e.job.status.is_terminal()) {
                entry.cancel.store(true, Ordering::Relaxed);
            }
            self.shared.changed.notify_all();
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("worker thread panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn unknown_job(id: JobId) -> DropError {
    DropError::InvalidState(format!("unknown job {id}"))
}

fn spawn_worker(
    name: String,
    lane: ExecutionMode,
    shared: Arc<Shared>,
    progress: Sender<ProgressMessage>,
) -> DropResult<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name(name)
        .spawn(move || worker_loop(lane, shared, progress))?;
    Ok(handle)
}

fn worker_loop(lane: ExecutionMode, shared: Arc<Shared>, progress: Sender<ProgressMessage>) {
    while let Some(queued) = shared.queue(lane).wait_pop() {
        let id = queued.job_id;
        let claimed = {
            let mut jobs = shared.jobs.lock();
            match jobs.get_mut(&id) {
                Some(entry) if entry.job.status == JobStatus::Pending => {
                    let options = ExecuteOptions {
                        mode: entry.job.mode,
                        progress_interval: shared.config.progress_interval,
                        cancel: Arc::clone(&entry.cancel),
                        wall_clock_limit: Some(entry.job.plan.entitlements().wall_clock_limit),
                    };
                    entry.job.transition(JobStatus::Running).ok().map(|_| options)
                }
                _ => None,
            }
        };
        let Some(options) = claimed else {
            continue;
        };
        shared.changed.notify_all();

        let mut sink = WorkerSink {
            channel: ChannelSink::new(progress.clone()),
            shared: Arc::clone(&shared),
        };
        let outcome = execute(id, &queued.run, &options, &mut sink);

        let mut jobs = shared.jobs.lock();
        if let Some(entry) = jobs.get_mut(&id) {
            let recorded = match outcome {
                Ok(outcome) => {
                    let summary = outcome.artifact.summary.clone();
                    entry.artifact = Some(outcome.artifact);
                    entry.job.finish(outcome.status, Some(summary), outcome.error.as_ref())
                }
                Err(e) => entry.job.finish(JobStatus::Failed, None, Some(&e)),
            };
            if let Err(e) = recorded {
                tracing::warn!(job = %id, error = %e, "could not record job result");
            }
        }
        shared.changed.notify_all();
    }
}
