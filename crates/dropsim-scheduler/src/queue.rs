//! Priority job queue.
//!
//! Higher priority first, FIFO within a priority. Workers block on the
//! queue until a job arrives or the queue is closed.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use dropsim_io::PreparedRun;
use parking_lot::{Condvar, Mutex};

use crate::job::JobId;

/// A job waiting for a worker.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job_id: JobId,
    pub priority: u32,
    /// Enqueue order, for FIFO within a priority.
    pub sequence: u64,
    pub run: Arc<PreparedRun>,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.job_id == other.job_id
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Blocking priority queue shared by a group of workers.
#[derive(Debug, Default)]
pub struct JobQueue {
    heap: Mutex<BinaryHeap<QueuedJob>>,
    available: Condvar,
    sequence: AtomicU64,
    closed: AtomicBool,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job and wakes one waiting worker. Returns its sequence number.
    pub fn push(&self, job_id: JobId, priority: u32, run: Arc<PreparedRun>) -> u64 {
        let sequence = self.sequence.fetch_add(1, AtomicOrdering::Relaxed);
        self.heap.lock().push(QueuedJob {
            job_id,
            priority,
            sequence,
            run,
        });
        self.available.notify_one();
        sequence
    }

    /// Takes the next job without waiting.
    pub fn pop(&self) -> Option<QueuedJob> {
        self.heap.lock().pop()
    }

    /// Waits for the next job. Returns `None` once the queue is closed.
    pub fn wait_pop(&self) -> Option<QueuedJob> {
        let mut heap = self.heap.lock();
        loop {
            if self.closed.load(AtomicOrdering::Acquire) {
                return None;
            }
            if let Some(job) = heap.pop() {
                return Some(job);
            }
            self.available.wait(&mut heap);
        }
    }

    /// Id of the job that would be taken next.
    pub fn peek(&self) -> Option<JobId> {
        self.heap.lock().peek().map(|q| q.job_id)
    }

    /// Removes a waiting job.
    pub fn remove(&self, job_id: JobId) -> Option<QueuedJob> {
        let mut heap = self.heap.lock();
        let mut removed = None;
        let remaining: BinaryHeap<QueuedJob> = std::mem::take(&mut *heap)
            .into_iter()
            .filter_map(|q| {
                if q.job_id == job_id {
                    removed = Some(q);
                    None
                } else {
                    Some(q)
                }
            })
            .collect();
        *heap = remaining;
        removed
    }

    /// Closes the queue, wakes every worker and returns the jobs that
    /// were still waiting, in dispatch order.
    pub fn close(&self) -> Vec<QueuedJob> {
        let mut heap = self.heap.lock();
        self.closed.store(true, AtomicOrdering::Release);
        let drained = std::mem::take(&mut *heap).into_sorted_vec().into_iter().rev().collect();
        self.available.notify_all();
        drained
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(AtomicOrdering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }
}
