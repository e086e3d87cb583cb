//! Dispatch policy: where a job of a given size runs.

use dropsim_compute::Backend;
use dropsim_types::constants::{
    DEFAULT_GPU_ELEMENT_THRESHOLD, DEFAULT_LOCAL_ELEMENT_THRESHOLD, DEFAULT_PROGRESS_INTERVAL,
};
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

use crate::plan::{Entitlements, PlanTier};

/// Where a simulation executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// In the caller's process, on the caller's thread, single-threaded.
    Wasm,
    /// Server job queue, one job per CPU worker.
    ServerCpu,
    /// Server job queue, through the GPU slot.
    ServerGpu,
}

impl ExecutionMode {
    pub fn name(&self) -> &str {
        match self {
            ExecutionMode::Wasm => "wasm",
            ExecutionMode::ServerCpu => "server_cpu",
            ExecutionMode::ServerGpu => "server_gpu",
        }
    }

    pub fn is_server(&self) -> bool {
        !matches!(self, ExecutionMode::Wasm)
    }

    /// Element loop strategy for this mode. The GPU slot runs the
    /// data-parallel loop; CPU workers each take one core.
    pub fn backend(&self) -> Backend {
        match self {
            ExecutionMode::Wasm | ExecutionMode::ServerCpu => Backend::Scalar,
            ExecutionMode::ServerGpu => Backend::Parallel,
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Meshes up to this many elements may run locally.
    pub local_element_threshold: usize,
    /// Server meshes above this many elements go to the GPU slot when
    /// the plan grants it.
    pub gpu_element_threshold: usize,
    /// CPU workers. `0` uses one per available core.
    pub cpu_workers: usize,
    /// Steps between progress messages.
    pub progress_interval: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            local_element_threshold: DEFAULT_LOCAL_ELEMENT_THRESHOLD,
            gpu_element_threshold: DEFAULT_GPU_ELEMENT_THRESHOLD,
            cpu_workers: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    /// Small pool for tests and local development.
    pub fn debug() -> Self {
        Self {
            cpu_workers: 2,
            progress_interval: 1,
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> DropResult<Self> {
        toml::from_str(text).map_err(|e| DropError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> DropResult<()> {
        if self.progress_interval == 0 {
            return Err(DropError::InvalidConfig("progress_interval must be at least 1".into()));
        }
        if self.gpu_element_threshold < self.local_element_threshold {
            return Err(DropError::InvalidConfig(format!(
                "gpu_element_threshold ({}) is below local_element_threshold ({})",
                self.gpu_element_threshold, self.local_element_threshold
            )));
        }
        Ok(())
    }

    /// Resolved number of CPU workers.
    pub fn worker_count(&self) -> usize {
        if self.cpu_workers > 0 {
            self.cpu_workers
        } else {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        }
    }

    /// Decides the execution mode for a mesh of `element_count` elements.
    ///
    /// Fails with `ResourceLimit` when the mesh is larger than the plan
    /// allows, before anything is dispatched.
    pub fn schedule(&self, element_count: usize, plan: PlanTier) -> DropResult<ExecutionMode> {
        let entitlements = plan.entitlements();
        check_entitlement(element_count, plan, &entitlements)?;
        if entitlements.allow_local && element_count <= self.local_element_threshold {
            return Ok(ExecutionMode::Wasm);
        }
        Ok(self.server_mode(element_count, &entitlements))
    }

    /// Server mode for a job that is sent to the queue regardless of size.
    pub fn server_schedule(&self, element_count: usize, plan: PlanTier) -> DropResult<ExecutionMode> {
        let entitlements = plan.entitlements();
        check_entitlement(element_count, plan, &entitlements)?;
        Ok(self.server_mode(element_count, &entitlements))
    }

    fn server_mode(&self, element_count: usize, entitlements: &Entitlements) -> ExecutionMode {
        if entitlements.gpu && element_count > self.gpu_element_threshold {
            ExecutionMode::ServerGpu
        } else {
            ExecutionMode::ServerCpu
        }
    }
}

fn check_entitlement(element_count: usize, plan: PlanTier, entitlements: &Entitlements) -> DropResult<()> {
    if element_count > entitlements.max_elements {
        return Err(DropError::ResourceLimit(format!(
            "{element_count} elements exceeds the {} plan limit of {}",
            plan.name(),
            entitlements.max_elements
        )));
    }
    Ok(())
}

/// [`SchedulerConfig::schedule`] with the default thresholds.
///
/// ```
/// use dropsim_scheduler::{schedule, ExecutionMode, PlanTier};
///
/// assert_eq!(schedule(8_000, PlanTier::Free).unwrap(), ExecutionMode::Wasm);
/// assert_eq!(schedule(20_000, PlanTier::Free).unwrap(), ExecutionMode::ServerCpu);
/// assert_eq!(schedule(200_000, PlanTier::Enterprise).unwrap(), ExecutionMode::ServerGpu);
/// assert!(schedule(200_000, PlanTier::Free).is_err());
/// ```
pub fn schedule(element_count: usize, plan: PlanTier) -> DropResult<ExecutionMode> {
    SchedulerConfig::default().schedule(element_count, plan)
}
