//! Error types for the dropsim solver.
//!
//! All crates return `DropResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the dropsim solver.
#[derive(Debug, Error)]
pub enum DropError {
    /// Mesh data is malformed: degenerate element, dangling node
    /// reference, or non-manifold connectivity.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Constitutive parameter is out of its valid range.
    #[error("Invalid material parameter: {0}")]
    InvalidMaterial(String),

    /// A constitutive evaluation failed during a step
    /// (inverted element or non-finite stress).
    #[error("Material failure{}: {reason}", element.map(|e| format!(" in element {e}")).unwrap_or_default())]
    MaterialFailure {
        element: Option<u32>,
        reason: String,
    },

    /// The state became non-finite or unbounded while stepping.
    #[error("Simulation diverged after step {last_good_step}: {reason}")]
    Divergence {
        last_good_step: u64,
        reason: String,
    },

    /// Element count or compute time exceeds the plan entitlement.
    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),

    /// Wall-clock cap for the job was reached.
    #[error("Job timed out after {limit_secs:.1}s wall-clock")]
    Timeout { limit_secs: f64 },

    /// The run was cancelled by its owner.
    #[error("Simulation cancelled")]
    Cancelled,

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation was requested in a lifecycle state that does not allow it.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DropError {
    /// Attaches an element index to a material failure raised by a
    /// context-free constitutive evaluation.
    pub fn at_element(self, index: u32) -> Self {
        match self {
            DropError::MaterialFailure { reason, .. } => DropError::MaterialFailure {
                element: Some(index),
                reason,
            },
            other => other,
        }
    }

    /// True for failures that end a run that had already started
    /// (as opposed to input that was rejected up front).
    pub fn is_terminal_for_job(&self) -> bool {
        matches!(
            self,
            DropError::MaterialFailure { .. }
                | DropError::Divergence { .. }
                | DropError::Timeout { .. }
                | DropError::Cancelled
        )
    }

    /// Convenience constructor for a material failure without element context.
    pub fn material_failure(reason: impl Into<String>) -> Self {
        DropError::MaterialFailure {
            element: None,
            reason: reason.into(),
        }
    }
}

/// Convenience alias for `Result<T, DropError>`.
pub type DropResult<T> = Result<T, DropError>;
