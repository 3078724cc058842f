//! Engine error types.

use affix_core::{DiskKey, PlacementItem, PlatformError, ResourceKind};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

/// Errors surfaced by engine operations.
///
/// Every variant names the workload, domain or item it concerns so the
/// caller can retry exactly that unit. The engine itself never retries.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// A named resource does not exist.
    #[error("{kind} not found: {name}")]
    Lookup { kind: ResourceKind, name: String },

    /// No usable placement recommendation for a destination.
    #[error("cannot place {item} of {workload} on {target}: {reason}")]
    Resolution {
        workload: String,
        item: PlacementItem,
        target: String,
        reason: String,
    },

    /// A balance target cannot be computed.
    #[error("balance undefined: {0}")]
    DivisionUndefined(String),

    /// Per-disk destination count does not match the workload's disks.
    #[error("plan for {workload} has {actual} disk destinations, workload has {expected} disks")]
    InvalidPlanShape {
        workload: String,
        expected: usize,
        actual: usize,
    },

    /// Disks are addressed by key, so a repeated key makes the plan ambiguous.
    #[error("workload {workload} lists disk {disk} more than once")]
    DuplicateDisk { workload: String, disk: DiskKey },

    /// A rogue workload's domain cannot be inferred from its storage.
    #[error("cannot infer a domain for {workload}")]
    Unclassifiable { workload: String },

    /// The platform client failed for a reason other than a missing resource.
    #[error("platform error: {0}")]
    Platform(PlatformError),
}

impl EngineError {
    pub fn lookup(kind: ResourceKind, name: impl Into<String>) -> Self {
        EngineError::Lookup {
            kind,
            name: name.into(),
        }
    }

    /// Short machine-readable name of the failure class.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Lookup { .. } => "lookup_failure",
            EngineError::Resolution { .. } => "resolution_failure",
            EngineError::DivisionUndefined(_) => "division_undefined",
            EngineError::InvalidPlanShape { .. } => "invalid_plan_shape",
            EngineError::DuplicateDisk { .. } => "duplicate_disk",
            EngineError::Unclassifiable { .. } => "unclassifiable",
            EngineError::Platform(_) => "platform",
        }
    }

    /// Whether retrying the same unit of work may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Lookup { .. } | EngineError::Resolution { .. } => true,
            EngineError::Platform(PlatformError::Backend(_)) => true,
            EngineError::Platform(_) => false,
            EngineError::DivisionUndefined(_)
            | EngineError::InvalidPlanShape { .. }
            | EngineError::DuplicateDisk { .. }
            | EngineError::Unclassifiable { .. } => false,
        }
    }
}

impl From<PlatformError> for EngineError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::NotFound { kind, name } => EngineError::Lookup { kind, name },
            other => EngineError::Platform(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

impl Serialize for EngineError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("EngineError", 3)?;
        st.serialize_field("code", self.code())?;
        st.serialize_field("message", &self.to_string())?;
        st.serialize_field("retryable", &self.is_retryable())?;
        st.end()
    }
}
