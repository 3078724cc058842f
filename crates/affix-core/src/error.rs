//! Error types for the platform client boundary and configuration.

use std::fmt;

use thiserror::Error;

/// Result type alias for platform client calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Kind of named resource a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Cluster,
    Host,
    Workload,
    Group,
    Store,
    Pool,
    Task,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Cluster => "cluster",
            ResourceKind::Host => "host",
            ResourceKind::Workload => "workload",
            ResourceKind::Group => "group",
            ResourceKind::Store => "store",
            ResourceKind::Pool => "pool",
            ResourceKind::Task => "task",
        };
        f.write_str(s)
    }
}

/// Errors reported by a platform client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: ResourceKind, name: String },

    /// The platform understood the request and refused it.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Transport or storage failure inside the client.
    #[error("platform backend error: {0}")]
    Backend(String),
}

impl PlatformError {
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        PlatformError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound { .. })
    }
}

/// Errors loading `affix.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
