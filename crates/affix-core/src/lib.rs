//! affix-core: shared types for the affinity placement engine.
//!
//! Holds the inventory data model, the [`Platform`] client trait the engine
//! is driven through, the domain naming convention and `affix.toml` parsing.

pub mod config;
pub mod error;
pub mod naming;
pub mod platform;
pub mod types;

pub use config::AffixConfig;
pub use error::{ConfigError, PlatformError, PlatformResult, ResourceKind};
pub use naming::{DelimiterConvention, DomainConvention, derive_domain};
pub use platform::{Platform, WorkloadRef};
pub use types::*;
