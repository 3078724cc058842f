//! affix-placement: affinity-domain placement engine.
//!
//! Measures how workloads are spread across affinity domains and corrects
//! storage that has drifted out of a workload's domain.
//!
//! # Components
//!
//! - [`GroupRegistry`] classifies a cluster's affinity groups by kind and domain.
//! - [`compute_balance`] reports each domain's workload count against its
//!   proportional share of hosts.
//! - [`MismatchDetector`] finds configuration and disks stored in another
//!   known domain.
//! - [`RemediationPlanner`] and [`RemediationExecutor`] turn findings into a
//!   single relocation per workload, resolving pools through
//!   [`PlacementResolver`].
//! - [`RogueAssigner`] gives ungrouped workloads a default group.
//!
//! [`Engine`] ties them together behind one [`Platform`](affix_core::Platform)
//! handle. Detection across a cluster runs on a bounded worker pool
//! ([`scan_cluster`]); mutations are issued one at a time.

pub mod balance;
pub mod detector;
pub mod engine;
pub mod error;
pub mod registry;
pub mod remediation;
pub mod resolver;
pub mod rogue;
pub mod scan;

#[cfg(test)]
mod testutil;

pub use balance::{
    BalanceReport, Deviation, DomainBalance, compute_balance, compute_balance_from_groups, ungrouped_hosts,
};
pub use detector::{Detection, Finding, MismatchDetector, UnresolvedItem, WorkloadDetection};
pub use engine::{
    BalanceOutcome, Engine, EngineSettings, RemediateOptions, RemediationReport, RemediationStatus,
    WorkloadRemediation,
};
pub use error::{EngineError, EngineResult};
pub use registry::{AffinityGroup, GroupRegistry, Membership};
pub use remediation::{
    Destination, PlanEntry, RelocationPlan, RemediationExecutor, RemediationOutcome, RemediationPlanner,
};
pub use resolver::{PlacementResolver, ResolvedDestination};
pub use rogue::{RogueAction, RogueAssigner, RogueOutcome, RogueResult};
pub use scan::scan_cluster;
