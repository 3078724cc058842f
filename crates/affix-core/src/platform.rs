//! Client boundary to the virtualization platform.
//!
//! The engine never talks to a global connection: every component receives
//! a `&dyn Platform` (or an `Arc<dyn Platform>` for the worker pool) from
//! its caller. Implementations own transport, retries and timeouts.

use crate::error::{PlatformError, PlatformResult, ResourceKind};
use crate::types::*;

/// Inventory queries and mutation requests against the platform.
pub trait Platform: Send + Sync {
    /// All hosts in `cluster`.
    fn list_hosts(&self, cluster: &str) -> PlatformResult<Vec<Host>>;

    /// All workloads in `cluster`.
    fn list_workloads(&self, cluster: &str) -> PlatformResult<Vec<Workload>>;

    /// All affinity groups configured on `cluster`.
    fn list_groups(&self, cluster: &str) -> PlatformResult<Vec<GroupRecord>>;

    /// Resolve a workload by name.
    fn get_workload(&self, cluster: &str, name: &str) -> PlatformResult<Workload>;

    /// Resolve a concrete store by exact name.
    fn find_store(&self, name: &str) -> PlatformResult<Store>;

    /// Resolve a storage pool by exact name.
    fn find_pool(&self, name: &str) -> PlatformResult<StoragePool>;

    /// The pool holding `store_name`, or the store itself when it is standalone.
    fn storage_container(&self, store_name: &str) -> PlatformResult<StorageLocation>;

    /// Ranked placement proposals for putting a workload into a pool.
    fn recommend(&self, request: &RecommendationRequest) -> PlatformResult<Vec<Proposal>>;

    /// Submit a relocation; returns without waiting for it to finish.
    fn submit_relocation(&self, request: &RelocationRequest) -> PlatformResult<TaskHandle>;

    /// Add `member` to the workload group `group` on `cluster`.
    fn edit_group(&self, cluster: &str, group: &str, member: &str) -> PlatformResult<()>;
}

/// A workload given either by name or already resolved.
#[derive(Debug, Clone)]
pub enum WorkloadRef {
    Name(String),
    Resolved(Workload),
}

impl WorkloadRef {
    /// Resolve to a full workload record, querying the platform only for names.
    pub fn resolve(self, platform: &dyn Platform, cluster: &str) -> PlatformResult<Workload> {
        match self {
            WorkloadRef::Resolved(workload) if workload.cluster == cluster => Ok(workload),
            WorkloadRef::Resolved(workload) => Err(PlatformError::not_found(
                ResourceKind::Workload,
                format!("{}/{}", cluster, workload.name),
            )),
            WorkloadRef::Name(name) => platform.get_workload(cluster, &name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            WorkloadRef::Name(name) => name,
            WorkloadRef::Resolved(workload) => &workload.name,
        }
    }
}

impl From<&str> for WorkloadRef {
    fn from(name: &str) -> Self {
        WorkloadRef::Name(name.to_string())
    }
}

impl From<String> for WorkloadRef {
    fn from(name: String) -> Self {
        WorkloadRef::Name(name)
    }
}

impl From<Workload> for WorkloadRef {
    fn from(workload: Workload) -> Self {
        WorkloadRef::Resolved(workload)
    }
}
