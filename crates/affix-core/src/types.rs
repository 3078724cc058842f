//! Inventory types shared by the platform boundary and the engine.
//!
//! These mirror what the virtualization platform reports: hosts, workloads
//! with their storage, affinity groups, stores and storage pools. The engine
//! only reads them; mutation requests travel through [`crate::Platform`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a cluster, unique within a platform connection.
pub type ClusterName = String;

/// Name of a workload (virtual machine), unique within its cluster.
pub type WorkloadName = String;

/// Platform key of a virtual disk, unique within its workload.
pub type DiskKey = u32;

// ── Clusters, hosts & workloads ───────────────────────────────────

/// A cluster of hosts sharing affinity-group configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cluster {
    pub name: ClusterName,
}

/// A compute host belonging to exactly one cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub cluster: ClusterName,
}

/// A virtual disk attached to a workload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Disk {
    pub key: DiskKey,
    /// Display label, e.g. "Hard disk 1".
    #[serde(default)]
    pub label: String,
    /// Name of the concrete store holding the disk's backing file.
    pub store: String,
    #[serde(default)]
    pub capacity_bytes: u64,
}

/// A workload (virtual machine) and where its files live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workload {
    pub name: WorkloadName,
    pub cluster: ClusterName,
    /// Store holding the workload's configuration file.
    pub config_store: String,
    /// Disks in platform order.
    #[serde(default)]
    pub disks: Vec<Disk>,
}

impl Workload {
    /// Build the composite key used by inventory tables.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.cluster, self.name)
    }

    /// Every storage-bearing item in fixed order: configuration first, then disks.
    pub fn locations(&self) -> impl Iterator<Item = (PlacementItem, &str)> {
        std::iter::once((PlacementItem::Config, self.config_store.as_str())).chain(
            self.disks
                .iter()
                .map(|d| (PlacementItem::Disk(d.key), d.store.as_str())),
        )
    }

    /// Total provisioned disk capacity.
    pub fn storage_bytes(&self) -> u64 {
        self.disks.iter().map(|d| d.capacity_bytes).sum()
    }

    pub fn disk(&self, key: DiskKey) -> Option<&Disk> {
        self.disks.iter().find(|d| d.key == key)
    }

    /// First disk key that appears more than once, if any.
    ///
    /// Disks are addressed by key everywhere, so such a workload cannot be
    /// planned or relocated.
    pub fn duplicate_disk_key(&self) -> Option<DiskKey> {
        let mut seen = std::collections::HashSet::new();
        self.disks.iter().map(|d| d.key).find(|key| !seen.insert(*key))
    }
}

/// One relocatable item of a workload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "type", content = "key", rename_all = "snake_case")]
pub enum PlacementItem {
    Config,
    Disk(DiskKey),
}

impl fmt::Display for PlacementItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementItem::Config => f.write_str("config"),
            PlacementItem::Disk(key) => write!(f, "disk {key}"),
        }
    }
}

// ── Affinity groups ───────────────────────────────────────────────

/// Which member type an affinity group holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Host,
    Workload,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKind::Host => f.write_str("host"),
            GroupKind::Workload => f.write_str("workload"),
        }
    }
}

/// Members as the platform reports them; the variant is the member type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "names", rename_all = "snake_case")]
pub enum GroupMembers {
    Hosts(Vec<String>),
    Workloads(Vec<String>),
}

impl GroupMembers {
    pub fn kind(&self) -> GroupKind {
        match self {
            GroupMembers::Hosts(_) => GroupKind::Host,
            GroupMembers::Workloads(_) => GroupKind::Workload,
        }
    }

    pub fn names(&self) -> &[String] {
        match self {
            GroupMembers::Hosts(names) | GroupMembers::Workloads(names) => names,
        }
    }
}

/// Raw affinity group record as listed by the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    pub cluster: ClusterName,
    pub members: GroupMembers,
}

impl GroupRecord {
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.cluster, self.name)
    }
}

// ── Storage ───────────────────────────────────────────────────────

/// A concrete store (datastore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Store {
    pub name: String,
    /// Pool this store belongs to, if any.
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub capacity_bytes: u64,
    #[serde(default)]
    pub free_bytes: u64,
}

/// A storage pool aggregating stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoragePool {
    pub name: String,
}

/// The ultimate container of a file: a concrete store or the pool holding it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum StorageLocation {
    Store(String),
    Pool(String),
}

impl StorageLocation {
    pub fn name(&self) -> &str {
        match self {
            StorageLocation::Store(name) | StorageLocation::Pool(name) => name,
        }
    }

    pub fn is_pool(&self) -> bool {
        matches!(self, StorageLocation::Pool(_))
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Store(name) => write!(f, "store {name}"),
            StorageLocation::Pool(name) => write!(f, "pool {name}"),
        }
    }
}

// ── Placement requests ────────────────────────────────────────────

/// Kind of operation a placement recommendation is requested for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Relocate,
    Clone,
    Create,
    Reconfigure,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Relocate => "relocate",
            OperationType::Clone => "clone",
            OperationType::Create => "create",
            OperationType::Reconfigure => "reconfigure",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to the platform's placement-recommendation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub cluster: ClusterName,
    pub workload: WorkloadName,
    pub pool: String,
    pub operation: OperationType,
}

/// One ranked recommendation; destinations are store names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Proposal {
    #[serde(default)]
    pub reason: String,
    pub destinations: Vec<String>,
}

/// Per-disk destination inside a relocation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiskDestination {
    pub disk: DiskKey,
    pub store: String,
}

/// Composite relocation: configuration destination plus one destination per disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelocationRequest {
    pub cluster: ClusterName,
    pub workload: WorkloadName,
    pub config_destination: String,
    pub disk_destinations: Vec<DiskDestination>,
}

/// Handle to an asynchronous platform task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskHandle {
    pub id: String,
    pub workload: WorkloadName,
    /// Unix timestamp (seconds) of submission.
    pub submitted_at: u64,
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
