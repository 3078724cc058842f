//! Inventory seed files.
//!
//! A seed describes storage and one or more clusters in TOML or JSON and is
//! imported into an [`InventoryStore`] in one pass:
//!
//! ```toml
//! [[pools]]
//! name = "alpha_pod"
//!
//! [[stores]]
//! name = "alpha_ds01"
//! pool = "alpha_pod"
//! capacity_bytes = 1099511627776
//! free_bytes = 549755813888
//!
//! [[clusters]]
//! name = "prod"
//! hosts = ["esx01", "esx02"]
//!
//! [[clusters.groups]]
//! name = "alpha-hosts"
//! kind = "host"
//! members = ["esx01"]
//!
//! [[clusters.workloads]]
//! name = "web01"
//! config_store = "alpha_ds01"
//! disks = [{ key = 2000, store = "alpha_ds01", capacity_bytes = 10737418240 }]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use affix_core::{Cluster, Disk, GroupKind, GroupMembers, GroupRecord, Host, StoragePool, Store, Workload};

use crate::error::{InventoryError, InventoryResult};
use crate::store::InventoryStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InventorySeed {
    pub pools: Vec<StoragePool>,
    pub stores: Vec<Store>,
    pub clusters: Vec<ClusterSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterSeed {
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub workloads: Vec<WorkloadSeed>,
    #[serde(default)]
    pub groups: Vec<GroupSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadSeed {
    pub name: String,
    pub config_store: String,
    #[serde(default)]
    pub disks: Vec<Disk>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupSeed {
    pub name: String,
    pub kind: GroupKind,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Counts of records written by an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub pools: usize,
    pub stores: usize,
    pub clusters: usize,
    pub hosts: usize,
    pub workloads: usize,
    pub groups: usize,
}

impl InventorySeed {
    /// Parse a seed file; `.json` files are JSON, everything else TOML.
    pub fn from_file(path: &Path) -> InventoryResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| InventoryError::Seed(format!("read {}: {e}", path.display())))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> InventoryResult<Self> {
        toml::from_str(content).map_err(|e| InventoryError::Seed(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> InventoryResult<Self> {
        serde_json::from_str(content).map_err(|e| InventoryError::Seed(e.to_string()))
    }

    /// Check cross references before anything is written.
    pub fn validate(&self, existing_pools: &[StoragePool]) -> InventoryResult<()> {
        let pools: HashSet<&str> = self
            .pools
            .iter()
            .chain(existing_pools)
            .map(|p| p.name.as_str())
            .collect();
        for store in &self.stores {
            if let Some(pool) = &store.pool {
                if !pools.contains(pool.as_str()) {
                    return Err(InventoryError::Seed(format!(
                        "store {} references unknown pool {pool}",
                        store.name
                    )));
                }
            }
        }

        for cluster in &self.clusters {
            for w in &cluster.workloads {
                let mut keys = HashSet::new();
                if let Some(dup) = w.disks.iter().find(|d| !keys.insert(d.key)) {
                    return Err(InventoryError::Seed(format!(
                        "workload {}/{} lists disk {} more than once",
                        cluster.name, w.name, dup.key
                    )));
                }
            }

            let hosts: HashSet<&str> = cluster.hosts.iter().map(String::as_str).collect();
            let workloads: HashSet<&str> = cluster.workloads.iter().map(|w| w.name.as_str()).collect();
            for group in &cluster.groups {
                let known = match group.kind {
                    GroupKind::Host => &hosts,
                    GroupKind::Workload => &workloads,
                };
                if let Some(unknown) = group.members.iter().find(|m| !known.contains(m.as_str())) {
                    return Err(InventoryError::Seed(format!(
                        "group {}/{} lists unknown {} {unknown}",
                        cluster.name, group.name, group.kind
                    )));
                }
            }
        }
        Ok(())
    }
}

impl GroupSeed {
    fn to_record(&self, cluster: &str) -> GroupRecord {
        let members = match self.kind {
            GroupKind::Host => GroupMembers::Hosts(self.members.clone()),
            GroupKind::Workload => GroupMembers::Workloads(self.members.clone()),
        };
        GroupRecord {
            name: self.name.clone(),
            cluster: cluster.to_string(),
            members,
        }
    }
}

impl InventoryStore {
    /// Import a seed, overwriting records with the same keys.
    pub fn import(&self, seed: &InventorySeed) -> InventoryResult<ImportSummary> {
        seed.validate(&self.list_pools()?)?;
        let mut summary = ImportSummary::default();

        for pool in &seed.pools {
            self.put_pool(pool)?;
            summary.pools += 1;
        }
        for store in &seed.stores {
            self.put_store(store)?;
            summary.stores += 1;
        }
        for cluster in &seed.clusters {
            self.put_cluster(&Cluster {
                name: cluster.name.clone(),
            })?;
            summary.clusters += 1;

            for host in &cluster.hosts {
                self.put_host(&Host {
                    name: host.clone(),
                    cluster: cluster.name.clone(),
                })?;
                summary.hosts += 1;
            }
            for w in &cluster.workloads {
                self.put_workload(&Workload {
                    name: w.name.clone(),
                    cluster: cluster.name.clone(),
                    config_store: w.config_store.clone(),
                    disks: w.disks.clone(),
                })?;
                summary.workloads += 1;
            }
            for group in &cluster.groups {
                self.put_group(&group.to_record(&cluster.name))?;
                summary.groups += 1;
            }
        }

        info!(
            clusters = summary.clusters,
            workloads = summary.workloads,
            groups = summary.groups,
            stores = summary.stores,
            "inventory seed imported"
        );
        Ok(summary)
    }
}
