//! Inventory fixtures shared by the engine's unit tests.

use std::sync::Mutex;

use affix_core::{
    Cluster, Disk, GroupMembers, GroupRecord, Host, Platform, PlatformError, PlatformResult,
    Proposal, RecommendationRequest, RelocationRequest, StorageLocation, StoragePool, Store,
    TaskHandle, Workload,
};
use affix_inventory::InventoryStore;

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Builds a one-cluster in-memory inventory named "prod".
pub struct InventoryBuilder {
    inv: InventoryStore,
}

impl InventoryBuilder {
    pub fn new() -> Self {
        let inv = InventoryStore::open_in_memory().unwrap();
        inv.put_cluster(&Cluster {
            name: "prod".to_string(),
        })
        .unwrap();
        Self { inv }
    }

    /// A host that no group lists.
    pub fn host(self, name: &str) -> Self {
        self.inv
            .put_host(&Host {
                name: name.to_string(),
                cluster: "prod".to_string(),
            })
            .unwrap();
        self
    }

    pub fn host_group(self, name: &str, hosts: &[&str]) -> Self {
        for host in hosts {
            self.inv
                .put_host(&Host {
                    name: host.to_string(),
                    cluster: "prod".to_string(),
                })
                .unwrap();
        }
        self.group(name, GroupMembers::Hosts(strings(hosts)))
    }

    pub fn workload_group(self, name: &str, members: &[&str]) -> Self {
        self.group(name, GroupMembers::Workloads(strings(members)))
    }

    fn group(self, name: &str, members: GroupMembers) -> Self {
        self.inv
            .put_group(&GroupRecord {
                name: name.to_string(),
                cluster: "prod".to_string(),
                members,
            })
            .unwrap();
        self
    }

    /// A store with 100 GiB capacity; creates its pool on first use.
    pub fn store(self, name: &str, pool: Option<&str>, free_gib: u64) -> Self {
        if let Some(pool) = pool {
            self.inv
                .put_pool(&StoragePool {
                    name: pool.to_string(),
                })
                .unwrap();
        }
        self.inv
            .put_store(&Store {
                name: name.to_string(),
                pool: pool.map(str::to_string),
                capacity_bytes: 100 * GIB,
                free_bytes: free_gib * GIB,
            })
            .unwrap();
        self
    }

    pub fn pool(self, name: &str) -> Self {
        self.inv
            .put_pool(&StoragePool {
                name: name.to_string(),
            })
            .unwrap();
        self
    }

    /// A workload whose disks are keyed 2000, 2001, … and hold 10 GiB each.
    pub fn workload(self, name: &str, config: &str, disks: &[&str]) -> Self {
        self.inv.put_workload(&workload(name, config, disks)).unwrap();
        self
    }

    pub fn build(self) -> InventoryStore {
        self.inv
    }
}

pub fn workload(name: &str, config: &str, disks: &[&str]) -> Workload {
    Workload {
        name: name.to_string(),
        cluster: "prod".to_string(),
        config_store: config.to_string(),
        disks: disks
            .iter()
            .enumerate()
            .map(|(i, store)| Disk {
                key: 2000 + i as u32,
                label: format!("Hard disk {}", i + 1),
                store: store.to_string(),
                capacity_bytes: 10 * GIB,
            })
            .collect(),
    }
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Wraps an inventory, overriding recommendations and counting calls.
pub struct ScriptedPlatform {
    pub inner: InventoryStore,
    pub proposals: Option<PlatformResult<Vec<Proposal>>>,
    pub recommend_calls: Mutex<Vec<RecommendationRequest>>,
    pub submissions: Mutex<Vec<RelocationRequest>>,
}

impl ScriptedPlatform {
    pub fn new(inner: InventoryStore) -> Self {
        Self {
            inner,
            proposals: None,
            recommend_calls: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_proposals(mut self, proposals: PlatformResult<Vec<Proposal>>) -> Self {
        self.proposals = Some(proposals);
        self
    }

    pub fn recommend_count(&self) -> usize {
        self.recommend_calls.lock().unwrap().len()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

impl Platform for ScriptedPlatform {
    fn list_hosts(&self, cluster: &str) -> PlatformResult<Vec<Host>> {
        self.inner.list_hosts(cluster)
    }

    fn list_workloads(&self, cluster: &str) -> PlatformResult<Vec<Workload>> {
        self.inner.list_workloads(cluster)
    }

    fn list_groups(&self, cluster: &str) -> PlatformResult<Vec<GroupRecord>> {
        self.inner.list_groups(cluster)
    }

    fn get_workload(&self, cluster: &str, name: &str) -> PlatformResult<Workload> {
        Platform::get_workload(&self.inner, cluster, name)
    }

    fn find_store(&self, name: &str) -> PlatformResult<Store> {
        self.inner.find_store(name)
    }

    fn find_pool(&self, name: &str) -> PlatformResult<StoragePool> {
        self.inner.find_pool(name)
    }

    fn storage_container(&self, store_name: &str) -> PlatformResult<StorageLocation> {
        self.inner.storage_container(store_name)
    }

    fn recommend(&self, request: &RecommendationRequest) -> PlatformResult<Vec<Proposal>> {
        self.recommend_calls.lock().unwrap().push(request.clone());
        match &self.proposals {
            Some(scripted) => scripted.clone(),
            None => self.inner.recommend(request),
        }
    }

    fn submit_relocation(&self, request: &RelocationRequest) -> PlatformResult<TaskHandle> {
        self.submissions.lock().unwrap().push(request.clone());
        self.inner.submit_relocation(request)
    }

    fn edit_group(&self, cluster: &str, group: &str, member: &str) -> PlatformResult<()> {
        self.inner.edit_group(cluster, group, member)
    }
}

/// A platform error used to script rejections.
pub fn rejected(reason: &str) -> PlatformError {
    PlatformError::Rejected(reason.to_string())
}
