//! InventoryStore: redb-backed inventory for affix.
//!
//! Provides typed CRUD over clusters, hosts, workloads, affinity groups,
//! stores, pools and relocation tasks. All values are JSON-serialized into
//! redb's `&[u8]` value columns. The store supports both on-disk and
//! in-memory backends (the latter for testing).

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use affix_core::{
    Cluster, GroupMembers, GroupRecord, Host, Proposal, RecommendationRequest, RelocationRequest,
    ResourceKind, StoragePool, Store, TaskHandle, Workload,
};

use crate::error::{InventoryError, InventoryResult};
use crate::tables::*;
use crate::types::{TaskRecord, TaskStatus};

/// Convert any `Display` error into an `InventoryError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| InventoryError::$variant(e.to_string())
    };
}

/// Thread-safe inventory store backed by redb.
#[derive(Clone)]
pub struct InventoryStore {
    db: Arc<Database>,
}

impl InventoryStore {
    /// Open (or create) a persistent inventory at the given path.
    pub fn open(path: &Path) -> InventoryResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "inventory store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory inventory (for testing).
    pub fn open_in_memory() -> InventoryResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory inventory store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> InventoryResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        for table in [CLUSTERS, HOSTS, WORKLOADS, GROUPS, STORES, POOLS, TASKS] {
            txn.open_table(table).map_err(map_err!(Table))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Generic record access ──────────────────────────────────────

    fn put_record<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> InventoryResult<()> {
        let bytes = encode(value)?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut t = txn.open_table(table).map_err(map_err!(Table))?;
            t.insert(key, bytes.as_slice()).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get_record<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> InventoryResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let t = txn.open_table(table).map_err(map_err!(Table))?;
        match t.get(key).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All records whose key starts with `prefix`, in key order.
    fn list_records<T: DeserializeOwned>(&self, table: JsonTable, prefix: &str) -> InventoryResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let t = txn.open_table(table).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in t.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(prefix) {
                results.push(decode(value.value())?);
            }
        }
        Ok(results)
    }

    // ── Clusters ───────────────────────────────────────────────────

    pub fn put_cluster(&self, cluster: &Cluster) -> InventoryResult<()> {
        self.put_record(CLUSTERS, &cluster.name, cluster)?;
        debug!(cluster = %cluster.name, "cluster stored");
        Ok(())
    }

    pub fn get_cluster(&self, name: &str) -> InventoryResult<Option<Cluster>> {
        self.get_record(CLUSTERS, name)
    }

    pub fn list_clusters(&self) -> InventoryResult<Vec<Cluster>> {
        self.list_records(CLUSTERS, "")
    }

    /// Fail with `NotFound` unless `name` is a known cluster.
    pub fn require_cluster(&self, name: &str) -> InventoryResult<()> {
        match self.get_cluster(name)? {
            Some(_) => Ok(()),
            None => Err(InventoryError::not_found(ResourceKind::Cluster, name)),
        }
    }

    // ── Hosts ──────────────────────────────────────────────────────

    pub fn put_host(&self, host: &Host) -> InventoryResult<()> {
        let key = format!("{}/{}", host.cluster, host.name);
        self.put_record(HOSTS, &key, host)
    }

    pub fn list_hosts_in(&self, cluster: &str) -> InventoryResult<Vec<Host>> {
        self.list_records(HOSTS, &format!("{cluster}/"))
    }

    // ── Workloads ──────────────────────────────────────────────────

    pub fn put_workload(&self, workload: &Workload) -> InventoryResult<()> {
        if let Some(dup) = workload.duplicate_disk_key() {
            return Err(InventoryError::Rejected(format!(
                "workload {} lists disk {dup} more than once",
                workload.name
            )));
        }
        let key = workload.table_key();
        self.put_record(WORKLOADS, &key, workload)?;
        debug!(%key, "workload stored");
        Ok(())
    }

    pub fn get_workload(&self, cluster: &str, name: &str) -> InventoryResult<Option<Workload>> {
        self.get_record(WORKLOADS, &format!("{cluster}/{name}"))
    }

    pub fn list_workloads_in(&self, cluster: &str) -> InventoryResult<Vec<Workload>> {
        self.list_records(WORKLOADS, &format!("{cluster}/"))
    }

    // ── Groups ─────────────────────────────────────────────────────

    pub fn put_group(&self, group: &GroupRecord) -> InventoryResult<()> {
        let key = group.table_key();
        self.put_record(GROUPS, &key, group)?;
        debug!(%key, kind = %group.members.kind(), "group stored");
        Ok(())
    }

    pub fn get_group(&self, cluster: &str, name: &str) -> InventoryResult<Option<GroupRecord>> {
        self.get_record(GROUPS, &format!("{cluster}/{name}"))
    }

    pub fn list_groups_in(&self, cluster: &str) -> InventoryResult<Vec<GroupRecord>> {
        self.list_records(GROUPS, &format!("{cluster}/"))
    }

    /// Add a workload to a workload group in one write transaction.
    pub fn add_group_member(&self, cluster: &str, group: &str, member: &str) -> InventoryResult<()> {
        let group_key = format!("{cluster}/{group}");
        let workload_key = format!("{cluster}/{member}");
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let workloads = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
            if workloads.get(workload_key.as_str()).map_err(map_err!(Read))?.is_none() {
                return Err(InventoryError::not_found(ResourceKind::Workload, workload_key));
            }

            let mut groups = txn.open_table(GROUPS).map_err(map_err!(Table))?;
            let mut record: GroupRecord = match groups.get(group_key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => decode(guard.value())?,
                None => return Err(InventoryError::not_found(ResourceKind::Group, group_key)),
            };
            match &mut record.members {
                GroupMembers::Hosts(_) => {
                    return Err(InventoryError::Rejected(format!(
                        "group {group_key} holds hosts, not workloads"
                    )));
                }
                GroupMembers::Workloads(names) => {
                    if names.iter().any(|n| n == member) {
                        return Err(InventoryError::Rejected(format!(
                            "{member} is already a member of {group_key}"
                        )));
                    }
                    names.push(member.to_string());
                }
            }
            let bytes = encode(&record)?;
            groups
                .insert(group_key.as_str(), bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        info!(%cluster, %group, %member, "group member added");
        Ok(())
    }

    // ── Storage ────────────────────────────────────────────────────

    pub fn put_store(&self, store: &Store) -> InventoryResult<()> {
        self.put_record(STORES, &store.name, store)
    }

    pub fn get_store(&self, name: &str) -> InventoryResult<Option<Store>> {
        self.get_record(STORES, name)
    }

    pub fn list_stores(&self) -> InventoryResult<Vec<Store>> {
        self.list_records(STORES, "")
    }

    pub fn put_pool(&self, pool: &StoragePool) -> InventoryResult<()> {
        self.put_record(POOLS, &pool.name, pool)
    }

    pub fn get_pool(&self, name: &str) -> InventoryResult<Option<StoragePool>> {
        self.get_record(POOLS, name)
    }

    pub fn list_pools(&self) -> InventoryResult<Vec<StoragePool>> {
        self.list_records(POOLS, "")
    }

    /// Member stores of `pool`, in name order.
    pub fn pool_stores(&self, pool: &str) -> InventoryResult<Vec<Store>> {
        Ok(self
            .list_stores()?
            .into_iter()
            .filter(|s| s.pool.as_deref() == Some(pool))
            .collect())
    }

    /// Rank a pool's member stores for a workload: one proposal per store
    /// that can hold the workload's disks, most free space first.
    pub fn proposals(&self, request: &RecommendationRequest) -> InventoryResult<Vec<Proposal>> {
        if self.get_pool(&request.pool)?.is_none() {
            return Err(InventoryError::not_found(ResourceKind::Pool, &request.pool));
        }
        let workload = self
            .get_workload(&request.cluster, &request.workload)?
            .ok_or_else(|| {
                InventoryError::not_found(
                    ResourceKind::Workload,
                    format!("{}/{}", request.cluster, request.workload),
                )
            })?;
        let needed = workload.storage_bytes();

        let mut candidates: Vec<Store> = self
            .pool_stores(&request.pool)?
            .into_iter()
            .filter(|s| s.free_bytes >= needed)
            .collect();
        candidates.sort_by(|a, b| b.free_bytes.cmp(&a.free_bytes).then_with(|| a.name.cmp(&b.name)));

        debug!(
            pool = %request.pool,
            workload = %request.workload,
            operation = %request.operation,
            candidates = candidates.len(),
            "placement proposals computed"
        );

        Ok(candidates
            .into_iter()
            .map(|s| Proposal {
                reason: format!("{} bytes free on {}", s.free_bytes, s.name),
                destinations: vec![s.name],
            })
            .collect())
    }

    // ── Tasks ──────────────────────────────────────────────────────

    /// Validate a relocation and queue it as a task.
    pub fn record_relocation(&self, request: &RelocationRequest) -> InventoryResult<TaskHandle> {
        let workload = self
            .get_workload(&request.cluster, &request.workload)?
            .ok_or_else(|| {
                InventoryError::not_found(
                    ResourceKind::Workload,
                    format!("{}/{}", request.cluster, request.workload),
                )
            })?;

        check_disk_destinations(&workload, request)?;
        let destinations = std::iter::once(&request.config_destination)
            .chain(request.disk_destinations.iter().map(|d| &d.store));
        for name in destinations {
            if self.get_store(name)?.is_none() {
                return Err(InventoryError::not_found(ResourceKind::Store, name));
            }
        }

        let now = epoch_secs();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let handle;
        {
            let mut tasks = txn.open_table(TASKS).map_err(map_err!(Table))?;
            let count = tasks.iter().map_err(map_err!(Read))?.count();
            handle = TaskHandle {
                id: format!("task-{}", count + 1),
                workload: request.workload.clone(),
                submitted_at: now,
            };
            let record = TaskRecord {
                handle: handle.clone(),
                request: request.clone(),
                status: TaskStatus::Queued,
                updated_at: now,
            };
            let bytes = encode(&record)?;
            tasks
                .insert(handle.id.as_str(), bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        info!(task = %handle.id, workload = %request.workload, "relocation queued");
        Ok(handle)
    }

    pub fn get_task(&self, id: &str) -> InventoryResult<Option<TaskRecord>> {
        self.get_record(TASKS, id)
    }

    pub fn list_tasks(&self) -> InventoryResult<Vec<TaskRecord>> {
        let mut tasks: Vec<TaskRecord> = self.list_records(TASKS, "")?;
        tasks.sort_by_key(|t| task_number(&t.handle.id));
        Ok(tasks)
    }

    /// Apply a queued relocation: move the workload's files and account
    /// the freed and consumed space on the affected stores.
    pub fn complete_task(&self, id: &str) -> InventoryResult<TaskRecord> {
        let now = epoch_secs();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let record = {
            let mut tasks = txn.open_table(TASKS).map_err(map_err!(Table))?;
            let mut workloads = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
            let mut stores = txn.open_table(STORES).map_err(map_err!(Table))?;

            let mut record: TaskRecord = match tasks.get(id).map_err(map_err!(Read))? {
                Some(guard) => decode(guard.value())?,
                None => return Err(InventoryError::not_found(ResourceKind::Task, id)),
            };
            if record.status != TaskStatus::Queued {
                return Err(InventoryError::Rejected(format!("task {id} is not queued")));
            }

            let request = &record.request;
            let workload_key = format!("{}/{}", request.cluster, request.workload);
            let mut workload: Workload = match workloads.get(workload_key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => decode(guard.value())?,
                None => return Err(InventoryError::not_found(ResourceKind::Workload, workload_key)),
            };

            // The workload may have changed since the task was queued.
            check_disk_destinations(&workload, request)?;

            workload.config_store = request.config_destination.clone();
            for dest in &request.disk_destinations {
                let Some(disk) = workload.disks.iter_mut().find(|d| d.key == dest.disk) else {
                    return Err(InventoryError::Rejected(format!(
                        "workload {} has no disk {}",
                        workload.name, dest.disk
                    )));
                };
                if disk.store != dest.store {
                    adjust_free(&mut stores, &disk.store, disk.capacity_bytes, 0)?;
                    adjust_free(&mut stores, &dest.store, 0, disk.capacity_bytes)?;
                    disk.store = dest.store.clone();
                }
            }

            let bytes = encode(&workload)?;
            workloads
                .insert(workload_key.as_str(), bytes.as_slice())
                .map_err(map_err!(Write))?;

            record.status = TaskStatus::Completed;
            record.updated_at = now;
            let bytes = encode(&record)?;
            tasks.insert(id, bytes.as_slice()).map_err(map_err!(Write))?;
            record
        };
        txn.commit().map_err(map_err!(Transaction))?;
        info!(task = %id, workload = %record.handle.workload, "relocation applied");
        Ok(record)
    }
}

/// Every disk of `workload` must be addressed exactly once.
fn check_disk_destinations(workload: &Workload, request: &RelocationRequest) -> InventoryResult<()> {
    if let Some(dup) = workload.duplicate_disk_key() {
        return Err(InventoryError::Rejected(format!(
            "workload {} lists disk {dup} more than once",
            workload.name
        )));
    }
    if request.disk_destinations.len() != workload.disks.len() {
        return Err(InventoryError::Rejected(format!(
            "relocation of {} lists {} disk destinations but the workload has {} disks",
            workload.name,
            request.disk_destinations.len(),
            workload.disks.len()
        )));
    }
    let mut seen = HashSet::new();
    for dest in &request.disk_destinations {
        if workload.disk(dest.disk).is_none() {
            return Err(InventoryError::Rejected(format!(
                "workload {} has no disk {}",
                workload.name, dest.disk
            )));
        }
        if !seen.insert(dest.disk) {
            return Err(InventoryError::Rejected(format!(
                "relocation of {} lists disk {} more than once",
                workload.name, dest.disk
            )));
        }
    }
    Ok(())
}

/// Release and consume space on a store inside an open write transaction.
fn adjust_free(
    stores: &mut redb::Table<'_, &'static str, &'static [u8]>,
    name: &str,
    release: u64,
    consume: u64,
) -> InventoryResult<()> {
    let mut store: Store = match stores.get(name).map_err(map_err!(Read))? {
        Some(guard) => decode(guard.value())?,
        None => {
            debug!(store = %name, "store missing from inventory, space not accounted");
            return Ok(());
        }
    };
    store.free_bytes = store.free_bytes.saturating_add(release).saturating_sub(consume);
    let bytes = encode(&store)?;
    stores.insert(name, bytes.as_slice()).map_err(map_err!(Write))?;
    Ok(())
}

fn encode<T: Serialize>(value: &T) -> InventoryResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(map_err!(Serialize))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> InventoryResult<T> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}

fn task_number(id: &str) -> u64 {
    id.strip_prefix("task-")
        .and_then(|n| n.parse().ok())
        .unwrap_or(u64::MAX)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
