//! [`Platform`] implementation over the inventory store.

use affix_core::{
    GroupRecord, Host, Platform, PlatformResult, Proposal, RecommendationRequest,
    RelocationRequest, ResourceKind, StorageLocation, StoragePool, Store, TaskHandle, Workload,
};
use tracing::debug;

use crate::error::InventoryError;
use crate::store::InventoryStore;

impl Platform for InventoryStore {
    fn list_hosts(&self, cluster: &str) -> PlatformResult<Vec<Host>> {
        self.require_cluster(cluster)?;
        Ok(self.list_hosts_in(cluster)?)
    }

    fn list_workloads(&self, cluster: &str) -> PlatformResult<Vec<Workload>> {
        self.require_cluster(cluster)?;
        Ok(self.list_workloads_in(cluster)?)
    }

    fn list_groups(&self, cluster: &str) -> PlatformResult<Vec<GroupRecord>> {
        self.require_cluster(cluster)?;
        Ok(self.list_groups_in(cluster)?)
    }

    fn get_workload(&self, cluster: &str, name: &str) -> PlatformResult<Workload> {
        InventoryStore::get_workload(self, cluster, name)?.ok_or_else(|| {
            InventoryError::not_found(ResourceKind::Workload, format!("{cluster}/{name}")).into()
        })
    }

    fn find_store(&self, name: &str) -> PlatformResult<Store> {
        self.get_store(name)?
            .ok_or_else(|| InventoryError::not_found(ResourceKind::Store, name).into())
    }

    fn find_pool(&self, name: &str) -> PlatformResult<StoragePool> {
        self.get_pool(name)?
            .ok_or_else(|| InventoryError::not_found(ResourceKind::Pool, name).into())
    }

    fn storage_container(&self, store_name: &str) -> PlatformResult<StorageLocation> {
        let store = self.find_store(store_name)?;
        let location = match store.pool {
            Some(pool) => StorageLocation::Pool(pool),
            None => StorageLocation::Store(store.name),
        };
        debug!(store = %store_name, %location, "storage container resolved");
        Ok(location)
    }

    fn recommend(&self, request: &RecommendationRequest) -> PlatformResult<Vec<Proposal>> {
        Ok(self.proposals(request)?)
    }

    fn submit_relocation(&self, request: &RelocationRequest) -> PlatformResult<TaskHandle> {
        Ok(self.record_relocation(request)?)
    }

    fn edit_group(&self, cluster: &str, group: &str, member: &str) -> PlatformResult<()> {
        Ok(self.add_group_member(cluster, group, member)?)
    }
}
