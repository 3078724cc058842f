//! Mismatch detection: storage living outside its workload's domain.
//!
//! For a workload with a workload-group assignment, each storage item
//! (configuration first, then disks in order) is traced to its container
//! (the pool holding the store, or the store itself) and the container's
//! domain is compared with the assigned one. Only containers whose domain
//! is a known workload-group domain are ever flagged; shared or
//! unaffiliated storage is left alone.

use serde::Serialize;
use tracing::{debug, warn};

use affix_core::{DomainConvention, PlacementItem, Platform, StorageLocation, Workload};

use crate::error::{EngineError, EngineResult};
use crate::registry::{GroupRegistry, Membership};

/// One storage item sitting in another known domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub item: PlacementItem,
    /// Concrete store currently holding the item.
    pub store: String,
    /// Container the domain was derived from.
    pub location: StorageLocation,
    pub actual_domain: String,
    pub assigned_domain: String,
}

impl Finding {
    pub fn actual_location_name(&self) -> &str {
        self.location.name()
    }
}

/// A storage item whose container could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedItem {
    pub item: PlacementItem,
    pub store: String,
    pub error: EngineError,
}

/// Detection result for an assigned workload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadDetection {
    pub workload: String,
    pub group: String,
    pub assigned_domain: String,
    pub findings: Vec<Finding>,
    pub unresolved: Vec<UnresolvedItem>,
}

impl WorkloadDetection {
    pub fn has_mismatch(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn finding_for(&self, item: PlacementItem) -> Option<&Finding> {
        self.findings.iter().find(|f| f.item == item)
    }
}

/// Outcome of evaluating one workload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Detection {
    /// In no workload group; rogue assignment handles it.
    Unassigned { workload: String },
    Evaluated(WorkloadDetection),
}

impl Detection {
    pub fn workload(&self) -> &str {
        match self {
            Detection::Unassigned { workload } => workload,
            Detection::Evaluated(d) => &d.workload,
        }
    }

    pub fn evaluated(&self) -> Option<&WorkloadDetection> {
        match self {
            Detection::Unassigned { .. } => None,
            Detection::Evaluated(d) => Some(d),
        }
    }
}

/// Trace `store` to its container and derive the container's domain.
pub(crate) fn locate_store(
    platform: &dyn Platform,
    convention: &dyn DomainConvention,
    store: &str,
) -> EngineResult<(StorageLocation, String)> {
    let location = platform.storage_container(store)?;
    let domain = convention.storage_domain(location.name()).to_string();
    Ok((location, domain))
}

pub struct MismatchDetector<'a> {
    platform: &'a dyn Platform,
    registry: &'a GroupRegistry,
    convention: &'a dyn DomainConvention,
}

impl<'a> MismatchDetector<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        registry: &'a GroupRegistry,
        convention: &'a dyn DomainConvention,
    ) -> Self {
        Self {
            platform,
            registry,
            convention,
        }
    }

    /// Evaluate one workload. Per-item lookup failures are collected, not fatal.
    pub fn detect(&self, workload: &Workload) -> Detection {
        let group = match self.registry.membership(&workload.name) {
            Membership::None => {
                debug!(workload = %workload.name, "no workload group, skipping detection");
                return Detection::Unassigned {
                    workload: workload.name.clone(),
                };
            }
            Membership::Assigned(group) => group,
        };
        let assigned = group.domain.as_str();

        let mut findings = Vec::new();
        let mut unresolved = Vec::new();
        for (item, store) in workload.locations() {
            let (location, domain) = match locate_store(self.platform, self.convention, store) {
                Ok(found) => found,
                Err(error) => {
                    warn!(workload = %workload.name, %item, %store, %error, "cannot resolve storage");
                    unresolved.push(UnresolvedItem {
                        item,
                        store: store.to_string(),
                        error,
                    });
                    continue;
                }
            };

            if domain == assigned {
                continue;
            }
            if !self.registry.is_known_domain(&domain) {
                debug!(
                    workload = %workload.name,
                    %item,
                    %location,
                    %domain,
                    "storage outside known domains, not flagged"
                );
                continue;
            }

            debug!(
                workload = %workload.name,
                %item,
                %location,
                actual = %domain,
                %assigned,
                "domain mismatch"
            );
            findings.push(Finding {
                item,
                store: store.to_string(),
                location,
                actual_domain: domain,
                assigned_domain: assigned.to_string(),
            });
        }

        Detection::Evaluated(WorkloadDetection {
            workload: workload.name.clone(),
            group: group.name.clone(),
            assigned_domain: assigned.to_string(),
            findings,
            unresolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use affix_core::{DelimiterConvention, ResourceKind};
    use affix_inventory::InventoryStore;

    use super::*;
    use crate::testutil::*;

    fn inventory() -> InventoryStore {
        InventoryBuilder::new()
            .host_group("alpha-hosts", &["esx1"])
            .workload_group("alpha-vms", &["web01", "web02", "web03"])
            .workload_group("beta-vms", &["db01"])
            .store("alpha_ds01", None, 50)
            .store("alpha_ds02", Some("alpha_pod"), 50)
            .store("beta_ds01", None, 50)
            .store("beta_ds02", Some("beta_pod"), 50)
            .store("gamma_ds01", None, 50)
            .store("shared_nfs", None, 50)
            .workload("web01", "beta_ds01", &["alpha_ds01"])
            .workload("web02", "alpha_ds01", &["shared_nfs", "gamma_ds01", "beta_ds02"])
            .workload("web03", "alpha_ds02", &["alpha_ds01"])
            .workload("rogue01", "alpha_ds01", &[])
            .build()
    }

    fn detect(inv: &InventoryStore, name: &str) -> Detection {
        let convention = DelimiterConvention::default();
        let registry = GroupRegistry::load(inv, "prod", &convention).unwrap();
        let workload = Platform::get_workload(inv, "prod", name).unwrap();
        MismatchDetector::new(inv, &registry, &convention).detect(&workload)
    }

    #[test]
    fn config_on_foreign_store_is_flagged() {
        let inv = inventory();
        let detection = detect(&inv, "web01");
        let evaluated = detection.evaluated().unwrap();
        assert_eq!(evaluated.assigned_domain, "alpha");
        assert_eq!(
            evaluated.findings,
            vec![Finding {
                item: PlacementItem::Config,
                store: "beta_ds01".to_string(),
                location: StorageLocation::Store("beta_ds01".to_string()),
                actual_domain: "beta".to_string(),
                assigned_domain: "alpha".to_string(),
            }]
        );
        assert_eq!(evaluated.findings[0].actual_location_name(), "beta_ds01");
    }

    #[test]
    fn unknown_domains_are_never_flagged() {
        let inv = inventory();
        let detection = detect(&inv, "web02");
        let evaluated = detection.evaluated().unwrap();
        // shared_nfs and gamma_ds01 are outside the known domains; only the
        // beta pool member is flagged, by its pool name.
        assert_eq!(evaluated.findings.len(), 1);
        let finding = &evaluated.findings[0];
        assert_eq!(finding.item, PlacementItem::Disk(2002));
        assert_eq!(finding.location, StorageLocation::Pool("beta_pod".to_string()));
        assert_eq!(finding.store, "beta_ds02");
    }

    #[test]
    fn matching_storage_yields_no_findings() {
        let inv = inventory();
        let detection = detect(&inv, "web03");
        assert!(!detection.evaluated().unwrap().has_mismatch());
    }

    #[test]
    fn unassigned_workload_is_handed_off() {
        let inv = inventory();
        assert_eq!(
            detect(&inv, "rogue01"),
            Detection::Unassigned {
                workload: "rogue01".to_string()
            }
        );
    }

    #[test]
    fn missing_store_is_recorded_and_rest_evaluated() {
        let inv = inventory();
        inv.put_workload(&workload("web01", "beta_ds01", &["vanished_ds"])).unwrap();
        let detection = detect(&inv, "web01");
        let evaluated = detection.evaluated().unwrap();
        assert_eq!(evaluated.findings.len(), 1);
        assert_eq!(evaluated.unresolved.len(), 1);
        assert_eq!(evaluated.unresolved[0].item, PlacementItem::Disk(2000));
        assert_eq!(
            evaluated.unresolved[0].error,
            EngineError::lookup(ResourceKind::Store, "vanished_ds")
        );
    }
}
