//! Engine facade: one entry point per cluster-level operation.
//!
//! The engine owns an explicit platform handle and naming convention; every
//! component it builds borrows them. Batch operations collect per-workload
//! results so one workload's failure never stops the rest.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use affix_core::{
    DomainConvention, Platform, RelocationRequest, TaskHandle, WorkloadRef,
    config::EngineConfig,
};

use crate::balance::{BalanceReport, compute_balance, ungrouped_hosts};
use crate::detector::{Detection, MismatchDetector, WorkloadDetection};
use crate::error::{EngineError, EngineResult};
use crate::registry::GroupRegistry;
use crate::remediation::{RelocationPlan, RemediationExecutor, RemediationOutcome, RemediationPlanner};
use crate::rogue::{RogueAssigner, RogueResult};
use crate::scan::{scan_cluster, worker_failed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub concurrency: usize,
    pub prevalidate_destinations: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            prevalidate_destinations: config.prevalidate_destinations,
        }
    }
}

/// Balance of a cluster, or why there is none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BalanceOutcome {
    Report(BalanceReport),
    /// No host is in any host group; no target can be computed.
    NoData { cluster: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediateOptions {
    /// Plan and resolve, but submit nothing.
    pub dry_run: bool,
    /// Only this workload instead of the whole cluster.
    pub workload: Option<String>,
}

/// Per-workload remediation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemediationStatus {
    NothingToDo,
    /// Dry run: the request that would have been submitted.
    Previewed { request: RelocationRequest },
    Submitted { task: TaskHandle, request: RelocationRequest },
    Failed { error: EngineError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadRemediation {
    pub workload: String,
    pub assigned_domain: String,
    pub plan: Option<RelocationPlan>,
    pub status: RemediationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemediationReport {
    pub cluster: String,
    pub dry_run: bool,
    /// Workloads evaluated, including compliant and unassigned ones.
    pub scanned: usize,
    /// One entry per mismatched workload, in name order.
    pub workloads: Vec<WorkloadRemediation>,
}

impl RemediationReport {
    pub fn submitted(&self) -> impl Iterator<Item = &TaskHandle> {
        self.workloads.iter().filter_map(|w| match &w.status {
            RemediationStatus::Submitted { task, .. } => Some(task),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &EngineError)> {
        self.workloads.iter().filter_map(|w| match &w.status {
            RemediationStatus::Failed { error } => Some((w.workload.as_str(), error)),
            _ => None,
        })
    }
}

pub struct Engine {
    platform: Arc<dyn Platform>,
    convention: Arc<dyn DomainConvention>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(
        platform: Arc<dyn Platform>,
        convention: Arc<dyn DomainConvention>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            platform,
            convention,
            settings,
        }
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn registry(&self, cluster: &str) -> EngineResult<GroupRegistry> {
        GroupRegistry::load(self.platform.as_ref(), cluster, self.convention.as_ref())
    }

    /// Domain balance of `cluster`. A cluster without grouped hosts yields
    /// [`BalanceOutcome::NoData`] rather than an error.
    pub fn balance(&self, cluster: &str) -> EngineResult<BalanceOutcome> {
        let registry = self.registry(cluster)?;
        match compute_balance(&registry) {
            Ok(mut report) => {
                let hosts = self.platform.list_hosts(cluster)?;
                report.ungrouped_hosts = ungrouped_hosts(registry.groups(), &hosts);
                if !report.ungrouped_hosts.is_empty() {
                    warn!(%cluster, hosts = ?report.ungrouped_hosts, "hosts in no host group");
                }
                Ok(BalanceOutcome::Report(report))
            }
            Err(EngineError::DivisionUndefined(reason)) => Ok(BalanceOutcome::NoData {
                cluster: cluster.to_string(),
                reason,
            }),
            Err(err) => Err(err),
        }
    }

    /// Mismatch detection for every workload of `cluster`.
    pub async fn detect(&self, cluster: &str) -> EngineResult<Vec<Detection>> {
        let registry = Arc::new(self.registry(cluster)?);
        scan_cluster(
            Arc::clone(&self.platform),
            registry,
            Arc::clone(&self.convention),
            self.settings.concurrency,
        )
        .await
    }

    /// Mismatch detection for a single workload.
    pub fn detect_workload(&self, cluster: &str, workload: impl Into<WorkloadRef>) -> EngineResult<Detection> {
        let workload = workload.into().resolve(self.platform.as_ref(), cluster)?;
        let registry = self.registry(cluster)?;
        Ok(MismatchDetector::new(self.platform.as_ref(), &registry, self.convention.as_ref()).detect(&workload))
    }

    /// Plan and submit corrections for every mismatched workload.
    ///
    /// Workloads are handled one after another, so at most one relocation
    /// per workload is submitted by a call.
    pub async fn remediate(&self, cluster: &str, options: &RemediateOptions) -> EngineResult<RemediationReport> {
        let detections = match &options.workload {
            Some(name) => vec![self.detect_workload(cluster, name.as_str())?],
            None => self.detect(cluster).await?,
        };
        let scanned = detections.len();

        let platform = Arc::clone(&self.platform);
        let convention = Arc::clone(&self.convention);
        let prevalidate = self.settings.prevalidate_destinations;
        let dry_run = options.dry_run;
        let target = cluster.to_string();
        let workloads = tokio::task::spawn_blocking(move || {
            detections
                .iter()
                .filter_map(Detection::evaluated)
                .filter(|d| d.has_mismatch())
                .map(|d| {
                    remediate_one(platform.as_ref(), convention.as_ref(), prevalidate, dry_run, &target, d)
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(worker_failed)?;

        let report = RemediationReport {
            cluster: cluster.to_string(),
            dry_run,
            scanned,
            workloads,
        };
        info!(
            %cluster,
            dry_run,
            mismatched = report.workloads.len(),
            submitted = report.submitted().count(),
            failed = report.failures().count(),
            "remediation pass finished"
        );
        Ok(report)
    }

    /// Classify rogue workloads and, with `apply`, add them to their groups.
    pub fn assign_rogues(&self, cluster: &str, apply: bool) -> EngineResult<Vec<RogueResult>> {
        let registry = self.registry(cluster)?;
        RogueAssigner::new(self.platform.as_ref(), &registry, self.convention.as_ref()).assign_all(apply)
    }
}

fn remediate_one(
    platform: &dyn Platform,
    convention: &dyn DomainConvention,
    prevalidate: bool,
    dry_run: bool,
    cluster: &str,
    detection: &WorkloadDetection,
) -> WorkloadRemediation {
    let mut entry = WorkloadRemediation {
        workload: detection.workload.clone(),
        assigned_domain: detection.assigned_domain.clone(),
        plan: None,
        status: RemediationStatus::NothingToDo,
    };
    let fail = |mut entry: WorkloadRemediation, error: EngineError| {
        warn!(workload = %entry.workload, code = error.code(), %error, "remediation aborted");
        entry.status = RemediationStatus::Failed { error };
        entry
    };

    // Plan against the workload as it is now, not as it was scanned.
    let workload = match platform.get_workload(cluster, &detection.workload) {
        Ok(workload) => workload,
        Err(err) => return fail(entry, err.into()),
    };
    let plan = match RemediationPlanner::new(convention).plan(&workload, detection) {
        Ok(plan) => plan,
        Err(err) => return fail(entry, err),
    };

    let executor = RemediationExecutor::new(platform).with_prevalidation(prevalidate);
    let status = if dry_run {
        executor.prepare(&workload, &plan).map(|request| match request {
            Some(request) => RemediationStatus::Previewed { request },
            None => RemediationStatus::NothingToDo,
        })
    } else {
        executor.execute(&workload, &plan).map(|outcome| match outcome {
            RemediationOutcome::NothingToDo => RemediationStatus::NothingToDo,
            RemediationOutcome::Submitted { task, request } => RemediationStatus::Submitted { task, request },
        })
    };
    entry.plan = Some(plan);
    match status {
        Ok(status) => {
            entry.status = status;
            entry
        }
        Err(err) => fail(entry, err),
    }
}

#[cfg(test)]
mod tests {
    use affix_core::DelimiterConvention;
    use affix_inventory::InventoryStore;

    use super::*;
    use crate::testutil::*;

    fn engine(inv: InventoryStore, settings: EngineSettings) -> Engine {
        Engine::new(Arc::new(inv), Arc::new(DelimiterConvention::default()), settings)
    }

    fn inventory() -> InventoryBuilder {
        InventoryBuilder::new()
            .host_group("alpha-hosts", &["esx1", "esx2"])
            .host_group("beta-hosts", &["esx3"])
            .workload_group("alpha-vms", &["web01", "web02", "web03"])
            .workload_group("beta-vms", &["db01"])
            .store("alpha_ds01", None, 80)
            .store("beta_ds01", None, 80)
            .store("beta_ds07", None, 80)
            .workload("web01", "beta_ds01", &["alpha_ds01"])
            .workload("web02", "alpha_ds01", &[])
            .workload("web03", "beta_ds07", &[])
            .workload("db01", "beta_ds01", &["beta_ds01"])
            .workload("stray", "alpha_ds01", &[])
    }

    #[test]
    fn balance_without_hosts_is_no_data() {
        let inv = InventoryBuilder::new()
            .workload_group("alpha-vms", &["web01"])
            .build();
        let outcome = engine(inv, EngineSettings::default()).balance("prod").unwrap();
        assert!(matches!(outcome, BalanceOutcome::NoData { ref cluster, .. } if cluster == "prod"));
    }

    #[test]
    fn balance_of_unknown_cluster_is_lookup_failure() {
        let engine = engine(inventory().build(), EngineSettings::default());
        assert!(matches!(engine.balance("staging"), Err(EngineError::Lookup { .. })));
    }

    #[test]
    fn balance_reports_domains() {
        let engine = engine(inventory().build(), EngineSettings::default());
        let BalanceOutcome::Report(report) = engine.balance("prod").unwrap() else {
            panic!("expected report");
        };
        assert_eq!(report.total_hosts, 3);
        assert_eq!(report.total_workloads, 4);
        assert_eq!(report.domain("alpha").unwrap().workload_count, 3);
        assert!(report.ungrouped_hosts.is_empty());
    }

    #[test]
    fn balance_lists_hosts_outside_host_groups() {
        let inv = inventory().host("esx9").build();
        let outcome = engine(inv, EngineSettings::default()).balance("prod").unwrap();
        let BalanceOutcome::Report(report) = outcome else {
            panic!("expected report");
        };
        assert_eq!(report.total_hosts, 3);
        assert_eq!(report.ungrouped_hosts, vec!["esx9".to_string()]);
    }

    #[test]
    fn detect_workload_accepts_names_and_records() {
        let engine = engine(inventory().build(), EngineSettings::default());
        let by_name = engine.detect_workload("prod", "web01").unwrap();
        let record = engine.platform().get_workload("prod", "web01").unwrap();
        let by_record = engine.detect_workload("prod", record).unwrap();
        assert_eq!(by_name, by_record);
        assert!(by_name.evaluated().unwrap().has_mismatch());
    }

    #[tokio::test]
    async fn remediation_failure_does_not_stop_batch() {
        // web03 wants alpha_ds07, which does not exist.
        let engine = engine(inventory().build(), EngineSettings::default());
        let report = engine.remediate("prod", &RemediateOptions::default()).await.unwrap();

        assert_eq!(report.scanned, 5);
        let names: Vec<&str> = report.workloads.iter().map(|w| w.workload.as_str()).collect();
        assert_eq!(names, vec!["web01", "web03"]);
        assert_eq!(report.submitted().count(), 1);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "web03");
        assert!(matches!(failures[0].1, EngineError::Lookup { .. }));
        assert!(report.workloads[1].plan.is_some());
    }

    #[tokio::test]
    async fn dry_run_previews_without_submitting() {
        let inv = inventory().build();
        let engine = engine(inv, EngineSettings::default());
        let options = RemediateOptions {
            dry_run: true,
            workload: Some("web01".to_string()),
        };
        let report = engine.remediate("prod", &options).await.unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.workloads.len(), 1);
        match &report.workloads[0].status {
            RemediationStatus::Previewed { request } => {
                assert_eq!(request.config_destination, "alpha_ds01");
                assert_eq!(request.disk_destinations[0].store, "alpha_ds01");
            }
            other => panic!("unexpected status: {other:?}"),
        }
        assert!(report.workloads[0].plan.is_some());

        let workload = engine.platform().get_workload("prod", "web01").unwrap();
        assert_eq!(workload.config_store, "beta_ds01");
    }

    #[tokio::test]
    async fn unknown_workload_filter_is_lookup_failure() {
        let engine = engine(inventory().build(), EngineSettings::default());
        let options = RemediateOptions {
            dry_run: false,
            workload: Some("ghost".to_string()),
        };
        assert!(matches!(
            engine.remediate("prod", &options).await,
            Err(EngineError::Lookup { .. })
        ));
    }

    #[test]
    fn assign_rogues_uses_cluster_registry() {
        let engine = engine(inventory().build(), EngineSettings::default());
        let results = engine.assign_rogues("prod", true).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].workload, "stray");

        let registry = engine.registry("prod").unwrap();
        assert_eq!(registry.membership("stray").group().map(|g| g.name.as_str()), Some("alpha-vms"));
    }

    #[test]
    fn settings_follow_engine_config() {
        let config = EngineConfig {
            concurrency: 9,
            prevalidate_destinations: false,
            default_cluster: None,
        };
        assert_eq!(
            EngineSettings::from(&config),
            EngineSettings {
                concurrency: 9,
                prevalidate_destinations: false,
            }
        );
    }
}
