//! Remediation: relocation plans for mismatched workloads and their
//! submission as one composite relocation.
//!
//! The planner rewrites the domain prefix of each mismatched item's current
//! container name to the assigned domain (suffix untouched) and leaves the
//! other items unchanged. The executor resolves every rewritten name to a
//! concrete store and submits one relocation per workload, or nothing at all
//! if any item cannot be placed.

use serde::Serialize;
use tracing::{debug, info};

use affix_core::{
    DiskDestination, DomainConvention, OperationType, PlacementItem, Platform, RelocationRequest,
    TaskHandle, Workload,
};

use crate::detector::WorkloadDetection;
use crate::error::{EngineError, EngineResult};
use crate::resolver::PlacementResolver;

/// Where an item should go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "name", rename_all = "snake_case")]
pub enum Destination {
    Unchanged,
    /// Store or pool name, resolved at execution time.
    Named(String),
}

/// One line of a relocation plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub item: PlacementItem,
    /// Store currently holding the item.
    pub source: String,
    pub destination: Destination,
}

impl PlanEntry {
    pub fn unchanged(item: PlacementItem, source: impl Into<String>) -> Self {
        Self {
            item,
            source: source.into(),
            destination: Destination::Unchanged,
        }
    }

    pub fn moved(item: PlacementItem, source: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            item,
            source: source.into(),
            destination: Destination::Named(to.into()),
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self.destination, Destination::Named(_))
    }
}

/// Relocation plan for one workload: configuration plus one entry per disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelocationPlan {
    pub workload: String,
    pub config: PlanEntry,
    pub disks: Vec<PlanEntry>,
}

impl RelocationPlan {
    /// Build a plan, rejecting one whose disk entries do not match the
    /// workload's disks one to one.
    pub fn new(workload: &Workload, config: PlanEntry, disks: Vec<PlanEntry>) -> EngineResult<Self> {
        let plan = Self {
            workload: workload.name.clone(),
            config,
            disks,
        };
        plan.check_shape(workload)?;
        Ok(plan)
    }

    pub fn check_shape(&self, workload: &Workload) -> EngineResult<()> {
        if let Some(disk) = workload.duplicate_disk_key() {
            return Err(EngineError::DuplicateDisk {
                workload: workload.name.clone(),
                disk,
            });
        }
        if self.disks.len() != workload.disks.len() {
            return Err(EngineError::InvalidPlanShape {
                workload: workload.name.clone(),
                expected: workload.disks.len(),
                actual: self.disks.len(),
            });
        }
        Ok(())
    }

    /// Configuration entry followed by disk entries.
    pub fn entries(&self) -> impl Iterator<Item = &PlanEntry> {
        std::iter::once(&self.config).chain(self.disks.iter())
    }

    pub fn changed(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries().filter(|e| e.is_changed())
    }

    pub fn is_noop(&self) -> bool {
        self.changed().next().is_none()
    }
}

pub struct RemediationPlanner<'a> {
    convention: &'a dyn DomainConvention,
}

impl<'a> RemediationPlanner<'a> {
    pub fn new(convention: &'a dyn DomainConvention) -> Self {
        Self { convention }
    }

    /// Plan corrections for the findings of `detection`.
    ///
    /// Destination names are derived by prefix substitution only; whether
    /// they exist is the executor's concern.
    pub fn plan(&self, workload: &Workload, detection: &WorkloadDetection) -> EngineResult<RelocationPlan> {
        // Findings are looked up by disk key; a repeated key would hand one
        // disk its twin's finding.
        if let Some(disk) = workload.duplicate_disk_key() {
            return Err(EngineError::DuplicateDisk {
                workload: workload.name.clone(),
                disk,
            });
        }
        let entry_for = |item: PlacementItem, source: &str| -> EngineResult<PlanEntry> {
            let Some(finding) = detection.finding_for(item) else {
                return Ok(PlanEntry::unchanged(item, source));
            };
            let current = finding.actual_location_name();
            let target = self
                .convention
                .rewrite_storage(current, &finding.actual_domain, &finding.assigned_domain)
                .ok_or_else(|| EngineError::Resolution {
                    workload: workload.name.clone(),
                    item,
                    target: current.to_string(),
                    reason: format!("name does not start with domain {}", finding.actual_domain),
                })?;
            debug!(workload = %workload.name, %item, from = %current, to = %target, "planned move");
            Ok(PlanEntry::moved(item, source, target))
        };

        let config = entry_for(PlacementItem::Config, &workload.config_store)?;
        let disks = workload
            .disks
            .iter()
            .map(|d| entry_for(PlacementItem::Disk(d.key), &d.store))
            .collect::<EngineResult<Vec<_>>>()?;
        RelocationPlan::new(workload, config, disks)
    }
}

/// What execution did for one workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemediationOutcome {
    /// The plan changes nothing; nothing was submitted.
    NothingToDo,
    Submitted {
        task: TaskHandle,
        request: RelocationRequest,
    },
}

pub struct RemediationExecutor<'a> {
    platform: &'a dyn Platform,
    prevalidate: bool,
}

impl<'a> RemediationExecutor<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self {
            platform,
            prevalidate: true,
        }
    }

    /// Require rewritten names to exist as a store or pool before any
    /// recommendation is requested.
    pub fn with_prevalidation(mut self, prevalidate: bool) -> Self {
        self.prevalidate = prevalidate;
        self
    }

    /// Resolve every changed item and build the composite request without
    /// submitting it.
    pub fn prepare(&self, workload: &Workload, plan: &RelocationPlan) -> EngineResult<Option<RelocationRequest>> {
        plan.check_shape(workload)?;
        if plan.is_noop() {
            return Ok(None);
        }

        if self.prevalidate {
            for entry in plan.changed() {
                if let Destination::Named(name) = &entry.destination {
                    self.check_exists(name)?;
                }
            }
        }

        let resolver = PlacementResolver::new(self.platform);
        let resolve = |entry: &PlanEntry| -> EngineResult<String> {
            match &entry.destination {
                Destination::Unchanged => Ok(entry.source.clone()),
                Destination::Named(name) => Ok(resolver
                    .resolve(workload, entry.item, name, OperationType::Relocate)?
                    .store),
            }
        };

        let config_destination = resolve(&plan.config)?;
        let disk_destinations = workload
            .disks
            .iter()
            .zip(&plan.disks)
            .map(|(disk, entry)| {
                Ok(DiskDestination {
                    disk: disk.key,
                    store: resolve(entry)?,
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Some(RelocationRequest {
            cluster: workload.cluster.clone(),
            workload: workload.name.clone(),
            config_destination,
            disk_destinations,
        }))
    }

    /// Resolve and submit `plan` as a single asynchronous relocation.
    ///
    /// Any failure aborts the whole plan before submission.
    pub fn execute(&self, workload: &Workload, plan: &RelocationPlan) -> EngineResult<RemediationOutcome> {
        let Some(request) = self.prepare(workload, plan)? else {
            debug!(workload = %workload.name, "plan changes nothing, not submitting");
            return Ok(RemediationOutcome::NothingToDo);
        };
        let task = self.platform.submit_relocation(&request)?;
        info!(
            workload = %workload.name,
            task = %task.id,
            config = %request.config_destination,
            disks = request.disk_destinations.len(),
            "relocation submitted"
        );
        Ok(RemediationOutcome::Submitted { task, request })
    }

    fn check_exists(&self, name: &str) -> EngineResult<()> {
        match self.platform.find_store(name) {
            Ok(_) => return Ok(()),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err.into()),
        }
        self.platform.find_pool(name)?;
        Ok(())
    }
}
