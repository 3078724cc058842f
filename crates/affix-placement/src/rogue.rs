//! Rogue assignment: default workload-group membership for workloads that
//! have none.
//!
//! The domain is inferred from at most two storage locations: the
//! configuration store, then the first disk. The first one whose domain is a
//! known workload-group domain decides. Existing memberships are never
//! touched and unclassifiable workloads are only reported.

use serde::Serialize;
use tracing::{debug, info, warn};

use affix_core::{DomainConvention, PlacementItem, Platform, Workload};

use crate::detector::locate_store;
use crate::error::{EngineError, EngineResult};
use crate::registry::{GroupRegistry, Membership};

/// Domain inferred for a rogue workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RogueOutcome {
    Classified {
        domain: String,
        group: String,
        /// Storage item the domain was inferred from.
        source: PlacementItem,
    },
    Unclassifiable,
}

/// What was done about a rogue workload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RogueAction {
    /// Group edit submitted.
    Added,
    /// Classified, but not applied.
    Pending,
    Skipped { error: EngineError },
    Failed { error: EngineError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RogueResult {
    pub workload: String,
    pub outcome: RogueOutcome,
    pub action: RogueAction,
}

pub struct RogueAssigner<'a> {
    platform: &'a dyn Platform,
    registry: &'a GroupRegistry,
    convention: &'a dyn DomainConvention,
}

impl<'a> RogueAssigner<'a> {
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

    /// Infer the workload group `workload` should join.
    pub fn classify(&self, workload: &Workload) -> RogueOutcome {
        let candidates = workload.locations().take(2);
        for (item, store) in candidates {
            let domain = match locate_store(self.platform, self.convention, store) {
                Ok((_, domain)) => domain,
                Err(error) => {
                    warn!(workload = %workload.name, %item, %store, %error, "cannot resolve storage");
                    continue;
                }
            };
            if !self.registry.is_known_domain(&domain) {
                debug!(workload = %workload.name, %item, %store, %domain, "not a known domain");
                continue;
            }
            if let Some(group) = self.registry.workload_group_for_domain(&domain) {
                return RogueOutcome::Classified {
                    group: group.name.clone(),
                    domain,
                    source: item,
                };
            }
        }
        RogueOutcome::Unclassifiable
    }

    /// Classify one workload and, with `apply`, add it to its group.
    pub fn assign(&self, workload: &Workload, apply: bool) -> RogueResult {
        let result = |outcome, action| RogueResult {
            workload: workload.name.clone(),
            outcome,
            action,
        };

        let outcome = self.classify(workload);
        let (domain, group) = match &outcome {
            RogueOutcome::Unclassifiable => {
                warn!(workload = %workload.name, "rogue workload is unclassifiable");
                let error = EngineError::Unclassifiable {
                    workload: workload.name.clone(),
                };
                return result(outcome, RogueAction::Skipped { error });
            }
            RogueOutcome::Classified { domain, group, .. } => (domain.clone(), group.clone()),
        };

        if !apply {
            debug!(workload = %workload.name, %domain, %group, "classified, not applying");
            return result(outcome, RogueAction::Pending);
        }

        match self.platform.edit_group(self.registry.cluster(), &group, &workload.name) {
            Ok(()) => {
                info!(workload = %workload.name, %domain, %group, "rogue workload added to group");
                result(outcome, RogueAction::Added)
            }
            Err(err) => {
                let error = EngineError::from(err);
                warn!(workload = %workload.name, %group, %error, "group edit failed");
                result(outcome, RogueAction::Failed { error })
            }
        }
    }

    /// Handle every rogue workload of the registry's cluster, one at a time.
    ///
    /// Workloads with a membership are skipped. A failed edit is recorded
    /// and the rest are still processed.
    pub fn assign_all(&self, apply: bool) -> EngineResult<Vec<RogueResult>> {
        let mut workloads = self.platform.list_workloads(self.registry.cluster())?;
        workloads.sort_by(|a, b| a.name.cmp(&b.name));

        let results: Vec<RogueResult> = workloads
            .iter()
            .filter(|w| matches!(self.registry.membership(&w.name), Membership::None))
            .map(|w| self.assign(w, apply))
            .collect();
        debug!(cluster = %self.registry.cluster(), rogues = results.len(), "rogue pass finished");
        Ok(results)
    }
}
