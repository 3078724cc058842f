//! Placement resolver: turns a destination name into a concrete store.
//!
//! A name that matches a store is used as is. Any other name is taken to be
//! a storage pool and the platform is asked for a placement recommendation;
//! the first destination of the first proposal wins.

use serde::Serialize;
use tracing::debug;

use affix_core::{OperationType, PlacementItem, Platform, RecommendationRequest, Workload};

use crate::error::{EngineError, EngineResult};

/// A concrete store chosen for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDestination {
    pub store: String,
    /// Pool the store was recommended from, if the target named a pool.
    pub pool: Option<String>,
}

pub struct PlacementResolver<'a> {
    platform: &'a dyn Platform,
}

impl<'a> PlacementResolver<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }

    /// Resolve `target` for `item` of `workload`.
    pub fn resolve(
        &self,
        workload: &Workload,
        item: PlacementItem,
        target: &str,
        operation: OperationType,
    ) -> EngineResult<ResolvedDestination> {
        match self.platform.find_store(target) {
            Ok(store) => {
                debug!(workload = %workload.name, %item, store = %store.name, "target is a store");
                return Ok(ResolvedDestination {
                    store: store.name,
                    pool: None,
                });
            }
            Err(err) if err.is_not_found() => {
                debug!(workload = %workload.name, %item, %target, "no such store, trying as pool");
            }
            Err(err) => return Err(err.into()),
        }

        let failure = |reason: String| EngineError::Resolution {
            workload: workload.name.clone(),
            item,
            target: target.to_string(),
            reason,
        };

        let request = RecommendationRequest {
            cluster: workload.cluster.clone(),
            workload: workload.name.clone(),
            pool: target.to_string(),
            operation,
        };
        let proposals = self
            .platform
            .recommend(&request)
            .map_err(|e| failure(format!("recommendation failed: {e}")))?;

        let Some(first) = proposals.into_iter().next() else {
            return Err(failure("no placement proposals".to_string()));
        };
        let Some(store) = first.destinations.into_iter().next() else {
            return Err(failure("first proposal lists no destination".to_string()));
        };

        debug!(
            workload = %workload.name,
            %item,
            pool = %target,
            %store,
            reason = %first.reason,
            "pool recommendation accepted"
        );
        Ok(ResolvedDestination {
            store,
            pool: Some(target.to_string()),
        })
    }
}
