//! Bounded parallel detection over every workload of a cluster.
//!
//! Detection is read-only, so workloads are evaluated independently on
//! blocking workers. A semaphore caps how many platform conversations run
//! at once.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use affix_core::{DomainConvention, Platform, PlatformError};

use crate::detector::{Detection, MismatchDetector};
use crate::error::{EngineError, EngineResult};
use crate::registry::GroupRegistry;

/// Run mismatch detection for every workload in `registry`'s cluster.
///
/// Results come back in workload-name order regardless of completion order.
pub async fn scan_cluster(
    platform: Arc<dyn Platform>,
    registry: Arc<GroupRegistry>,
    convention: Arc<dyn DomainConvention>,
    concurrency: usize,
) -> EngineResult<Vec<Detection>> {
    let cluster = registry.cluster().to_string();
    let workloads = {
        let platform = Arc::clone(&platform);
        tokio::task::spawn_blocking(move || platform.list_workloads(&cluster))
            .await
            .map_err(worker_failed)??
    };

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut set = JoinSet::new();
    for workload in workloads {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(worker_failed)?;
        let platform = Arc::clone(&platform);
        let registry = Arc::clone(&registry);
        let convention = Arc::clone(&convention);
        set.spawn_blocking(move || {
            let _permit = permit;
            MismatchDetector::new(platform.as_ref(), &registry, convention.as_ref()).detect(&workload)
        });
    }

    let mut detections = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(detection) => detections.push(detection),
            Err(err) => {
                warn!(error = %err, "detection worker failed");
                return Err(worker_failed(err));
            }
        }
    }
    detections.sort_by(|a, b| a.workload().cmp(b.workload()));
    debug!(cluster = %registry.cluster(), workloads = detections.len(), "scan finished");
    Ok(detections)
}

pub(crate) fn worker_failed(err: impl std::fmt::Display) -> EngineError {
    EngineError::Platform(PlatformError::Backend(format!("scan worker failed: {err}")))
}
