//! Group registry: affinity groups of one cluster, classified.
//!
//! Each platform group record becomes an [`AffinityGroup`] with its kind
//! (taken from the member type the platform reports) and its domain
//! (derived from the group name by the naming convention).

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use affix_core::{DomainConvention, GroupKind, GroupRecord, Platform};

use crate::error::EngineResult;

/// An affinity group with its kind and domain resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffinityGroup {
    pub name: String,
    pub kind: GroupKind,
    pub domain: String,
    pub members: BTreeSet<String>,
}

/// Workload-group membership of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership<'a> {
    /// In no workload group: a rogue workload.
    None,
    Assigned(&'a AffinityGroup),
}

impl<'a> Membership<'a> {
    pub fn group(&self) -> Option<&'a AffinityGroup> {
        match self {
            Membership::None => None,
            Membership::Assigned(group) => Some(group),
        }
    }
}

/// Snapshot of a cluster's affinity groups.
#[derive(Debug, Clone)]
pub struct GroupRegistry {
    cluster: String,
    /// Sorted by group name.
    groups: Vec<AffinityGroup>,
    /// Workload name → indices into `groups` of its workload groups.
    memberships: HashMap<String, Vec<usize>>,
    known_domains: BTreeSet<String>,
}

impl GroupRegistry {
    /// Fetch and classify the groups of `cluster`.
    pub fn load(
        platform: &dyn Platform,
        cluster: &str,
        convention: &dyn DomainConvention,
    ) -> EngineResult<Self> {
        let records = platform.list_groups(cluster)?;
        let registry = Self::from_records(cluster, records, convention);
        debug!(
            %cluster,
            groups = registry.groups.len(),
            domains = registry.known_domains.len(),
            "group registry loaded"
        );
        Ok(registry)
    }

    /// Classify already-fetched group records.
    pub fn from_records(
        cluster: &str,
        records: impl IntoIterator<Item = GroupRecord>,
        convention: &dyn DomainConvention,
    ) -> Self {
        let mut groups: Vec<AffinityGroup> = records
            .into_iter()
            .map(|record| AffinityGroup {
                kind: record.members.kind(),
                domain: convention.group_domain(&record.name).to_string(),
                members: record.members.names().iter().cloned().collect(),
                name: record.name,
            })
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));

        let mut memberships: HashMap<String, Vec<usize>> = HashMap::new();
        let mut known_domains = BTreeSet::new();
        for (idx, group) in groups.iter().enumerate() {
            if group.kind != GroupKind::Workload {
                continue;
            }
            if !group.domain.is_empty() {
                known_domains.insert(group.domain.clone());
            }
            for member in &group.members {
                memberships.entry(member.clone()).or_default().push(idx);
            }
        }

        Self {
            cluster: cluster.to_string(),
            groups,
            memberships,
            known_domains,
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn groups(&self) -> &[AffinityGroup] {
        &self.groups
    }

    pub fn host_groups(&self) -> impl Iterator<Item = &AffinityGroup> {
        self.groups.iter().filter(|g| g.kind == GroupKind::Host)
    }

    pub fn workload_groups(&self) -> impl Iterator<Item = &AffinityGroup> {
        self.groups.iter().filter(|g| g.kind == GroupKind::Workload)
    }

    /// Domains that appear on at least one workload group.
    pub fn known_domains(&self) -> &BTreeSet<String> {
        &self.known_domains
    }

    pub fn is_known_domain(&self, domain: &str) -> bool {
        self.known_domains.contains(domain)
    }

    /// The workload group `workload` belongs to.
    ///
    /// Several memberships violate the inventory's own rules; the first
    /// group by name is used and the rest are logged.
    pub fn membership(&self, workload: &str) -> Membership<'_> {
        let Some(indices) = self.memberships.get(workload) else {
            return Membership::None;
        };
        let Some(&first) = indices.first() else {
            return Membership::None;
        };
        if indices.len() > 1 {
            let extra: Vec<&str> = indices[1..]
                .iter()
                .map(|&i| self.groups[i].name.as_str())
                .collect();
            warn!(
                cluster = %self.cluster,
                %workload,
                using = %self.groups[first].name,
                ignored = ?extra,
                "workload is in several workload groups"
            );
        }
        Membership::Assigned(&self.groups[first])
    }

    /// The workload group that collects workloads of `domain`.
    pub fn workload_group_for_domain(&self, domain: &str) -> Option<&AffinityGroup> {
        self.workload_groups().find(|g| g.domain == domain)
    }
}
