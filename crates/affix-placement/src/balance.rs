//! Domain balance: how far each domain's workload count is from its
//! proportional share.
//!
//! Every workload weighs the same. The cluster-wide per-host target is
//! `total_workloads / total_hosts`; a domain's target is that times its
//! host count, rounded half-to-even. The report describes, it never moves
//! anything.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use affix_core::{GroupKind, Host};

use crate::error::{EngineError, EngineResult};
use crate::registry::{AffinityGroup, GroupRegistry};

/// Deviation of a domain's workload count from its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "percent", rename_all = "snake_case")]
pub enum Deviation {
    Percent(f64),
    /// Target is zero, so no ratio exists.
    NotApplicable,
}

impl Deviation {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Deviation::Percent(p) => Some(*p),
            Deviation::NotApplicable => None,
        }
    }
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deviation::Percent(p) => write!(f, "{p:+.1}%"),
            Deviation::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// Balance figures for one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainBalance {
    pub domain: String,
    pub host_count: usize,
    pub workload_count: usize,
    pub target: u64,
    pub deviation: Deviation,
}

/// Balance of a whole cluster, domains in name order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceReport {
    pub cluster: String,
    pub total_hosts: usize,
    pub total_workloads: usize,
    pub per_host_target: f64,
    pub domains: Vec<DomainBalance>,
    /// Hosts of the cluster that no host group lists. They carry no weight
    /// in the figures above.
    pub ungrouped_hosts: Vec<String>,
}

impl BalanceReport {
    pub fn domain(&self, name: &str) -> Option<&DomainBalance> {
        self.domains.iter().find(|d| d.domain == name)
    }

    /// Largest absolute deviation among domains that have one.
    pub fn max_abs_deviation(&self) -> Option<f64> {
        self.domains
            .iter()
            .filter_map(|d| d.deviation.percent())
            .map(f64::abs)
            .reduce(f64::max)
    }
}

/// Compute the balance report for a registry snapshot.
pub fn compute_balance(registry: &GroupRegistry) -> EngineResult<BalanceReport> {
    compute_balance_from_groups(registry.cluster(), registry.groups())
}

/// Compute the balance report over an arbitrary set of classified groups.
///
/// Members are counted once per domain even if several groups of the same
/// domain list them.
pub fn compute_balance_from_groups<'a>(
    cluster: &str,
    groups: impl IntoIterator<Item = &'a AffinityGroup>,
) -> EngineResult<BalanceReport> {
    #[derive(Default)]
    struct Tally<'g> {
        hosts: BTreeSet<&'g str>,
        workloads: BTreeSet<&'g str>,
    }

    let mut tallies: BTreeMap<&str, Tally<'_>> = BTreeMap::new();
    for group in groups {
        let tally = tallies.entry(group.domain.as_str()).or_default();
        let bucket = match group.kind {
            GroupKind::Host => &mut tally.hosts,
            GroupKind::Workload => &mut tally.workloads,
        };
        bucket.extend(group.members.iter().map(String::as_str));
    }

    let total_hosts: usize = tallies.values().map(|t| t.hosts.len()).sum();
    let total_workloads: usize = tallies.values().map(|t| t.workloads.len()).sum();
    if total_hosts == 0 {
        return Err(EngineError::DivisionUndefined(format!(
            "cluster {cluster} has no hosts in any host group"
        )));
    }
    let per_host_target = total_workloads as f64 / total_hosts as f64;

    let domains = tallies
        .into_iter()
        .map(|(domain, tally)| {
            let host_count = tally.hosts.len();
            let workload_count = tally.workloads.len();
            let target = (per_host_target * host_count as f64).round_ties_even() as u64;
            let deviation = if target == 0 {
                Deviation::NotApplicable
            } else {
                Deviation::Percent((workload_count as f64 - target as f64) / target as f64 * 100.0)
            };
            DomainBalance {
                domain: domain.to_string(),
                host_count,
                workload_count,
                target,
                deviation,
            }
        })
        .collect();

    Ok(BalanceReport {
        cluster: cluster.to_string(),
        total_hosts,
        total_workloads,
        per_host_target,
        domains,
        ungrouped_hosts: Vec::new(),
    })
}

/// Names of `hosts` that are not a member of any host group, sorted.
pub fn ungrouped_hosts<'a>(
    groups: impl IntoIterator<Item = &'a AffinityGroup>,
    hosts: &[Host],
) -> Vec<String> {
    let grouped: BTreeSet<&str> = groups
        .into_iter()
        .filter(|g| g.kind == GroupKind::Host)
        .flat_map(|g| g.members.iter().map(String::as_str))
        .collect();
    let mut names: Vec<String> = hosts
        .iter()
        .filter(|h| !grouped.contains(h.name.as_str()))
        .map(|h| h.name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn group(name: &str, kind: GroupKind, members: &[&str]) -> AffinityGroup {
        AffinityGroup {
            name: name.to_string(),
            kind,
            domain: name.split('-').next().unwrap_or(name).to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn proportional_targets_and_deviation() {
        let groups = vec![
            group("alpha-hosts", GroupKind::Host, &["h1", "h2"]),
            group("alpha-vms", GroupKind::Workload, &["v1", "v2", "v3", "v4", "v5"]),
            group("beta-hosts", GroupKind::Host, &["h3", "h4"]),
            group("beta-vms", GroupKind::Workload, &["v6", "v7", "v8"]),
        ];
        let report = compute_balance_from_groups("prod", &groups).unwrap();

        assert_eq!(report.total_hosts, 4);
        assert_eq!(report.total_workloads, 8);
        assert_eq!(report.per_host_target, 2.0);

        let alpha = report.domain("alpha").unwrap();
        assert_eq!(alpha.target, 4);
        assert_eq!(alpha.deviation, Deviation::Percent(25.0));
        let beta = report.domain("beta").unwrap();
        assert_eq!(beta.target, 4);
        assert_eq!(beta.deviation, Deviation::Percent(-25.0));
        assert_eq!(report.max_abs_deviation(), Some(25.0));
    }

    #[test]
    fn hosts_outside_host_groups_are_listed() {
        let groups = vec![
            group("alpha-hosts", GroupKind::Host, &["h1"]),
            // Workload members never count as grouped hosts.
            group("alpha-vms", GroupKind::Workload, &["h3"]),
        ];
        let host = |name: &str| Host {
            name: name.to_string(),
            cluster: "prod".to_string(),
        };
        let hosts = vec![host("h3"), host("h1"), host("h2")];
        assert_eq!(ungrouped_hosts(&groups, &hosts), vec!["h2".to_string(), "h3".to_string()]);
    }

    #[test]
    fn zero_hosts_is_division_undefined() {
        let groups = vec![group("alpha-vms", GroupKind::Workload, &["v1"])];
        let err = compute_balance_from_groups("prod", &groups).unwrap_err();
        assert!(matches!(err, EngineError::DivisionUndefined(_)));

        let empty: Vec<AffinityGroup> = Vec::new();
        assert!(matches!(
            compute_balance_from_groups("prod", &empty),
            Err(EngineError::DivisionUndefined(_))
        ));
    }

    #[test]
    fn zero_target_reports_not_applicable() {
        let groups = vec![
            group("alpha-hosts", GroupKind::Host, &["h1"]),
            group("beta-hosts", GroupKind::Host, &["h2"]),
            group("beta-vms", GroupKind::Workload, &[]),
        ];
        let report = compute_balance_from_groups("prod", &groups).unwrap();
        let beta = report.domain("beta").unwrap();
        assert_eq!(beta.target, 0);
        assert_eq!(beta.workload_count, 0);
        assert_eq!(beta.deviation, Deviation::NotApplicable);
        assert_eq!(beta.deviation.to_string(), "N/A");
        assert_eq!(report.max_abs_deviation(), None);
    }

    #[test]
    fn workloads_without_hosts_have_na_deviation() {
        let groups = vec![
            group("alpha-hosts", GroupKind::Host, &["h1", "h2"]),
            group("alpha-vms", GroupKind::Workload, &["v1"]),
            group("gamma-vms", GroupKind::Workload, &["v2", "v3"]),
        ];
        let report = compute_balance_from_groups("prod", &groups).unwrap();
        let gamma = report.domain("gamma").unwrap();
        assert_eq!(gamma.host_count, 0);
        assert_eq!(gamma.deviation, Deviation::NotApplicable);
    }

    #[test]
    fn target_rounds_half_to_even() {
        // 3 workloads over 2 hosts: 1.5 per host, one-host domains target 2.
        let groups = vec![
            group("alpha-hosts", GroupKind::Host, &["h1"]),
            group("beta-hosts", GroupKind::Host, &["h2"]),
            group("alpha-vms", GroupKind::Workload, &["v1", "v2", "v3"]),
        ];
        let report = compute_balance_from_groups("prod", &groups).unwrap();
        assert_eq!(report.domain("alpha").unwrap().target, 2);
        // 5 over 2 hosts: 2.5 rounds to 2.
        let groups = vec![
            group("alpha-hosts", GroupKind::Host, &["h1"]),
            group("beta-hosts", GroupKind::Host, &["h2"]),
            group("alpha-vms", GroupKind::Workload, &["v1", "v2", "v3", "v4", "v5"]),
        ];
        let report = compute_balance_from_groups("prod", &groups).unwrap();
        assert_eq!(report.domain("alpha").unwrap().target, 2);
    }

    #[test]
    fn members_count_once_per_domain() {
        let groups = vec![
            group("alpha-hosts", GroupKind::Host, &["h1", "h2"]),
            group("alpha-hosts2", GroupKind::Host, &["h2"]),
            group("alpha-vms", GroupKind::Workload, &["v1"]),
        ];
        let report = compute_balance_from_groups("prod", &groups).unwrap();
        assert_eq!(report.total_hosts, 2);
    }

    #[test]
    fn deviation_display() {
        assert_eq!(Deviation::Percent(25.0).to_string(), "+25.0%");
        assert_eq!(Deviation::Percent(-12.5).to_string(), "-12.5%");
    }

    /// Strategy: up to 6 domains, each with a host group and a workload group.
    fn domain_groups() -> impl Strategy<Value = Vec<AffinityGroup>> {
        prop::collection::vec((0usize..8, 0usize..30), 1..6).prop_map(|sizes| {
            let mut groups = Vec::new();
            for (i, (hosts, workloads)) in sizes.into_iter().enumerate() {
                let domain = format!("d{i}");
                let host_names: Vec<String> = (0..hosts).map(|h| format!("{domain}-h{h}")).collect();
                let vm_names: Vec<String> = (0..workloads).map(|w| format!("{domain}-v{w}")).collect();
                groups.push(AffinityGroup {
                    name: format!("{domain}-hosts"),
                    kind: GroupKind::Host,
                    domain: domain.clone(),
                    members: host_names.into_iter().collect(),
                });
                groups.push(AffinityGroup {
                    name: format!("{domain}-vms"),
                    kind: GroupKind::Workload,
                    domain,
                    members: vm_names.into_iter().collect(),
                });
            }
            groups
        })
    }

    proptest! {
        #[test]
        fn counts_are_conserved(groups in domain_groups()) {
            match compute_balance_from_groups("prod", &groups) {
                Ok(report) => {
                    let hosts: usize = report.domains.iter().map(|d| d.host_count).sum();
                    let workloads: usize = report.domains.iter().map(|d| d.workload_count).sum();
                    prop_assert_eq!(hosts, report.total_hosts);
                    prop_assert_eq!(workloads, report.total_workloads);
                    for d in &report.domains {
                        prop_assert_eq!(d.target == 0, d.deviation == Deviation::NotApplicable);
                    }
                }
                Err(err) => {
                    prop_assert!(matches!(err, EngineError::DivisionUndefined(_)));
                    let hosts: usize = groups
                        .iter()
                        .filter(|g| g.kind == GroupKind::Host)
                        .map(|g| g.members.len())
                        .sum();
                    prop_assert_eq!(hosts, 0);
                }
            }
        }
    }
}
