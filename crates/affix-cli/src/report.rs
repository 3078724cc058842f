//! Human-readable report formatting.

use affix_inventory::{TaskRecord, TaskStatus};
use affix_placement::{
    BalanceOutcome, Destination, Detection, PlanEntry, RemediationReport, RemediationStatus,
    RogueAction, RogueOutcome, RogueResult,
};

pub fn format_balance(outcome: &BalanceOutcome) -> String {
    let report = match outcome {
        BalanceOutcome::NoData { cluster, reason } => {
            return format!("Cluster {cluster}: no balance data ({reason})\n");
        }
        BalanceOutcome::Report(report) => report,
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Cluster {}: {} hosts, {} workloads, {:.2} workloads per host\n\n",
        report.cluster, report.total_hosts, report.total_workloads, report.per_host_target
    ));
    out.push_str(&format!(
        "  {:<16} {:>6} {:>10} {:>7} {:>10}\n",
        "DOMAIN", "HOSTS", "WORKLOADS", "TARGET", "DEVIATION"
    ));
    for d in &report.domains {
        out.push_str(&format!(
            "  {:<16} {:>6} {:>10} {:>7} {:>10}\n",
            d.domain,
            d.host_count,
            d.workload_count,
            d.target,
            d.deviation.to_string()
        ));
    }
    if !report.ungrouped_hosts.is_empty() {
        out.push_str(&format!(
            "\n  {} hosts in no host group: {}\n",
            report.ungrouped_hosts.len(),
            report.ungrouped_hosts.join(", ")
        ));
    }
    out
}

pub fn format_detections(cluster: &str, detections: &[Detection]) -> String {
    let mut out = String::new();
    let mut mismatched = 0;
    let mut unassigned = Vec::new();

    for detection in detections {
        let Some(d) = detection.evaluated() else {
            unassigned.push(detection.workload());
            continue;
        };
        if !d.has_mismatch() && d.unresolved.is_empty() {
            continue;
        }
        if d.has_mismatch() {
            mismatched += 1;
        }
        out.push_str(&format!("{} ({}, domain {})\n", d.workload, d.group, d.assigned_domain));
        for f in &d.findings {
            out.push_str(&format!(
                "  ❌ {:<10} on {} (domain {})\n",
                f.item.to_string(),
                f.location,
                f.actual_domain
            ));
        }
        for u in &d.unresolved {
            out.push_str(&format!("  ⚠️  {:<10} on {}: {}\n", u.item.to_string(), u.store, u.error));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Cluster {cluster}: {} workloads scanned, {mismatched} with storage outside their domain\n",
        detections.len()
    ));
    if !unassigned.is_empty() {
        out.push_str(&format!("  {} in no workload group: {}\n", unassigned.len(), unassigned.join(", ")));
    }
    out
}

fn format_entry(entry: &PlanEntry) -> String {
    match &entry.destination {
        Destination::Unchanged => format!("{:<10} {} (unchanged)", entry.item.to_string(), entry.source),
        Destination::Named(name) => format!("{:<10} {} → {name}", entry.item.to_string(), entry.source),
    }
}

pub fn format_remediation(report: &RemediationReport) -> String {
    let mut out = String::new();
    if report.dry_run {
        out.push_str("DRY RUN: nothing is submitted\n\n");
    }

    for w in &report.workloads {
        out.push_str(&format!("{} (domain {})\n", w.workload, w.assigned_domain));
        if let Some(plan) = &w.plan {
            for entry in plan.entries() {
                out.push_str(&format!("  {}\n", format_entry(entry)));
            }
        }
        match &w.status {
            RemediationStatus::NothingToDo => out.push_str("  • nothing to do\n"),
            RemediationStatus::Previewed { request } => {
                out.push_str(&format!("  • would relocate config to {}", request.config_destination));
                for d in &request.disk_destinations {
                    out.push_str(&format!(", disk {} to {}", d.disk, d.store));
                }
                out.push('\n');
            }
            RemediationStatus::Submitted { task, .. } => {
                out.push_str(&format!("  ✓ submitted {task}\n"));
            }
            RemediationStatus::Failed { error } => {
                out.push_str(&format!("  ❌ {}: {error}\n", error.code()));
            }
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Cluster {}: {} workloads scanned, {} mismatched, {} submitted, {} failed\n",
        report.cluster,
        report.scanned,
        report.workloads.len(),
        report.submitted().count(),
        report.failures().count()
    ));
    out
}

pub fn format_rogues(cluster: &str, results: &[RogueResult]) -> String {
    if results.is_empty() {
        return format!("Cluster {cluster}: every workload is in a workload group\n");
    }

    let mut out = format!("Cluster {cluster}: {} workloads in no workload group\n\n", results.len());
    for r in results {
        let line = match (&r.outcome, &r.action) {
            (RogueOutcome::Classified { group, source, .. }, RogueAction::Added) => {
                format!("✓ {} added to {group} (from {source})", r.workload)
            }
            (RogueOutcome::Classified { group, source, .. }, RogueAction::Pending) => {
                format!("• {} → {group} (from {source})", r.workload)
            }
            (_, RogueAction::Failed { error }) => format!("❌ {}: {error}", r.workload),
            _ => format!("⚠️  {}: no known domain on config or first disk", r.workload),
        };
        out.push_str(&format!("  {line}\n"));
    }
    out
}

pub fn format_tasks(tasks: &[TaskRecord]) -> String {
    if tasks.is_empty() {
        return "No relocation tasks\n".to_string();
    }

    let mut out = String::new();
    for t in tasks {
        let status = match t.status {
            TaskStatus::Queued => "queued",
            TaskStatus::Completed => "completed",
        };
        out.push_str(&format!(
            "{:<10} {:<10} {}/{} config → {}, {} disks\n",
            t.handle.id,
            status,
            t.request.cluster,
            t.request.workload,
            t.request.config_destination,
            t.request.disk_destinations.len()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use affix_core::{DiskDestination, PlacementItem, RelocationRequest, TaskHandle};
    use affix_placement::{
        BalanceReport, Deviation, DomainBalance, EngineError, RelocationPlan, WorkloadRemediation,
    };

    use super::*;

    #[test]
    fn balance_table_shows_na() {
        let outcome = BalanceOutcome::Report(BalanceReport {
            cluster: "prod".to_string(),
            total_hosts: 4,
            total_workloads: 8,
            per_host_target: 2.0,
            domains: vec![
                DomainBalance {
                    domain: "alpha".to_string(),
                    host_count: 4,
                    workload_count: 5,
                    target: 8,
                    deviation: Deviation::Percent(-37.5),
                },
                DomainBalance {
                    domain: "gamma".to_string(),
                    host_count: 0,
                    workload_count: 3,
                    target: 0,
                    deviation: Deviation::NotApplicable,
                },
            ],
            ungrouped_hosts: vec!["esx9".to_string()],
        });
        let text = format_balance(&outcome);
        assert!(text.contains("2.00 workloads per host"));
        assert!(text.contains("1 hosts in no host group: esx9"));
        assert!(text.contains("-37.5%"));
        assert!(text.contains("N/A"));
    }

    #[test]
    fn no_data_is_reported_plainly() {
        let outcome = BalanceOutcome::NoData {
            cluster: "lab".to_string(),
            reason: "cluster lab has no hosts in any host group".to_string(),
        };
        assert!(format_balance(&outcome).starts_with("Cluster lab: no balance data"));
    }

    #[test]
    fn remediation_lists_plan_and_failures() {
        let request = RelocationRequest {
            cluster: "prod".to_string(),
            workload: "web01".to_string(),
            config_destination: "alpha_ds01".to_string(),
            disk_destinations: vec![DiskDestination {
                disk: 2000,
                store: "alpha_ds03".to_string(),
            }],
        };
        let report = RemediationReport {
            cluster: "prod".to_string(),
            dry_run: false,
            scanned: 3,
            workloads: vec![
                WorkloadRemediation {
                    workload: "web01".to_string(),
                    assigned_domain: "alpha".to_string(),
                    plan: Some(RelocationPlan {
                        workload: "web01".to_string(),
                        config: PlanEntry::moved(PlacementItem::Config, "beta_ds01", "alpha_ds01"),
                        disks: vec![PlanEntry::unchanged(PlacementItem::Disk(2000), "alpha_ds03")],
                    }),
                    status: RemediationStatus::Submitted {
                        task: TaskHandle {
                            id: "task-1".to_string(),
                            workload: "web01".to_string(),
                            submitted_at: 0,
                        },
                        request,
                    },
                },
                WorkloadRemediation {
                    workload: "web09".to_string(),
                    assigned_domain: "alpha".to_string(),
                    plan: None,
                    status: RemediationStatus::Failed {
                        error: EngineError::Unclassifiable {
                            workload: "web09".to_string(),
                        },
                    },
                },
            ],
        };
        let text = format_remediation(&report);
        assert!(text.contains("beta_ds01 → alpha_ds01"));
        assert!(text.contains("alpha_ds03 (unchanged)"));
        assert!(text.contains("task-1"));
        assert!(text.contains("1 submitted, 1 failed"));
    }

    #[test]
    fn empty_rogue_list() {
        assert!(format_rogues("prod", &[]).contains("every workload is in a workload group"));
    }
}
