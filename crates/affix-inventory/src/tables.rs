//! redb table definitions for the inventory store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized records).
//! Cluster-scoped records use `{cluster}/{name}` keys so a prefix scan
//! returns one cluster's contents.

use redb::TableDefinition;

/// Table shape shared by every inventory table.
pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Clusters keyed by `{name}`.
pub const CLUSTERS: JsonTable = TableDefinition::new("clusters");

/// Hosts keyed by `{cluster}/{host}`.
pub const HOSTS: JsonTable = TableDefinition::new("hosts");

/// Workloads keyed by `{cluster}/{workload}`.
pub const WORKLOADS: JsonTable = TableDefinition::new("workloads");

/// Affinity groups keyed by `{cluster}/{group}`.
pub const GROUPS: JsonTable = TableDefinition::new("groups");

/// Stores keyed by `{name}`.
pub const STORES: JsonTable = TableDefinition::new("stores");

/// Storage pools keyed by `{name}`.
pub const POOLS: JsonTable = TableDefinition::new("pools");

/// Relocation tasks keyed by `{task_id}`.
pub const TASKS: JsonTable = TableDefinition::new("tasks");
