//! affix-inventory: embedded inventory store for affix.
//!
//! Backed by [redb](https://docs.rs/redb). Holds clusters, hosts, workloads,
//! affinity groups, stores, pools and relocation tasks, and implements the
//! [`affix_core::Platform`] client trait on top of them, so the engine can
//! run against a recorded or hand-written inventory exactly as it would
//! against a live platform.
//!
//! # Architecture
//!
//! All records are JSON-serialized into redb's `&[u8]` value columns.
//! Cluster-scoped keys (`{cluster}/{name}`) make a prefix scan return one
//! cluster's contents. Multi-record mutations (group edits, task
//! completion) run in a single write transaction.
//!
//! The `InventoryStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and can be shared across worker threads.

pub mod error;
pub mod platform;
pub mod seed;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{InventoryError, InventoryResult};
pub use seed::{ClusterSeed, GroupSeed, ImportSummary, InventorySeed, WorkloadSeed};
pub use store::InventoryStore;
pub use types::{TaskRecord, TaskStatus};
