//! auditdiff Core - structural diffing for audit trails
//!
//! This crate turns a pair of object snapshots into the minimal set of
//! field-level change records, including:
//! - A closed `Value` model with structural equality
//! - Flattening of snapshots into path-tagged leaf elements
//! - Per-path change detection for update pairs
//! - Multiset reconciliation of unordered collections with duplicates
//! - Synchronous and tokio-backed concurrent diff orchestration
//! - Change-set fingerprints and human-readable summaries

pub use auditdiff_core_types;

pub mod config;
pub mod diff;
pub mod errors;
pub mod flatten;
pub mod logging_facility;
pub mod model;

// Re-export commonly used types
pub use config::{DiffConfig, IgnoreCollectionOrder};
pub use diff::{ChangeSet, ConcurrentDiffer, DiffStats, Differ};
pub use errors::{AuditDiffError, ExError, ExErrorKind, Result};
pub use flatten::{Flattener, JsonFlattener};
pub use model::{ChangeKind, Element, ElementMetadata, EventType, Value};
