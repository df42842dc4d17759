//! Structural diff engine.
//!
//! Produces the minimal set of field-level change records between two
//! optional snapshots.
//!
//! ## Entry point
//!
//! ```
//! use auditdiff_core::{Differ, Value};
//! use serde_json::json;
//!
//! let before = Value::from(json!({"name": "Alice", "age": 30}));
//! let after = Value::from(json!({"name": "Alice", "age": 31}));
//!
//! let changes = Differ::default().diff(Some(&before), Some(&after)).unwrap();
//! assert_eq!(changes.len(), 1);
//! ```
//!
//! ## Pipeline
//!
//! 1. Flatten `before` as deletion candidates and `after` as creation candidates
//! 2. Group the merged elements into buckets by fqdn
//! 3. Detect per bucket: pass-through, pair comparison, or multiset reconciliation
//! 4. Drop unnamed records
//!
//! ## Guarantees
//!
//! - **Stateless**: every call is an independent, deterministic computation
//! - **All-or-nothing**: a failing bucket fails the whole call
//! - **No cross-bucket order**: consumers treat records as independent

pub mod bucket;
pub mod change_set;
pub mod concurrent;
pub mod detector;
pub mod engine;
pub mod human_summary;
pub mod reconciler;

pub use change_set::{ChangeSet, DiffStats};
pub use concurrent::ConcurrentDiffer;
pub use detector::detect;
pub use engine::Differ;
pub use human_summary::render_human_summary;
pub use reconciler::reconcile;
