//! Correlation types for diff invocations
//!
//! Every diff call gets a `DiffId` so that its lifecycle log events,
//! errors and emitted change records can be tied together downstream.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single diff invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffId(String);

impl DiffId {
    /// Generate a new random DiffId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for DiffId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DiffId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried through a diff invocation for correlation
#[derive(Debug, Clone)]
pub struct DiffContext {
    pub diff_id: DiffId,
    /// Free-form subject of the audited snapshots (e.g. `order:42`)
    pub subject: Option<String>,
}

impl DiffContext {
    /// Create a new context with a fresh DiffId
    pub fn new() -> Self {
        Self {
            diff_id: DiffId::new(),
            subject: None,
        }
    }

    /// Create a context with an existing DiffId
    pub fn with_diff_id(diff_id: DiffId) -> Self {
        Self {
            diff_id,
            subject: None,
        }
    }

    /// Attach the audited subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl Default for DiffContext {
    fn default() -> Self {
        Self::new()
    }
}
