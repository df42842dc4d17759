//! Snapshot flattening.
//!
//! A [`Flattener`] turns one snapshot into leaf [`Element`]s tagged with an
//! fqdn. The differ only depends on the trait; [`JsonFlattener`] is the
//! default implementation over [`Value`].

pub mod json;

pub use json::JsonFlattener;

use crate::config::DiffConfig;
use crate::errors::Result;
use crate::model::{Element, EventType, Value};

/// Per-call flattening options.
#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions<'a> {
    /// Prefix for every fqdn; empty means no prefix
    pub root_type_name: &'a str,
    /// Key collection members by identifier fields instead of position
    pub ignore_collection_order: bool,
    pub identifier_field_names: &'a [String],
}

impl<'a> FlattenOptions<'a> {
    pub fn from_config(config: &'a DiffConfig) -> Self {
        Self {
            root_type_name: &config.root_type_name,
            ignore_collection_order: config.ignore_collection_order.enabled,
            identifier_field_names: &config.ignore_collection_order.fields,
        }
    }
}

/// Converts a snapshot into path-tagged elements.
///
/// Implementations must emit one named element per leaf with `fqdn` set,
/// and only creation candidates for `EventType::Created` or deletion
/// candidates for `EventType::Deleted`.
pub trait Flattener: Send + Sync {
    /// # Errors
    ///
    /// `InvalidInput` when `event_type` is not `Created` or `Deleted`.
    fn flatten(
        &self,
        node: &Value,
        event_type: EventType,
        options: &FlattenOptions<'_>,
    ) -> Result<Vec<Element>>;
}
