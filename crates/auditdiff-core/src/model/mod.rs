//! Data model for diff inputs and change records.
//!
//! - [`Value`]: closed tagged union for snapshot contents
//! - [`Element`]: one before/after record at a single field position
//! - [`EventType`] / [`ChangeKind`]: source event vs. emitted record nature

pub mod element;
pub mod value;

pub use element::{ChangeKind, Element, ElementMetadata, EventType};
pub use value::Value;
