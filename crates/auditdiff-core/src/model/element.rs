//! Elements: the unit of change detection.
//!
//! A flattener emits one element per field position with exactly one of
//! `previous_value` (deletion candidate) or `updated_value` (creation
//! candidate) set. The detector and reconciler may fill in the missing side
//! to produce a resolved update. An element with neither side set never
//! reaches the output.

use crate::model::value::Value;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// The flattening event an element was produced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Created,
    Updated,
    Deleted,
}

/// Nature of an emitted change record, derived from which sides are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        }
    }
}

/// Path metadata attached by the flattener.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementMetadata {
    /// Structural path of the field; the grouping key for change detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    /// Identifier values of the enclosing collection member, when order is ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<BTreeMap<String, Value>>,
}

impl ElementMetadata {
    pub fn at(fqdn: impl Into<String>) -> Self {
        Self {
            fqdn: Some(fqdn.into()),
            identifiers: None,
        }
    }
}

/// One before/after record for a single field position.
///
/// `Some(Value::Null)` is a present null and is distinct from an absent side;
/// serialization preserves the difference by omitting absent sides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Element {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub previous_value: Option<Value>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub updated_value: Option<Value>,
    #[serde(default)]
    pub metadata: ElementMetadata,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Element {
    /// A creation candidate: only `updated_value` is set.
    pub fn created(name: Option<String>, fqdn: impl Into<String>, value: Value) -> Self {
        Self {
            name,
            previous_value: None,
            updated_value: Some(value),
            metadata: ElementMetadata::at(fqdn),
        }
    }

    /// A deletion candidate: only `previous_value` is set.
    pub fn deleted(name: Option<String>, fqdn: impl Into<String>, value: Value) -> Self {
        Self {
            name,
            previous_value: Some(value),
            updated_value: None,
            metadata: ElementMetadata::at(fqdn),
        }
    }

    /// Build the candidate matching a flattening event.
    ///
    /// `Updated` has no single-sided candidate and yields `None`.
    pub fn for_event(
        event_type: EventType,
        name: Option<String>,
        fqdn: impl Into<String>,
        value: Value,
    ) -> Option<Self> {
        match event_type {
            EventType::Created => Some(Self::created(name, fqdn, value)),
            EventType::Deleted => Some(Self::deleted(name, fqdn, value)),
            EventType::Updated => None,
        }
    }

    pub fn with_identifiers(mut self, identifiers: BTreeMap<String, Value>) -> Self {
        self.metadata.identifiers = Some(identifiers);
        self
    }

    /// Copy of this element with the updated side replaced.
    pub fn with_updated_value(self, updated_value: Option<Value>) -> Self {
        Self {
            updated_value,
            ..self
        }
    }

    /// Merge a creation candidate into this element as an update.
    ///
    /// Metadata stays with `self`. The name falls back to `created`'s, so an
    /// update survives when only one side was named.
    pub fn into_update(self, created: Element) -> Self {
        Self {
            name: self.name.or(created.name),
            updated_value: created.updated_value,
            ..self
        }
    }

    pub fn fqdn(&self) -> Option<&str> {
        self.metadata.fqdn.as_deref()
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// True when only the previous side is set.
    pub fn is_deletion_candidate(&self) -> bool {
        self.previous_value.is_some() && self.updated_value.is_none()
    }

    /// True when only the updated side is set.
    pub fn is_creation_candidate(&self) -> bool {
        self.previous_value.is_none() && self.updated_value.is_some()
    }

    pub fn kind(&self) -> Option<ChangeKind> {
        match (&self.previous_value, &self.updated_value) {
            (Some(_), Some(_)) => Some(ChangeKind::Updated),
            (Some(_), None) => Some(ChangeKind::Deleted),
            (None, Some(_)) => Some(ChangeKind::Created),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_update_keeps_a_name() {
        let unnamed = Element {
            previous_value: Some(Value::from("old")),
            metadata: ElementMetadata::at("addr"),
            ..Element::default()
        };
        let named = Element::created(Some("addr".into()), "addr", Value::from("new"));

        let update = unnamed.into_update(named);
        assert_eq!(update.name.as_deref(), Some("addr"));
        assert_eq!(update.kind(), Some(ChangeKind::Updated));
        assert_eq!(update.updated_value, Some(Value::from("new")));
    }

    #[test]
    fn test_kind_follows_set_sides() {
        let created = Element::created(Some("age".into()), "age", Value::from(31i64));
        let deleted = Element::deleted(Some("age".into()), "age", Value::from(30i64));
        assert_eq!(created.kind(), Some(ChangeKind::Created));
        assert_eq!(deleted.kind(), Some(ChangeKind::Deleted));

        let updated = deleted.with_updated_value(Some(Value::from(31i64)));
        assert_eq!(updated.kind(), Some(ChangeKind::Updated));
        assert_eq!(Element::default().kind(), None);
    }

    #[test]
    fn test_for_event_rejects_updated() {
        assert!(Element::for_event(EventType::Updated, None, "x", Value::Null).is_none());
        let e = Element::for_event(EventType::Deleted, None, "x", Value::Null).unwrap();
        assert!(e.is_deletion_candidate());
    }

    #[test]
    fn test_present_null_survives_serialization() {
        let e = Element::deleted(Some("note".into()), "note", Value::Null);
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(
            json,
            r#"{"name":"note","previous_value":null,"metadata":{"fqdn":"note"}}"#
        );

        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back.previous_value, Some(Value::Null));
        assert_eq!(back.updated_value, None);
    }
}
