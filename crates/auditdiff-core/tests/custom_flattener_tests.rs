//! Orchestrator behaviour with a hand-written `Flattener`.
//!
//! `JsonFlattener` always sets an fqdn and a name, so these tests use a
//! flattener that emits each field as-is, including ones without a path or
//! without a name.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use auditdiff_core::flatten::FlattenOptions;
use auditdiff_core::{
    ChangeKind, ConcurrentDiffer, DiffConfig, Differ, Element, ElementMetadata, EventType,
    Flattener, Result, Value,
};
use serde_json::json;

/// Emits one element per top-level field. Fields starting with `_` get no
/// fqdn, fields starting with `~` get no name.
#[derive(Debug, Clone, Copy)]
struct FieldFlattener;

impl Flattener for FieldFlattener {
    fn flatten(
        &self,
        node: &Value,
        event_type: EventType,
        _options: &FlattenOptions<'_>,
    ) -> Result<Vec<Element>> {
        let Some(map) = node.as_object() else {
            return Ok(Vec::new());
        };
        Ok(map
            .iter()
            .filter_map(|(key, value)| {
                let mut element =
                    Element::for_event(event_type, Some(key.clone()), key.as_str(), value.clone())?;
                if key.starts_with('_') {
                    element.metadata = ElementMetadata::default();
                }
                if key.starts_with('~') {
                    element.name = None;
                }
                Some(element)
            })
            .collect())
    }
}

fn snapshots() -> (Value, Value) {
    (
        Value::from(json!({"age": 30, "_orphan": "x", "~hidden": 1})),
        Value::from(json!({"age": 31, "_orphan": "y", "_stray": "z", "~hidden": 2})),
    )
}

fn assert_reportable(records: &[Element]) {
    for record in records {
        assert!(record.fqdn().is_some(), "record without fqdn: {:?}", record);
        assert!(record.is_named(), "unnamed record: {:?}", record);
    }
}

#[test]
fn test_missing_fqdn_is_counted_and_dropped() {
    let differ = Differ::with_flattener(FieldFlattener, DiffConfig::default()).unwrap();
    let (before, after) = snapshots();

    let set = differ.diff(Some(&before), Some(&after)).unwrap();

    assert_reportable(&set.records);
    assert_eq!(set.len(), 1);
    assert_eq!(set.at("age").unwrap().kind(), Some(ChangeKind::Updated));
    assert_eq!(set.stats.missing_metadata, 3);
}

#[test]
fn test_missing_fqdn_dropped_on_single_side() {
    let differ = Differ::with_flattener(FieldFlattener, DiffConfig::default()).unwrap();
    let (_, after) = snapshots();

    let set = differ.diff(None, Some(&after)).unwrap();

    assert_reportable(&set.records);
    assert_eq!(set.len(), 1);
    assert_eq!(set.stats.missing_metadata, 2);
    assert_eq!(set.stats.created, 1);
}

#[tokio::test]
async fn test_concurrent_differ_drops_missing_fqdn() {
    let differ = ConcurrentDiffer::with_flattener(FieldFlattener, DiffConfig::default()).unwrap();
    let (before, after) = snapshots();

    let set = differ
        .diff(Some(before.clone()), Some(after.clone()))
        .await
        .unwrap();
    assert_reportable(&set.records);
    assert_eq!(set.len(), 1);
    assert_eq!(set.stats.missing_metadata, 3);

    let single = differ.diff(Some(before), None).await.unwrap();
    assert_reportable(&single.records);
    assert_eq!(single.stats.missing_metadata, 1);
    assert_eq!(single.stats.deleted, 1);
}
