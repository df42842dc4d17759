//! Default flattener over [`Value`] trees.
//!
//! Path rules:
//! - object fields are joined with `.`, prefixed by the root type name when set
//! - array members get `[i]`, or when collection order is ignored
//!   `[field=value,...]` for members carrying identifier fields and `[]`
//!   for everything else
//! - scalars and empty containers are named leaves; a leaf is named after
//!   its field, array members after the enclosing field
//! - non-empty containers produce no element of their own, so a container
//!   path never collides with a leaf at the same fqdn

use crate::errors::{AuditDiffError, Result};
use crate::flatten::{FlattenOptions, Flattener};
use crate::model::{Element, EventType, Value};
use std::collections::BTreeMap;

/// Leaf name for a scalar root when no root type name is configured.
pub const ROOT_LEAF_NAME: &str = "$";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFlattener;

impl Flattener for JsonFlattener {
    fn flatten(
        &self,
        node: &Value,
        event_type: EventType,
        options: &FlattenOptions<'_>,
    ) -> Result<Vec<Element>> {
        if event_type == EventType::Updated {
            return Err(AuditDiffError::InvalidInput {
                message: "flattening only supports created or deleted events".to_string(),
            });
        }

        let mut walker = Walker {
            event_type,
            options,
            out: Vec::new(),
        };
        let root_name = if options.root_type_name.is_empty() {
            ROOT_LEAF_NAME
        } else {
            options.root_type_name
        };
        walker.visit(node, options.root_type_name.to_string(), root_name, None);

        tracing::trace!(
            event_type = ?event_type,
            element_count = walker.out.len(),
            "flattened snapshot"
        );
        Ok(walker.out)
    }
}

struct Walker<'a> {
    event_type: EventType,
    options: &'a FlattenOptions<'a>,
    out: Vec<Element>,
}

/// Identifier values of one collection member plus its rendered segment.
struct MemberIdentity {
    segment: String,
    values: BTreeMap<String, Value>,
}

impl Walker<'_> {
    fn visit(
        &mut self,
        node: &Value,
        path: String,
        name: &str,
        identifiers: Option<&BTreeMap<String, Value>>,
    ) {
        match node {
            Value::Object(map) if !map.is_empty() => {
                for (key, child) in map {
                    self.visit(child, join_field(&path, key), key, identifiers);
                }
            }
            Value::Array(items) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    if !self.options.ignore_collection_order {
                        self.visit(item, format!("{}[{}]", path, index), name, identifiers);
                        continue;
                    }
                    match self.member_identity(item) {
                        Some(identity) => self.visit(
                            item,
                            format!("{}[{}]", path, identity.segment),
                            name,
                            Some(&identity.values),
                        ),
                        None => self.visit(item, format!("{}[]", path), name, identifiers),
                    }
                }
            }
            _ => self.push(name, &path, node, identifiers),
        }
    }

    /// Identifier fields present on an object member, in configured order.
    fn member_identity(&self, item: &Value) -> Option<MemberIdentity> {
        let map = item.as_object()?;
        let mut parts = Vec::new();
        let mut values = BTreeMap::new();
        for field in self.options.identifier_field_names {
            match map.get(field) {
                Some(value) if !value.is_null() => {
                    parts.push(format!("{}={}", field, value.to_path_segment()));
                    values.insert(field.clone(), value.clone());
                }
                _ => {}
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(MemberIdentity {
            segment: parts.join(","),
            values,
        })
    }

    fn push(
        &mut self,
        name: &str,
        path: &str,
        node: &Value,
        identifiers: Option<&BTreeMap<String, Value>>,
    ) {
        let Some(mut element) = Element::for_event(
            self.event_type,
            Some(name.to_string()),
            path,
            node.clone(),
        ) else {
            return;
        };
        element.metadata.identifiers = identifiers.cloned();
        self.out.push(element);
    }
}

fn join_field(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
