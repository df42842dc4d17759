//! Multiset reconciliation for buckets with more than two elements.
//!
//! Such buckets arise when collection order is ignored and several members
//! land on the same fqdn. Members are matched by value count, not position:
//! values present equally often on both sides are unchanged (possibly
//! reordered) and produce nothing. Only the count surplus is reported, with
//! deleted and created surpluses paired into updates where possible.
//!
//! Count conservation holds on each side: matched + surplus equals the size
//! of that side's pool.

use crate::model::{Element, Value};

/// Elements grouped by value, in first-seen order.
///
/// Grouping uses `Value` equality directly, so lookups are linear in the
/// number of distinct values.
#[derive(Debug, Default)]
struct OccurrenceTable {
    groups: Vec<(Value, Vec<Element>)>,
}

impl OccurrenceTable {
    fn insert(&mut self, value: Value, element: Element) {
        match self.groups.iter_mut().find(|(v, _)| *v == value) {
            Some((_, members)) => members.push(element),
            None => self.groups.push((value, vec![element])),
        }
    }

    /// Remove and return the group for `value`, if any.
    fn take(&mut self, value: &Value) -> Vec<Element> {
        match self.groups.iter().position(|(v, _)| v == value) {
            Some(pos) => self.groups.remove(pos).1,
            None => Vec::new(),
        }
    }
}

/// Surplus members left after count matching.
#[derive(Debug, Default)]
struct Surplus {
    deleted: Vec<Element>,
    created: Vec<Element>,
    matched_values: usize,
}

/// Reconcile a bucket of elements that share one fqdn.
///
/// Elements with neither side set are dropped. The output holds
/// `min(|deleted surplus|, |created surplus|)` updates followed by the
/// unpaired remainder, which is either all deletions or all creations.
pub fn reconcile(elements: Vec<Element>) -> Vec<Element> {
    let mut previous = OccurrenceTable::default();
    let mut updated = OccurrenceTable::default();

    for element in elements {
        if let Some(value) = element.previous_value.clone() {
            previous.insert(value, element);
        } else if let Some(value) = element.updated_value.clone() {
            updated.insert(value, element);
        }
    }

    let surplus = compute_surplus(previous, updated);
    tracing::trace!(
        matched_values = surplus.matched_values,
        deleted_surplus = surplus.deleted.len(),
        created_surplus = surplus.created.len(),
        "reconciled bucket"
    );
    consolidate(surplus)
}

fn compute_surplus(previous: OccurrenceTable, mut updated: OccurrenceTable) -> Surplus {
    let mut surplus = Surplus::default();

    for (value, mut prev_members) in previous.groups {
        let mut upd_members = updated.take(&value);
        let prev_count = prev_members.len();
        let upd_count = upd_members.len();

        if prev_count > upd_count {
            surplus.deleted.extend(prev_members.split_off(upd_count));
        } else if upd_count > prev_count {
            surplus.created.extend(upd_members.split_off(prev_count));
        }
        if prev_count.min(upd_count) > 0 {
            surplus.matched_values += 1;
        }
    }

    // Values that only exist on the updated side are surplus in full.
    for (_, upd_members) in updated.groups {
        surplus.created.extend(upd_members);
    }

    surplus
}

/// Pair surplus deletions with surplus creations into updates.
///
/// Both sides are paired in canonical value order so the output does not
/// depend on the order elements arrived in.
fn consolidate(mut surplus: Surplus) -> Vec<Element> {
    surplus
        .deleted
        .sort_by_cached_key(|e| canonical(&e.previous_value));
    surplus
        .created
        .sort_by_cached_key(|e| canonical(&e.updated_value));

    let pairs = surplus.deleted.len().min(surplus.created.len());
    let mut out = Vec::with_capacity(surplus.deleted.len().max(surplus.created.len()));

    let mut deleted = surplus.deleted.into_iter();
    let mut created = surplus.created.into_iter();

    for (old, new) in deleted.by_ref().zip(created.by_ref()).take(pairs) {
        out.push(old.into_update(new));
    }
    out.extend(deleted);
    out.extend(created);
    out
}

fn canonical(value: &Option<Value>) -> String {
    value.as_ref().map(Value::to_string).unwrap_or_default()
}
