//! Per-bucket change detection.
//!
//! A bucket of one element is an unambiguous create or delete. A bucket of
//! one deletion candidate and one creation candidate is the common update
//! case and is compared directly. Everything else goes through the
//! multiset reconciler.

use crate::diff::reconciler::reconcile;
use crate::model::Element;

/// How a bucket is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Empty,
    PassThrough,
    Pair,
    Reconcile,
}

/// Choose the processing route for a bucket.
///
/// Two elements from the same side (two creations or two deletions) are
/// not an update pair; they are reconciled so neither member is lost.
pub fn route(elements: &[Element]) -> Route {
    match elements {
        [] => Route::Empty,
        [_] => Route::PassThrough,
        [a, b] if same_side(a, b) => Route::Reconcile,
        [_, _] => Route::Pair,
        _ => Route::Reconcile,
    }
}

fn same_side(a: &Element, b: &Element) -> bool {
    (a.is_creation_candidate() && b.is_creation_candidate())
        || (a.is_deletion_candidate() && b.is_deletion_candidate())
}

/// Resolve all elements sharing one fqdn into change records.
pub fn detect(elements: Vec<Element>) -> Vec<Element> {
    match route(&elements) {
        Route::Empty => Vec::new(),
        Route::PassThrough => elements,
        Route::Pair => {
            let mut it = elements.into_iter();
            match (it.next(), it.next()) {
                (Some(a), Some(b)) => detect_pair(a, b).into_iter().collect(),
                _ => Vec::new(),
            }
        }
        Route::Reconcile => reconcile(elements),
    }
}

/// Compare a two-element bucket in both directions.
///
/// Arrival order is not guaranteed, so either element may hold the
/// previous side. Equal values produce no record.
pub fn detect_pair(a: Element, b: Element) -> Option<Element> {
    if a.previous_value.is_some() && a.previous_value != b.updated_value {
        return Some(a.into_update(b));
    }
    if b.previous_value.is_some() && b.previous_value != a.updated_value {
        return Some(b.into_update(a));
    }
    None
}
