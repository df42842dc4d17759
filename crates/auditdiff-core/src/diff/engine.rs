//! Synchronous diff orchestration.
//!
//! The core entry point is [`Differ::diff`]: flatten both snapshots, merge
//! them, group by fqdn, detect per bucket, and keep only named records.

use crate::config::DiffConfig;
use crate::diff::bucket::{BucketKey, Buckets};
use crate::diff::change_set::{ChangeSet, DiffStats};
use crate::diff::detector::{detect, route, Route};
use crate::errors::Result;
use crate::flatten::{FlattenOptions, Flattener, JsonFlattener};
use crate::model::{Element, EventType, Value};
use crate::{log_op_end, log_op_error, log_op_start};
use auditdiff_core_types::DiffContext;
use std::time::Instant;

/// Computes change sets between snapshot pairs.
///
/// Holds no per-invocation state; one `Differ` can serve any number of
/// independent `diff` calls.
#[derive(Debug, Clone)]
pub struct Differ<F = JsonFlattener> {
    flattener: F,
    config: DiffConfig,
}

impl Default for Differ<JsonFlattener> {
    fn default() -> Self {
        Self {
            flattener: JsonFlattener,
            config: DiffConfig::default(),
        }
    }
}

impl Differ<JsonFlattener> {
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration fails validation.
    pub fn new(config: DiffConfig) -> Result<Self> {
        Self::with_flattener(JsonFlattener, config)
    }
}

impl<F: Flattener> Differ<F> {
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration fails validation.
    pub fn with_flattener(flattener: F, config: DiffConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { flattener, config })
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Diff two optional snapshots under a fresh correlation context.
    ///
    /// # Errors
    ///
    /// - `BucketCapacityExceeded` if one fqdn collects more elements than
    ///   the configured capacity; no partial output is returned
    /// - any error raised by the flattener
    pub fn diff(&self, before: Option<&Value>, after: Option<&Value>) -> Result<ChangeSet> {
        self.diff_with_context(before, after, &DiffContext::new())
    }

    /// Diff two optional snapshots, tagging lifecycle events with `ctx`.
    ///
    /// # Errors
    ///
    /// See [`Differ::diff`].
    pub fn diff_with_context(
        &self,
        before: Option<&Value>,
        after: Option<&Value>,
        ctx: &DiffContext,
    ) -> Result<ChangeSet> {
        log_op_start!(
            "diff",
            &ctx.diff_id,
            subject = ctx.subject.as_deref().unwrap_or_default()
        );
        let start = Instant::now();

        let change_set = self.diff_impl(before, after).map_err(|e| {
            log_op_error!(
                "diff",
                &ctx.diff_id,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "diff",
            &ctx.diff_id,
            duration_ms = start.elapsed().as_millis() as u64,
            record_count = change_set.len() as u64,
            bucket_count = change_set.stats.buckets as u64
        );
        Ok(change_set)
    }

    fn diff_impl(&self, before: Option<&Value>, after: Option<&Value>) -> Result<ChangeSet> {
        let options = FlattenOptions::from_config(&self.config);
        match (before, after) {
            (None, None) => Ok(ChangeSet::default()),
            (None, Some(after)) => {
                let created = self.flattener.flatten(after, EventType::Created, &options)?;
                let mut stats = DiffStats {
                    after_elements: created.len(),
                    ..DiffStats::default()
                };
                let records = retain_located(created, &mut stats);
                Ok(ChangeSet::new(retain_named(records), stats))
            }
            (Some(before), None) => {
                let deleted = self.flattener.flatten(before, EventType::Deleted, &options)?;
                let mut stats = DiffStats {
                    before_elements: deleted.len(),
                    ..DiffStats::default()
                };
                let records = retain_located(deleted, &mut stats);
                Ok(ChangeSet::new(retain_named(records), stats))
            }
            (Some(before), Some(after)) => {
                let deleted = self.flattener.flatten(before, EventType::Deleted, &options)?;
                let created = self.flattener.flatten(after, EventType::Created, &options)?;
                let mut stats = DiffStats {
                    before_elements: deleted.len(),
                    after_elements: created.len(),
                    ..DiffStats::default()
                };

                let buckets = Buckets::collect(
                    deleted.into_iter().chain(created),
                    self.config.bucket_capacity(),
                )?;
                stats.buckets = buckets.len();

                let mut records = Vec::new();
                for (key, elements) in buckets {
                    records.extend(process_bucket(&key, elements, &mut stats));
                }
                Ok(ChangeSet::new(retain_named(records), stats))
            }
        }
    }
}

/// Run detection for one bucket, updating routing counters.
///
/// The sentinel bucket is counted and discarded without detection.
pub(crate) fn process_bucket(
    key: &BucketKey,
    elements: Vec<Element>,
    stats: &mut DiffStats,
) -> Vec<Element> {
    if key.is_sentinel() {
        tracing::debug!(
            bucket_len = elements.len(),
            "dropping elements without fqdn"
        );
        stats.missing_metadata += elements.len();
        return Vec::new();
    }

    let bucket_route = route(&elements);
    if bucket_route == Route::Reconcile {
        stats.reconciled_buckets += 1;
    }
    tracing::trace!(
        fqdn = key.label(),
        bucket_len = elements.len(),
        route = ?bucket_route,
        "detecting bucket"
    );
    detect(elements)
}

/// Drop elements without an fqdn, counting them as missing metadata.
///
/// Single-sided diffs skip bucketing, so this stands in for the sentinel
/// bucket there.
pub(crate) fn retain_located(elements: Vec<Element>, stats: &mut DiffStats) -> Vec<Element> {
    let before = elements.len();
    let located: Vec<Element> = elements
        .into_iter()
        .filter(|e| e.fqdn().is_some())
        .collect();
    stats.missing_metadata += before - located.len();
    located
}

/// Drop unnamed elements.
pub(crate) fn retain_named(elements: Vec<Element>) -> Vec<Element> {
    elements.into_iter().filter(|e| e.is_named()).collect()
}
