//! Concurrent diff orchestration on tokio.
//!
//! Same semantics as [`Differ`](crate::diff::Differ) with two sources of
//! parallelism: both snapshots are flattened on concurrent blocking tasks,
//! and materialised buckets are detected on a `JoinSet` bounded by a
//! semaphore of `workers` permits.
//!
//! Output is all-or-nothing. The first failing bucket fails the call, and
//! dropping the returned future aborts bucket tasks that have not started.

use crate::config::DiffConfig;
use crate::diff::bucket::Buckets;
use crate::diff::change_set::{ChangeSet, DiffStats};
use crate::diff::engine::{process_bucket, retain_located, retain_named};
use crate::errors::{AuditDiffError, Result};
use crate::flatten::{FlattenOptions, Flattener, JsonFlattener};
use crate::model::{Element, EventType, Value};
use crate::{log_op_end, log_op_error, log_op_start};
use auditdiff_core_types::DiffContext;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug)]
pub struct ConcurrentDiffer<F = JsonFlattener> {
    flattener: Arc<F>,
    config: Arc<DiffConfig>,
}

impl<F> Clone for ConcurrentDiffer<F> {
    fn clone(&self) -> Self {
        Self {
            flattener: Arc::clone(&self.flattener),
            config: Arc::clone(&self.config),
        }
    }
}

impl ConcurrentDiffer<JsonFlattener> {
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration fails validation.
    pub fn new(config: DiffConfig) -> Result<Self> {
        Self::with_flattener(JsonFlattener, config)
    }
}

impl<F: Flattener + 'static> ConcurrentDiffer<F> {
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration fails validation.
    pub fn with_flattener(flattener: F, config: DiffConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            flattener: Arc::new(flattener),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// # Errors
    ///
    /// - `BucketCapacityExceeded` if one fqdn outgrows the bucket capacity
    /// - `Cancelled` if a task was aborted underneath the call
    /// - any error raised by the flattener
    pub async fn diff(&self, before: Option<Value>, after: Option<Value>) -> Result<ChangeSet> {
        self.diff_with_context(before, after, &DiffContext::new()).await
    }

    /// # Errors
    ///
    /// See [`ConcurrentDiffer::diff`].
    pub async fn diff_with_context(
        &self,
        before: Option<Value>,
        after: Option<Value>,
        ctx: &DiffContext,
    ) -> Result<ChangeSet> {
        log_op_start!(
            "diff_concurrent",
            &ctx.diff_id,
            workers = self.config.workers as u64
        );
        let start = Instant::now();

        let change_set = match self.diff_impl(before, after).await {
            Ok(change_set) => change_set,
            Err(e) => {
                log_op_error!(
                    "diff_concurrent",
                    &ctx.diff_id,
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                return Err(e);
            }
        };

        log_op_end!(
            "diff_concurrent",
            &ctx.diff_id,
            duration_ms = start.elapsed().as_millis() as u64,
            record_count = change_set.len() as u64,
            bucket_count = change_set.stats.buckets as u64
        );
        Ok(change_set)
    }

    async fn diff_impl(&self, before: Option<Value>, after: Option<Value>) -> Result<ChangeSet> {
        match (before, after) {
            (None, None) => Ok(ChangeSet::default()),
            (None, Some(after)) => {
                let created = self.flatten_blocking(after, EventType::Created).await?;
                let mut stats = DiffStats {
                    after_elements: created.len(),
                    ..DiffStats::default()
                };
                let records = retain_located(created, &mut stats);
                Ok(ChangeSet::new(retain_named(records), stats))
            }
            (Some(before), None) => {
                let deleted = self.flatten_blocking(before, EventType::Deleted).await?;
                let mut stats = DiffStats {
                    before_elements: deleted.len(),
                    ..DiffStats::default()
                };
                let records = retain_located(deleted, &mut stats);
                Ok(ChangeSet::new(retain_named(records), stats))
            }
            (Some(before), Some(after)) => {
                let (deleted, created) = tokio::try_join!(
                    self.flatten_blocking(before, EventType::Deleted),
                    self.flatten_blocking(after, EventType::Created),
                )?;
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

                let records = self.detect_buckets(buckets, &mut stats).await?;
                Ok(ChangeSet::new(retain_named(records), stats))
            }
        }
    }

    async fn flatten_blocking(&self, node: Value, event_type: EventType) -> Result<Vec<Element>> {
        let flattener = Arc::clone(&self.flattener);
        let config = Arc::clone(&self.config);
        tokio::task::spawn_blocking(move || {
            let options = FlattenOptions::from_config(&config);
            flattener.flatten(&node, event_type, &options)
        })
        .await?
    }

    /// Detect every bucket with at most `workers` running at once.
    ///
    /// Results are reassembled in bucket order so output matches the
    /// synchronous differ.
    async fn detect_buckets(
        &self,
        buckets: Buckets,
        stats: &mut DiffStats,
    ) -> Result<Vec<Element>> {
        let permits = Arc::new(Semaphore::new(self.config.workers));
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<(Vec<Element>, DiffStats)>> = Vec::new();

        for (slot, (key, elements)) in buckets.into_iter().enumerate() {
            slots.push(None);
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|_| AuditDiffError::Cancelled)?;
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let mut bucket_stats = DiffStats::default();
                let records = process_bucket(&key, elements, &mut bucket_stats);
                (slot, records, bucket_stats)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (slot, records, bucket_stats) = joined?;
            slots[slot] = Some((records, bucket_stats));
        }

        let mut records = Vec::new();
        for (bucket_records, bucket_stats) in slots.into_iter().flatten() {
            stats.reconciled_buckets += bucket_stats.reconciled_buckets;
            stats.missing_metadata += bucket_stats.missing_metadata;
            records.extend(bucket_records);
        }
        Ok(records)
    }
}
