//! In-memory event capture for logging assertions
//!
//! Installs one global subscriber per test binary. Tests share it, so
//! assertions should narrow events by operation or by diff id.

use auditdiff_core_types::schema::{FIELD_DIFF_ID, FIELD_EVENT, FIELD_OP};
use auditdiff_core_types::DiffId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One recorded event, fields rendered as strings
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn op(&self) -> Option<&str> {
        self.field(FIELD_OP)
    }

    /// Lifecycle marker: `start`, `end` or `end_error`
    pub fn event(&self) -> Option<&str> {
        self.field(FIELD_EVENT)
    }

    pub fn diff_id(&self) -> Option<&str> {
        self.field(FIELD_DIFF_ID)
    }

    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op() == Some(op) && self.event() == Some(event)
    }
}

struct FieldRecorder<'a>(&'a mut BTreeMap<String, String>);

impl Visit for FieldRecorder<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

type EventLog = Arc<Mutex<Vec<CapturedEvent>>>;

struct CaptureLayer {
    log: EventLog,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        event.record(&mut FieldRecorder(&mut fields));
        lock(&self.log).push(CapturedEvent {
            level: *event.metadata().level(),
            fields,
        });
    }
}

fn lock(log: &EventLog) -> MutexGuard<'_, Vec<CapturedEvent>> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared handle onto the captured events
#[derive(Clone)]
pub struct TestCapture {
    log: EventLog,
}

impl TestCapture {
    /// Snapshot of every captured event, in emission order
    pub fn events(&self) -> Vec<CapturedEvent> {
        lock(&self.log).clone()
    }

    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.matching(|e| e.op() == Some(op))
    }

    /// Lifecycle events of one diff invocation, in emission order
    pub fn lifecycle(&self, diff_id: &DiffId) -> Vec<CapturedEvent> {
        self.matching(|e| e.diff_id() == Some(diff_id.as_str()))
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        lock(&self.log).iter().filter(|e| predicate(e)).count()
    }

    /// # Panics
    ///
    /// Panics if no event with this operation and lifecycle marker was captured.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let seen = self.count_events(|e| e.is(op, event));
        assert!(seen > 0, "no captured event with op={} event={}", op, event);
    }

    fn matching<F>(&self, predicate: F) -> Vec<CapturedEvent>
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        lock(&self.log)
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }
}

static CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture subscriber on first call and return its handle
///
/// # Example
///
/// ```
/// use auditdiff_core::auditdiff_core_types::DiffId;
/// use auditdiff_core::log_op_start;
/// use auditdiff_core::logging_facility::test_capture::init_test_capture;
///
/// let capture = init_test_capture();
/// let diff_id = DiffId::new();
/// log_op_start!("doc_operation", &diff_id);
/// assert_eq!(capture.lifecycle(&diff_id).len(), 1);
/// ```
pub fn init_test_capture() -> TestCapture {
    CAPTURE
        .get_or_init(|| {
            let capture = TestCapture {
                log: Arc::new(Mutex::new(Vec::new())),
            };
            let layer = CaptureLayer {
                log: Arc::clone(&capture.log),
            };
            tracing_subscriber::registry().with(layer).init();
            capture
        })
        .clone()
}
