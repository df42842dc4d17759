//! Lifecycle logging macros for diff invocations
//!
//! Every event carries the operation name and the invocation's `DiffId`, so
//! start, end and error lines of one diff can be joined downstream. Extra
//! fields follow as a `tracing` field list.

/// Log the start of a diff operation
///
/// # Example
///
/// ```
/// # use auditdiff_core::log_op_start;
/// # use auditdiff_core::auditdiff_core_types::DiffId;
/// let diff_id = DiffId::new();
/// log_op_start!("diff", &diff_id);
/// log_op_start!("diff", &diff_id, subject = "order:42");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr, $diff_id:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::auditdiff_core_types::schema::EVENT_START,
            diff_id = $crate::auditdiff_core_types::DiffId::as_str($diff_id)
        )
    };
    ($op:expr, $diff_id:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::auditdiff_core_types::schema::EVENT_START,
            diff_id = $crate::auditdiff_core_types::DiffId::as_str($diff_id),
            $($field)*
        )
    };
}

/// Log the successful end of a diff operation
///
/// # Example
///
/// ```
/// # use auditdiff_core::log_op_end;
/// # use auditdiff_core::auditdiff_core_types::DiffId;
/// let diff_id = DiffId::new();
/// log_op_end!("diff", &diff_id, duration_ms = 42u64, record_count = 3u64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, $diff_id:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::auditdiff_core_types::schema::EVENT_END,
            diff_id = $crate::auditdiff_core_types::DiffId::as_str($diff_id),
            duration_ms = $duration
        )
    };
    ($op:expr, $diff_id:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::auditdiff_core_types::schema::EVENT_END,
            diff_id = $crate::auditdiff_core_types::DiffId::as_str($diff_id),
            duration_ms = $duration,
            $($field)*
        )
    };
}

/// Log a failed diff operation
///
/// The error is converted into an [`ExError`](crate::errors::ExError) tagged
/// with the diff id; its code, kind, path and rendered form are logged.
///
/// # Example
///
/// ```
/// # use auditdiff_core::{log_op_error, errors::AuditDiffError};
/// # use auditdiff_core::auditdiff_core_types::DiffId;
/// let diff_id = DiffId::new();
/// log_op_error!("diff", &diff_id, AuditDiffError::Cancelled, duration_ms = 10u64);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $diff_id:expr, $err:expr, duration_ms = $duration:expr) => {{
        let diff_id: &$crate::auditdiff_core_types::DiffId = $diff_id;
        let ex_err = $crate::errors::ExError::from($err).with_diff_id(diff_id.clone());
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::auditdiff_core_types::schema::EVENT_END_ERROR,
            diff_id = diff_id.as_str(),
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            fqdn = ex_err.fqdn().unwrap_or_default(),
            error = %ex_err
        )
    }};
    ($op:expr, $diff_id:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let diff_id: &$crate::auditdiff_core_types::DiffId = $diff_id;
        let ex_err = $crate::errors::ExError::from($err).with_diff_id(diff_id.clone());
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::auditdiff_core_types::schema::EVENT_END_ERROR,
            diff_id = diff_id.as_str(),
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            fqdn = ex_err.fqdn().unwrap_or_default(),
            error = %ex_err,
            $($field)*
        )
    }};
}
