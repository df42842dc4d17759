use auditdiff_core_types::DiffId;
use thiserror::Error;

/// Result type alias using AuditDiffError
pub type Result<T> = std::result::Result<T, AuditDiffError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on
/// programmatically and that audit publishers can forward verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    InvalidInput,
    InvalidConfig,

    // Resource limits
    /// A single fqdn bucket grew past the configured buffering capacity
    CapacityExceeded,

    // Execution
    Cancelled,

    // Integration/IO
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::CapacityExceeded => "ERR_CAPACITY_EXCEEDED",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a stable classification plus the context needed to locate the
/// failure: the operation, the offending path and the diff invocation id.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    fqdn: Option<String>,
    diff_id: Option<DiffId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            fqdn: None,
            diff_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add path context
    pub fn with_fqdn(mut self, fqdn: impl Into<String>) -> Self {
        self.fqdn = Some(fqdn.into());
        self
    }

    /// Add diff invocation context
    pub fn with_diff_id(mut self, diff_id: DiffId) -> Self {
        self.diff_id = Some(diff_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the path context, if any
    pub fn fqdn(&self) -> Option<&str> {
        self.fqdn.as_deref()
    }

    /// Get the diff invocation id, if any
    pub fn diff_id(&self) -> Option<&DiffId> {
        self.diff_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(fqdn) = &self.fqdn {
            write!(f, " (fqdn: {})", fqdn)?;
        }
        if let Some(diff_id) = &self.diff_id {
            write!(f, " (diff_id: {})", diff_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for diff operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuditDiffError {
    /// A bucket holds more elements than the buffering capacity allows
    #[error("Bucket '{fqdn}' holds {len} elements, capacity is {capacity}")]
    BucketCapacityExceeded {
        fqdn: String,
        len: usize,
        capacity: usize,
    },

    /// Configuration failed validation or could not be parsed
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Snapshot input could not be interpreted
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    /// The diff invocation was aborted before completion
    #[error("Diff cancelled")]
    Cancelled,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from AuditDiffError to ExError
impl From<AuditDiffError> for ExError {
    fn from(err: AuditDiffError) -> Self {
        match err {
            AuditDiffError::BucketCapacityExceeded {
                fqdn,
                len,
                capacity,
            } => ExError::new(ExErrorKind::CapacityExceeded)
                .with_op("collect_bucket")
                .with_fqdn(fqdn)
                .with_message(format!(
                    "bucket holds {} elements, capacity is {}",
                    len, capacity
                )),

            AuditDiffError::InvalidConfig { message } => ExError::new(ExErrorKind::InvalidConfig)
                .with_op("load_config")
                .with_message(message),

            AuditDiffError::InvalidInput { message } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }

            AuditDiffError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            AuditDiffError::Io { message } => ExError::new(ExErrorKind::Io).with_message(message),

            AuditDiffError::Cancelled => {
                ExError::new(ExErrorKind::Cancelled).with_message("Diff cancelled")
            }

            AuditDiffError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to AuditDiffError
impl From<serde_json::Error> for AuditDiffError {
    fn from(err: serde_json::Error) -> Self {
        AuditDiffError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AuditDiffError {
    fn from(err: std::io::Error) -> Self {
        AuditDiffError::Io {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for AuditDiffError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            AuditDiffError::Cancelled
        } else {
            AuditDiffError::Internal {
                message: format!("diff task panicked: {}", err),
            }
        }
    }
}
