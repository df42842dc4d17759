//! Diff configuration.
//!
//! Loaded from TOML or JSON (chosen by file extension), then optionally
//! overridden from `AUDITDIFF_*` environment variables. Keys are snake_case;
//! the camelCase spellings (`maxElements`, `ignoreCollectionOrder`) are
//! accepted as aliases.

use crate::errors::{AuditDiffError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Expected elements per path when `max_elements` is not configured.
pub const DEFAULT_MAX_ELEMENTS: usize = 1000;

pub const DEFAULT_WORKERS: usize = 4;

pub const ENV_MAX_ELEMENTS: &str = "AUDITDIFF_MAX_ELEMENTS";
pub const ENV_IGNORE_ORDER: &str = "AUDITDIFF_IGNORE_COLLECTION_ORDER";
pub const ENV_ID_FIELDS: &str = "AUDITDIFF_ID_FIELDS";
pub const ENV_ROOT_TYPE_NAME: &str = "AUDITDIFF_ROOT_TYPE_NAME";
pub const ENV_WORKERS: &str = "AUDITDIFF_WORKERS";

/// Order-independent collection matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IgnoreCollectionOrder {
    pub enabled: bool,
    /// Member fields used to tell collection members apart
    pub fields: Vec<String>,
}

impl Default for IgnoreCollectionOrder {
    fn default() -> Self {
        Self {
            enabled: false,
            fields: vec!["id".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Expected maximum elements per path; bucket capacity is twice this
    #[serde(alias = "maxElements")]
    pub max_elements: Option<usize>,
    #[serde(alias = "ignoreCollectionOrder")]
    pub ignore_collection_order: IgnoreCollectionOrder,
    /// Prefix for every fqdn; empty means paths start at the first field
    #[serde(alias = "rootTypeName")]
    pub root_type_name: String,
    /// Bucket worker permits for the concurrent differ
    pub workers: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_elements: None,
            ignore_collection_order: IgnoreCollectionOrder::default(),
            root_type_name: String::new(),
            workers: DEFAULT_WORKERS,
        }
    }
}

impl DiffConfig {
    /// Enable order-independent matching with the given identifier fields.
    pub fn with_ignored_collection_order<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_collection_order = IgnoreCollectionOrder {
            enabled: true,
            fields: fields.into_iter().map(Into::into).collect(),
        };
        self
    }

    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = Some(max_elements);
        self
    }

    pub fn with_root_type_name(mut self, root_type_name: impl Into<String>) -> Self {
        self.root_type_name = root_type_name.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Maximum number of elements buffered for a single fqdn.
    pub fn bucket_capacity(&self) -> usize {
        self.max_elements
            .unwrap_or(DEFAULT_MAX_ELEMENTS)
            .saturating_mul(2)
    }

    /// # Errors
    ///
    /// `InvalidConfig` when `max_elements` or `workers` is zero, or an
    /// identifier field name is blank.
    pub fn validate(&self) -> Result<()> {
        if self.max_elements == Some(0) {
            return Err(invalid("max_elements must be greater than zero"));
        }
        if self.workers == 0 {
            return Err(invalid("workers must be greater than zero"));
        }
        if self
            .ignore_collection_order
            .fields
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err(invalid("identifier field names must not be blank"));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// `InvalidConfig` if the text is not valid TOML for this schema or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DiffConfig =
            toml::from_str(content).map_err(|e| invalid(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `InvalidConfig` if the text is not valid JSON for this schema or fails validation.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: DiffConfig = serde_json::from_str(content)
            .map_err(|e| invalid(format!("JSON parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, choosing the format from its extension.
    ///
    /// # Errors
    ///
    /// - `Io` if the file cannot be read
    /// - `InvalidConfig` for an unknown extension or invalid content
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AuditDiffError::Io {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(invalid(format!(
                "unsupported config extension: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// Apply `AUDITDIFF_*` overrides from an arbitrary lookup.
    ///
    /// `AUDITDIFF_ID_FIELDS` is a comma-separated list.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if an override cannot be parsed or the result fails validation.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_ELEMENTS) {
            self.max_elements = Some(parse_usize(ENV_MAX_ELEMENTS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_IGNORE_ORDER) {
            self.ignore_collection_order.enabled = parse_bool(ENV_IGNORE_ORDER, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ID_FIELDS) {
            self.ignore_collection_order.fields =
                raw.split(',').map(|f| f.trim().to_string()).collect();
        }
        if let Some(raw) = lookup(ENV_ROOT_TYPE_NAME) {
            self.root_type_name = raw;
        }
        if let Some(raw) = lookup(ENV_WORKERS) {
            self.workers = parse_usize(ENV_WORKERS, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// See [`DiffConfig::apply_overrides`].
    pub fn with_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }
}

fn invalid(message: impl Into<String>) -> AuditDiffError {
    AuditDiffError::InvalidConfig {
        message: message.into(),
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(format!("{} must be a non-negative integer, got '{}'", key, raw)))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(format!("{} must be a boolean, got '{}'", key, raw))),
    }
}
