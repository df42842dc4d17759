//! Diff command

use auditdiff_core::auditdiff_core_types::DiffContext;
use auditdiff_core::diff::render_human_summary;
use auditdiff_core::{ChangeSet, DiffConfig, DiffStats, Differ, Element, Value};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Before snapshot (JSON); omitted means the object did not exist
    #[arg(long)]
    pub before: Option<PathBuf>,

    /// After snapshot (JSON); omitted means the object was removed
    #[arg(long)]
    pub after: Option<PathBuf>,

    /// Config file (.toml or .json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Treat collections as unordered
    #[arg(long)]
    pub ignore_order: bool,

    /// Identifier field for unordered collection members (repeatable)
    #[arg(long = "id-field")]
    pub id_fields: Vec<String>,

    #[arg(long)]
    pub root_type: Option<String>,

    /// Correlation subject recorded in logs
    #[arg(long)]
    pub subject: Option<String>,

    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct DiffOutput<'a> {
    diff_id: &'a str,
    records: &'a [Element],
    stats: &'a DiffStats,
    fingerprint: String,
}

pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&args)?;
    let before = args.before.as_deref().map(read_snapshot).transpose()?;
    let after = args.after.as_deref().map(read_snapshot).transpose()?;

    let mut ctx = DiffContext::new();
    if let Some(subject) = args.subject.clone() {
        ctx = ctx.with_subject(subject);
    }

    let differ = Differ::new(config)?;
    let change_set = differ.diff_with_context(before.as_ref(), after.as_ref(), &ctx)?;

    match args.format {
        OutputFormat::Json => print_json(&change_set, &ctx)?,
        OutputFormat::Text => print!("{}", render_human_summary(&change_set)),
    }
    Ok(())
}

/// Defaults, then the config file, then `AUDITDIFF_*` variables, then flags.
fn resolve_config(args: &DiffArgs) -> Result<DiffConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => DiffConfig::load(path)?,
        None => DiffConfig::default(),
    }
    .with_env_overrides()?;

    if args.ignore_order {
        config.ignore_collection_order.enabled = true;
    }
    if !args.id_fields.is_empty() {
        config.ignore_collection_order.fields = args.id_fields.clone();
    }
    if let Some(root_type) = &args.root_type {
        config.root_type_name = root_type.clone();
    }
    config.validate()?;
    Ok(config)
}

fn read_snapshot(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read snapshot {}: {}", path.display(), e))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))?;
    Ok(Value::from(json))
}

fn print_json(change_set: &ChangeSet, ctx: &DiffContext) -> Result<(), Box<dyn std::error::Error>> {
    let output = DiffOutput {
        diff_id: ctx.diff_id.as_str(),
        records: change_set.records(),
        stats: &change_set.stats,
        fingerprint: change_set.fingerprint()?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    tracing::debug!(records = change_set.len(), "wrote change set");
    Ok(())
}
