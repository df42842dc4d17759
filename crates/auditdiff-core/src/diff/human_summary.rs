//! Human-readable summary renderer for change sets.

use crate::diff::change_set::ChangeSet;
use crate::model::{ChangeKind, Element, Value};

/// Render a Markdown summary of a [`ChangeSet`].
///
/// Records are listed per kind and sorted by fqdn within each section so
/// that the text is stable regardless of bucket order. Informational only.
pub fn render_human_summary(change_set: &ChangeSet) -> String {
    let mut out = String::new();

    out.push_str("## Change Summary\n\n");
    let stats = &change_set.stats;
    out.push_str(&format!(
        "**Records**: {}  \n**Created**: {} | **Updated**: {} | **Deleted**: {}\n\n",
        change_set.len(),
        stats.created,
        stats.updated,
        stats.deleted
    ));

    if change_set.is_empty() {
        out.push_str("_No changes detected._\n");
        return out;
    }

    for kind in [ChangeKind::Updated, ChangeKind::Created, ChangeKind::Deleted] {
        let mut records: Vec<&Element> = change_set.of_kind(kind).collect();
        if records.is_empty() {
            continue;
        }
        records.sort_by(|a, b| a.fqdn().cmp(&b.fqdn()));

        out.push_str(&format!("### {}\n\n", section_title(kind)));
        for record in records {
            out.push_str(&render_line(kind, record));
        }
        out.push('\n');
    }

    if stats.reconciled_buckets > 0 {
        out.push_str(&format!(
            "_{} unordered collection path(s) reconciled by value count._\n",
            stats.reconciled_buckets
        ));
    }

    out
}

fn section_title(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Created => "Created",
        ChangeKind::Updated => "Updated",
        ChangeKind::Deleted => "Deleted",
    }
}

fn render_line(kind: ChangeKind, record: &Element) -> String {
    let path = record.fqdn().unwrap_or_default();
    match kind {
        ChangeKind::Updated => format!(
            "- `{}`: {} → {}\n",
            path,
            show(&record.previous_value),
            show(&record.updated_value)
        ),
        ChangeKind::Created => format!("- `{}`: {}\n", path, show(&record.updated_value)),
        ChangeKind::Deleted => format!("- `{}`: {}\n", path, show(&record.previous_value)),
    }
}

fn show(value: &Option<Value>) -> String {
    match value {
        Some(v) => format!("`{}`", v),
        None => "_absent_".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::change_set::DiffStats;

    #[test]
    fn test_empty_summary() {
        let text = render_human_summary(&ChangeSet::default());
        assert!(text.contains("_No changes detected._"));
    }

    #[test]
    fn test_update_line() {
        let record = Element::deleted(Some("age".into()), "age", Value::from(30i64))
            .with_updated_value(Some(Value::from(31i64)));
        let set = ChangeSet::new(vec![record], DiffStats::default());
        let text = render_human_summary(&set);
        assert!(text.contains("### Updated"));
        assert!(text.contains("- `age`: `30` → `31`"));
        assert!(!text.contains("### Created"));
    }

    #[test]
    fn test_sections_sorted_by_path() {
        let set = ChangeSet::new(
            vec![
                Element::created(Some("z".into()), "z", Value::from("1")),
                Element::created(Some("a".into()), "a", Value::from("2")),
            ],
            DiffStats::default(),
        );
        let text = render_human_summary(&set);
        let a = text.find("- `a`").unwrap();
        let z = text.find("- `z`").unwrap();
        assert!(a < z);
    }
}
