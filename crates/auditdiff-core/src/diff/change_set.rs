//! Diff output: change records plus run statistics.

use crate::errors::Result;
use crate::model::{ChangeKind, Element};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Counters describing one diff invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    /// Elements flattened from the before snapshot
    pub before_elements: usize,
    /// Elements flattened from the after snapshot
    pub after_elements: usize,
    pub buckets: usize,
    /// Buckets routed through multiset reconciliation
    pub reconciled_buckets: usize,
    /// Elements discarded because they had no fqdn
    pub missing_metadata: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl DiffStats {
    pub(crate) fn count_records(&mut self, records: &[Element]) {
        for record in records {
            match record.kind() {
                Some(ChangeKind::Created) => self.created += 1,
                Some(ChangeKind::Updated) => self.updated += 1,
                Some(ChangeKind::Deleted) => self.deleted += 1,
                None => {}
            }
        }
    }
}

/// The named change records detected between two snapshots.
///
/// Records from different fqdns are independent; their order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub records: Vec<Element>,
    pub stats: DiffStats,
}

impl ChangeSet {
    pub fn new(records: Vec<Element>, mut stats: DiffStats) -> Self {
        stats.created = 0;
        stats.updated = 0;
        stats.deleted = 0;
        stats.count_records(&records);
        Self { records, stats }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[Element] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Element> {
        self.records
    }

    /// Records of one kind, in output order.
    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &Element> {
        self.records
            .iter()
            .filter(move |r| r.kind() == Some(kind))
    }

    /// Find the first record at an fqdn.
    pub fn at(&self, fqdn: &str) -> Option<&Element> {
        self.records.iter().find(|r| r.fqdn() == Some(fqdn))
    }

    /// Order-independent SHA-256 digest of the records.
    ///
    /// Each record is serialized to canonical JSON, the encodings are
    /// sorted, and the sorted list is hashed. Two change sets holding the
    /// same records in any order share a fingerprint.
    ///
    /// # Errors
    ///
    /// Returns `AuditDiffError::Serialization` if a record cannot be serialized.
    pub fn fingerprint(&self) -> Result<String> {
        let mut encoded = self
            .records
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        encoded.sort();
        let canonical = serde_json::to_string(&encoded)?;

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn records() -> Vec<Element> {
        vec![
            Element::created(Some("a".into()), "a", Value::from(1i64)),
            Element::deleted(Some("b".into()), "b", Value::from(2i64)),
            Element::deleted(Some("c".into()), "c", Value::from(3i64))
                .with_updated_value(Some(Value::from(4i64))),
        ]
    }

    #[test]
    fn test_stats_count_kinds() {
        let set = ChangeSet::new(records(), DiffStats::default());
        assert_eq!(set.stats.created, 1);
        assert_eq!(set.stats.deleted, 1);
        assert_eq!(set.stats.updated, 1);
        assert_eq!(set.of_kind(ChangeKind::Updated).count(), 1);
        assert_eq!(set.at("b").and_then(Element::kind), Some(ChangeKind::Deleted));
    }

    #[test]
    fn test_fingerprint_ignores_record_order() {
        let forward = ChangeSet::new(records(), DiffStats::default());
        let mut reversed_records = records();
        reversed_records.reverse();
        let reversed = ChangeSet::new(reversed_records, DiffStats::default());

        let fp = forward.fingerprint().unwrap();
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, reversed.fingerprint().unwrap());
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let a = ChangeSet::new(records(), DiffStats::default());
        let mut other = records();
        other.pop();
        let b = ChangeSet::new(other, DiffStats::default());
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }
}
