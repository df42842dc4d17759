//! Grouping of elements by fqdn.
//!
//! Buckets are fully materialised before detection runs: the reconciler
//! needs complete membership counts. Each bucket is capped at the configured
//! capacity and overflow fails the diff instead of truncating it.

use crate::errors::{AuditDiffError, Result};
use crate::model::Element;
use std::collections::HashMap;

/// Label of the sentinel bucket holding elements without an fqdn.
pub const MISSING_METADATA_BUCKET: &str = "missingMetadata";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketKey {
    Path(String),
    /// Elements without an fqdn; never reported
    MissingMetadata,
}

impl BucketKey {
    pub fn of(element: &Element) -> Self {
        match element.fqdn() {
            Some(fqdn) => BucketKey::Path(fqdn.to_string()),
            None => BucketKey::MissingMetadata,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BucketKey::Path(fqdn) => fqdn,
            BucketKey::MissingMetadata => MISSING_METADATA_BUCKET,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, BucketKey::MissingMetadata)
    }
}

/// Elements grouped by fqdn, in first-seen order.
#[derive(Debug)]
pub struct Buckets {
    entries: Vec<(BucketKey, Vec<Element>)>,
    index: HashMap<BucketKey, usize>,
    capacity: usize,
}

impl Buckets {
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            capacity,
        }
    }

    /// Group a merged element stream.
    ///
    /// # Errors
    ///
    /// `BucketCapacityExceeded` as soon as any bucket outgrows `capacity`.
    pub fn collect<I>(elements: I, capacity: usize) -> Result<Self>
    where
        I: IntoIterator<Item = Element>,
    {
        let mut buckets = Self::with_capacity_limit(capacity);
        for element in elements {
            buckets.push(element)?;
        }
        Ok(buckets)
    }

    /// # Errors
    ///
    /// `BucketCapacityExceeded` if the element's bucket is already full.
    pub fn push(&mut self, element: Element) -> Result<()> {
        let key = BucketKey::of(&element);
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.index.insert(key.clone(), slot);
                self.entries.push((key, Vec::new()));
                slot
            }
        };

        let (key, members) = &mut self.entries[slot];
        if members.len() >= self.capacity {
            return Err(AuditDiffError::BucketCapacityExceeded {
                fqdn: key.label().to_string(),
                len: members.len() + 1,
                capacity: self.capacity,
            });
        }
        members.push(element);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &[Element])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

impl IntoIterator for Buckets {
    type Item = (BucketKey, Vec<Element>);
    type IntoIter = std::vec::IntoIter<(BucketKey, Vec<Element>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
