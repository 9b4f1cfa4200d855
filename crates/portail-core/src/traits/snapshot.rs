//! Snapshot notification types.

use serde::{Deserialize, Serialize};

use crate::record::RawEntry;
use crate::types::DocumentRef;

/// One document of a snapshot, in delivery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Reference back to the stored document.
    pub origin: DocumentRef,

    /// The stored payload, undecoded.
    pub raw: RawEntry,
}

/// The complete current result set of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<SnapshotEntry>> for Snapshot {
    fn from(entries: Vec<SnapshotEntry>) -> Self {
        Self { entries }
    }
}
