//! Local list projection.
//!
//! The ordered, UI-facing list of decoded records together with the
//! reference each one came from. Snapshots replace it wholesale; a local
//! delete truncates a single row without waiting for the store.

use portail_core::DocumentRef;
use portail_core::error::IndexError;

/// A decoded record and the document it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedEntry<D> {
    pub record: D,
    pub origin: DocumentRef,
}

/// Ordered records as last delivered, minus optimistic removals.
///
/// The order is whatever the store delivered; the projection never re-sorts.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection<D> {
    entries: Vec<ProjectedEntry<D>>,
}

impl<D> Default for Projection<D> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<D> Projection<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry at once.
    pub fn replace(&mut self, entries: Vec<ProjectedEntry<D>>) {
        self.entries = entries;
    }

    /// Remove the entry at `index` and return its origin, so the caller can
    /// issue the matching store deletion.
    pub fn remove_at(&mut self, index: usize) -> Result<DocumentRef, IndexError> {
        self.check(index)?;
        Ok(self.entries.remove(index).origin)
    }

    pub fn get(&self, index: usize) -> Result<&ProjectedEntry<D>, IndexError> {
        self.check(index)?;
        Ok(&self.entries[index])
    }

    pub fn entries(&self) -> &[ProjectedEntry<D>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The empty-state signal: true when the placeholder should show.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self, index: usize) -> Result<(), IndexError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(IndexError {
                index,
                len: self.entries.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> ProjectedEntry<String> {
        ProjectedEntry {
            record: id.to_uppercase(),
            origin: DocumentRef::new(format!("news/{}", id)).unwrap(),
        }
    }

    #[test]
    fn replace_keeps_delivery_order() {
        let mut projection = Projection::new();
        let delivered = vec![entry("c"), entry("a"), entry("b")];

        projection.replace(delivered.clone());
        assert_eq!(projection.entries(), delivered.as_slice());
        assert!(!projection.is_empty());

        projection.replace(Vec::new());
        assert!(projection.is_empty());
    }

    #[test]
    fn remove_at_returns_origin() {
        let mut projection = Projection::new();
        projection.replace(vec![entry("a"), entry("b")]);

        let origin = projection.remove_at(0).unwrap();
        assert_eq!(origin.to_string(), "news/a");
        assert_eq!(projection.len(), 1);
        assert_eq!(projection.get(0).unwrap().record, "B");
    }

    #[test]
    fn out_of_range_is_an_index_error() {
        let mut projection: Projection<String> = Projection::new();
        assert_eq!(projection.remove_at(0), Err(IndexError { index: 0, len: 0 }));

        projection.replace(vec![entry("a")]);
        assert_eq!(projection.get(1).unwrap_err(), IndexError { index: 1, len: 1 });
        assert_eq!(projection.len(), 1);
    }

    #[test]
    fn replace_after_remove_is_authoritative() {
        let mut projection = Projection::new();
        projection.replace(vec![entry("a"), entry("b")]);
        projection.remove_at(0).unwrap();

        // The store has not processed the delete yet and still reports "a".
        projection.replace(vec![entry("a"), entry("b")]);
        assert_eq!(projection.len(), 2);
        assert_eq!(projection.get(0).unwrap().origin.to_string(), "news/a");
    }
}
