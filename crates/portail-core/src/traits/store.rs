//! Document store trait.

use async_trait::async_trait;

use super::Listener;
use crate::query::QueryDescriptor;
use crate::record::RawEntry;
use crate::types::{Collection, DocumentRef};
use crate::Result;

/// A document store that can push live query results.
#[async_trait]
pub trait Store: Send + Sync {
    /// Listener stream type for this store.
    type Listener: Listener + 'static;

    /// Register a live listener for `query`.
    ///
    /// The first item is the current result set. Every later change to the
    /// queried collection produces a new full snapshot.
    fn run_query(&self, query: &QueryDescriptor) -> Result<Self::Listener>;

    /// Store a new document and return its reference.
    async fn create(&self, collection: &Collection, entry: &RawEntry) -> Result<DocumentRef>;

    /// Fetch a single document.
    async fn get(&self, doc: &DocumentRef) -> Result<RawEntry>;

    /// List every document of a collection.
    async fn list(&self, collection: &Collection) -> Result<Vec<(DocumentRef, RawEntry)>>;

    /// Replace the payload of an existing document.
    async fn update(&self, doc: &DocumentRef, entry: &RawEntry) -> Result<()>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, doc: &DocumentRef) -> Result<()>;
}
