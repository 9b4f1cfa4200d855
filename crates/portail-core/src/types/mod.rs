//! Identifier types for stored documents.
//!
//! These types enforce their format at construction time, so a value that
//! exists is always safe to use as a path segment.

mod collection;
mod document_id;
mod document_ref;

pub use collection::Collection;
pub use document_id::DocumentId;
pub use document_ref::DocumentRef;
