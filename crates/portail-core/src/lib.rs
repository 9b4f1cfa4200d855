//! portail-core - Core bulletin feed types and traits.
//!
//! This crate holds everything the feed engine and the store backends share:
//! the error taxonomy, validated identifiers, the record codec, query
//! descriptors and the [`Store`] trait.

pub mod error;
pub mod query;
pub mod record;
pub mod traits;
pub mod types;

pub use error::Error;
pub use query::{EventFilter, QueryDescriptor};
pub use record::{Document, Event, News, RawEntry, Record, RecordKind};
pub use traits::{Listener, Snapshot, SnapshotEntry, Store};
pub use types::{Collection, DocumentId, DocumentRef};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
