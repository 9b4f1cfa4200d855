//! Error types for the portail crates.
//!
//! One unified error type with explicit variants for decoding, projection
//! indexing, store operations, live subscriptions and input validation.

use thiserror::Error;

use crate::record::{RawEntry, RecordKind};

/// The unified error type for portail operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A raw entry could not be decoded into a typed record.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Out-of-range access on a projection.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// A create, update or delete against the store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The store reported a listener failure.
    #[error("subscription error: {0}")]
    Subscription(#[from] SubscriptionError),

    /// Input validation errors (identifiers, record fields).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// A raw entry that does not describe a valid record.
///
/// Carries the offending payload so diagnostics can show what the store sent.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot decode {kind} record: {reason}")]
pub struct DecodeError {
    /// The kind of record that was expected.
    pub kind: RecordKind,
    /// Why decoding failed.
    pub reason: String,
    /// The raw payload as delivered.
    pub raw: RawEntry,
}

impl DecodeError {
    pub fn new(kind: RecordKind, reason: impl Into<String>, raw: &RawEntry) -> Self {
        Self {
            kind,
            reason: reason.into(),
            raw: raw.clone(),
        }
    }
}

/// Out-of-range index into a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("index {index} out of range for projection of length {len}")]
pub struct IndexError {
    pub index: usize,
    pub len: usize,
}

/// Failures of store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Filesystem or transport failure.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// The document does not exist.
    #[error("document {path} not found")]
    NotFound { path: String },

    /// A payload could not be serialized or parsed.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// The store is not accepting operations.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

/// Failures of a live listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// The listener could not be registered.
    #[error("listener could not be started: {message}")]
    Start { message: String },

    /// The listener failed after it was registered.
    #[error("listener failed: {message}")]
    Listener { message: String },
}

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    /// Invalid collection name.
    #[error("invalid collection '{value}': {reason}")]
    Collection { value: String, reason: String },

    /// Invalid document id.
    #[error("invalid document id '{value}': {reason}")]
    DocumentId { value: String, reason: String },

    /// Invalid document reference.
    #[error("invalid document reference '{value}': {reason}")]
    DocumentRef { value: String, reason: String },

    /// A record field failed write-time validation.
    #[error("invalid record: {reason}")]
    Record { reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
