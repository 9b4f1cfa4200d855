//! Events published by a feed.

use portail_core::DocumentRef;
use portail_core::error::{DecodeError, SubscriptionError};

/// What a UI needs to redraw after a projection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    /// Incremented on every snapshot applied to the projection.
    pub revision: u64,
    pub len: usize,
    /// Whether the placeholder view should be shown.
    pub is_empty: bool,
}

/// A recoverable problem worth showing or logging.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A snapshot entry could not be decoded.
    Decode {
        origin: DocumentRef,
        error: DecodeError,
    },

    /// The listener could not be started or failed.
    Subscription(SubscriptionError),

    /// A delete or update issued against the store failed.
    Store { origin: DocumentRef, message: String },
}

/// Notifications from a feed to its UI.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// The projection was replaced by a snapshot.
    Rendered(RenderState),

    /// A row was removed optimistically.
    Removed { index: usize, origin: DocumentRef },

    Diagnostic(Diagnostic),

    /// The listener ended on the store side; a new bind is required.
    Unbound,
}
