//! Live listener stream trait.

use futures_core::Stream;

use super::Snapshot;
use crate::Result;

/// A live query registration.
///
/// Yields one full [`Snapshot`] per change, starting with the current state.
/// An `Err` item reports a listener failure; nothing further is delivered
/// after it. Dropping the stream releases the registration.
pub trait Listener: Stream<Item = Result<Snapshot>> + Send {}

impl<T> Listener for T where T: Stream<Item = Result<Snapshot>> + Send {}
