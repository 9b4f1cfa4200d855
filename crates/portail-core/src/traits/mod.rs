//! Core traits for store backends and their live listeners.

mod listener;
mod snapshot;
mod store;

pub use listener::Listener;
pub use snapshot::{Snapshot, SnapshotEntry};
pub use store::Store;
