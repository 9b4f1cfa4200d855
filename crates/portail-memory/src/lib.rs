//! portail-memory - In-memory document store.
//!
//! Keeps every document in a map and pushes full snapshots to its listeners
//! on each write. Used as the substitutable backend in tests, and anywhere a
//! process-local store is enough.

mod listener;
mod store;

pub use listener::MemoryListener;
pub use store::MemoryStore;
