//! portail-file - Filesystem-backed document store.
//!
//! Layout under the store root:
//!
//! ```text
//! collections/<collection>/<id>.json   one document per file
//! changes.jsonl                        append-only change log
//! changes.lock                         writer lock for the log
//! ```
//!
//! Listeners tail the change log (file watching, with a polling fallback)
//! and push a fresh full snapshot whenever their collection changes, so
//! several processes can share one store directory.

mod changes;
mod listener;
mod store;

pub use listener::FileListener;
pub use store::FileStore;
