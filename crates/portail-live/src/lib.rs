//! portail-live - Live bulletin feeds.
//!
//! A [`SubscriptionManager`] owns at most one live listener against a
//! [`Store`](portail_core::Store), decodes every snapshot it delivers and
//! keeps a [`Projection`] of typed records in step with it. [`Feed`] wraps a
//! manager with the operations a UI issues: bind a filter, stop, delete or
//! update a row, publish a new record.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use portail_core::{Event, EventFilter};
//! use portail_live::{Feed, FeedConfig, FeedEvent};
//! use portail_memory::MemoryStore;
//!
//! # async fn example() -> portail_core::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let feed: Feed<MemoryStore, Event> = Feed::new(store, FeedConfig::default());
//! let mut events = feed.subscribe();
//! feed.select(EventFilter::Upcoming)?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let FeedEvent::Rendered(state) = event {
//!         println!("{} upcoming events", state.len);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod event;
pub mod feed;
pub mod manager;
pub mod projection;

pub use config::{DecodePolicy, FeedConfig};
pub use event::{Diagnostic, FeedEvent, RenderState};
pub use feed::{EventFeed, Feed, NewsFeed};
pub use manager::SubscriptionManager;
pub use projection::{ProjectedEntry, Projection};
