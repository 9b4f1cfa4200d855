//! The operations a UI issues against a live feed.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{instrument, warn};

use portail_core::{
    Document, DocumentRef, Event, EventFilter, News, QueryDescriptor, Result, Snapshot, Store,
};

use crate::config::FeedConfig;
use crate::event::{Diagnostic, FeedEvent};
use crate::manager::SubscriptionManager;
use crate::projection::ProjectedEntry;

/// A live list of records of one kind, plus the writes a UI can trigger.
///
/// Failed store writes are returned to the caller and also published as
/// [`Diagnostic::Store`]. An optimistic removal is never rolled back.
pub struct Feed<S: Store, D: Document> {
    manager: SubscriptionManager<S, D>,
}

/// A feed of events.
pub type EventFeed<S> = Feed<S, Event>;

/// A feed of news posts.
pub type NewsFeed<S> = Feed<S, News>;

impl<S: Store, D: Document> Feed<S, D> {
    pub fn new(store: Arc<S>, config: FeedConfig) -> Self {
        Self {
            manager: SubscriptionManager::new(store, config),
        }
    }

    pub fn manager(&self) -> &SubscriptionManager<S, D> {
        &self.manager
    }

    /// Show the results of `query`, replacing the current listener.
    pub fn request_bind(&self, query: QueryDescriptor) -> Result<()> {
        self.manager.bind(query)
    }

    /// Show every record of this feed's kind.
    pub fn request_bind_all(&self) -> Result<()> {
        self.manager.bind(QueryDescriptor::all(D::KIND.collection()))
    }

    /// Stop listening, e.g. when the view goes away.
    pub fn request_stop(&self) {
        self.manager.stop()
    }

    /// Remove the row at `index` locally, then delete it from the store.
    ///
    /// The row is gone from the projection even if the store delete fails.
    #[instrument(skip(self))]
    pub async fn request_local_delete(&self, index: usize) -> Result<DocumentRef> {
        let origin = self.manager.remove_at(index)?;

        if let Err(err) = self.manager.store().delete(&origin).await {
            warn!(%origin, error = %err, "Delete failed");
            self.manager.report(Diagnostic::Store {
                origin: origin.clone(),
                message: err.to_string(),
            });
            return Err(err);
        }

        Ok(origin)
    }

    /// Overwrite the stored document behind row `index` with `record`.
    #[instrument(skip(self, record))]
    pub async fn request_update(&self, index: usize, record: &D) -> Result<()> {
        let origin = self.manager.get(index)?.origin;

        if let Err(err) = self.manager.store().update(&origin, &record.encode()).await {
            warn!(%origin, error = %err, "Update failed");
            self.manager.report(Diagnostic::Store {
                origin,
                message: err.to_string(),
            });
            return Err(err);
        }

        Ok(())
    }

    /// Store a new record. It shows up through the next snapshot.
    pub async fn publish(&self, record: &D) -> Result<DocumentRef> {
        self.manager
            .store()
            .create(&D::KIND.collection(), &record.encode())
            .await
    }

    pub fn current_projection(&self) -> Vec<ProjectedEntry<D>> {
        self.manager.current_projection()
    }

    pub fn is_empty(&self) -> bool {
        self.manager.is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.manager.subscribe()
    }

    pub fn on_snapshot<F>(&self, handler: F)
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.manager.on_snapshot(handler)
    }
}

impl<S: Store> Feed<S, Event> {
    /// Bind the descriptor for `filter`, relative to the current time.
    pub fn select(&self, filter: EventFilter) -> Result<()> {
        self.request_bind(filter.descriptor(Utc::now()))
    }
}
