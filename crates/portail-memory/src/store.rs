//! In-memory store implementation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use portail_core::error::{StoreError, SubscriptionError};
use portail_core::{
    Collection, DocumentId, DocumentRef, QueryDescriptor, RawEntry, Result, Snapshot, Store,
};

use crate::listener::MemoryListener;

/// A registered live query.
#[derive(Debug)]
struct Registration {
    query: QueryDescriptor,
    tx: mpsc::UnboundedSender<Result<Snapshot>>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: BTreeMap<DocumentRef, RawEntry>,
    listeners: Vec<Registration>,
    write_failure: Option<String>,
}

impl Inner {
    fn snapshot(&self, query: &QueryDescriptor) -> Snapshot {
        let documents = self
            .documents
            .iter()
            .filter(|(doc, _)| doc.collection() == query.collection())
            .map(|(doc, raw)| (doc.clone(), raw.clone()));
        Snapshot::new(query.evaluate(documents))
    }

    /// Push a fresh snapshot to every listener of `collection`, pruning
    /// listeners whose stream has been dropped.
    fn notify(&mut self, collection: &Collection) {
        let mut listeners = std::mem::take(&mut self.listeners);
        listeners.retain(|registration| {
            if registration.tx.is_closed() {
                return false;
            }
            if registration.query.collection() != collection {
                return true;
            }
            let snapshot = self.snapshot(&registration.query);
            trace!(query = %registration.query, len = snapshot.len(), "Pushing snapshot");
            registration.tx.send(Ok(snapshot)).is_ok()
        });
        self.listeners = listeners;
    }

    fn check_writable(&self) -> Result<()> {
        match &self.write_failure {
            Some(message) => Err(StoreError::Unavailable {
                message: message.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// A process-local document store.
///
/// Cloning is cheap; clones share the same documents and listeners.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace a document under a caller-chosen reference.
    pub fn put(&self, doc: &DocumentRef, entry: RawEntry) {
        let mut inner = self.lock();
        inner.documents.insert(doc.clone(), entry);
        inner.notify(doc.collection());
    }

    /// Number of listeners whose stream is still alive.
    pub fn listener_count(&self) -> usize {
        let mut inner = self.lock();
        inner.listeners.retain(|registration| !registration.tx.is_closed());
        inner.listeners.len()
    }

    /// Make every later create, update and delete fail with `message`.
    pub fn fail_writes(&self, message: impl Into<String>) {
        self.lock().write_failure = Some(message.into());
    }

    /// Undo [`fail_writes`](Self::fail_writes).
    pub fn restore_writes(&self) {
        self.lock().write_failure = None;
    }

    /// Report a failure to every live listener and drop them.
    pub fn fail_listeners(&self, message: impl Into<String>) {
        let message = message.into();
        let listeners = std::mem::take(&mut self.lock().listeners);
        debug!(count = listeners.len(), %message, "Failing listeners");
        for registration in listeners {
            let _ = registration.tx.send(Err(SubscriptionError::Listener {
                message: message.clone(),
            }
            .into()));
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Listener = MemoryListener;

    #[instrument(skip(self), fields(%query))]
    fn run_query(&self, query: &QueryDescriptor) -> Result<Self::Listener> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut inner = self.lock();
        let snapshot = inner.snapshot(query);
        debug!(len = snapshot.len(), "Registered listener");
        // The receiver is alive until this function returns.
        let _ = tx.send(Ok(snapshot));
        inner.listeners.push(Registration {
            query: query.clone(),
            tx,
        });

        Ok(MemoryListener::new(rx))
    }

    #[instrument(skip(self, entry))]
    async fn create(&self, collection: &Collection, entry: &RawEntry) -> Result<DocumentRef> {
        let mut inner = self.lock();
        inner.check_writable()?;

        let id = DocumentId::new(Uuid::new_v4().simple().to_string())?;
        let doc = DocumentRef::from_parts(collection.clone(), id);
        inner.documents.insert(doc.clone(), entry.clone());
        inner.notify(collection);

        debug!(%doc, "Created document");
        Ok(doc)
    }

    async fn get(&self, doc: &DocumentRef) -> Result<RawEntry> {
        self.lock().documents.get(doc).cloned().ok_or_else(|| {
            StoreError::NotFound {
                path: doc.to_string(),
            }
            .into()
        })
    }

    async fn list(&self, collection: &Collection) -> Result<Vec<(DocumentRef, RawEntry)>> {
        Ok(self
            .lock()
            .documents
            .iter()
            .filter(|(doc, _)| doc.collection() == collection)
            .map(|(doc, raw)| (doc.clone(), raw.clone()))
            .collect())
    }

    #[instrument(skip(self, entry), fields(%doc))]
    async fn update(&self, doc: &DocumentRef, entry: &RawEntry) -> Result<()> {
        let mut inner = self.lock();
        inner.check_writable()?;

        let Some(stored) = inner.documents.get_mut(doc) else {
            return Err(StoreError::NotFound {
                path: doc.to_string(),
            }
            .into());
        };
        *stored = entry.clone();
        inner.notify(doc.collection());

        debug!("Updated document");
        Ok(())
    }

    #[instrument(skip(self), fields(%doc))]
    async fn delete(&self, doc: &DocumentRef) -> Result<()> {
        let mut inner = self.lock();
        inner.check_writable()?;

        if inner.documents.remove(doc).is_some() {
            inner.notify(doc.collection());
            debug!("Deleted document");
        }

        Ok(())
    }
}
