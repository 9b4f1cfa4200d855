//! Live query subscription manager.
//!
//! Owns at most one listener at a time. Every bind bumps a generation
//! counter and the listener task carries the generation it was started
//! with; a notification is only applied while that generation is still the
//! active one. Releasing a listener aborts its task, and anything it had in
//! flight fails the generation check.
//!
//! All state (active listener, projection, handlers) sits behind a single
//! mutex, so a bind, a stop, a local removal and a notification never
//! interleave.

use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use portail_core::error::SubscriptionError;
use portail_core::{
    Document, DocumentRef, Error, Listener, QueryDescriptor, Result, Snapshot, Store,
};

use crate::config::{DecodePolicy, FeedConfig};
use crate::event::{Diagnostic, FeedEvent, RenderState};
use crate::projection::{ProjectedEntry, Projection};

/// Callback invoked with every raw snapshot delivered by the active listener.
type SnapshotHandler = Arc<dyn Fn(&Snapshot) + Send + Sync>;

struct ActiveListener {
    generation: u64,
    query: QueryDescriptor,
    task: JoinHandle<()>,
}

struct State<D> {
    generation: u64,
    active: Option<ActiveListener>,
    projection: Projection<D>,
    handlers: Vec<SnapshotHandler>,
    revision: u64,
}

impl<D> State<D> {
    fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }

    /// Stop delivery from the active listener, if any.
    fn release(&mut self) -> Option<QueryDescriptor> {
        let active = self.active.take()?;
        active.task.abort();
        Some(active.query)
    }
}

struct Shared<D> {
    state: Mutex<State<D>>,
    events: broadcast::Sender<FeedEvent>,
    config: FeedConfig,
}

impl<D: Document> Shared<D> {
    fn lock(&self) -> MutexGuard<'_, State<D>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: FeedEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Handle one item from the listener started as `generation`.
    ///
    /// Returns false once the listener should stop reading.
    fn deliver(&self, generation: u64, item: Result<Snapshot>) -> bool {
        let mut state = self.lock();
        if !state.is_current(generation) {
            trace!(generation, "Discarding notification from released listener");
            return false;
        }

        match item {
            Ok(snapshot) => {
                self.apply(&mut state, &snapshot);
                true
            }
            Err(err) => {
                warn!(generation, error = %err, "Listener failed");
                state.active = None;
                let error = match err {
                    Error::Subscription(error) => error,
                    other => SubscriptionError::Listener {
                        message: other.to_string(),
                    },
                };
                self.emit(FeedEvent::Diagnostic(Diagnostic::Subscription(error)));
                self.emit(FeedEvent::Unbound);
                false
            }
        }
    }

    /// The store closed the listener without an error.
    fn closed(&self, generation: u64) {
        let mut state = self.lock();
        if state.is_current(generation) {
            debug!(generation, "Listener closed by store");
            state.active = None;
            self.emit(FeedEvent::Unbound);
        }
    }

    fn apply(&self, state: &mut State<D>, snapshot: &Snapshot) {
        for handler in &state.handlers {
            handler(snapshot);
        }

        let mut entries = Vec::with_capacity(snapshot.len());
        let mut rejected = false;

        for entry in &snapshot.entries {
            match D::decode(Some(entry.origin.id().clone()), &entry.raw) {
                Ok(record) => entries.push(ProjectedEntry {
                    record,
                    origin: entry.origin.clone(),
                }),
                Err(error) => {
                    warn!(origin = %entry.origin, %error, "Undecodable entry");
                    rejected = self.config.decode_policy == DecodePolicy::Reject;
                    self.emit(FeedEvent::Diagnostic(Diagnostic::Decode {
                        origin: entry.origin.clone(),
                        error,
                    }));
                    if rejected {
                        break;
                    }
                }
            }
        }

        if rejected {
            warn!(len = snapshot.len(), "Snapshot rejected, projection unchanged");
            return;
        }

        state.projection.replace(entries);
        state.revision += 1;

        let render = RenderState {
            revision: state.revision,
            len: state.projection.len(),
            is_empty: state.projection.is_empty(),
        };
        debug!(revision = render.revision, len = render.len, "Projection replaced");
        self.emit(FeedEvent::Rendered(render));
    }
}

async fn listen<D, L>(shared: Arc<Shared<D>>, generation: u64, listener: L)
where
    D: Document,
    L: Listener,
{
    let mut listener = pin!(listener);
    while let Some(item) = listener.next().await {
        if !shared.deliver(generation, item) {
            return;
        }
    }
    shared.closed(generation);
}

/// Binds a typed projection to one live query at a time.
///
/// Requires a Tokio runtime: each bind spawns the task that reads the
/// store's listener. Dropping the manager releases the listener.
pub struct SubscriptionManager<S: Store, D: Document> {
    store: Arc<S>,
    shared: Arc<Shared<D>>,
}

impl<S: Store, D: Document> SubscriptionManager<S, D> {
    pub fn new(store: Arc<S>, config: FeedConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let state = State {
            generation: 0,
            active: None,
            projection: Projection::new(),
            handlers: Vec::new(),
            revision: 0,
        };

        Self {
            store,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                events,
                config,
            }),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &FeedConfig {
        &self.shared.config
    }

    /// Listen to `query`, releasing the current listener first.
    ///
    /// Binding the query that is already active keeps the existing
    /// listener. On error the manager is left unbound.
    #[instrument(skip(self), fields(%query))]
    pub fn bind(&self, query: QueryDescriptor) -> Result<()> {
        let mut state = self.shared.lock();

        if state.active.as_ref().is_some_and(|active| active.query == query) {
            debug!("Query unchanged, keeping listener");
            return Ok(());
        }

        if let Some(previous) = state.release() {
            debug!(%previous, "Released previous listener");
        }
        state.generation += 1;
        let generation = state.generation;

        let listener = match self.store.run_query(&query) {
            Ok(listener) => listener,
            Err(err) => {
                warn!(error = %err, "Could not start listener");
                self.shared
                    .emit(FeedEvent::Diagnostic(Diagnostic::Subscription(
                        SubscriptionError::Start {
                            message: err.to_string(),
                        },
                    )));
                return Err(err);
            }
        };

        let task = tokio::spawn(listen(Arc::clone(&self.shared), generation, listener));
        state.active = Some(ActiveListener {
            generation,
            query,
            task,
        });

        info!(generation, "Bound listener");
        Ok(())
    }

    /// Release the active listener. Does nothing when unbound.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        if let Some(query) = state.release() {
            state.generation += 1;
            info!(%query, "Stopped listener");
        }
    }

    /// Register a callback for every delivered raw snapshot, the first
    /// included.
    ///
    /// Handlers run before decoding, so they also see snapshots that the
    /// `Reject` policy leaves unapplied. They run while the manager's state
    /// is locked and must not call back into the manager.
    pub fn on_snapshot<F>(&self, handler: F)
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.shared.lock().handlers.push(Arc::new(handler));
    }

    /// Receive render, removal and diagnostic events.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_bound(&self) -> bool {
        self.shared.lock().active.is_some()
    }

    /// The query of the active listener.
    pub fn query(&self) -> Option<QueryDescriptor> {
        self.shared
            .lock()
            .active
            .as_ref()
            .map(|active| active.query.clone())
    }

    /// A copy of the current projection.
    pub fn current_projection(&self) -> Vec<ProjectedEntry<D>> {
        self.shared.lock().projection.entries().to_vec()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().projection.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().projection.len()
    }

    /// Number of snapshots applied so far.
    pub fn revision(&self) -> u64 {
        self.shared.lock().revision
    }

    pub fn get(&self, index: usize) -> Result<ProjectedEntry<D>> {
        Ok(self.shared.lock().projection.get(index)?.clone())
    }

    /// Optimistically remove the row at `index` and return its origin.
    ///
    /// The store is not contacted; the next snapshot replaces the
    /// projection regardless of this removal.
    pub fn remove_at(&self, index: usize) -> Result<DocumentRef> {
        let origin = self.shared.lock().projection.remove_at(index)?;
        debug!(index, %origin, "Removed row");
        self.shared.emit(FeedEvent::Removed {
            index,
            origin: origin.clone(),
        });
        Ok(origin)
    }

    /// Publish a diagnostic on this manager's event channel.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.shared.emit(FeedEvent::Diagnostic(diagnostic));
    }
}

impl<S: Store, D: Document> Drop for SubscriptionManager<S, D> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        if state.release().is_some() {
            state.generation += 1;
            debug!("Released listener on drop");
        }
    }
}
