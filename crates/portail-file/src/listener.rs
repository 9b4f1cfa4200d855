//! Live query listener over a store directory.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use portail_core::error::{Error, StoreError, SubscriptionError};
use portail_core::{QueryDescriptor, Result, Snapshot};

use crate::changes::read_since;
use crate::store::FileStore;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Live listener returned by [`FileStore::run_query`](portail_core::Store::run_query).
///
/// Yields the current result set first, then a fresh one after every
/// change to the queried collection. Dropping it stops the background
/// task and the file watcher.
pub struct FileListener {
    inner: Pin<Box<dyn Stream<Item = Result<Snapshot>> + Send>>,
}

impl FileListener {
    /// Start listening. Must be called from within a tokio runtime.
    pub(crate) fn start(store: FileStore, query: QueryDescriptor) -> Result<Self> {
        std::fs::create_dir_all(store.root()).map_err(|e| {
            Error::Subscription(SubscriptionError::Start {
                message: format!("Failed to create store directory: {}", e),
            })
        })?;

        let changes_path = store.changes_path();
        let mut position = std::fs::metadata(&changes_path)
            .map(|m| m.len())
            .unwrap_or(0);
        let initial = store.snapshot(&query)?;

        let (tx, mut rx) = mpsc::channel::<Result<Snapshot>>(16);
        let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(
                event.kind,
                notify::EventKind::Modify(_) | notify::EventKind::Create(_)
            ) {
                return;
            }

            let is_changes = event
                .paths
                .iter()
                .any(|p| p.file_name().is_some_and(|n| n == "changes.jsonl"));

            if is_changes {
                // A pending wake already covers this change.
                let _ = wake_tx.try_send(());
            }
        })
        .map_err(|e| {
            Error::Subscription(SubscriptionError::Start {
                message: format!("Failed to create file watcher: {}", e),
            })
        })?;

        watcher
            .watch(store.root(), RecursiveMode::NonRecursive)
            .map_err(|e| {
                Error::Subscription(SubscriptionError::Start {
                    message: format!("Failed to watch directory: {}", e),
                })
            })?;

        debug!(root = %store.root().display(), %query, "Listener started");

        tokio::spawn(async move {
            let _watcher = watcher;

            if tx.send(Ok(initial)).await.is_err() {
                return;
            }

            let mut interval = tokio::time::interval(POLL_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    Some(()) = wake_rx.recv() => {}
                    _ = tx.closed() => break,
                }

                let changes = match read_since(&changes_path, &mut position) {
                    Ok(changes) => changes,
                    Err(e) => {
                        warn!(error = %e, "Failed to read change log");
                        let err = Error::Subscription(SubscriptionError::Listener {
                            message: format!("Failed to read change log: {}", e),
                        });
                        let _ = tx.send(Err(err)).await;
                        break;
                    }
                };

                if !changes
                    .iter()
                    .any(|c| c.doc.collection() == query.collection())
                {
                    continue;
                }

                trace!(changes = changes.len(), "Collection changed");

                let item = store.snapshot(&query).map_err(|e| match e {
                    Error::Store(StoreError::Io { message }) => {
                        Error::Subscription(SubscriptionError::Listener { message })
                    }
                    other => other,
                });
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }

            debug!("Listener stopped");
        });

        let stream = async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        };

        Ok(Self {
            inner: Box::pin(stream),
        })
    }
}

impl Stream for FileListener {
    type Item = Result<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
