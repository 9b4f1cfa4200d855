//! Listener stream for the in-memory store.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;

use portail_core::{Result, Snapshot};

/// Live listener returned by [`MemoryStore::run_query`](crate::MemoryStore).
pub struct MemoryListener {
    inner: Pin<Box<dyn Stream<Item = Result<Snapshot>> + Send>>,
}

impl MemoryListener {
    pub(crate) fn new(mut rx: mpsc::UnboundedReceiver<Result<Snapshot>>) -> Self {
        let stream = async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        };

        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for MemoryListener {
    type Item = Result<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
