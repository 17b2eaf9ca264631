//! Broadcast + history store backing the message and log feeds.

use std::{
    collections::VecDeque,
    sync::{Arc, PoisonError, RwLock},
};

use futures::{StreamExt, stream::BoxStream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::message::{ChatMessage, LogEntry};

/// Default history size limit (16 MB).
const HISTORY_BYTES: usize = 16 * 1024 * 1024;

/// Live channel capacity before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 1024;

/// An entry that can be kept in a [`MsgStore`].
pub trait FeedItem: Clone + Send + Sync + 'static {
    fn approx_bytes(&self) -> usize;
}

impl FeedItem for ChatMessage {
    fn approx_bytes(&self) -> usize {
        const OVERHEAD: usize = 64;
        self.text.len() + OVERHEAD
    }
}

impl FeedItem for LogEntry {
    fn approx_bytes(&self) -> usize {
        const OVERHEAD: usize = 48;
        self.text.len() + OVERHEAD
    }
}

struct StoredMsg<T> {
    msg: T,
    bytes: usize,
}

struct Inner<T> {
    history: VecDeque<StoredMsg<T>>,
    total_bytes: usize,
}

/// Ordered, append-only store with broadcast and history support.
///
/// Late subscribers receive history first, then live updates. A push updates
/// history and notifies subscribers under one lock, so every observer sees
/// entries in the same order.
pub struct MsgStore<T: FeedItem> {
    inner: RwLock<Inner<T>>,
    sender: broadcast::Sender<T>,
}

impl<T: FeedItem> Default for MsgStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FeedItem> MsgStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(Inner {
                history: VecDeque::with_capacity(32),
                total_bytes: 0,
            }),
            sender,
        }
    }

    /// Append an entry to history and notify live subscribers.
    pub fn push(&self, msg: T) {
        let bytes = msg.approx_bytes();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        while inner.total_bytes.saturating_add(bytes) > HISTORY_BYTES {
            if let Some(front) = inner.history.pop_front() {
                inner.total_bytes = inner.total_bytes.saturating_sub(front.bytes);
            } else {
                break;
            }
        }

        let _ = self.sender.send(msg.clone());
        inner.history.push_back(StoredMsg { msg, bytes });
        inner.total_bytes = inner.total_bytes.saturating_add(bytes);
    }

    /// Get a receiver for live updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Snapshot of the history.
    #[must_use]
    pub fn history(&self) -> Vec<T> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .iter()
            .map(|s| s.msg.clone())
            .collect()
    }

    /// Number of entries currently in history.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stream that yields history first, then live updates.
    ///
    /// Entries dropped because the subscriber lagged are skipped.
    #[must_use]
    pub fn history_plus_stream(&self) -> BoxStream<'static, T> {
        let (history, rx) = {
            let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            let history: Vec<T> = inner.history.iter().map(|s| s.msg.clone()).collect();
            (history, self.sender.subscribe())
        };

        let hist = futures::stream::iter(history);
        let live = BroadcastStream::new(rx).filter_map(|res| async move {
            match res {
                Ok(msg) => Some(msg),
                Err(err) => {
                    tracing::warn!("feed subscriber lagged: {err}");
                    None
                }
            }
        });

        hist.chain(live).boxed()
    }
}

/// Read-only handle on a [`MsgStore`] for presentation layers.
pub struct FeedView<T: FeedItem> {
    store: Arc<MsgStore<T>>,
}

impl<T: FeedItem> Clone for FeedView<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: FeedItem> FeedView<T> {
    #[must_use]
    pub const fn new(store: Arc<MsgStore<T>>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn history(&self) -> Vec<T> {
        self.store.history()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.store.subscribe()
    }

    #[must_use]
    pub fn history_plus_stream(&self) -> BoxStream<'static, T> {
        self.store.history_plus_stream()
    }
}
