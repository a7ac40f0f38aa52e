//! Event source subscriptions.
//!
//! A [`Subscription`] is the receiving end of a stream of [`FsEvent`]s and
//! asynchronous source errors. It is backed either by a `notify` watcher on
//! one directory or by an in-process channel fed through [`SourceSender`].

use std::path::Path;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::events::FsEvent;
use crate::error::WatchError;
use crate::Result;

/// Events buffered between the backend and the watch loop.
const EVENT_BUFFER: usize = 100;

/// One item from an event source.
pub type SourceMessage = std::result::Result<FsEvent, WatchError>;

/// Receiving end of an event source.
pub struct Subscription {
    event_rx: mpsc::Receiver<SourceMessage>,
    watcher: Option<RecommendedWatcher>,
}

impl Subscription {
    /// Subscribe to changes directly inside `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::WatchFailed`] if the directory does not exist or
    /// the backend refuses to watch it.
    pub fn watch(directory: &Path) -> Result<Self> {
        let dir_display = directory.display().to_string();

        if !directory.is_dir() {
            return Err(WatchError::watch_failed(dir_display, "not an existing directory").into());
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

        let mut watcher = notify::recommended_watcher(
            move |result: notify::Result<notify::Event>| match result {
                Ok(event) => {
                    for fs_event in FsEvent::from_notify(event) {
                        // Runs on the backend's own thread; blocking here is fine.
                        if event_tx.blocking_send(Ok(fs_event)).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    let _ = event_tx.blocking_send(Err(WatchError::from(e)));
                }
            },
        )
        .map_err(|e| WatchError::watch_failed(dir_display.clone(), e.to_string()))?;

        watcher
            .watch(directory, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::watch_failed(dir_display.clone(), e.to_string()))?;

        tracing::info!(path = %dir_display, "Watching directory");

        Ok(Self {
            event_rx,
            watcher: Some(watcher),
        })
    }

    /// An in-process source, fed by the returned sender.
    ///
    /// The subscription closes once every sender has been dropped.
    #[must_use]
    pub fn channel() -> (SourceSender, Self) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        (
            SourceSender { event_tx },
            Self {
                event_rx,
                watcher: None,
            },
        )
    }

    /// Wait for the next event or error.
    ///
    /// Returns `None` once the source has closed.
    pub async fn recv(&mut self) -> Option<SourceMessage> {
        self.event_rx.recv().await
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("backend", &if self.watcher.is_some() { "notify" } else { "channel" })
            .finish()
    }
}

/// Feeds a [`Subscription::channel`] source.
#[derive(Debug, Clone)]
pub struct SourceSender {
    event_tx: mpsc::Sender<SourceMessage>,
}

impl SourceSender {
    /// Deliver an event. Returns `false` if the subscription is gone.
    pub async fn event(&self, event: FsEvent) -> bool {
        self.event_tx.send(Ok(event)).await.is_ok()
    }

    /// Deliver a source error. Returns `false` if the subscription is gone.
    pub async fn error(&self, error: WatchError) -> bool {
        self.event_tx.send(Err(error)).await.is_ok()
    }

    /// Whether the subscription has taken every message sent so far.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.event_tx.capacity() == self.event_tx.max_capacity()
    }

    /// Whether the subscription has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.event_tx.is_closed()
    }
}
