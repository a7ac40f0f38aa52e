//! Watch sessions.
//!
//! A session is one tokio task running [`WatchLoop`]: deliver the scan taken
//! at start unconditionally, then re-scan on every relevant event and deliver
//! only when the fingerprint differs from the last one delivered. The channel
//! and callback entry points are thin adapters over the same loop.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::aggregator::{scan, Snapshot};
use super::diagnostics::{default_diagnostics, Diagnostic, Diagnostics};
use super::fingerprint::Fingerprint;
use super::source::Subscription;
use crate::config::WatchConfig;
use crate::error::WatchError;
use crate::{Error, Result};

/// What a consumer receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The aggregated content changed, or this is the initial scan.
    Update(Snapshot),
    /// The event source reported an error. Watching continues.
    Error(WatchError),
}

impl Notification {
    #[must_use]
    pub const fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Update(snapshot) => Some(snapshot),
            Self::Error(_) => None,
        }
    }

    #[must_use]
    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            Self::Update(snapshot) => Some(snapshot),
            Self::Error(_) => None,
        }
    }
}

/// Callback invoked inline by the watch loop.
///
/// Returning [`ControlFlow::Break`] ends the session.
pub type UpdateCallback =
    Box<dyn FnMut(std::result::Result<&Snapshot, &WatchError>) -> ControlFlow<()> + Send>;

/// Handle to a running watch session.
///
/// Dropping the handle cancels the session.
#[must_use = "dropping a WatchSession stops watching"]
#[derive(Debug)]
pub struct WatchSession {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WatchSession {
    /// Stop the session. No notification is delivered after this returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token cancelling this session.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the loop task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the loop task to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| Error::internal(format!("watch task failed: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Channel end of a watch session.
///
/// The loop blocks while the channel is full, so a consumer that stops
/// reading stalls detection until it reads again or the session is
/// cancelled.
#[derive(Debug)]
pub struct DirectoryUpdates {
    notification_rx: mpsc::Receiver<Notification>,
    session: WatchSession,
}

impl DirectoryUpdates {
    /// Wait for the next notification.
    ///
    /// Returns `None` once the session has ended.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.notification_rx.recv().await
    }

    /// Take a notification if one is ready.
    ///
    /// # Errors
    ///
    /// Returns `Empty` if nothing is pending, `Disconnected` once the
    /// session has ended.
    pub fn try_recv(&mut self) -> std::result::Result<Notification, mpsc::error::TryRecvError> {
        self.notification_rx.try_recv()
    }

    /// Wait for the next snapshot, skipping source errors.
    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        while let Some(notification) = self.recv().await {
            if let Notification::Update(snapshot) = notification {
                return Some(snapshot);
            }
        }
        None
    }

    pub const fn session(&self) -> &WatchSession {
        &self.session
    }

    /// Cancel the session and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop task panicked.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            notification_rx,
            session,
        } = self;
        drop(notification_rx);
        session.shutdown().await
    }
}

/// Watch `config.directory` and receive notifications on a channel.
///
/// The initial scan is taken before this returns and is always the first
/// notification. `diagnostics` defaults to
/// [`TracingDiagnostics`](super::TracingDiagnostics), which only produces
/// output once a `tracing` subscriber is installed, for example with
/// [`init_tracing`](crate::observability::init_tracing).
///
/// # Errors
///
/// Returns an error if the config is invalid, the directory cannot be
/// watched, or no Tokio runtime is running.
pub fn watch_directory(
    config: &WatchConfig,
    diagnostics: Option<Arc<dyn Diagnostics>>,
) -> Result<DirectoryUpdates> {
    SessionBuilder::new(config.clone())
        .with_optional_diagnostics(diagnostics)
        .channel()
}

/// Like [`watch_directory`], stopping when `cancel` is cancelled.
///
/// # Errors
///
/// Same as [`watch_directory`].
pub fn watch_directory_until(
    config: &WatchConfig,
    diagnostics: Option<Arc<dyn Diagnostics>>,
    cancel: &CancellationToken,
) -> Result<DirectoryUpdates> {
    SessionBuilder::new(config.clone())
        .with_optional_diagnostics(diagnostics)
        .with_cancellation(cancel)
        .channel()
}

/// Watch `config.directory` and invoke `on_update` inline for every
/// notification.
///
/// `on_update` runs on the loop task; while it blocks, no further changes
/// are detected.
///
/// # Errors
///
/// Same as [`watch_directory`].
pub fn watch_directory_with_callback<F>(
    config: &WatchConfig,
    diagnostics: Option<Arc<dyn Diagnostics>>,
    on_update: F,
) -> Result<WatchSession>
where
    F: FnMut(std::result::Result<&Snapshot, &WatchError>) -> ControlFlow<()> + Send + 'static,
{
    SessionBuilder::new(config.clone())
        .with_optional_diagnostics(diagnostics)
        .callback(on_update)
}

/// Assembles a watch session.
pub struct SessionBuilder {
    config: WatchConfig,
    diagnostics: Arc<dyn Diagnostics>,
    cancel: CancellationToken,
    subscription: Option<Subscription>,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            diagnostics: default_diagnostics(),
            cancel: CancellationToken::new(),
            subscription: None,
        }
    }

    /// Send diagnostics to `diagnostics` instead of `tracing`.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    fn with_optional_diagnostics(self, diagnostics: Option<Arc<dyn Diagnostics>>) -> Self {
        match diagnostics {
            Some(diagnostics) => self.with_diagnostics(diagnostics),
            None => self,
        }
    }

    /// Stop the session when `parent` is cancelled.
    ///
    /// Cancelling the session itself leaves `parent` untouched.
    #[must_use]
    pub fn with_cancellation(mut self, parent: &CancellationToken) -> Self {
        self.cancel = parent.child_token();
        self
    }

    /// Use `subscription` instead of a `notify` watcher on the directory.
    #[must_use]
    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscription = Some(subscription);
        self
    }

    /// Start the session with a channel consumer.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the directory cannot be
    /// watched, or no Tokio runtime is running.
    pub fn channel(self) -> Result<DirectoryUpdates> {
        let (notification_tx, notification_rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let session = self.spawn(Consumer::Channel(notification_tx))?;
        Ok(DirectoryUpdates {
            notification_rx,
            session,
        })
    }

    /// Start the session with a callback consumer.
    ///
    /// # Errors
    ///
    /// Same as [`SessionBuilder::channel`].
    pub fn callback<F>(self, on_update: F) -> Result<WatchSession>
    where
        F: FnMut(std::result::Result<&Snapshot, &WatchError>) -> ControlFlow<()> + Send + 'static,
    {
        self.spawn(Consumer::Callback(Box::new(on_update)))
    }

    fn spawn(self, consumer: Consumer) -> Result<WatchSession> {
        self.config.validate()?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::internal(format!("watch session needs a Tokio runtime: {e}")))?;

        let subscription = match self.subscription {
            Some(subscription) => subscription,
            None => Subscription::watch(&self.config.directory)?,
        };

        let span = tracing::info_span!(
            "watch_session",
            directory = %self.config.directory.display(),
            suffix = %self.config.suffix,
        );

        let watch_loop = WatchLoop {
            directory: self.config.directory,
            suffix: self.config.suffix,
            subscription,
            consumer,
            diagnostics: self.diagnostics,
            cancel: self.cancel.clone(),
            last_emitted: None,
        };

        // Subscribed first, so no change after this scan goes unseen.
        let initial = span.in_scope(|| watch_loop.scan());

        let task = runtime.spawn(watch_loop.run(initial).instrument(span));

        Ok(WatchSession {
            cancel: self.cancel,
            task: Some(task),
        })
    }
}

enum Consumer {
    Channel(mpsc::Sender<Notification>),
    Callback(UpdateCallback),
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Stop,
}

impl Consumer {
    async fn deliver(&mut self, notification: Notification, cancel: &CancellationToken) -> Step {
        match self {
            Self::Channel(notification_tx) => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => Step::Stop,
                    sent = notification_tx.send(notification) => {
                        if sent.is_ok() {
                            Step::Continue
                        } else {
                            tracing::debug!("Notification receiver dropped");
                            Step::Stop
                        }
                    }
                }
            }
            Self::Callback(on_update) => {
                if cancel.is_cancelled() {
                    return Step::Stop;
                }
                let flow = match &notification {
                    Notification::Update(snapshot) => on_update(Ok(snapshot)),
                    Notification::Error(err) => on_update(Err(err)),
                };
                match flow {
                    ControlFlow::Continue(()) => Step::Continue,
                    ControlFlow::Break(()) => Step::Stop,
                }
            }
        }
    }
}

struct WatchLoop {
    directory: PathBuf,
    suffix: String,
    subscription: Subscription,
    consumer: Consumer,
    diagnostics: Arc<dyn Diagnostics>,
    cancel: CancellationToken,
    /// Fingerprint of the last snapshot the consumer accepted.
    last_emitted: Option<Fingerprint>,
}

impl WatchLoop {
    async fn run(mut self, initial: Snapshot) {
        tracing::debug!("Watch loop started");

        if self.emit(initial).await == Step::Stop {
            tracing::debug!("Watch loop stopped before watching");
            return;
        }

        loop {
            let message = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::debug!("Watch loop cancelled");
                    break;
                }
                message = self.subscription.recv() => message,
            };

            let step = match message {
                Some(Ok(event)) => {
                    if !event.is_relevant(&self.suffix) {
                        tracing::trace!(path = %event.path.display(), kind = ?event.kind, "Ignoring event");
                        continue;
                    }
                    self.rescan().await
                }
                Some(Err(err)) => {
                    self.diagnostics
                        .record(&Diagnostic::SourceError(err.clone()));
                    self.consumer
                        .deliver(Notification::Error(err), &self.cancel)
                        .await
                }
                None => {
                    tracing::info!("Event source closed, stopping watch loop");
                    break;
                }
            };

            if step == Step::Stop {
                break;
            }
        }

        tracing::debug!("Watch loop finished");
    }

    fn scan(&self) -> Snapshot {
        scan(&self.directory, &self.suffix, self.diagnostics.as_ref())
    }

    async fn rescan(&mut self) -> Step {
        let snapshot = self.scan();
        if self.last_emitted == Some(snapshot.fingerprint()) {
            self.diagnostics.record(&Diagnostic::Unchanged {
                fingerprint: snapshot.fingerprint(),
            });
            return Step::Continue;
        }
        self.emit(snapshot).await
    }

    async fn emit(&mut self, snapshot: Snapshot) -> Step {
        let emitted = Diagnostic::Emitted {
            fingerprint: snapshot.fingerprint(),
            files: snapshot.files().len(),
            bytes: snapshot.payload().len(),
        };
        let fingerprint = snapshot.fingerprint();

        let step = self
            .consumer
            .deliver(Notification::Update(snapshot), &self.cancel)
            .await;

        if step == Step::Continue {
            self.last_emitted = Some(fingerprint);
            self.diagnostics.record(&emitted);
        }
        step
    }
}
