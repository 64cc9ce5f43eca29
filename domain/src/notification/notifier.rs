use super::dispatcher::NotificationDispatcher;
use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use async_trait::async_trait;
use log::*;
use service::config::{Config, NotifierMode};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Opaque payload telling clients to refetch the post list.
pub const SYNC_PAYLOAD: &[u8] = b"msg-sync";

/// Triggers a fan-out after a state change.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, payload: Vec<u8>) -> Result<(), Error>;
}

/// Runs the fan-out before returning, so the caller waits for every delivery.
#[derive(Clone)]
pub struct InlineNotifier {
    dispatcher: NotificationDispatcher,
}

impl InlineNotifier {
    pub fn new(dispatcher: NotificationDispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Notifier for InlineNotifier {
    async fn notify(&self, payload: Vec<u8>) -> Result<(), Error> {
        self.dispatcher.notify_all(&payload).await?;
        Ok(())
    }
}

/// Hands payloads to a background worker through a bounded queue.
///
/// `notify` never waits on push services. When the queue is full the payload is
/// dropped and an error is returned.
#[derive(Clone)]
pub struct QueuedNotifier {
    sender: mpsc::Sender<Vec<u8>>,
}

impl QueuedNotifier {
    /// Spawns the worker. It runs until every `QueuedNotifier` clone is dropped.
    pub fn spawn(dispatcher: NotificationDispatcher, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(dispatcher, receiver));
        (Self { sender }, worker)
    }
}

#[async_trait]
impl Notifier for QueuedNotifier {
    async fn notify(&self, payload: Vec<u8>) -> Result<(), Error> {
        self.sender.try_send(payload).map_err(|err| {
            let reason = match err {
                mpsc::error::TrySendError::Full(_) => "notification queue is full",
                mpsc::error::TrySendError::Closed(_) => "notification worker has stopped",
            };
            warn!("Dropping notification: {reason}");
            Error {
                source: None,
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    reason.to_string(),
                )),
            }
        })
    }
}

async fn run_worker(dispatcher: NotificationDispatcher, mut receiver: mpsc::Receiver<Vec<u8>>) {
    info!("Notification worker started");
    while let Some(payload) = receiver.recv().await {
        // Failures were already logged by the dispatcher.
        let _ = dispatcher.notify_all(&payload).await;
    }
    info!("Notification worker stopped");
}

/// Builds the notifier selected by `notifier_mode`.
pub fn from_config(config: &Config, dispatcher: NotificationDispatcher) -> Arc<dyn Notifier> {
    match config.notifier_mode {
        NotifierMode::Inline => Arc::new(InlineNotifier::new(dispatcher)),
        NotifierMode::Queued => {
            let (notifier, _worker) =
                QueuedNotifier::spawn(dispatcher, config.notify_queue_capacity);
            Arc::new(notifier)
        }
    }
}
