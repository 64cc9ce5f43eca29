use super::{DeliveryFailure, DispatchOutcome, FailureReason};
use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use crate::gateway::{DeliveryStatus, PushTransport, SenderKeys};
use crate::key_manager::KeyManager;
use crate::subscription::SubscriptionRegistry;
use log::*;
use service::config::{Config, DEFAULT_VAPID_SUBJECT};
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Clone, Debug)]
pub struct DispatchSettings {
    pub subject: String,
    pub ttl: u32,
    /// Upper bound on deliveries in flight at once.
    pub concurrency: usize,
}

impl DispatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            subject: config.vapid_subject().to_string(),
            ttl: config.push_ttl_secs,
            concurrency: config.push_concurrency,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            subject: DEFAULT_VAPID_SUBJECT.to_string(),
            ttl: 86_400,
            concurrency: 16,
        }
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    key_manager: KeyManager,
    registry: SubscriptionRegistry,
    transport: Arc<dyn PushTransport>,
    settings: DispatchSettings,
}

impl NotificationDispatcher {
    pub fn new(
        key_manager: KeyManager,
        registry: SubscriptionRegistry,
        transport: Arc<dyn PushTransport>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            key_manager,
            registry,
            transport,
            settings,
        }
    }

    /// Sends `payload` to every stored subscription concurrently and waits for all
    /// deliveries to finish.
    ///
    /// Only a missing server key or an unreadable subscription list fails the call.
    /// Individual delivery failures end up in the returned outcome.
    pub async fn notify_all(&self, payload: &[u8]) -> Result<DispatchOutcome, Error> {
        let key = self
            .key_manager
            .get_or_create_keys()
            .await
            .map_err(dispatch_aborted)?;
        let subscriptions = self.registry.read_all().await.map_err(dispatch_aborted)?;

        let keys = Arc::new(SenderKeys {
            public_key: key.public_key_bytes(),
            private_key: key.private_key_bytes(),
            subject: self.settings.subject.clone(),
            ttl: self.settings.ttl,
        });
        let payload: Arc<[u8]> = Arc::from(payload);
        let permits = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));

        debug!("Dispatching push to {} subscription(s)", subscriptions.len());

        let deliveries: Vec<_> = subscriptions
            .into_iter()
            .map(|subscription| {
                let transport = Arc::clone(&self.transport);
                let keys = Arc::clone(&keys);
                let payload = Arc::clone(&payload);
                let permits = Arc::clone(&permits);
                let target = subscription.clone();

                let handle = tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await;
                    transport.send(&payload, &subscription, &keys).await
                });

                (target, handle)
            })
            .collect();

        let mut outcome = DispatchOutcome {
            attempted: deliveries.len(),
            ..Default::default()
        };

        for (subscription, handle) in deliveries {
            let reason = match handle.await {
                Ok(Ok(DeliveryStatus::Delivered)) => {
                    outcome.succeeded += 1;
                    continue;
                }
                Ok(Ok(DeliveryStatus::Gone)) => FailureReason::EndpointGone,
                Ok(Err(err)) => FailureReason::Transport(err.to_string()),
                Err(join_err) => FailureReason::Transport(format!("delivery task failed: {join_err}")),
            };

            warn!(
                "Push to user {} at {} failed: {reason}",
                subscription.user_id, subscription.endpoint
            );
            outcome
                .failures
                .push(DeliveryFailure::new(&subscription, reason));
        }

        info!(
            "Push dispatch finished: {} attempted, {} succeeded, {} failed",
            outcome.attempted,
            outcome.succeeded,
            outcome.failed()
        );

        Ok(outcome)
    }
}

fn dispatch_aborted(source: Error) -> Error {
    error!("Push dispatch aborted: {source}");
    Error {
        source: Some(Box::new(source)),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::DispatchAborted),
    }
}
