//! Fan-out of a payload to every stored push subscription.
//!
//! [`dispatcher::NotificationDispatcher`] performs one fan-out and reports a
//! [`DispatchOutcome`]. A [`notifier::Notifier`] decides when that fan-out runs
//! relative to the request that triggered it.

use crate::{subscriptions, Id};
use serde::Serialize;
use std::fmt;

pub mod dispatcher;
pub mod notifier;

pub use dispatcher::{DispatchSettings, NotificationDispatcher};
pub use notifier::{InlineNotifier, Notifier, QueuedNotifier, SYNC_PAYLOAD};

/// Summary of one fan-out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DispatchOutcome {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Subscriptions whose endpoint the push service reported as gone.
    pub fn gone(&self) -> impl Iterator<Item = &DeliveryFailure> {
        self.failures
            .iter()
            .filter(|failure| failure.reason == FailureReason::EndpointGone)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    pub user_id: Id,
    pub endpoint: String,
    pub reason: FailureReason,
}

impl DeliveryFailure {
    pub(crate) fn new(subscription: &subscriptions::Model, reason: FailureReason) -> Self {
        Self {
            user_id: subscription.user_id,
            endpoint: subscription.endpoint.clone(),
            reason,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    EndpointGone,
    Transport(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::EndpointGone => write!(f, "endpoint gone"),
            FailureReason::Transport(reason) => write!(f, "{reason}"),
        }
    }
}
