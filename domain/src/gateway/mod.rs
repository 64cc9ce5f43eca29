//! Outbound integrations. Today that is only the Web Push transport.

use crate::error::Error;
use crate::subscriptions;
use async_trait::async_trait;
use std::fmt;

pub mod web_push;

/// Everything a transport needs to sign and address a push on behalf of the server.
#[derive(Clone)]
pub struct SenderKeys {
    /// Uncompressed P-256 point, 65 bytes.
    pub public_key: Vec<u8>,
    /// Private scalar, 32 bytes.
    pub private_key: Vec<u8>,
    /// Contact URI carried in the VAPID `sub` claim.
    pub subject: String,
    /// Seconds a push service may hold an undelivered message.
    pub ttl: u32,
}

impl fmt::Debug for SenderKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderKeys")
            .field("public_key", &self.public_key)
            .field("private_key", &"[redacted]")
            .field("subject", &self.subject)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// How a push service answered a delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// The endpoint no longer exists (404 or 410).
    Gone,
}

/// Sends one encrypted payload to one subscription.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(
        &self,
        payload: &[u8],
        subscription: &subscriptions::Model,
        keys: &SenderKeys,
    ) -> Result<DeliveryStatus, Error>;
}
