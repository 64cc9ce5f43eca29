use crate::error::Error;
use crate::storage::SubscriptionStore;
use crate::{subscriptions, Id};
use chrono::Utc;
use log::*;
use std::sync::Arc;

/// A push subscription as handed over by a browser, with its keys already decoded.
#[derive(Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub endpoint: String,
    pub p256dh: Vec<u8>,
    pub auth: Vec<u8>,
}

/// Tracks the one push subscription each user may hold.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionRegistry {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    pub async fn create_or_replace(
        &self,
        user_id: Id,
        subscription: NewSubscription,
    ) -> Result<subscriptions::Model, Error> {
        if subscription.endpoint.trim().is_empty() {
            return Err(Error::invalid("subscription endpoint must not be empty"));
        }
        if subscription.p256dh.is_empty() || subscription.auth.is_empty() {
            return Err(Error::invalid("subscription keys must not be empty"));
        }

        let now = Utc::now();
        let model = subscriptions::Model {
            id: Id::new_v4(),
            user_id,
            endpoint: subscription.endpoint,
            p256dh: subscription.p256dh,
            auth: subscription.auth,
            created_at: now.into(),
            updated_at: now.into(),
        };

        let stored = self.store.upsert_subscription(model).await?;
        debug!("Stored push subscription {} for user {user_id}", stored.id);
        Ok(stored)
    }

    pub async fn read(&self, user_id: Id) -> Result<subscriptions::Model, Error> {
        self.store
            .find_subscription(user_id)
            .await?
            .ok_or_else(Error::not_found)
    }

    pub async fn read_all(&self) -> Result<Vec<subscriptions::Model>, Error> {
        self.store.find_all_subscriptions().await
    }

    pub async fn delete(&self, user_id: Id) -> Result<(), Error> {
        self.store.delete_subscription(user_id).await?;
        debug!("Deleted push subscription for user {user_id}");
        Ok(())
    }
}
