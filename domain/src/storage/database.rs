use super::{KeyStore, PostStore, SubscriptionStore, UserStore};
use crate::error::Error;
use crate::key_manager::ServerKeyPair;
use crate::{posts, server_keys, subscriptions, users, Id};
use async_trait::async_trait;
use chrono::Utc;
use entity_api::{post, server_key, subscription, user};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Postgres adapter for every storage port.
#[derive(Clone)]
pub struct DbStore {
    db: Arc<DatabaseConnection>,
}

impl DbStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<server_keys::Model> for ServerKeyPair {
    fn from(model: server_keys::Model) -> Self {
        ServerKeyPair::from_parts(model.x, model.y, model.d)
    }
}

#[async_trait]
impl KeyStore for DbStore {
    async fn read_key(&self) -> Result<Option<ServerKeyPair>, Error> {
        Ok(server_key::find(self.db.as_ref())
            .await?
            .map(ServerKeyPair::from))
    }

    async fn write_key(&self, key: &ServerKeyPair) -> Result<(), Error> {
        let model = server_keys::Model {
            name: server_keys::VAPID_KEY_NAME.to_string(),
            x: key.x().to_vec(),
            y: key.y().to_vec(),
            d: key.d().to_vec(),
            created_at: Utc::now().into(),
        };
        Ok(server_key::save(self.db.as_ref(), model).await?)
    }
}

#[async_trait]
impl SubscriptionStore for DbStore {
    async fn upsert_subscription(
        &self,
        subscription: subscriptions::Model,
    ) -> Result<subscriptions::Model, Error> {
        Ok(subscription::create_or_replace(self.db.as_ref(), subscription).await?)
    }

    async fn find_subscription(
        &self,
        user_id: Id,
    ) -> Result<Option<subscriptions::Model>, Error> {
        Ok(subscription::find_by_user_id(self.db.as_ref(), user_id).await?)
    }

    async fn find_all_subscriptions(&self) -> Result<Vec<subscriptions::Model>, Error> {
        Ok(subscription::find_all(self.db.as_ref()).await?)
    }

    async fn delete_subscription(&self, user_id: Id) -> Result<(), Error> {
        Ok(subscription::delete_by_user_id(self.db.as_ref(), user_id).await?)
    }
}

#[async_trait]
impl UserStore for DbStore {
    async fn create_user(&self, name: String) -> Result<users::Model, Error> {
        Ok(user::create(self.db.as_ref(), name).await?)
    }

    async fn find_user(&self, id: Id) -> Result<Option<users::Model>, Error> {
        match user::find_by_id(self.db.as_ref(), id).await {
            Ok(found) => Ok(Some(found)),
            Err(err) => {
                let err = Error::from(err);
                if err.is_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<users::Model>, Error> {
        Ok(user::find_by_name(self.db.as_ref(), name).await?)
    }
}

#[async_trait]
impl PostStore for DbStore {
    async fn create_posts(&self, posts: Vec<posts::Model>) -> Result<Vec<posts::Model>, Error> {
        Ok(post::create_many(self.db.as_ref(), posts).await?)
    }

    async fn find_posts(&self) -> Result<Vec<posts::Model>, Error> {
        Ok(post::find_all(self.db.as_ref()).await?)
    }
}
