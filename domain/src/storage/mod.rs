//! Storage ports used by the domain layer and the two adapters that implement them.
//!
//! The Postgres-backed [`database::DbStore`] goes through `entity_api`, while
//! [`memory::MemoryStore`] keeps everything in process for development and tests.
//! Both are selected once at startup and bundled into a [`Storage`].

use crate::error::Error;
use crate::key_manager::ServerKeyPair;
use crate::{posts, subscriptions, users, Id};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod database;
pub mod memory;

pub use database::DbStore;
pub use memory::MemoryStore;

/// Persists the single server push key pair.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn read_key(&self) -> Result<Option<ServerKeyPair>, Error>;

    /// Overwrites any previously stored key.
    async fn write_key(&self, key: &ServerKeyPair) -> Result<(), Error>;
}

/// Persists at most one push subscription per user.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts the subscription or replaces the one already held for its user.
    async fn upsert_subscription(
        &self,
        subscription: subscriptions::Model,
    ) -> Result<subscriptions::Model, Error>;

    async fn find_subscription(&self, user_id: Id)
        -> Result<Option<subscriptions::Model>, Error>;

    async fn find_all_subscriptions(&self) -> Result<Vec<subscriptions::Model>, Error>;

    /// Fails with a not-found error when the user holds no subscription.
    async fn delete_subscription(&self, user_id: Id) -> Result<(), Error>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with a conflict error when the name is already taken.
    async fn create_user(&self, name: String) -> Result<users::Model, Error>;

    async fn find_user(&self, id: Id) -> Result<Option<users::Model>, Error>;

    async fn find_user_by_name(&self, name: &str) -> Result<Option<users::Model>, Error>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Stores every post or none of them.
    async fn create_posts(&self, posts: Vec<posts::Model>) -> Result<Vec<posts::Model>, Error>;

    /// Newest first.
    async fn find_posts(&self) -> Result<Vec<posts::Model>, Error>;
}

/// Handles to every store, all backed by the same adapter.
#[derive(Clone)]
pub struct Storage {
    pub keys: Arc<dyn KeyStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
}

impl Storage {
    pub fn database(db: Arc<DatabaseConnection>) -> Self {
        Self::from_adapter(Arc::new(DbStore::new(db)))
    }

    pub fn memory() -> Self {
        Self::from_adapter(Arc::new(MemoryStore::default()))
    }

    fn from_adapter<S>(store: Arc<S>) -> Self
    where
        S: KeyStore + SubscriptionStore + UserStore + PostStore + 'static,
    {
        Self {
            keys: store.clone(),
            subscriptions: store.clone(),
            users: store.clone(),
            posts: store,
        }
    }
}
