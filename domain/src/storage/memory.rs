use super::{KeyStore, PostStore, SubscriptionStore, UserStore};
use crate::error::{DomainErrorKind, EntityErrorKind, Error, InternalErrorKind};
use crate::key_manager::ServerKeyPair;
use crate::{posts, subscriptions, users, Id};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::*;
use tokio::sync::RwLock;

/// In-process adapter for every storage port. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    key: RwLock<Option<ServerKeyPair>>,
    subscriptions: DashMap<Id, subscriptions::Model>,
    users: DashMap<Id, users::Model>,
    user_names: DashMap<String, Id>,
    posts: DashMap<Id, posts::Model>,
}

#[async_trait]
impl KeyStore for MemoryStore {
    async fn read_key(&self) -> Result<Option<ServerKeyPair>, Error> {
        Ok(self.key.read().await.clone())
    }

    async fn write_key(&self, key: &ServerKeyPair) -> Result<(), Error> {
        *self.key.write().await = Some(key.clone());
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn upsert_subscription(
        &self,
        subscription: subscriptions::Model,
    ) -> Result<subscriptions::Model, Error> {
        let stored = match self.subscriptions.entry(subscription.user_id) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get_mut();
                existing.endpoint = subscription.endpoint;
                existing.p256dh = subscription.p256dh;
                existing.auth = subscription.auth;
                existing.updated_at = Utc::now().into();
                existing.clone()
            }
            Entry::Vacant(vacant) => vacant.insert(subscription).clone(),
        };
        Ok(stored)
    }

    async fn find_subscription(
        &self,
        user_id: Id,
    ) -> Result<Option<subscriptions::Model>, Error> {
        Ok(self.subscriptions.get(&user_id).map(|entry| entry.clone()))
    }

    async fn find_all_subscriptions(&self) -> Result<Vec<subscriptions::Model>, Error> {
        Ok(self
            .subscriptions
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_subscription(&self, user_id: Id) -> Result<(), Error> {
        self.subscriptions
            .remove(&user_id)
            .map(|_| ())
            .ok_or_else(Error::not_found)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, name: String) -> Result<users::Model, Error> {
        match self.user_names.entry(name.clone()) {
            Entry::Occupied(_) => {
                debug!("User name {name} is already taken");
                Err(Error {
                    source: None,
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                        EntityErrorKind::Conflict,
                    )),
                })
            }
            Entry::Vacant(vacant) => {
                let user = users::Model {
                    id: Id::new_v4(),
                    name,
                    created_at: Utc::now().into(),
                };
                vacant.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    async fn find_user(&self, id: Id) -> Result<Option<users::Model>, Error> {
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<users::Model>, Error> {
        let Some(id) = self.user_names.get(name).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        self.find_user(id).await
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_posts(&self, new_posts: Vec<posts::Model>) -> Result<Vec<posts::Model>, Error> {
        for post in &new_posts {
            self.posts.insert(post.id, post.clone());
        }
        Ok(new_posts)
    }

    async fn find_posts(&self) -> Result<Vec<posts::Model>, Error> {
        let mut all: Vec<posts::Model> = self.posts.iter().map(|entry| entry.clone()).collect();
        all.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subscription_for(user_id: Id, endpoint: &str) -> subscriptions::Model {
        let now = Utc::now();
        subscriptions::Model {
            id: Id::new_v4(),
            user_id,
            endpoint: endpoint.to_string(),
            p256dh: vec![4; 65],
            auth: vec![7; 16],
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn upsert_replaces_the_subscription_of_the_same_user() -> Result<(), Error> {
        let store = MemoryStore::default();
        let user_id = Id::new_v4();

        let first = store
            .upsert_subscription(subscription_for(user_id, "https://push.example/a"))
            .await?;
        let second = store
            .upsert_subscription(subscription_for(user_id, "https://push.example/b"))
            .await?;

        assert_eq!(first.id, second.id);
        assert_eq!(second.endpoint, "https://push.example/b");
        assert_eq!(store.find_all_subscriptions().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_missing_subscriptions() -> Result<(), Error> {
        let store = MemoryStore::default();
        let user_id = Id::new_v4();
        store
            .upsert_subscription(subscription_for(user_id, "https://push.example/a"))
            .await?;

        store.delete_subscription(user_id).await?;
        let err = store.delete_subscription(user_id).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(store.find_subscription(user_id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn create_user_rejects_a_taken_name() -> Result<(), Error> {
        let store = MemoryStore::default();
        let alice = store.create_user("alice".to_string()).await?;

        let err = store.create_user("alice".to_string()).await.unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Conflict))
        );
        assert_eq!(store.find_user_by_name("alice").await?, Some(alice));
        Ok(())
    }

    #[tokio::test]
    async fn find_posts_returns_newest_first() -> Result<(), Error> {
        let store = MemoryStore::default();
        let user_id = Id::new_v4();
        let now = Utc::now();
        let post_at = |text: &str, minutes_ago: i64| posts::Model {
            id: Id::new_v4(),
            user_id,
            author: "alice".to_string(),
            text: text.to_string(),
            time: now - Duration::minutes(minutes_ago),
        };

        store
            .create_posts(vec![post_at("older", 5), post_at("newest", 0)])
            .await?;
        store.create_posts(vec![post_at("middle", 2)]).await?;

        let texts: Vec<String> = store
            .find_posts()
            .await?
            .into_iter()
            .map(|post| post.text)
            .collect();
        assert_eq!(texts, vec!["newest", "middle", "older"]);
        Ok(())
    }

    #[tokio::test]
    async fn a_post_with_a_known_id_replaces_the_stored_one() -> Result<(), Error> {
        let store = MemoryStore::default();
        let draft = posts::Model {
            id: Id::new_v4(),
            user_id: Id::new_v4(),
            author: "alice".to_string(),
            text: "draft".to_string(),
            time: Utc::now(),
        };
        let edited = posts::Model {
            text: "edited".to_string(),
            ..draft.clone()
        };

        store.create_posts(vec![draft]).await?;
        store.create_posts(vec![edited.clone()]).await?;

        assert_eq!(store.find_posts().await?, vec![edited]);
        Ok(())
    }

    #[tokio::test]
    async fn write_key_overwrites_the_previous_key() -> Result<(), Error> {
        let store = MemoryStore::default();
        assert!(store.read_key().await?.is_none());

        store
            .write_key(&ServerKeyPair::from_parts(vec![1; 32], vec![1; 32], vec![1; 32]))
            .await?;
        store
            .write_key(&ServerKeyPair::from_parts(vec![2; 32], vec![2; 32], vec![2; 32]))
            .await?;

        let stored = store.read_key().await?.expect("a stored key");
        assert_eq!(stored.x(), &[2; 32]);
        Ok(())
    }
}
