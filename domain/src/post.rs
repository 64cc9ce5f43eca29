use crate::error::Error;
use crate::notification::{Notifier, SYNC_PAYLOAD};
use crate::storage::PostStore;
use crate::{posts, users, Id};
use chrono::{DateTime, Utc};
use log::*;

/// A post as submitted by a client. Offline clients assign `id` and `time`
/// themselves and may upload the same post again; missing values are filled
/// in by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPost {
    pub id: Option<Id>,
    pub text: String,
    pub time: Option<DateTime<Utc>>,
}

impl NewPost {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            time: None,
        }
    }
}

/// Stores the batch, then notifies subscribers once. A post whose id is
/// already stored is replaced rather than duplicated.
///
/// The posts stay stored even when notification fails; that failure is only logged.
pub async fn create_many(
    store: &dyn PostStore,
    notifier: &dyn Notifier,
    author: &users::Model,
    new_posts: Vec<NewPost>,
) -> Result<Vec<posts::Model>, Error> {
    if new_posts.is_empty() {
        return Err(Error::invalid("at least one post is required"));
    }

    let now = Utc::now();
    let new_posts = new_posts
        .into_iter()
        .map(|post| posts::Model {
            id: post.id.unwrap_or_else(Id::new_v4),
            user_id: author.id,
            author: author.name.clone(),
            text: post.text,
            time: post.time.unwrap_or(now),
        })
        .collect();

    let created = store.create_posts(new_posts).await?;
    info!("{} created {} post(s)", author.name, created.len());

    if let Err(err) = notifier.notify(SYNC_PAYLOAD.to_vec()).await {
        warn!("Posts were stored but subscribers could not be notified: {err}");
    }

    Ok(created)
}

pub async fn create(
    store: &dyn PostStore,
    notifier: &dyn Notifier,
    author: &users::Model,
    new_post: NewPost,
) -> Result<posts::Model, Error> {
    create_many(store, notifier, author, vec![new_post])
        .await?
        .pop()
        .ok_or_else(|| Error::store("post store returned no rows"))
}

pub async fn find_all(store: &dyn PostStore) -> Result<Vec<posts::Model>, Error> {
    store.find_posts().await
}
