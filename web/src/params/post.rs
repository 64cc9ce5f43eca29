use chrono::{DateTime, Utc};
use domain::{post::NewPost, Id};
use serde::Deserialize;
use utoipa::ToSchema;

/// A post as uploaded by the client. `id` and `time` are set by clients that
/// write posts offline and upload them later; re-sending the same `id`
/// replaces the stored post.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct PostParams {
    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub id: Option<Id>,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    #[schema(value_type = Option<i64>)]
    pub time: Option<DateTime<Utc>>,
}

impl From<PostParams> for NewPost {
    fn from(params: PostParams) -> Self {
        NewPost {
            id: params.id,
            text: params.text,
            time: params.time,
        }
    }
}
