use crate::extractors::{authenticated_user::AuthenticatedUser, json_body::JsonBody};
use crate::params::post::PostParams;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::post as PostApi;
use log::*;

/// POST a new post and notify every subscriber
#[utoipa::path(
    post,
    path = "/api/post",
    request_body = PostParams,
    responses(
        (status = 201, description = "Successfully created a new post", body = domain::posts::Model),
        (status = 400, description = "Malformed post"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Post could not be stored")
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    JsonBody(params): JsonBody<PostParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST new post from {}", user.name);

    let post = PostApi::create(
        app_state.storage.posts.as_ref(),
        app_state.notifier.as_ref(),
        &user,
        params.into(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// POST several posts at once; subscribers are notified once for the batch
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = Vec<PostParams>,
    responses(
        (status = 201, description = "Successfully created the posts", body = [domain::posts::Model]),
        (status = 400, description = "Malformed or empty batch"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Posts could not be stored")
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn create_many(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    JsonBody(params): JsonBody<Vec<PostParams>>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST {} new posts from {}", params.len(), user.name);

    let posts = PostApi::create_many(
        app_state.storage.posts.as_ref(),
        app_state.notifier.as_ref(),
        &user,
        params.into_iter().map(Into::into).collect(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(posts)))
}

/// GET all posts, newest first
#[utoipa::path(
    get,
    path = "/api/posts",
    responses(
        (status = 200, description = "Successfully retrieved all posts", body = [domain::posts::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Posts could not be read")
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(_user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let posts = PostApi::find_all(app_state.storage.posts.as_ref()).await?;

    Ok(Json(posts))
}
