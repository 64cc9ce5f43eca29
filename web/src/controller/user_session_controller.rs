use crate::extractors::json_body::JsonBody;
use crate::params::user::{NameParams, SessionResponse};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::user as UserApi;
use log::*;

/// POST register a new user under a unique name
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = NameParams,
    responses(
        (status = 201, description = "Successfully registered a new user", body = domain::users::Model),
        (status = 400, description = "Malformed or empty name"),
        (status = 409, description = "Name already taken"),
        (status = 500, description = "User could not be stored")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    JsonBody(params): JsonBody<NameParams>,
) -> Result<impl IntoResponse, Error> {
    let user = UserApi::register(app_state.storage.users.as_ref(), params.name).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST log in by name
///
/// The returned token must be sent back in the `Authorization` header of every
/// authenticated request, e.g.:
/// curl --header "Authorization: 07bbbe54-bd35-425f-8e63-618a8d8612df" http://localhost:4000/api/posts
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = NameParams,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 400, description = "Malformed request"),
        (status = 404, description = "No user with that name")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    JsonBody(params): JsonBody<NameParams>,
) -> Result<impl IntoResponse, Error> {
    let user = UserApi::login(app_state.storage.users.as_ref(), &params.name).await?;
    info!("{} logged in", user.name);

    Ok(Json(SessionResponse {
        token: user.id.to_string(),
        name: user.name,
    }))
}
