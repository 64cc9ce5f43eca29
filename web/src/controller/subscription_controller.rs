use crate::extractors::{authenticated_user::AuthenticatedUser, json_body::JsonBody};
use crate::params::subscription::SubscriptionParams;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use domain::subscription::NewSubscription;
use log::*;

/// POST the push subscription of the authenticated user, replacing any previous one
#[utoipa::path(
    post,
    path = "/api/subscription",
    request_body = SubscriptionParams,
    responses(
        (status = 201, description = "Subscription stored"),
        (status = 400, description = "Malformed subscription"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Subscription could not be stored")
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    JsonBody(params): JsonBody<SubscriptionParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST push subscription for {} at {}", user.name, params.endpoint);

    let subscription = NewSubscription::try_from(params)?;
    app_state
        .registry
        .create_or_replace(user.id, subscription)
        .await?;

    Ok(StatusCode::CREATED)
}

/// GET whether the authenticated user holds a push subscription
#[utoipa::path(
    get,
    path = "/api/subscription",
    responses(
        (status = 204, description = "A subscription exists"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No subscription"),
        (status = 500, description = "Subscription could not be read")
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    app_state.registry.read(user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE the push subscription of the authenticated user
#[utoipa::path(
    delete,
    path = "/api/subscription",
    responses(
        (status = 204, description = "Subscription deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No subscription"),
        (status = 500, description = "Subscription could not be deleted")
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE push subscription for {}", user.name);

    app_state.registry.delete(user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
