use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::*;

/// Resolves the `Authorization` header to a user, returning 401 Unauthorized when
/// it is missing or unknown. Accepts either the bare token or `Bearer <token>`.
pub async fn require_auth(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).to_string())
    else {
        trace!("Request without an Authorization header");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    match domain::user::authenticate(app_state.storage.users.as_ref(), &token).await {
        Ok(user) => {
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        Err(err) => Error::from(err).into_response(),
    }
}
