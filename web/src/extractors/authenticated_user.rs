use crate::extractors::RejectionType;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use domain::users;

/// The user resolved by the `require_auth` middleware for this request.
#[derive(Clone, Debug)]
pub(crate) struct AuthenticatedUser(pub users::Model);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    // Only succeeds on routes layered with `require_auth`, which stores the
    // authenticated user in the request extensions.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))
    }
}
