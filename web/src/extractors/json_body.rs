use crate::extractors::RejectionType;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use log::*;

/// Like [`Json`], but every malformed body is answered with 400 Bad Request.
pub(crate) struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!("Rejected malformed JSON body: {}", rejection.body_text());
                Err((StatusCode::BAD_REQUEST, rejection.body_text()))
            }
        }
    }
}
