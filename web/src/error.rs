use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};

use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                    EntityErrorKind::NotFound => {
                        debug!("Resource not found: {}", self.0);
                        (StatusCode::NOT_FOUND, "NOT FOUND").into_response()
                    }
                    EntityErrorKind::Invalid => {
                        warn!("Rejected invalid input: {}", self.0);
                        let message = self
                            .0
                            .source
                            .as_ref()
                            .map(|source| source.to_string())
                            .unwrap_or_else(|| "BAD REQUEST".to_string());
                        (StatusCode::BAD_REQUEST, message).into_response()
                    }
                    EntityErrorKind::Unauthenticated => {
                        (StatusCode::UNAUTHORIZED, "UNAUTHORIZED").into_response()
                    }
                    EntityErrorKind::Conflict => {
                        (StatusCode::CONFLICT, "CONFLICT").into_response()
                    }
                    EntityErrorKind::Store => {
                        error!("Storage failure: {}", self.0);
                        (StatusCode::INTERNAL_SERVER_ERROR, "storage failure").into_response()
                    }
                },
                InternalErrorKind::KeyUnavailable => {
                    error!("Server key unavailable: {}", self.0);
                    (StatusCode::INTERNAL_SERVER_ERROR, "server key unavailable").into_response()
                }
                InternalErrorKind::DispatchAborted => {
                    error!("Notification dispatch aborted: {}", self.0);
                    (StatusCode::INTERNAL_SERVER_ERROR, "notification dispatch aborted")
                        .into_response()
                }
                InternalErrorKind::Config => {
                    error!("Configuration error: {}", self.0);
                    (StatusCode::INTERNAL_SERVER_ERROR, "configuration error").into_response()
                }
                InternalErrorKind::Other(message) => {
                    error!("Internal error: {}", self.0);
                    (StatusCode::INTERNAL_SERVER_ERROR, message.clone()).into_response()
                }
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Network => {
                    warn!("Upstream network failure: {}", self.0);
                    (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
                }
                ExternalErrorKind::Other(message) => {
                    error!("External error: {}", self.0);
                    (StatusCode::INTERNAL_SERVER_ERROR, message.clone()).into_response()
                }
            },
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
