pub(crate) mod authenticated_user;
pub(crate) mod json_body;

use axum::http::StatusCode;

type RejectionType = (StatusCode, String);
