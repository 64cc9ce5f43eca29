use crate::{AppState, Error};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use log::*;

/// GET the server's push public key
///
/// The body is the 65-byte uncompressed P-256 point, ready to be passed to
/// `PushManager.subscribe` as `applicationServerKey`. The key is created on first request.
#[utoipa::path(
    get,
    path = "/vapid-public-key",
    responses(
        (status = 200, description = "Raw uncompressed public key bytes", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 500, description = "Server key could not be loaded or created")
    )
)]
pub async fn read(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    trace!("GET server public key");

    let public_key = app_state.key_manager.public_key_bytes().await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        public_key,
    ))
}
