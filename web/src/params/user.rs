use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct NameParams {
    pub name: String,
}

/// Returned on login. `token` goes into the `Authorization` header of later requests.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct SessionResponse {
    pub name: String,
    pub token: String,
}
