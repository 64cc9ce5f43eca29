use crate::error::{DomainErrorKind, EntityErrorKind, Error, InternalErrorKind};
use crate::storage::UserStore;
use crate::{users, Id};
use log::*;

pub async fn register(store: &dyn UserStore, name: String) -> Result<users::Model, Error> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::invalid("user name must not be empty"));
    }

    let user = store.create_user(name).await?;
    info!("Registered user {}", user.name);
    Ok(user)
}

/// Looks a user up by name. The returned id doubles as the session token.
pub async fn login(store: &dyn UserStore, name: &str) -> Result<users::Model, Error> {
    store
        .find_user_by_name(name.trim())
        .await?
        .ok_or_else(Error::not_found)
}

pub async fn find_by_id(store: &dyn UserStore, id: Id) -> Result<users::Model, Error> {
    store.find_user(id).await?.ok_or_else(Error::not_found)
}

/// Resolves a session token to its user, failing as unauthenticated for any
/// token that is malformed or unknown.
pub async fn authenticate(store: &dyn UserStore, token: &str) -> Result<users::Model, Error> {
    let unauthenticated = || Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
            EntityErrorKind::Unauthenticated,
        )),
    };

    let id = Id::parse_str(token.trim()).map_err(|_| unauthenticated())?;
    store.find_user(id).await?.ok_or_else(unauthenticated)
}
