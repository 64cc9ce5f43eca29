use super::error::Error;
use entity::server_keys::{ActiveModel, Column, Entity, Model, VAPID_KEY_NAME};
use log::*;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ConnectionTrait, Set};

/// Loads the deployment's VAPID key pair, if one has been stored.
pub async fn find(db: &impl ConnectionTrait) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(VAPID_KEY_NAME.to_string()).one(db).await?)
}

/// Writes the key pair under the fixed key name. Concurrent first writers are
/// not serialized here: the last write wins.
pub async fn save(db: &impl ConnectionTrait, model: Model) -> Result<(), Error> {
    debug!("Persisting server key pair {}", VAPID_KEY_NAME);

    let active_model = ActiveModel {
        name: Set(VAPID_KEY_NAME.to_string()),
        x: Set(model.x),
        y: Set(model.y),
        d: Set(model.d),
        created_at: Set(model.created_at),
    };

    let on_conflict = OnConflict::column(Column::Name)
        .update_columns([Column::X, Column::Y, Column::D, Column::CreatedAt])
        .to_owned();

    Entity::insert(active_model)
        .on_conflict(on_conflict)
        .exec_without_returning(db)
        .await?;

    Ok(())
}
