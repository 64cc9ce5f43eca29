use super::error::Error;
use chrono::Utc;
use entity::subscriptions::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ConnectionTrait, Set};

/// Stores `model` as the one subscription of `model.user_id`, replacing any
/// previous one in a single `INSERT .. ON CONFLICT (user_id) DO UPDATE`.
/// Calling this N times for a user always leaves exactly the Nth payload.
pub async fn create_or_replace(db: &impl ConnectionTrait, model: Model) -> Result<Model, Error> {
    debug!(
        "Upserting push subscription for user_id: {}, endpoint: {}",
        model.user_id, model.endpoint
    );

    let now = Utc::now();
    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        user_id: Set(model.user_id),
        endpoint: Set(model.endpoint),
        p256dh: Set(model.p256dh),
        auth: Set(model.auth),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    let on_conflict = OnConflict::column(Column::UserId)
        .update_columns([
            Column::Endpoint,
            Column::P256dh,
            Column::Auth,
            Column::UpdatedAt,
        ])
        .to_owned();

    Ok(Entity::insert(active_model)
        .on_conflict(on_conflict)
        .exec_with_returning(db)
        .await?)
}

pub async fn find_by_user_id(db: &impl ConnectionTrait, user_id: Id) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Returns every stored subscription. Callers must not rely on the order.
pub async fn find_all(db: &impl ConnectionTrait) -> Result<Vec<Model>, Error> {
    Ok(Entity::find().all(db).await?)
}

pub async fn delete_by_user_id(db: &impl ConnectionTrait, user_id: Id) -> Result<(), Error> {
    let result = Entity::delete_many()
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }

    Ok(())
}
