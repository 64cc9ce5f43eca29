use super::error::Error;
use chrono::Utc;
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};

pub async fn create(db: &impl ConnectionTrait, name: String) -> Result<Model, Error> {
    debug!("New User to be inserted: {name}");

    let user_active_model = ActiveModel {
        id: Set(Id::new_v4()),
        name: Set(name),
        created_at: Set(Utc::now().into()),
    };

    Ok(user_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or(Error::not_found())
}

pub async fn find_by_name(db: &impl ConnectionTrait, name: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find().filter(Column::Name.eq(name)).one(db).await?)
}
