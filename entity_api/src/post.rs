use super::error::Error;
use entity::posts::{ActiveModel, Column, Entity, Model};
use log::*;
use sea_orm::{
    entity::prelude::*, sea_query::OnConflict, ConnectionTrait, QueryOrder, Set, TransactionTrait,
};

/// Stores all posts in a single transaction; either every post is stored or
/// none is. A post whose id already exists replaces the stored row, so a client
/// re-uploading the same post leaves one copy.
pub async fn create_many(
    db: &(impl ConnectionTrait + TransactionTrait),
    posts: Vec<Model>,
) -> Result<Vec<Model>, Error> {
    debug!("Upserting {} post(s)", posts.len());

    let txn = db.begin().await?;
    let mut created = Vec::with_capacity(posts.len());
    for post in posts {
        let active_model = ActiveModel {
            id: Set(post.id),
            user_id: Set(post.user_id),
            author: Set(post.author),
            text: Set(post.text),
            time: Set(post.time),
        };
        let on_conflict = OnConflict::column(Column::Id)
            .update_columns([Column::UserId, Column::Author, Column::Text, Column::Time])
            .to_owned();
        created.push(
            Entity::insert(active_model)
                .on_conflict(on_conflict)
                .exec_with_returning(&txn)
                .await?,
        );
    }
    txn.commit().await?;

    Ok(created)
}

/// Returns every post, newest first.
pub async fn find_all(db: &impl ConnectionTrait) -> Result<Vec<Model>, Error> {
    Ok(Entity::find().order_by_desc(Column::Time).all(db).await?)
}
