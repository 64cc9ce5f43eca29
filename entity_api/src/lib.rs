use chrono::Utc;
use log::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub use entity::{posts, server_keys, subscriptions, users, Id};

pub mod error;
pub mod post;
pub mod server_key;
pub mod subscription;
pub mod user;

/// Inserts a handful of demo users so a freshly migrated database can be
/// logged into right away.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let now = Utc::now();

    for name in ["alice", "bob", "carol"] {
        let user = users::ActiveModel {
            id: Set(Id::new_v4()),
            name: Set(name.to_owned()),
            created_at: Set(now.into()),
        }
        .insert(db)
        .await?;

        info!("Seeded user {} with token {}", user.name, user.id);
    }

    Ok(())
}
