use sea_orm::entity::prelude::*;

/// Name of the single row holding the deployment's VAPID key pair.
pub const VAPID_KEY_NAME: &str = "vapid-keypair";

/// Persisted push-authentication key pair. Coordinates and scalar are stored
/// as raw big-endian byte strings.
#[derive(Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(schema_name = "pushpost", table_name = "server_keys")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub x: Vec<u8>,
    pub y: Vec<u8>,
    pub d: Vec<u8>,
    pub created_at: DateTimeWithTimeZone,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
