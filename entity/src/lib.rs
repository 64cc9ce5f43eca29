use uuid::Uuid;

pub mod posts;
pub mod server_keys;
pub mod subscriptions;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
