//! Domain layer of the push-post service.
//!
//! Entity models are re-exported from `entity_api` so that `web` never needs to
//! depend on the persistence crates directly.
pub use entity_api::{posts, server_keys, subscriptions, users, Id};

pub mod error;
pub mod gateway;
pub mod key_manager;
pub mod notification;
pub mod post;
pub mod storage;
pub mod subscription;
pub mod user;
