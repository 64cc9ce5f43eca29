use domain::storage::Storage;
use log::*;
use migration::{Migrator, MigratorTrait};
use service::config::{Config, StorageBackend};
use service::logging::Logger;
use std::sync::Arc;
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting up in {} with {} storage...",
        config.runtime_env(),
        config.storage_backend
    );

    let storage = match config.storage_backend {
        StorageBackend::Postgres => {
            let db = match service::init_database(&config).await {
                Ok(db) => Arc::new(db),
                Err(e) => {
                    error!("Failed to establish database connection: {e}");
                    std::process::exit(1);
                }
            };

            if let Err(e) = Migrator::up(db.as_ref(), None).await {
                error!("Failed to apply database migrations: {e}");
                std::process::exit(1);
            }

            Storage::database(db)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, nothing will survive a restart");
            Storage::memory()
        }
    };

    let app_state = match AppState::new(&config, storage) {
        Ok(app_state) => app_state,
        Err(e) => {
            error!("Failed to initialize push notifications: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = web::init_server(config, app_state).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
