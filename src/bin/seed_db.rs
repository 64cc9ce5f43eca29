use log::{error, info};
use service::{config::Config, logging::Logger};

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Seeding database [{}]...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    match entity_api::seed_database(&db).await {
        Ok(()) => info!("Database seeded"),
        Err(e) => {
            error!("Failed to seed database: {e}");
            std::process::exit(1);
        }
    }
}
