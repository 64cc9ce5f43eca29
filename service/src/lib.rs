use config::Config;
use log::info;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tokio::time::Duration;

pub mod config;
pub mod logging;

/// PostgreSQL schema holding every table of the service.
pub const DB_SCHEMA: &str = "pushpost";

/// Connects the pool used by the Postgres storage backend.
pub async fn init_database(config: &Config) -> Result<DatabaseConnection, DbErr> {
    info!(
        "Connecting to Postgres: max_connections={}, min_connections={}, acquire_timeout={}s",
        config.db_max_connections, config.db_min_connections, config.db_acquire_timeout_secs,
    );

    Database::connect(connect_options(config)).await
}

fn connect_options(config: &Config) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.database_url().to_owned());
    opt.max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
        // Statement logging only when the operator asked for everything.
        .sqlx_logging(config.log_level_filter == log::LevelFilter::Trace)
        .sqlx_logging_level(log::LevelFilter::Debug)
        .set_schema_search_path(DB_SCHEMA);
    opt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn pool_options_follow_the_config() {
        let config = Config::try_from_args([
            "pushpost_rs",
            "--database-url",
            "postgres://pushpost:secret@db:5432/pushpost",
            "--db-max-connections",
            "12",
            "--db-connect-timeout-secs",
            "3",
        ])
        .unwrap();

        let opt = connect_options(&config);

        assert_eq!(opt.get_url(), "postgres://pushpost:secret@db:5432/pushpost");
        assert_eq!(opt.get_max_connections(), Some(12));
        assert_eq!(opt.get_connect_timeout(), Some(Duration::from_secs(3)));
    }
}
