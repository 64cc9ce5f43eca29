use domain::gateway::web_push::WebPushTransport;
use domain::key_manager::KeyManager;
use domain::notification::{notifier, DispatchSettings, NotificationDispatcher, Notifier};
use domain::storage::Storage;
use domain::subscription::SubscriptionRegistry;
use log::*;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
pub(crate) mod router;

pub use error::{Error, Result};

/// Everything a request handler needs, shared across the router.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub key_manager: KeyManager,
    pub registry: SubscriptionRegistry,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Wires the push pipeline over `storage`: a Web Push transport, the dispatcher
    /// and the notifier selected by `notifier_mode`.
    pub fn new(config: &Config, storage: Storage) -> core::result::Result<Self, domain::error::Error> {
        let key_manager = KeyManager::new(Arc::clone(&storage.keys));
        let registry = SubscriptionRegistry::new(Arc::clone(&storage.subscriptions));
        let transport = Arc::new(WebPushTransport::new(config)?);

        let dispatcher = NotificationDispatcher::new(
            key_manager.clone(),
            registry.clone(),
            transport,
            DispatchSettings::from_config(config),
        );
        info!("Notifications run in {} mode", config.notifier_mode);

        Ok(Self {
            notifier: notifier::from_config(config, dispatcher),
            storage,
            key_manager,
            registry,
        })
    }

    pub fn with_notifier(storage: Storage, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            key_manager: KeyManager::new(Arc::clone(&storage.keys)),
            registry: SubscriptionRegistry::new(Arc::clone(&storage.subscriptions)),
            storage,
            notifier,
        }
    }
}

pub async fn init_server(config: Config, app_state: AppState) -> std::io::Result<()> {
    let interface = config.interface.as_deref().unwrap_or("127.0.0.1");
    let listen_addr = format!("{interface}:{}", config.port);

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Server starting... listening for connections on http://{listen_addr}");

    axum::serve(listener, router::define_routes(&config, app_state)).await
}
