use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::dispatch::NotificationDispatcher;
use crate::telegram::{BotClient, BotClientFactory, ChatApi, ChatClientFactory, DeliveryError};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build state backed by the real Bot API.
    pub fn new(settings: Settings) -> Result<Self, DeliveryError> {
        let default_client: Arc<dyn ChatApi> = Arc::new(BotClient::new(&settings.bot)?);
        let factory: Arc<dyn ChatClientFactory> = Arc::new(BotClientFactory::new(&settings.bot)?);
        Ok(Self::with_clients(settings, default_client, factory))
    }

    /// Build state around caller-supplied clients.
    pub fn with_clients(
        settings: Settings,
        default_client: Arc<dyn ChatApi>,
        factory: Arc<dyn ChatClientFactory>,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(default_client, factory));

        Self {
            settings: Arc::new(settings),
            dispatcher,
            started_at: Utc::now(),
        }
    }
}
