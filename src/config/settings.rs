use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use std::env;

use crate::telegram::ChatId;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub bot: BotConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Default bot credential
    pub token: String,
    /// Default recipients for notifications that name no chat
    #[serde(default, deserialize_with = "deserialize_chat_ids")]
    pub chat_ids: Vec<ChatId>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout for Bot API calls, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Fetch and log every default chat at startup
    #[serde(default)]
    pub log_chats_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Public base URL; the webhook path is appended to it
    pub base_url: Option<String>,
    /// Expected value of `X-Telegram-Bot-Api-Secret-Token`
    pub secret_token: Option<String>,
    #[serde(default = "default_true")]
    pub register_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "chat-notify-gateway".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

/// Chat id lists arrive as a proper list from config files, but as a single
/// number or a comma separated string from the environment.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawChatIds {
    One(i64),
    Many(Vec<ChatId>),
    Joined(String),
}

fn deserialize_chat_ids<'de, D>(deserializer: D) -> Result<Vec<ChatId>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawChatIds::deserialize(deserializer)? {
        RawChatIds::One(id) => Ok(vec![ChatId::Id(id)]),
        RawChatIds::Many(ids) => Ok(ids),
        RawChatIds::Joined(joined) => {
            parse_chat_id_list(&joined).map_err(serde::de::Error::custom)
        }
    }
}

/// Parse a comma separated list of chat ids, skipping empty segments.
pub fn parse_chat_id_list(raw: &str) -> Result<Vec<ChatId>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ChatId>())
        .collect()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("bot.api_base_url", default_api_base_url())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Nested variables: BOT__TOKEN, SERVER__PORT, WEBHOOK__BASE_URL, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            // Flat variables used by existing deployments
            .set_override_option("bot.token", env::var("BOT_TOKEN").ok())?
            .set_override_option("bot.chat_ids", env::var("GROUP_IDS").ok())?
            .set_override_option("webhook.base_url", env::var("WEBHOOK_URL").ok())?
            .set_override_option("server.host", env::var("WEBAPP_HOST").ok())?
            .set_override_option("server.port", env::var("WEBAPP_PORT").ok())?;

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.token.trim().is_empty() {
            return Err(ConfigError::Message("bot.token must not be empty".into()));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Path the chat platform posts updates to.
    pub fn webhook_path(&self) -> String {
        format!("/bot/{}", self.bot.token)
    }

    /// Full webhook URL, if a public base URL is configured.
    pub fn webhook_url(&self) -> Option<String> {
        self.webhook
            .base_url
            .as_deref()
            .map(|base| format!("{}{}", base.trim_end_matches('/'), self.webhook_path()))
    }
}

impl BotConfig {
    pub fn new(token: impl Into<String>, chat_ids: Vec<ChatId>) -> Self {
        Self {
            token: token.into(),
            chat_ids,
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
            log_chats_on_startup: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            secret_token: None,
            register_on_startup: true,
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
