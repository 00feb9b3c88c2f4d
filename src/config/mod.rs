mod settings;

pub use settings::{
    parse_chat_id_list, BotConfig, OtelConfig, ServerConfig, Settings, WebhookConfig,
};
