//! Chat platform client.
//!
//! The gateway talks to the Telegram Bot API through the [`ChatApi`] trait so the
//! dispatch logic can be exercised against in-memory fakes. [`BotClient`] is the
//! HTTP implementation; [`BotClientFactory`] builds clients for credentials other
//! than the configured default.

mod client;
mod error;
mod types;

use std::sync::Arc;

use async_trait::async_trait;

pub use client::{BotClient, BotClientFactory};
pub use error::DeliveryError;
pub use types::{
    ApiResponse, Chat, ChatId, Message, OutgoingMessage, ParseMode, ReplyParameters,
    SentMessage, SetWebhookRequest, Update, User, WebhookInfo,
};

/// Operations the gateway needs from the chat platform.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Deliver one message to one chat.
    async fn send_message(&self, message: &OutgoingMessage) -> Result<SentMessage, DeliveryError>;

    /// Look up a chat's metadata.
    async fn get_chat(&self, chat_id: &ChatId) -> Result<Chat, DeliveryError>;

    /// Current webhook registration.
    async fn get_webhook_info(&self) -> Result<WebhookInfo, DeliveryError>;

    /// Point the platform's update delivery at `url`.
    async fn set_webhook(&self, url: &str, secret_token: Option<&str>)
        -> Result<(), DeliveryError>;

    /// Release the client. Calls made afterwards fail with `ClientClosed`.
    async fn close(&self);
}

/// Builds clients bound to an arbitrary bot credential.
#[async_trait]
pub trait ChatClientFactory: Send + Sync {
    async fn create(&self, credential: &str) -> Result<Arc<dyn ChatApi>, DeliveryError>;
}
