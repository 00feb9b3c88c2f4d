use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::config::BotConfig;

use super::{
    ApiResponse, Chat, ChatApi, ChatClientFactory, ChatId, DeliveryError, Message,
    OutgoingMessage, SentMessage, SetWebhookRequest, WebhookInfo,
};

/// Bot API client bound to a single credential.
pub struct BotClient {
    http: reqwest::Client,
    api_base_url: String,
    token: String,
    closed: AtomicBool,
}

impl BotClient {
    /// Create a client with its own connection pool.
    pub fn new(config: &BotConfig) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(DeliveryError::http)?;
        Ok(Self::with_http(http, &config.api_base_url, &config.token))
    }

    /// Create a client that shares an existing connection pool.
    pub fn with_http(http: reqwest::Client, api_base_url: &str, token: &str) -> Self {
        Self {
            http,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.token, method)
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, DeliveryError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if self.is_closed() {
            return Err(DeliveryError::ClientClosed);
        }

        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(DeliveryError::http)?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            DeliveryError::Decode(format!("{} (HTTP {})", e.without_url(), status))
        })?;

        if !envelope.ok {
            return Err(DeliveryError::api(envelope.error_code, envelope.description));
        }

        envelope
            .result
            .ok_or_else(|| DeliveryError::Decode(format!("{} returned no result", method)))
    }
}

#[async_trait]
impl ChatApi for BotClient {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<SentMessage, DeliveryError> {
        let sent: Message = self.call("sendMessage", message).await?;
        Ok(sent.into())
    }

    async fn get_chat(&self, chat_id: &ChatId) -> Result<Chat, DeliveryError> {
        self.call("getChat", &json!({ "chat_id": chat_id })).await
    }

    async fn get_webhook_info(&self) -> Result<WebhookInfo, DeliveryError> {
        self.call("getWebhookInfo", &json!({})).await
    }

    async fn set_webhook(
        &self,
        url: &str,
        secret_token: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let _: bool = self
            .call("setWebhook", &SetWebhookRequest { url, secret_token })
            .await?;
        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Bot client closed");
        }
    }
}

/// Builds [`BotClient`]s for per-request credentials, sharing one connection pool.
pub struct BotClientFactory {
    http: reqwest::Client,
    api_base_url: String,
}

impl BotClientFactory {
    pub fn new(config: &BotConfig) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(DeliveryError::http)?;
        Ok(Self {
            http,
            api_base_url: config.api_base_url.clone(),
        })
    }
}

#[async_trait]
impl ChatClientFactory for BotClientFactory {
    async fn create(&self, credential: &str) -> Result<Arc<dyn ChatApi>, DeliveryError> {
        if credential.trim().is_empty() {
            return Err(DeliveryError::api(None, Some("empty bot credential".into())));
        }
        Ok(Arc::new(BotClient::with_http(
            self.http.clone(),
            &self.api_base_url,
            credential,
        )))
    }
}
