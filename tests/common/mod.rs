#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::util::ServiceExt;

use chat_notify_gateway::config::{BotConfig, OtelConfig, ServerConfig, Settings, WebhookConfig};
use chat_notify_gateway::server::{create_app, AppState};
use chat_notify_gateway::telegram::{
    Chat, ChatApi, ChatClientFactory, ChatId, DeliveryError, OutgoingMessage, SentMessage,
    WebhookInfo,
};

pub const DEFAULT_TOKEN: &str = "123456:default";

/// In-memory chat platform that records every send.
#[derive(Default)]
pub struct RecordingChat {
    pub fail_for: Vec<ChatId>,
    pub sent: Mutex<Vec<OutgoingMessage>>,
    pub closed: AtomicUsize,
}

impl RecordingChat {
    pub fn failing_for(fail_for: Vec<ChatId>) -> Self {
        Self {
            fail_for,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<SentMessage, DeliveryError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        if self.fail_for.contains(&message.chat_id) {
            return Err(DeliveryError::Api {
                code: 400,
                description: "Bad Request: chat not found".to_string(),
            });
        }
        Ok(SentMessage {
            message_id: sent.len() as i64,
            chat_id: 0,
        })
    }

    async fn get_chat(&self, _chat_id: &ChatId) -> Result<Chat, DeliveryError> {
        Err(DeliveryError::ClientClosed)
    }

    async fn get_webhook_info(&self) -> Result<WebhookInfo, DeliveryError> {
        Ok(WebhookInfo::default())
    }

    async fn set_webhook(&self, _url: &str, _secret: Option<&str>) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory handing out one shared recording client and counting creations.
pub struct RecordingFactory {
    pub client: Arc<RecordingChat>,
    pub credentials: Mutex<Vec<String>>,
}

impl RecordingFactory {
    pub fn created(&self) -> usize {
        self.credentials.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClientFactory for RecordingFactory {
    async fn create(&self, credential: &str) -> Result<Arc<dyn ChatApi>, DeliveryError> {
        self.credentials.lock().unwrap().push(credential.to_string());
        Ok(self.client.clone())
    }
}

pub struct TestContext {
    pub app: axum::Router,
    pub default_client: Arc<RecordingChat>,
    pub factory: Arc<RecordingFactory>,
}

pub fn settings(chat_ids: Vec<i64>, secret_token: Option<&str>) -> Settings {
    Settings {
        server: ServerConfig::default(),
        bot: BotConfig::new(DEFAULT_TOKEN, chat_ids.into_iter().map(ChatId::Id).collect()),
        webhook: WebhookConfig {
            base_url: None,
            secret_token: secret_token.map(String::from),
            register_on_startup: false,
        },
        otel: OtelConfig::default(),
    }
}

pub fn build_test_context(settings: Settings, fail_for: Vec<i64>) -> TestContext {
    let fail_for: Vec<ChatId> = fail_for.into_iter().map(ChatId::Id).collect();
    let default_client = Arc::new(RecordingChat::failing_for(fail_for.clone()));
    let factory = Arc::new(RecordingFactory {
        client: Arc::new(RecordingChat::failing_for(fail_for)),
        credentials: Mutex::new(vec![]),
    });

    let state = AppState::with_clients(settings, default_client.clone(), factory.clone());
    TestContext {
        app: create_app(state),
        default_client,
        factory,
    }
}

pub async fn request(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

pub async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request(app, req).await
}
