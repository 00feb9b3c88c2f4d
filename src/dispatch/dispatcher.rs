use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::NotificationMetrics;
use crate::telegram::{ChatApi, ChatClientFactory, DeliveryError};

use super::sender::{fan_out, DispatchOutcome, PreparedMessage};
use super::{Credential, ResolvedNotification};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to create client for custom credential: {0}")]
    ClientSetup(#[source] DeliveryError),
}

/// Client bound to a per-request credential.
///
/// Call [`ScopedClient::release`] when done. A guard dropped without release
/// (e.g. the request future was cancelled) still closes its client once, on a
/// spawned task.
pub struct ScopedClient {
    client: Arc<dyn ChatApi>,
    released: bool,
}

impl ScopedClient {
    pub async fn acquire(
        factory: &dyn ChatClientFactory,
        credential: &str,
    ) -> Result<Self, DeliveryError> {
        let client = factory.create(credential).await?;
        NotificationMetrics::record_custom_client();
        Ok(Self {
            client,
            released: false,
        })
    }

    pub fn client(&self) -> &dyn ChatApi {
        self.client.as_ref()
    }

    pub async fn release(mut self) {
        self.released = true;
        self.client.close().await;
    }
}

impl Drop for ScopedClient {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        tracing::warn!("Scoped client dropped without release, closing in background");
        let client = self.client.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                client.close().await;
            });
        }
    }
}

/// Statistics for the notification dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Notifications dispatched
    pub total_notifications: AtomicU64,
    /// Notifications every recipient accepted
    pub total_succeeded: AtomicU64,
    /// Notifications at least one recipient rejected
    pub total_failed: AtomicU64,
    /// Individual messages delivered
    pub messages_delivered: AtomicU64,
    /// Individual messages that failed
    pub messages_failed: AtomicU64,
    /// Clients created for non-default credentials
    pub custom_clients: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_notifications: self.total_notifications.load(Ordering::Relaxed),
            total_succeeded: self.total_succeeded.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
            custom_clients: self.custom_clients.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &DispatchOutcome) {
        self.total_notifications.fetch_add(1, Ordering::Relaxed);
        if outcome.all_succeeded() {
            self.total_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.total_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.messages_delivered
            .fetch_add(outcome.delivered() as u64, Ordering::Relaxed);
        self.messages_failed
            .fetch_add(outcome.failed() as u64, Ordering::Relaxed);
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_notifications: u64,
    pub total_succeeded: u64,
    pub total_failed: u64,
    pub messages_delivered: u64,
    pub messages_failed: u64,
    pub custom_clients: u64,
}

/// Sends resolved notifications through the default or a per-request client.
pub struct NotificationDispatcher {
    default_client: Arc<dyn ChatApi>,
    factory: Arc<dyn ChatClientFactory>,
    stats: DispatcherStats,
}

impl NotificationDispatcher {
    pub fn new(default_client: Arc<dyn ChatApi>, factory: Arc<dyn ChatClientFactory>) -> Self {
        Self {
            default_client,
            factory,
            stats: DispatcherStats::default(),
        }
    }

    /// Client bound to the configured default credential
    pub fn default_client(&self) -> Arc<dyn ChatApi> {
        self.default_client.clone()
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Escape the text and send it to every recipient.
    ///
    /// Per-recipient failures are reported through the returned outcome; only a
    /// failure to build the custom credential's client is an error.
    #[tracing::instrument(
        name = "dispatcher.dispatch",
        skip(self, notification),
        fields(
            notification_id = %Uuid::new_v4(),
            format = %notification.format,
            recipients = notification.recipients.len(),
            custom_credential = notification.credential.is_custom()
        )
    )]
    pub async fn dispatch(
        &self,
        notification: &ResolvedNotification,
    ) -> Result<DispatchOutcome, DispatchError> {
        let started = Instant::now();
        let message = PreparedMessage {
            text: notification.format.escape(&notification.text),
            parse_mode: notification.format.parse_mode(),
            topic_id: notification.topic_id,
            reply_to_message_id: notification.reply_to_message_id,
        };

        let outcome = match &notification.credential {
            Credential::Default => {
                fan_out(self.default_client.as_ref(), &message, &notification.recipients).await
            }
            Credential::Custom(token) => {
                let scoped = ScopedClient::acquire(self.factory.as_ref(), token)
                    .await
                    .map_err(|e| {
                        NotificationMetrics::record_failure();
                        DispatchError::ClientSetup(e)
                    })?;
                self.stats.custom_clients.fetch_add(1, Ordering::Relaxed);

                let outcome = fan_out(scoped.client(), &message, &notification.recipients).await;
                scoped.release().await;
                outcome
            }
        };

        self.stats.record(&outcome);
        NotificationMetrics::observe_latency(started.elapsed().as_secs_f64());
        if outcome.all_succeeded() {
            NotificationMetrics::record_success();
        } else {
            NotificationMetrics::record_failure();
        }

        tracing::info!(
            delivered = outcome.delivered(),
            failed = outcome.failed(),
            "Notification dispatched"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::dispatch::MessageFormat;
    use crate::telegram::{Chat, ChatId, OutgoingMessage, SentMessage, WebhookInfo};

    #[derive(Default)]
    struct FakeChat {
        fail_for: Vec<ChatId>,
        sent: Mutex<Vec<OutgoingMessage>>,
        closed: AtomicUsize,
    }

    #[async_trait]
    impl ChatApi for FakeChat {
        async fn send_message(
            &self,
            message: &OutgoingMessage,
        ) -> Result<SentMessage, DeliveryError> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail_for.contains(&message.chat_id) {
                return Err(DeliveryError::api(Some(400), Some("chat not found".into())));
            }
            Ok(SentMessage {
                message_id: 1,
                chat_id: 0,
            })
        }

        async fn get_chat(&self, _chat_id: &ChatId) -> Result<Chat, DeliveryError> {
            Err(DeliveryError::ClientClosed)
        }

        async fn get_webhook_info(&self) -> Result<WebhookInfo, DeliveryError> {
            Ok(WebhookInfo::default())
        }

        async fn set_webhook(
            &self,
            _url: &str,
            _secret: Option<&str>,
        ) -> Result<(), DeliveryError> {
            Ok(())
        }

        async fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeFactory {
        client: Arc<FakeChat>,
        created: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ChatClientFactory for FakeFactory {
        async fn create(&self, _credential: &str) -> Result<Arc<dyn ChatApi>, DeliveryError> {
            if self.fail {
                return Err(DeliveryError::api(Some(401), Some("Unauthorized".into())));
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(self.client.clone())
        }
    }

    /// Formatted log output collected while the guard from [`capture_logs`] is held.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines_containing(&self, needle: &str) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .filter(|line| line.contains(needle))
                .map(str::to_string)
                .collect()
        }
    }

    fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    fn setup(
        fail_for: Vec<ChatId>,
        factory_fails: bool,
    ) -> (NotificationDispatcher, Arc<FakeChat>, Arc<FakeFactory>) {
        let default_client = Arc::new(FakeChat {
            fail_for: fail_for.clone(),
            ..Default::default()
        });
        let factory = Arc::new(FakeFactory {
            client: Arc::new(FakeChat {
                fail_for,
                ..Default::default()
            }),
            created: AtomicUsize::new(0),
            fail: factory_fails,
        });
        let dispatcher = NotificationDispatcher::new(default_client.clone(), factory.clone());
        (dispatcher, default_client, factory)
    }

    fn notification(
        text: &str,
        credential: Credential,
        recipients: Vec<ChatId>,
    ) -> ResolvedNotification {
        ResolvedNotification {
            text: text.to_string(),
            format: MessageFormat::detect(text),
            credential,
            recipients,
            topic_id: None,
            reply_to_message_id: None,
        }
    }

    #[tokio::test]
    async fn test_sends_to_every_recipient() {
        let (dispatcher, client, _) = setup(vec![], false);
        let outcome = dispatcher
            .dispatch(&notification(
                "hello",
                Credential::Default,
                vec![ChatId::Id(-1001), ChatId::Id(-1002)],
            ))
            .await
            .unwrap();

        assert!(outcome.all_succeeded());
        let sent = client.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.text == "hello" && m.parse_mode.is_none()));
        assert_eq!(client.closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_recipient() {
        let (dispatcher, client, _) = setup(vec![ChatId::Id(2)], false);
        let outcome = dispatcher
            .dispatch(&notification(
                "hello",
                Credential::Default,
                vec![ChatId::Id(1), ChatId::Id(2), ChatId::Id(3)],
            ))
            .await
            .unwrap();

        assert!(!outcome.all_succeeded());
        assert_eq!(outcome.delivered(), 2);
        assert_eq!(outcome.failed(), 1);
        assert_eq!(client.sent.lock().unwrap().len(), 3);

        let stats = dispatcher.stats();
        assert_eq!(stats.total_failed, 1);
        assert_eq!(stats.messages_delivered, 2);
        assert_eq!(stats.messages_failed, 1);
    }

    #[tokio::test]
    async fn test_each_recipient_gets_one_log_record() {
        let (logs, _guard) = capture_logs();
        let (dispatcher, _, _) = setup(vec![ChatId::Id(2)], false);
        dispatcher
            .dispatch(&notification(
                "hello",
                Credential::Default,
                vec![ChatId::Id(1), ChatId::Id(2), ChatId::Id(3)],
            ))
            .await
            .unwrap();

        let failures = logs.lines_containing("Failed to send message to chat");
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("chat_id=2 "));
        assert!(failures[0].contains("chat not found"));

        let delivered = logs.lines_containing("Message delivered");
        assert_eq!(delivered.len(), 2);
        for id in [1, 3] {
            let field = format!("chat_id={} ", id);
            assert_eq!(delivered.iter().filter(|l| l.contains(&field)).count(), 1);
            assert!(!failures[0].contains(&field));
        }
    }

    #[tokio::test]
    async fn test_text_is_escaped_for_format() {
        let (dispatcher, client, _) = setup(vec![], false);
        dispatcher
            .dispatch(&notification("*bold*", Credential::Default, vec![ChatId::Id(1)]))
            .await
            .unwrap();

        let sent = client.sent.lock().unwrap();
        assert_eq!(sent[0].text, "\\*bold\\*");
        assert_eq!(sent[0].parse_mode, Some(crate::telegram::ParseMode::MarkdownV2));
    }

    #[tokio::test]
    async fn test_custom_credential_client_is_released_once() {
        let (dispatcher, default_client, factory) = setup(vec![ChatId::Id(2)], false);
        let outcome = dispatcher
            .dispatch(&notification(
                "hello",
                Credential::Custom("X".into()),
                vec![ChatId::Id(1), ChatId::Id(2)],
            ))
            .await
            .unwrap();

        assert!(!outcome.all_succeeded());
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        assert_eq!(factory.client.closed.load(Ordering::SeqCst), 1);
        assert_eq!(factory.client.sent.lock().unwrap().len(), 2);
        assert!(default_client.sent.lock().unwrap().is_empty());
        assert_eq!(dispatcher.stats().custom_clients, 1);
    }

    #[tokio::test]
    async fn test_custom_client_setup_failure() {
        let (dispatcher, default_client, _) = setup(vec![], true);
        let result = dispatcher
            .dispatch(&notification(
                "hello",
                Credential::Custom("X".into()),
                vec![ChatId::Id(1)],
            ))
            .await;

        assert!(matches!(result, Err(DispatchError::ClientSetup(_))));
        assert!(default_client.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_scoped_client_is_closed() {
        let client = Arc::new(FakeChat::default());
        let factory = FakeFactory {
            client: client.clone(),
            created: AtomicUsize::new(0),
            fail: false,
        };

        let scoped = ScopedClient::acquire(&factory, "X").await.unwrap();
        drop(scoped);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(client.closed.load(Ordering::SeqCst), 1);
    }
}
