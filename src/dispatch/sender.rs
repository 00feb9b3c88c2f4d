use futures::stream::{FuturesUnordered, StreamExt};

use crate::metrics::DeliveryMetrics;
use crate::telegram::{ChatApi, ChatId, OutgoingMessage, ParseMode};

/// Maximum number of sends in flight for one notification
const MAX_CONCURRENT_SENDS: usize = 16;

/// A message already escaped for its parse mode, plus thread/reply context.
#[derive(Debug, Clone)]
pub struct PreparedMessage {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub topic_id: Option<i64>,
    pub reply_to_message_id: Option<i64>,
}

impl PreparedMessage {
    fn for_chat(&self, chat_id: ChatId) -> OutgoingMessage {
        OutgoingMessage::new(chat_id, self.text.clone())
            .parse_mode(self.parse_mode)
            .thread(self.topic_id)
            .reply_to(self.reply_to_message_id)
    }
}

/// Outcome of the send to one recipient.
#[derive(Debug, Clone)]
pub struct RecipientOutcome {
    pub chat_id: ChatId,
    /// Message id on success, error detail on failure
    pub result: Result<i64, String>,
}

impl RecipientOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate outcome of one fan-out.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub outcomes: Vec<RecipientOutcome>,
}

impl DispatchOutcome {
    /// True only when every targeted recipient accepted the message.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(RecipientOutcome::succeeded)
    }

    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }
}

/// Send `message` to every recipient, isolating failures per recipient.
///
/// Never fails as a whole: each recipient's error is logged and recorded in its
/// own [`RecipientOutcome`]. All sends complete before this returns.
pub async fn fan_out(
    client: &dyn ChatApi,
    message: &PreparedMessage,
    recipients: &[ChatId],
) -> DispatchOutcome {
    let mut futures = FuturesUnordered::new();
    let mut outcomes = Vec::with_capacity(recipients.len());
    let mut pending = recipients.iter();

    loop {
        while futures.len() < MAX_CONCURRENT_SENDS {
            let Some(chat_id) = pending.next() else {
                break;
            };
            let outgoing = message.for_chat(chat_id.clone());
            futures.push(async move {
                let result = client.send_message(&outgoing).await;
                (outgoing.chat_id, result)
            });
        }

        let Some((chat_id, result)) = futures.next().await else {
            break;
        };

        let result = match result {
            Ok(sent) => {
                DeliveryMetrics::record_delivered();
                tracing::debug!(
                    chat_id = %chat_id,
                    message_id = sent.message_id,
                    "Message delivered"
                );
                Ok(sent.message_id)
            }
            Err(e) => {
                DeliveryMetrics::record_failed();
                tracing::warn!(chat_id = %chat_id, error = %e, "Failed to send message to chat");
                Err(e.to_string())
            }
        };
        outcomes.push(RecipientOutcome { chat_id, result });
    }

    DispatchOutcome { outcomes }
}
