use crate::metrics::WebhookMetrics;
use crate::telegram::{ChatApi, ChatId, DeliveryError, Message, OutgoingMessage, Update};

/// Fixed acknowledgement sent back for every inbound message
pub const ECHO_REPLY: &str = "I received your message!";

/// Acknowledge `message` in the chat (and topic thread) it came from.
pub async fn echo_message(api: &dyn ChatApi, message: &Message) -> Result<(), DeliveryError> {
    let thread_id = message
        .is_topic_message
        .then_some(message.message_thread_id)
        .flatten();

    let reply = OutgoingMessage::new(ChatId::Id(message.chat.id), ECHO_REPLY).thread(thread_id);
    api.send_message(&reply).await?;
    Ok(())
}

/// Route one inbound update to its handler.
#[tracing::instrument(
    name = "bot.handle_update",
    skip(api, update),
    fields(update_id = update.update_id)
)]
pub async fn handle_update(api: &dyn ChatApi, update: Update) {
    let Some(message) = update.message else {
        WebhookMetrics::record_ignored();
        tracing::debug!("Ignoring update without a message");
        return;
    };

    WebhookMetrics::record_message();
    if let Err(e) = echo_message(api, &message).await {
        tracing::warn!(chat_id = message.chat.id, error = %e, "Failed to answer message");
    }
}
