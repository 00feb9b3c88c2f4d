use serde::Serialize;

use crate::telegram::{ChatApi, ChatId};

/// What the bot can see of one configured chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSummary {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
}

/// Fetch and log every chat in `chat_ids`. Chats that cannot be fetched are
/// logged and skipped.
pub async fn log_available_chats(api: &dyn ChatApi, chat_ids: &[ChatId]) -> Vec<ChatSummary> {
    let mut available = Vec::with_capacity(chat_ids.len());

    for chat_id in chat_ids {
        match api.get_chat(chat_id).await {
            Ok(chat) => available.push(ChatSummary {
                id: chat.id,
                kind: chat.kind,
                title: chat.title,
            }),
            Err(e) => {
                tracing::error!(chat_id = %chat_id, error = %e, "Error fetching chat info");
            }
        }
    }

    tracing::info!(count = available.len(), "Available chats for bot");
    for chat in &available {
        tracing::info!(chat_id = chat.id, kind = %chat.kind, title = ?chat.title, "Chat");
    }

    available
}
