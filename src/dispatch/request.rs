//! Raw notification inputs, as they arrive from each source.

use serde::Deserialize;

use crate::config::parse_chat_id_list;
use crate::telegram::ChatId;

use super::ResolveError;

/// One chat id or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChatTarget {
    One(ChatId),
    Many(Vec<ChatId>),
}

impl ChatTarget {
    pub fn into_vec(self) -> Vec<ChatId> {
        match self {
            ChatTarget::One(id) => vec![id],
            ChatTarget::Many(ids) => ids,
        }
    }
}

/// Every field a single input source may carry. All optional.
///
/// The JSON body of `POST /send_notification` deserializes straight into this.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFields {
    pub text: Option<String>,
    /// Older name for `text`; consulted only when `text` is absent or empty
    pub message: Option<String>,
    pub format: Option<String>,
    pub bot_id: Option<String>,
    pub chat_id: Option<ChatTarget>,
    pub topic_id: Option<i64>,
    pub reply_to_message_id: Option<i64>,
}

/// Query string parameters accepted by `POST /send_notification`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    pub text: Option<String>,
    pub bot_id: Option<String>,
    /// Single id or comma separated list
    pub chat_id: Option<String>,
    pub topic_id: Option<i64>,
}

impl NotificationQuery {
    pub fn into_fields(self) -> Result<NotificationFields, ResolveError> {
        let chat_id = match self.chat_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let ids = parse_chat_id_list(raw).map_err(ResolveError::InvalidChatId)?;
                Some(ChatTarget::Many(ids))
            }
            _ => None,
        };

        Ok(NotificationFields {
            text: self.text,
            bot_id: self.bot_id,
            chat_id,
            topic_id: self.topic_id,
            ..NotificationFields::default()
        })
    }
}

/// Inputs for one call, tagged by where they came from.
#[derive(Debug, Clone, Default)]
pub struct NotificationInput {
    pub query: NotificationFields,
    pub body: NotificationFields,
}
