//! Collapses overlapping notification inputs into one validated request.
//!
//! Every field is resolved independently, highest precedence first:
//! query string, then request body, then the configured default (credential and
//! recipients only). Empty strings count as absent.

use std::fmt;

use thiserror::Error;

use crate::config::BotConfig;
use crate::telegram::ChatId;

use super::{MessageFormat, NotificationFields, NotificationInput};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Message text cannot be empty")]
    EmptyMessage,

    #[error("Chat list cannot be empty")]
    EmptyRecipients,

    #[error("No default chats configured")]
    NoRecipients,

    #[error("{0}")]
    InvalidChatId(String),
}

/// Which bot identity sends the message.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Default,
    Custom(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Default => f.write_str("Default"),
            Credential::Custom(_) => f.write_str("Custom(<redacted>)"),
        }
    }
}

impl Credential {
    pub fn is_custom(&self) -> bool {
        matches!(self, Credential::Custom(_))
    }
}

/// A notification with every ambiguity resolved, ready for fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNotification {
    pub text: String,
    pub format: MessageFormat,
    pub credential: Credential,
    /// Never empty
    pub recipients: Vec<ChatId>,
    pub topic_id: Option<i64>,
    pub reply_to_message_id: Option<i64>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn effective_text(fields: &NotificationFields) -> Option<&str> {
    non_empty(&fields.text).or_else(|| non_empty(&fields.message))
}

/// Resolve and validate `input` against the configured defaults.
///
/// Fails before any network activity when the text is blank or no recipient
/// remains.
pub fn resolve(
    input: NotificationInput,
    defaults: &BotConfig,
) -> Result<ResolvedNotification, ResolveError> {
    let NotificationInput { query, body } = input;

    let text = effective_text(&query)
        .or_else(|| effective_text(&body))
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ResolveError::EmptyMessage);
    }
    let text = text.to_string();

    let explicit_format = non_empty(&query.format).or_else(|| non_empty(&body.format));
    let format = MessageFormat::resolve(explicit_format, &text);

    let credential = match non_empty(&query.bot_id).or_else(|| non_empty(&body.bot_id)) {
        Some(token) if token != defaults.token => Credential::Custom(token.to_string()),
        _ => Credential::Default,
    };

    let recipients = match query.chat_id.or(body.chat_id) {
        Some(target) => {
            let ids = target.into_vec();
            if ids.is_empty() {
                return Err(ResolveError::EmptyRecipients);
            }
            ids
        }
        None if defaults.chat_ids.is_empty() => return Err(ResolveError::NoRecipients),
        None => defaults.chat_ids.clone(),
    };

    Ok(ResolvedNotification {
        text,
        format,
        credential,
        recipients,
        topic_id: query.topic_id.or(body.topic_id),
        reply_to_message_id: query.reply_to_message_id.or(body.reply_to_message_id),
    })
}
