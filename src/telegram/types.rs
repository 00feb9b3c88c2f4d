//! Bot API wire types used by the gateway.
//!
//! Only the fields the gateway reads or writes are modelled; everything else in
//! the platform's payloads is ignored during deserialization.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// A chat destination: numeric id, or `@username` for public channels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawChatId")]
pub enum ChatId {
    Id(i64),
    Username(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChatId {
    Id(i64),
    Text(String),
}

impl TryFrom<RawChatId> for ChatId {
    type Error = String;

    fn try_from(raw: RawChatId) -> Result<Self, Self::Error> {
        match raw {
            RawChatId::Id(id) => Ok(ChatId::Id(id)),
            RawChatId::Text(text) => text.parse(),
        }
    }
}

impl FromStr for ChatId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i64>() {
            return Ok(ChatId::Id(id));
        }
        if s.len() > 1 && s.starts_with('@') {
            return Ok(ChatId::Username(s.to_string()));
        }
        Err(format!("invalid chat id: {:?}", s))
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

impl Serialize for ChatId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChatId::Id(id) => serializer.serialize_i64(*id),
            ChatId::Username(name) => serializer.serialize_str(name),
        }
    }
}

/// Markup interpretation mode understood by the Bot API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "MarkdownV2")]
    MarkdownV2,
}

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyParameters {
    pub message_id: i64,
}

impl OutgoingMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            message_thread_id: None,
            reply_parameters: None,
        }
    }

    pub fn parse_mode(mut self, mode: Option<ParseMode>) -> Self {
        self.parse_mode = mode;
        self
    }

    pub fn thread(mut self, thread_id: Option<i64>) -> Self {
        self.message_thread_id = thread_id;
        self
    }

    pub fn reply_to(mut self, message_id: Option<i64>) -> Self {
        self.reply_parameters = message_id.map(|message_id| ReplyParameters { message_id });
        self
    }
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

/// A message as delivered by the platform, inbound or as a send result.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub message_thread_id: Option<i64>,
    #[serde(default)]
    pub is_topic_message: bool,
}

/// Handle returned for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: i64,
    pub chat_id: i64,
}

impl From<Message> for SentMessage {
    fn from(message: Message) -> Self {
        Self {
            message_id: message.message_id,
            chat_id: message.chat.id,
        }
    }
}

/// Inbound webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pending_update_count: u32,
    pub last_error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetWebhookRequest<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<&'a str>,
}
