//! Bot-side behavior: replies to inbound messages and platform housekeeping.

mod chats;
mod handlers;
mod webhook;

pub use chats::{log_available_chats, ChatSummary};
pub use handlers::{echo_message, handle_update, ECHO_REPLY};
pub use webhook::ensure_webhook;
