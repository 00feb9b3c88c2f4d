//! HTTP notification trigger
//!
//! `POST /send_notification` resolves the query string and JSON body into one
//! notification and fans it out to the target chats.

mod handlers;
mod models;

pub use handlers::send_notification;
pub use models::{SendNotificationResponse, SUCCESS_MESSAGE};
