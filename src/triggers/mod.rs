mod http;
mod webhook;

pub use http::{send_notification, SendNotificationResponse, SUCCESS_MESSAGE};
pub use webhook::bot_webhook;
