//! Response models for the HTTP notification API

use serde::Serialize;

/// Summary returned when every chat accepted the notification
pub const SUCCESS_MESSAGE: &str = "Notification sent to all chats";

#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    pub status: &'static str,
    pub message: String,
}

impl SendNotificationResponse {
    pub fn success() -> Self {
        Self {
            status: "success",
            message: SUCCESS_MESSAGE.to_string(),
        }
    }
}
