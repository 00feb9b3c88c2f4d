use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::dispatch::{DispatchError, ResolveError};

/// Detail returned when one or more chats rejected a notification
pub const DELIVERY_FAILED_DETAIL: &str = "Failed to send notification to some chats";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("{delivered} of {total} chats accepted the notification")]
    DeliveryFailed { delivered: usize, total: usize },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found")]
    NotFound,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            AppError::Resolve(e) => match e {
                ResolveError::EmptyMessage
                | ResolveError::EmptyRecipients
                | ResolveError::InvalidChatId(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                ResolveError::NoRecipients => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "No target chats configured".to_string(),
                ),
            },
            AppError::InvalidBody(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::DeliveryFailed { .. } | AppError::Dispatch(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                DELIVERY_FAILED_DETAIL.to_string(),
            ),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
        };

        // Always log the detailed error server-side
        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %self, "API error");
        } else {
            tracing::warn!(status = %status.as_u16(), error = %self, "API error");
        }

        (
            status,
            Json(ErrorResponse {
                detail: client_message,
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
