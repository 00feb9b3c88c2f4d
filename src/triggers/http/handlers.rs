//! HTTP notification handlers

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};

use crate::dispatch::{resolve, NotificationFields, NotificationInput, NotificationQuery};
use crate::error::{AppError, Result};
use crate::metrics::NotificationMetrics;
use crate::server::AppState;

use super::models::SendNotificationResponse;

/// An empty body is allowed; everything may come from the query string.
fn parse_body(body: &Bytes) -> Result<NotificationFields> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(NotificationFields::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::InvalidBody(e.to_string()))
}

/// Send a notification to the requested (or default) chats
#[tracing::instrument(name = "http.send_notification", skip(state, query, body))]
pub async fn send_notification(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
    body: Bytes,
) -> Result<Json<SendNotificationResponse>> {
    let body = parse_body(&body)?;
    let input = NotificationInput {
        query: query.into_fields()?,
        body,
    };

    let notification = resolve(input, &state.settings.bot).inspect_err(|_| {
        NotificationMetrics::record_rejected();
    })?;

    let outcome = state.dispatcher.dispatch(&notification).await?;

    if outcome.all_succeeded() {
        Ok(Json(SendNotificationResponse::success()))
    } else {
        Err(AppError::DeliveryFailed {
            delivered: outcome.delivered(),
            total: outcome.outcomes.len(),
        })
    }
}
