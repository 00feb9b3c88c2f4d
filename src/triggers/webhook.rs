//! Inbound webhook for chat platform updates.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use crate::bot::handle_update;
use crate::error::{AppError, Result};
use crate::metrics::WebhookMetrics;
use crate::server::AppState;
use crate::telegram::Update;

const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// POST /bot/{credential} - receive one update and answer it in the background
pub async fn bot_webhook(
    State(state): State<AppState>,
    Path(credential): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    if credential != state.settings.bot.token {
        return Err(AppError::NotFound);
    }

    if let Some(expected) = state.settings.webhook.secret_token.as_deref() {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            return Err(AppError::Unauthorized(
                "webhook secret token mismatch".to_string(),
            ));
        }
    }

    // Undecodable updates are acknowledged anyway so the platform stops redelivering them
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            WebhookMetrics::record_invalid();
            tracing::warn!(error = %e, "Discarding undecodable webhook update");
            return Ok(Json(json!({ "ok": true })));
        }
    };

    let api = state.dispatcher.default_client();
    tokio::spawn(async move {
        handle_update(api.as_ref(), update).await;
    });

    Ok(Json(json!({ "ok": true })))
}
