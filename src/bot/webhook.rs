use crate::config::Settings;
use crate::telegram::{ChatApi, DeliveryError};

/// Register the webhook unless the platform already points at it.
///
/// Returns `Ok(false)` when registration is disabled or already current.
pub async fn ensure_webhook(api: &dyn ChatApi, settings: &Settings) -> Result<bool, DeliveryError> {
    if !settings.webhook.register_on_startup {
        return Ok(false);
    }
    let Some(url) = settings.webhook_url() else {
        tracing::info!("No webhook base URL configured, skipping webhook registration");
        return Ok(false);
    };

    let current = api.get_webhook_info().await?;
    if current.url == url {
        tracing::info!(
            pending_updates = current.pending_update_count,
            "Webhook already registered"
        );
        return Ok(false);
    }

    api.set_webhook(&url, settings.webhook.secret_token.as_deref())
        .await?;
    tracing::info!(base_url = ?settings.webhook.base_url, "Webhook registered");
    Ok(true)
}
