use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;
use crate::triggers::{bot_webhook, send_notification};

use super::health::{health, stats};
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health, stats & metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Notification endpoint
        .route("/send_notification", post(send_notification))
        // Inbound chat updates
        .route("/bot/{credential}", post(bot_webhook))
}
