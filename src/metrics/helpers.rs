//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    CUSTOM_CLIENTS_TOTAL, DELIVERIES_TOTAL, DISPATCH_LATENCY, NOTIFICATIONS_TOTAL,
    WEBHOOK_UPDATES_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording notification metrics
pub struct NotificationMetrics;

impl NotificationMetrics {
    /// Every recipient accepted the notification
    pub fn record_success() {
        NOTIFICATIONS_TOTAL.with_label_values(&["success"]).inc();
    }

    /// At least one recipient failed, or the client could not be built
    pub fn record_failure() {
        NOTIFICATIONS_TOTAL.with_label_values(&["failure"]).inc();
    }

    /// Input was rejected before any send
    pub fn record_rejected() {
        NOTIFICATIONS_TOTAL.with_label_values(&["rejected"]).inc();
    }

    pub fn record_custom_client() {
        CUSTOM_CLIENTS_TOTAL.inc();
    }

    pub fn observe_latency(seconds: f64) {
        DISPATCH_LATENCY.observe(seconds);
    }
}

/// Helper struct for recording per-chat delivery metrics
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    pub fn record_delivered() {
        DELIVERIES_TOTAL.with_label_values(&["delivered"]).inc();
    }

    pub fn record_failed() {
        DELIVERIES_TOTAL.with_label_values(&["failed"]).inc();
    }
}

/// Helper struct for recording webhook metrics
pub struct WebhookMetrics;

impl WebhookMetrics {
    /// Update carrying a message, handed to the echo handler
    pub fn record_message() {
        WEBHOOK_UPDATES_TOTAL.with_label_values(&["message"]).inc();
    }

    /// Update of a kind the gateway does not handle
    pub fn record_ignored() {
        WEBHOOK_UPDATES_TOTAL.with_label_values(&["ignored"]).inc();
    }

    /// Body that could not be decoded
    pub fn record_invalid() {
        WEBHOOK_UPDATES_TOTAL.with_label_values(&["invalid"]).inc();
    }
}
