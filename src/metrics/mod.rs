//! Prometheus metrics for the gateway.
//!
//! - Notification outcomes (all recipients accepted / some failed / rejected input)
//! - Per-recipient delivery outcomes
//! - Fan-out latency
//! - Custom credential clients and inbound webhook updates

mod helpers;

pub use helpers::{encode_metrics, DeliveryMetrics, NotificationMetrics, WebhookMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "notify_gateway";

lazy_static! {
    // ============================================================================
    // Notification Metrics
    // ============================================================================

    /// Notifications handled, by outcome
    pub static ref NOTIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_total", METRIC_PREFIX),
        "Total notifications handled",
        &["outcome"]
    ).unwrap();

    /// Time to fan a notification out to all of its recipients
    pub static ref DISPATCH_LATENCY: Histogram = register_histogram!(
        format!("{}_dispatch_latency_seconds", METRIC_PREFIX),
        "Notification fan-out latency in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    /// Clients created for per-request credentials
    pub static ref CUSTOM_CLIENTS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_custom_clients_total", METRIC_PREFIX),
        "Total clients created for non-default bot credentials"
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    /// Individual chat deliveries, by result
    pub static ref DELIVERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_deliveries_total", METRIC_PREFIX),
        "Total per-chat message deliveries",
        &["result"]
    ).unwrap();

    // ============================================================================
    // Webhook Metrics
    // ============================================================================

    /// Inbound updates received on the webhook, by kind
    pub static ref WEBHOOK_UPDATES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_webhook_updates_total", METRIC_PREFIX),
        "Total inbound webhook updates",
        &["kind"]
    ).unwrap();
}
