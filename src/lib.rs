// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Chat platform client
pub mod telegram;

// Domain layer (business logic)
pub mod bot;
pub mod dispatch;

// Application layer
pub mod api;
pub mod server;
pub mod triggers;
