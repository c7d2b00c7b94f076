//! HTTP client and observability collaborators.

pub mod client;
pub mod telemetry;

pub use client::ApiClient;
pub use telemetry::Telemetry;
