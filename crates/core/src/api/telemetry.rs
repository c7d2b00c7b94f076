//! Error-tracking and analytics beacons.
//!
//! Both are opaque collaborators: failures and page views are logged
//! locally and, when a measurement id is configured, forwarded as
//! fire-and-forget posts. A lost beacon is never an application error.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, error};

const COLLECT_ENDPOINT: &str = "https://telemetry.gamedeals.example/collect";
const BEACON_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle for reporting failures and page views.
#[derive(Debug, Clone)]
pub struct Telemetry {
    http: reqwest::Client,
    analytics_id: Option<String>,
}

impl Telemetry {
    /// Telemetry that beacons under `analytics_id`, or logs only when `None`.
    pub fn new(analytics_id: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(BEACON_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, analytics_id }
    }

    /// Disabled telemetry: logs only, never sends.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Report a failed API call. Cancellations must be filtered out by the
    /// caller before reaching this.
    pub fn api_failure(&self, method: &str, endpoint: &str, status: Option<StatusCode>, body: &str) {
        let status_label = status.map(|s| s.as_u16().to_string());
        error!(
            method,
            endpoint,
            status = status_label.as_deref().unwrap_or("none"),
            body,
            "api call failed"
        );
        self.send(json!({
            "kind": "api_failure",
            "method": method,
            "endpoint": endpoint,
            "status": status.map(|s| s.as_u16()),
            "body": body,
        }));
    }

    /// Report an unexpected exception caught by the top-level boundary.
    pub fn exception(&self, context: &str, detail: &str) {
        error!(context, detail, "unhandled exception");
        self.send(json!({
            "kind": "exception",
            "context": context,
            "detail": detail,
        }));
    }

    /// Emit a page-view beacon for route tracking.
    pub fn page_view(&self, route: &str) {
        debug!(route, "page view");
        self.send(json!({
            "kind": "page_view",
            "route": route,
        }));
    }

    fn send(&self, mut payload: serde_json::Value) {
        let Some(id) = self.analytics_id.clone() else {
            return;
        };
        // Beacons only make sense inside a runtime; outside one (unit
        // tests) they are silently skipped.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        if let Some(map) = payload.as_object_mut() {
            map.insert("measurementId".to_string(), json!(id));
        }
        let http = self.http.clone();
        handle.spawn(async move {
            if let Err(err) = http.post(COLLECT_ENDPOINT).json(&payload).send().await {
                debug!("telemetry beacon dropped: {err}");
            }
        });
    }
}
