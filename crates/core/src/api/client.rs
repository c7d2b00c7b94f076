//! Single HTTP client shared by every domain service.

use std::time::Duration;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::{
    api::telemetry::Telemetry,
    config::AppConfig,
    error::ApiError,
    models::Envelope,
};

/// REST client with a fixed base URL, request timeout, and cookie-backed
/// credentials. Failing responses are reported to [`Telemetry`] and then
/// handed back unchanged; no retries happen at this layer.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    telemetry: Telemetry,
}

impl ApiClient {
    /// Build the client from the configured base URL and timeout.
    pub fn new(config: &AppConfig, telemetry: Telemetry) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_store(true)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            telemetry,
        })
    }

    /// The telemetry handle this client reports to.
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path`, expecting an envelope whose message equals `expect`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        expect: &str,
    ) -> Result<T, ApiError> {
        let request = self.http.get(self.url(path)).query(query);
        self.execute(Method::GET, path, request, expect).await
    }

    /// POST a JSON body to `path`.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        expect: &str,
    ) -> Result<T, ApiError> {
        let request = self.http.post(self.url(path)).json(body);
        self.execute(Method::POST, path, request, expect).await
    }

    /// PUT a JSON body to `path`.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        expect: &str,
    ) -> Result<T, ApiError> {
        let request = self.http.put(self.url(path)).json(body);
        self.execute(Method::PUT, path, request, expect).await
    }

    /// DELETE `path`.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        expect: &str,
    ) -> Result<T, ApiError> {
        let request = self.http.delete(self.url(path));
        self.execute(Method::DELETE, path, request, expect).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: reqwest::RequestBuilder,
        expect: &str,
    ) -> Result<T, ApiError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                self.telemetry
                    .api_failure(method.as_str(), path, None, &err.to_string());
                return Err(ApiError::Http(err));
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            self.telemetry
                .api_failure(method.as_str(), path, Some(status), &body);
            return Err(ApiError::Status { status, body });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        unwrap_envelope(envelope, expect)
    }
}

/// Check the per-endpoint success discriminator, independent of the HTTP
/// status, and hand back the payload.
pub fn unwrap_envelope<T>(envelope: Envelope<T>, expect: &str) -> Result<T, ApiError> {
    if envelope.message != expect {
        warn!(
            got = envelope.message.as_str(),
            expected = expect,
            "envelope discriminator mismatch"
        );
        return Err(ApiError::Envelope {
            message: envelope.message,
        });
    }
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_envelope_checks_discriminator() {
        let ok = Envelope {
            message: "SUCCESS_GET_GAME".to_string(),
            data: 42u32,
        };
        assert_eq!(unwrap_envelope(ok, "SUCCESS_GET_GAME").unwrap(), 42);

        let bad = Envelope {
            message: "FAIL_GET_GAME".to_string(),
            data: 42u32,
        };
        match unwrap_envelope(bad, "SUCCESS_GET_GAME") {
            Err(ApiError::Envelope { message }) => assert_eq!(message, "FAIL_GET_GAME"),
            other => panic!("expected envelope error, got {other:?}"),
        }
    }
}
