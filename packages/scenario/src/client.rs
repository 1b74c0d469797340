//! HTTP client for the scenario simulation API.
//!
//! `POST /api/simulate` turns a natural-language prompt into per-county
//! scenario values; `GET /health` reports whether the service is up.
//! Timeouts and refused connections map to their own [`ScenarioError`]
//! variants so callers can tell a slow model from a missing server.

use std::time::Duration;

use envrisk_scenario_models::{HealthStatus, SimulationRequest, SimulationResponse};

use crate::ScenarioError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Picks the most specific message out of an error response body: the
/// JSON `detail` field, then `message`, then the raw text. An empty body
/// falls back to the status line.
#[must_use]
pub fn extract_error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["detail", "message"] {
            match &json[field] {
                serde_json::Value::String(s) if !s.is_empty() => return s.clone(),
                serde_json::Value::String(_) | serde_json::Value::Null => {}
                other => return other.to_string(),
            }
        }
    }

    if body.trim().is_empty() {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    } else {
        body.to_string()
    }
}

/// Scenario API client.
#[derive(Debug, Clone)]
pub struct ScenarioClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ScenarioClient {
    /// Creates a client for `base_url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ScenarioError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn classify(&self, e: reqwest::Error) -> ScenarioError {
        if e.is_timeout() {
            ScenarioError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            ScenarioError::Unreachable {
                url: self.base_url.clone(),
            }
        } else {
            ScenarioError::Http(e)
        }
    }

    /// Generates a scenario from a free-text prompt.
    ///
    /// # Errors
    ///
    /// * [`ScenarioError::Api`] on a non-success status
    /// * [`ScenarioError::Timeout`] / [`ScenarioError::Unreachable`] on
    ///   transport failures
    /// * [`ScenarioError::Json`] if the body is not a simulation response
    /// * [`ScenarioError::Unsuccessful`] if the API reports failure
    pub async fn simulate(&self, prompt: &str) -> Result<SimulationResponse, ScenarioError> {
        log::info!("Requesting scenario simulation ({} chars)", prompt.len());
        log::debug!("Prompt: {prompt}");

        let resp = self
            .client
            .post(self.endpoint("/api/simulate"))
            .json(&SimulationRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(ScenarioError::Api {
                status: status.as_u16(),
                message: extract_error_message(status, &body),
            });
        }

        let response: SimulationResponse = serde_json::from_str(&body)?;
        if !response.success {
            return Err(ScenarioError::Unsuccessful);
        }

        log::info!(
            "Scenario returned {} data points for {} ({})",
            response.data.data_points.len(),
            response.data.metric,
            response.data.unit
        );

        Ok(response)
    }

    /// Checks that the API is up.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if the request fails or the status is not
    /// a success.
    pub async fn health(&self) -> Result<HealthStatus, ScenarioError> {
        let resp = self
            .client
            .get(self.endpoint("/health"))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.classify(e))?;
        if !status.is_success() {
            return Err(ScenarioError::Api {
                status: status.as_u16(),
                message: extract_error_message(status, &body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn prefers_detail_then_message_then_body() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            extract_error_message(status, r#"{"detail": "bad prompt", "message": "x"}"#),
            "bad prompt"
        );
        assert_eq!(
            extract_error_message(status, r#"{"message": "quota exceeded"}"#),
            "quota exceeded"
        );
        assert_eq!(
            extract_error_message(status, "upstream exploded"),
            "upstream exploded"
        );
        assert_eq!(
            extract_error_message(status, r#"{"error": "x"}"#),
            r#"{"error": "x"}"#
        );
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let message = extract_error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body", "prompt"], "msg": "field required"}]}"#,
        );
        assert!(message.contains("field required"));
    }

    #[test]
    fn empty_body_falls_back_to_status_line() {
        assert_eq!(
            extract_error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "HTTP 500: Internal Server Error"
        );
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client =
            ScenarioClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.endpoint("/api/simulate"),
            "http://localhost:8000/api/simulate"
        );
    }
}
