use collector_core::ErrorKind;
use collector_logging::collector_debug;
use reqwest::StatusCode;
use url::Url;

use crate::error::map_reqwest_error;
use crate::types::HealthResponse;
use crate::{ClientSettings, FailureOrigin, JobError, SettingsError};

/// HTTP access to the job backend. Implements both [`crate::JobSubmitter`]
/// and [`crate::StatusSource`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    pub(crate) http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, SettingsError> {
        let base_url = settings.validate()?;
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SettingsError::Client(err.to_string()))?;
        Ok(Self { http, base_url })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Validated settings guarantee a base that can carry a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Calls `GET /health` and returns the reported status word.
    pub async fn health(&self) -> Result<String, JobError> {
        let url = self.endpoint(&["health"]);
        collector_debug!("Health check url={}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| map_reqwest_error(FailureOrigin::StatusQuery, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = failure_message(status, &body);
            return Err(JobError::new(
                FailureOrigin::StatusQuery,
                ErrorKind::Generic,
                message,
            ));
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|err| map_reqwest_error(FailureOrigin::StatusQuery, err))?;
        Ok(health.status)
    }
}

/// Extracts the user-facing message from a failed response body.
///
/// A JSON `detail` string is used verbatim, any other `detail` value is
/// serialized compactly, and bodies without one fall back to the status code.
pub(crate) fn failure_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|mut value| value.get_mut("detail").map(serde_json::Value::take));
    match detail {
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => text,
        Some(serde_json::Value::Null) | Some(serde_json::Value::String(_)) | None => {
            format!("API Error: {}", status.as_u16())
        }
        Some(other) => other.to_string(),
    }
}
