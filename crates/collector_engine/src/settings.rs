use std::time::Duration;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid base url '{url}': {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("failed to build http client: {0}")]
    Client(String),
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Root of the backend API; endpoints are appended as path segments.
    pub base_url: String,
    pub user_id: String,
    /// Fixed wait before every status query.
    pub poll_interval: Duration,
    /// Upper bound on the whole poll; exceeded polls are cancelled.
    pub deadline: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            user_id: "demo_user".to_string(),
            poll_interval: Duration::from_secs(2),
            deadline: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientSettings {
    /// Checks the settings and returns the parsed base URL.
    pub fn validate(&self) -> Result<Url, SettingsError> {
        let base_url_error = |reason: String| SettingsError::BaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|err| base_url_error(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(base_url_error(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if url.cannot_be_a_base() {
            return Err(base_url_error("url cannot carry a path".to_string()));
        }
        for (name, value) in [
            ("poll interval", self.poll_interval),
            ("deadline", self.deadline),
            ("connect timeout", self.connect_timeout),
            ("request timeout", self.request_timeout),
        ] {
            if value.is_zero() {
                return Err(SettingsError::ZeroDuration(name));
            }
        }
        Ok(url)
    }
}
