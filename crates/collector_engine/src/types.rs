use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend-reported job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Maps the wire value; unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Body of `POST /process`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessBody<'a> {
    pub url: &'a str,
    pub language: &'a str,
    pub user_id: &'a str,
}

/// Success body of `POST /process`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    pub job_id: Option<String>,
    pub status: Option<String>,
    pub remaining_quota: Option<i64>,
}

/// Body of `GET /status/{job_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub result: Option<StatusResult>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResult {
    /// Opaque payload handed to the presentation layer unmodified.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub processed_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
}
