use std::sync::Arc;
use std::time::Duration;

use collector_core::{classify, classify_status, ErrorKind, JobId, JobResult};
use collector_logging::{collector_debug, collector_info, collector_warn, describe_token};
use tokio_util::sync::CancellationToken;

use crate::client::{failure_message, BackendClient};
use crate::error::map_reqwest_error;
use crate::{AuthTokenProvider, ClientSettings, FailureOrigin, JobError, JobStatus, StatusResponse};

const FAILED_JOB_FALLBACK: &str = "Extraction failed on server.";

/// One status query against the backend.
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn status(
        &self,
        job_id: &JobId,
        auth_token: Option<&str>,
    ) -> Result<StatusResponse, JobError>;
}

#[async_trait::async_trait]
impl StatusSource for BackendClient {
    async fn status(
        &self,
        job_id: &JobId,
        auth_token: Option<&str>,
    ) -> Result<StatusResponse, JobError> {
        let url = self.endpoint(&["status", job_id.as_str()]);
        let mut builder = self.http.get(url);
        if let Some(token) = auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| map_reqwest_error(FailureOrigin::StatusQuery, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = failure_message(status, &body);
            let kind = classify_status(status.as_u16(), &detail);
            return Err(JobError::new(
                FailureOrigin::StatusQuery,
                kind,
                format!("Failed to fetch job status: {detail}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|err| map_reqwest_error(FailureOrigin::StatusQuery, err))
    }
}

/// Polls a job at a fixed cadence until it settles.
///
/// Every poll runs under a deadline and a cancellation token. Queries for
/// one job are strictly sequential; the caller must not start a second
/// poller for the same job.
#[derive(Clone)]
pub struct JobPoller {
    source: Arc<dyn StatusSource>,
    auth: Arc<dyn AuthTokenProvider>,
    interval: Duration,
    deadline: Duration,
}

impl JobPoller {
    pub fn new(
        source: Arc<dyn StatusSource>,
        auth: Arc<dyn AuthTokenProvider>,
        interval: Duration,
        deadline: Duration,
    ) -> Self {
        Self {
            source,
            auth,
            interval,
            deadline,
        }
    }

    pub fn from_settings(
        source: Arc<dyn StatusSource>,
        auth: Arc<dyn AuthTokenProvider>,
        settings: &ClientSettings,
    ) -> Self {
        Self::new(source, auth, settings.poll_interval, settings.deadline)
    }

    /// Resolves with the result of a `completed` job, or fails on a `failed`
    /// job, a status query failure, cancellation, or the deadline. On the
    /// deadline the token is cancelled before returning.
    pub async fn poll(
        &self,
        job_id: &JobId,
        cancel: &CancellationToken,
    ) -> Result<JobResult, JobError> {
        match tokio::time::timeout(self.deadline, self.poll_until_settled(job_id, cancel)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                cancel.cancel();
                collector_warn!(
                    "Job {} still unsettled after {:?}; polling abandoned",
                    job_id,
                    self.deadline
                );
                Err(JobError::new(
                    FailureOrigin::DeadlineExceeded,
                    ErrorKind::Generic,
                    format!(
                        "job {} did not finish within {} seconds",
                        job_id,
                        self.deadline.as_secs_f64()
                    ),
                ))
            }
        }
    }

    async fn poll_until_settled(
        &self,
        job_id: &JobId,
        cancel: &CancellationToken,
    ) -> Result<JobResult, JobError> {
        let mut attempt: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(JobError::cancelled());
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(JobError::cancelled()),
                _ = tokio::time::sleep(self.interval) => {}
            }

            attempt += 1;
            let token = self.auth.token().await;
            collector_debug!(
                "Status query job_id={} attempt={} auth={}",
                job_id,
                attempt,
                describe_token(token.as_deref())
            );
            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(JobError::cancelled()),
                response = self.source.status(job_id, token.as_deref()) => response?,
            };

            if let Some(result) = settle(job_id, response)? {
                collector_info!("Job {} completed after {} status queries", job_id, attempt);
                return Ok(result);
            }
        }
    }
}

/// Interprets one status response: `Ok(None)` keeps polling.
fn settle(job_id: &JobId, response: StatusResponse) -> Result<Option<JobResult>, JobError> {
    let Some(status) = JobStatus::parse(&response.status) else {
        return Err(JobError::new(
            FailureOrigin::StatusQuery,
            ErrorKind::Generic,
            format!("unrecognized job status '{}'", response.status),
        ));
    };

    match status {
        JobStatus::Queued | JobStatus::Processing => {
            collector_debug!("Job {} still {}", job_id, status);
            Ok(None)
        }
        JobStatus::Completed => response
            .result
            .and_then(|result| result.data)
            .map(|data| Some(JobResult::new(data)))
            .ok_or_else(|| {
                JobError::new(
                    FailureOrigin::StatusQuery,
                    ErrorKind::Generic,
                    "completed job carried no result data",
                )
            }),
        JobStatus::Failed => {
            let message = response
                .error
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| FAILED_JOB_FALLBACK.to_string());
            let kind = classify(&message).for_job_failure();
            collector_warn!("Job {} failed kind={} message={}", job_id, kind, message);
            Err(JobError::new(FailureOrigin::Job, kind, message))
        }
    }
}
