use collector_core::{classify_status, ErrorKind, JobId, JobRequest};
use collector_logging::{collector_debug, collector_info, collector_warn, describe_token};

use crate::client::{failure_message, BackendClient};
use crate::error::map_reqwest_error;
use crate::types::{ProcessBody, ProcessResponse};
use crate::{FailureOrigin, JobError};

/// Creates a backend job for a request. Does not start polling.
#[async_trait::async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(&self, request: &JobRequest, auth_token: Option<&str>)
        -> Result<JobId, JobError>;
}

#[async_trait::async_trait]
impl JobSubmitter for BackendClient {
    async fn submit(
        &self,
        request: &JobRequest,
        auth_token: Option<&str>,
    ) -> Result<JobId, JobError> {
        if !request.is_well_formed() {
            // The backend decides; this is only a hint in the log.
            collector_warn!("Submitting url that does not parse: {}", request.url());
        }

        let url = self.endpoint(&["process"]);
        collector_debug!(
            "POST {} language={} auth={}",
            url,
            request.language(),
            describe_token(auth_token)
        );

        let body = ProcessBody {
            url: request.url(),
            language: request.language().as_str(),
            user_id: request.user_id(),
        };
        let mut builder = self.http.post(url).json(&body);
        if let Some(token) = auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| map_reqwest_error(FailureOrigin::Submission, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = failure_message(status, &body);
            let kind = classify_status(status.as_u16(), &message);
            collector_warn!(
                "Submission rejected status={} kind={} message={}",
                status.as_u16(),
                kind,
                message
            );
            return Err(JobError::new(FailureOrigin::Submission, kind, message));
        }

        let accepted: ProcessResponse = response
            .json()
            .await
            .map_err(|err| map_reqwest_error(FailureOrigin::Submission, err))?;

        let job_id = accepted
            .job_id
            .filter(|id| !id.trim().is_empty())
            .map(JobId::new)
            .ok_or_else(|| {
                JobError::new(
                    FailureOrigin::Submission,
                    ErrorKind::Generic,
                    "backend response carried no job_id",
                )
            })?;

        match accepted.remaining_quota {
            Some(remaining) => collector_info!(
                "Job accepted job_id={} status={} remaining_quota={}",
                job_id,
                accepted.status.as_deref().unwrap_or("queued"),
                remaining
            ),
            None => collector_info!(
                "Job accepted job_id={} status={}",
                job_id,
                accepted.status.as_deref().unwrap_or("queued")
            ),
        }

        Ok(job_id)
    }
}
