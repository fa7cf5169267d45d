use crate::{CycleId, Failure, JobId, JobRequest, JobResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked to process a URL.
    ProcessRequested(JobRequest),
    /// Backend accepted the submission of a cycle.
    JobAccepted { cycle: CycleId, job_id: JobId },
    /// Poller observed `completed` for a cycle.
    JobCompleted { cycle: CycleId, result: JobResult },
    /// Submission, status query, or the job itself failed.
    JobFailed { cycle: CycleId, failure: Failure },
    /// User reset the controller (also issued on teardown).
    ResetRequested,
}
