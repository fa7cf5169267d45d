use std::fmt;

use crate::view_model::AppViewModel;
use crate::{ErrorKind, JobRequest};

/// Local identifier of one submission cycle. Strictly increasing per state.
pub type CycleId = u64;

/// Opaque job identifier issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend-owned result payload, carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult(serde_json::Value);

impl JobResult {
    pub fn new(data: serde_json::Value) -> Self {
        Self(data)
    }

    pub fn data(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Where in the lifecycle a failure arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    /// Rejected locally before any network call.
    InvalidInput,
    Submission,
    /// Transport or HTTP failure of a status query, unrelated to job outcome.
    StatusQuery,
    /// The backend reported the job as `failed`.
    Job,
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for FailureOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureOrigin::InvalidInput => write!(f, "invalid input"),
            FailureOrigin::Submission => write!(f, "submission"),
            FailureOrigin::StatusQuery => write!(f, "status query"),
            FailureOrigin::Job => write!(f, "job"),
            FailureOrigin::Cancelled => write!(f, "cancelled"),
            FailureOrigin::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// What the presentation layer needs to explain a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub origin: FailureOrigin,
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(origin: FailureOrigin, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            origin,
            kind,
            message: message.into(),
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.kind == ErrorKind::QuotaExceeded
    }
}

/// Coarse lifecycle phase, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, Phase::Submitting | Phase::Polling)
    }
}

/// The controller's own view of the single job it may own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClientState {
    #[default]
    Idle,
    Submitting {
        cycle: CycleId,
        request: JobRequest,
    },
    Polling {
        cycle: CycleId,
        request: JobRequest,
        job_id: JobId,
    },
    Completed {
        request: JobRequest,
        job_id: JobId,
        result: JobResult,
    },
    Failed {
        request: JobRequest,
        job_id: Option<JobId>,
        failure: Failure,
    },
}

impl ClientState {
    pub fn phase(&self) -> Phase {
        match self {
            ClientState::Idle => Phase::Idle,
            ClientState::Submitting { .. } => Phase::Submitting,
            ClientState::Polling { .. } => Phase::Polling,
            ClientState::Completed { .. } => Phase::Completed,
            ClientState::Failed { .. } => Phase::Failed,
        }
    }

    /// Cycle of the in-flight job, if any.
    pub fn live_cycle(&self) -> Option<CycleId> {
        match self {
            ClientState::Submitting { cycle, .. } | ClientState::Polling { cycle, .. } => {
                Some(*cycle)
            }
            _ => None,
        }
    }

    pub fn request(&self) -> Option<&JobRequest> {
        match self {
            ClientState::Idle => None,
            ClientState::Submitting { request, .. }
            | ClientState::Polling { request, .. }
            | ClientState::Completed { request, .. }
            | ClientState::Failed { request, .. } => Some(request),
        }
    }

    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            ClientState::Polling { job_id, .. } | ClientState::Completed { job_id, .. } => {
                Some(job_id)
            }
            ClientState::Failed { job_id, .. } => job_id.as_ref(),
            ClientState::Idle | ClientState::Submitting { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    client: ClientState,
    last_cycle: CycleId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(&self) -> &ClientState {
        &self.client
    }

    pub fn phase(&self) -> Phase {
        self.client.phase()
    }

    pub fn view(&self) -> AppViewModel {
        let request = self.client.request();
        let (result, failure) = match &self.client {
            ClientState::Completed { result, .. } => (Some(result.clone()), None),
            ClientState::Failed { failure, .. } => (None, Some(failure.clone())),
            _ => (None, None),
        };
        AppViewModel {
            phase: self.phase(),
            url: request.map(|r| r.url().to_string()),
            domain: request.and_then(JobRequest::display_domain),
            job_id: self.client.job_id().cloned(),
            result,
            failure,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn take_client(&mut self) -> ClientState {
        std::mem::take(&mut self.client)
    }

    /// Puts back a client state without counting it as a change.
    pub(crate) fn restore_client(&mut self, client: ClientState) {
        self.client = client;
    }

    pub(crate) fn transition(&mut self, next: ClientState) {
        self.client = next;
        self.dirty = true;
    }

    pub(crate) fn next_cycle(&mut self) -> CycleId {
        self.last_cycle += 1;
        self.last_cycle
    }
}
