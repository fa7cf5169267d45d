use collector_core::{ErrorKind, Failure, FailureOrigin, RequestError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{origin} failure ({kind}): {message}")]
pub struct JobError {
    pub origin: FailureOrigin,
    pub kind: ErrorKind,
    pub message: String,
}

impl JobError {
    pub(crate) fn new(origin: FailureOrigin, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            origin,
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(err: RequestError) -> Self {
        Self::new(FailureOrigin::InvalidInput, ErrorKind::Generic, err.to_string())
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(FailureOrigin::Cancelled, ErrorKind::Generic, "cancelled")
    }

    pub fn is_cancelled(&self) -> bool {
        self.origin == FailureOrigin::Cancelled
    }

    /// The presentation-facing part of this error.
    pub fn failure(&self) -> Failure {
        Failure::new(self.origin, self.kind, self.message.clone())
    }
}

/// Maps a transport-level reqwest error.
pub(crate) fn map_reqwest_error(origin: FailureOrigin, err: reqwest::Error) -> JobError {
    if err.is_decode() {
        return JobError::new(
            origin,
            ErrorKind::Generic,
            format!("invalid response body: {err}"),
        );
    }
    JobError::new(origin, ErrorKind::Network, format!("network error: {err}"))
}
