use std::fmt;

/// Coarse failure category the presentation layer branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Usage allowance exhausted; the user needs to upgrade or wait.
    QuotaExceeded,
    /// The backend does not know the job (or user) asked about.
    NotFound,
    /// No HTTP response was obtained.
    Network,
    Generic,
}

impl ErrorKind {
    /// Narrows a kind to the two values a backend-reported job failure may take.
    pub fn for_job_failure(self) -> Self {
        match self {
            ErrorKind::QuotaExceeded => ErrorKind::QuotaExceeded,
            _ => ErrorKind::Generic,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::QuotaExceeded => write!(f, "quota exceeded"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Generic => write!(f, "generic"),
        }
    }
}

// Phrases the backend puts in free-text errors when limits are hit.
const QUOTA_MARKERS: &[&str] = &["upgrade to pro", "quota exceeded", "credit limit"];

const NETWORK_MARKERS: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection closed",
    "timed out",
    "dns error",
    "network error",
    "error sending request",
];

const NOT_FOUND_MARKERS: &[&str] = &["not found"];

/// Classifies a failure message by case-insensitive substring match.
pub fn classify(message: &str) -> ErrorKind {
    let lowered = message.to_lowercase();
    let contains_any = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    if contains_any(QUOTA_MARKERS) {
        ErrorKind::QuotaExceeded
    } else if contains_any(NETWORK_MARKERS) {
        ErrorKind::Network
    } else if contains_any(NOT_FOUND_MARKERS) {
        ErrorKind::NotFound
    } else {
        ErrorKind::Generic
    }
}

/// Classifies a failed HTTP response, preferring the status code when it is
/// unambiguous and falling back to the message otherwise.
pub fn classify_status(status: u16, message: &str) -> ErrorKind {
    match status {
        402 | 429 => ErrorKind::QuotaExceeded,
        404 => ErrorKind::NotFound,
        _ => classify(message),
    }
}
