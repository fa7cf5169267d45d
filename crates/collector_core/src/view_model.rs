use crate::{Failure, JobId, JobResult, Phase};

/// Everything a presentation layer renders from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub url: Option<String>,
    /// Host of `url` without `www.`.
    pub domain: Option<String>,
    pub job_id: Option<JobId>,
    pub result: Option<JobResult>,
    pub failure: Option<Failure>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn is_settled(&self) -> bool {
        !self.phase.is_in_flight()
    }
}
