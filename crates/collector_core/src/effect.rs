use crate::{CycleId, JobRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Submit the request and poll the resulting job until it settles.
    SubmitJob { cycle: CycleId, request: JobRequest },
    /// Stop all network activity of a cycle.
    CancelCycle { cycle: CycleId },
}
