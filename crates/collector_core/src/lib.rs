//! Collector core: pure job lifecycle state machine, request validation and
//! error classification.
mod classify;
mod effect;
mod msg;
mod request;
mod state;
mod update;
mod view_model;

pub use classify::{classify, classify_status, ErrorKind};
pub use effect::Effect;
pub use msg::Msg;
pub use request::{JobRequest, Language, RequestError};
pub use state::{AppState, ClientState, CycleId, Failure, FailureOrigin, JobId, JobResult, Phase};
pub use update::update;
pub use view_model::AppViewModel;
