//! Collector engine: HTTP job submission, status polling and the lifecycle
//! controller that executes core effects.
mod auth;
mod client;
mod controller;
mod error;
mod poll;
mod settings;
mod submit;
mod types;

pub use auth::{Anonymous, AuthTokenProvider, EnvToken, StaticToken};
pub use client::BackendClient;
pub use controller::{Dispatch, JobLifecycleController};
pub use error::JobError;
pub use poll::{JobPoller, StatusSource};
pub use settings::{ClientSettings, SettingsError};
pub use submit::JobSubmitter;
pub use types::{JobStatus, ProcessBody, ProcessResponse, StatusResponse, StatusResult};

pub use collector_core::{
    AppViewModel, ClientState, ErrorKind, Failure, FailureOrigin, JobId, JobRequest, JobResult,
    Language, Phase,
};
