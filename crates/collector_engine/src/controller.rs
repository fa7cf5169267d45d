use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use collector_core::{
    update, AppState, AppViewModel, CycleId, Effect, JobRequest, JobResult, Language, Msg,
};
use collector_logging::{collector_debug, collector_info, collector_warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    AuthTokenProvider, BackendClient, ClientSettings, JobError, JobPoller, JobSubmitter,
    SettingsError,
};

/// Whether a "process URL" action started a new cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Started,
    /// A job is already owned; nothing was sent.
    Ignored,
}

/// Owns at most one in-flight job and publishes every state transition.
///
/// Must be used from within a tokio runtime: starting a cycle spawns a task.
/// Dropping the controller cancels the live cycle.
pub struct JobLifecycleController {
    inner: Arc<Inner>,
}

struct LiveCycle {
    cycle: CycleId,
    cancel: CancellationToken,
}

struct Inner {
    state: Mutex<AppState>,
    views: watch::Sender<AppViewModel>,
    live: Mutex<Option<LiveCycle>>,
    submitter: Arc<dyn JobSubmitter>,
    poller: JobPoller,
    auth: Arc<dyn AuthTokenProvider>,
    user_id: String,
}

impl JobLifecycleController {
    pub fn new(
        submitter: Arc<dyn JobSubmitter>,
        poller: JobPoller,
        auth: Arc<dyn AuthTokenProvider>,
        user_id: impl Into<String>,
    ) -> Self {
        let state = AppState::new();
        let (views, _) = watch::channel(state.view());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                views,
                live: Mutex::new(None),
                submitter,
                poller,
                auth,
                user_id: user_id.into(),
            }),
        }
    }

    /// Wires a controller to the HTTP backend described by `settings`.
    pub fn from_settings(
        settings: &ClientSettings,
        auth: Arc<dyn AuthTokenProvider>,
    ) -> Result<Self, SettingsError> {
        let client = Arc::new(BackendClient::new(settings)?);
        let poller = JobPoller::from_settings(client.clone(), auth.clone(), settings);
        Ok(Self::new(client, poller, auth, settings.user_id.clone()))
    }

    /// Validates the input and starts a cycle when idle. A blank URL is
    /// rejected without touching the network or the state.
    pub fn process_url(&self, url: &str, language: Language) -> Result<Dispatch, JobError> {
        let request = JobRequest::new(url, language, self.inner.user_id.clone())
            .map_err(JobError::invalid_input)?;
        Ok(self.process(request))
    }

    pub fn process(&self, request: JobRequest) -> Dispatch {
        if self.inner.apply(Msg::ProcessRequested(request)) {
            Dispatch::Started
        } else {
            collector_debug!("Process request ignored; a job is already owned");
            Dispatch::Ignored
        }
    }

    /// Returns to idle, cancelling any in-flight cycle.
    pub fn reset(&self) {
        self.inner.apply(Msg::ResetRequested);
    }

    pub fn view(&self) -> AppViewModel {
        self.inner.views.borrow().clone()
    }

    /// Receives a new view model after every transition.
    pub fn subscribe(&self) -> watch::Receiver<AppViewModel> {
        self.inner.views.subscribe()
    }

    /// Resolves once no job is in flight: Completed, Failed, or Idle.
    pub async fn wait_until_settled(&self) -> AppViewModel {
        let mut views = self.subscribe();
        let settled = match views.wait_for(AppViewModel::is_settled).await {
            Ok(view) => Some(view.clone()),
            // The sender lives in `inner`, which we hold.
            Err(_) => None,
        };
        settled.unwrap_or_else(|| self.view())
    }
}

impl Drop for JobLifecycleController {
    fn drop(&mut self) {
        self.inner.cancel_live();
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_live(&self) -> MutexGuard<'_, Option<LiveCycle>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies a message, publishes the view if anything changed and runs
    /// the resulting effects. Returns whether a new cycle was started.
    ///
    /// Effects run before the state lock is released, so a started cycle is
    /// registered as live before any later message can cancel it.
    fn apply(self: &Arc<Self>, msg: Msg) -> bool {
        let mut guard = self.lock_state();
        let state = std::mem::take(&mut *guard);
        let (state, effects) = update(state, msg);
        let view = state.view();
        let mut state = state;
        if state.consume_dirty() {
            collector_debug!("Lifecycle phase -> {:?}", view.phase);
            self.views.send_replace(view);
        }
        *guard = state;

        let mut started = false;
        for effect in effects {
            started |= matches!(effect, Effect::SubmitJob { .. });
            self.run_effect(effect);
        }
        started
    }

    /// Lock order: `state` before `live`.
    fn run_effect(self: &Arc<Self>, effect: Effect) {
        match effect {
            Effect::SubmitJob { cycle, request } => {
                let cancel = CancellationToken::new();
                if let Some(previous) = self.lock_live().replace(LiveCycle {
                    cycle,
                    cancel: cancel.clone(),
                }) {
                    previous.cancel.cancel();
                }
                let inner = Arc::clone(self);
                tokio::spawn(async move {
                    inner.run_cycle(cycle, request, cancel).await;
                });
            }
            Effect::CancelCycle { cycle } => {
                let mut live = self.lock_live();
                if live.as_ref().is_some_and(|entry| entry.cycle == cycle) {
                    if let Some(entry) = live.take() {
                        collector_info!("Cancelling cycle {}", cycle);
                        entry.cancel.cancel();
                    }
                }
            }
        }
    }

    async fn run_cycle(
        self: Arc<Self>,
        cycle: CycleId,
        request: JobRequest,
        cancel: CancellationToken,
    ) {
        let msg = match self.drive(cycle, &request, &cancel).await {
            Ok(result) => Msg::JobCompleted { cycle, result },
            Err(err) if err.is_cancelled() => {
                collector_debug!("Cycle {} stopped after cancellation", cycle);
                self.release(cycle);
                return;
            }
            Err(err) => {
                collector_warn!("Cycle {} failed: {}", cycle, err);
                Msg::JobFailed {
                    cycle,
                    failure: err.failure(),
                }
            }
        };
        self.apply(msg);
        self.release(cycle);
    }

    async fn drive(
        self: &Arc<Self>,
        cycle: CycleId,
        request: &JobRequest,
        cancel: &CancellationToken,
    ) -> Result<JobResult, JobError> {
        collector_info!("Submitting cycle {} url={}", cycle, request.url());
        if !self.owns(cycle) {
            return Err(JobError::cancelled());
        }
        let token = self.auth.token().await;
        let job_id = tokio::select! {
            _ = cancel.cancelled() => return Err(JobError::cancelled()),
            submitted = self.submitter.submit(request, token.as_deref()) => submitted?,
        };

        self.apply(Msg::JobAccepted {
            cycle,
            job_id: job_id.clone(),
        });
        // A reset racing the submission leaves the state on another cycle.
        if !self.owns(cycle) {
            return Err(JobError::cancelled());
        }
        self.poller.poll(&job_id, cancel).await
    }

    fn owns(&self, cycle: CycleId) -> bool {
        self.lock_state().client().live_cycle() == Some(cycle)
    }

    fn release(&self, cycle: CycleId) {
        let mut live = self.lock_live();
        if live.as_ref().is_some_and(|entry| entry.cycle == cycle) {
            *live = None;
        }
    }

    fn cancel_live(&self) {
        if let Some(entry) = self.lock_live().take() {
            entry.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    use collector_core::{JobId, Phase};
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::{Anonymous, StatusResponse, StatusSource};

    /// Accepts every submission once `release` is notified.
    #[derive(Default)]
    struct GatedBackend {
        gated: bool,
        entered: Notify,
        release: Notify,
        status_queries: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl JobSubmitter for GatedBackend {
        async fn submit(
            &self,
            _request: &JobRequest,
            _auth_token: Option<&str>,
        ) -> Result<JobId, JobError> {
            if self.gated {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(JobId::new("j1"))
        }
    }

    #[async_trait::async_trait]
    impl StatusSource for GatedBackend {
        async fn status(
            &self,
            _job_id: &JobId,
            _auth_token: Option<&str>,
        ) -> Result<StatusResponse, JobError> {
            self.status_queries.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_value(json!({
                "status": "completed",
                "result": {"data": {"title": "T"}}
            }))
            .expect("status body"))
        }
    }

    fn controller_over(backend: Arc<GatedBackend>) -> JobLifecycleController {
        let auth: Arc<dyn AuthTokenProvider> = Arc::new(Anonymous);
        let poller = JobPoller::new(
            backend.clone(),
            auth.clone(),
            Duration::from_millis(1),
            Duration::from_secs(5),
        );
        JobLifecycleController::new(backend, poller, auth, "u1")
    }

    fn request(url: &str) -> JobRequest {
        JobRequest::new(url, Language::Auto, "u1").expect("request")
    }

    #[tokio::test]
    async fn acceptance_arriving_after_reset_never_polls() {
        let backend = Arc::new(GatedBackend {
            gated: true,
            ..GatedBackend::default()
        });
        let controller = controller_over(backend.clone());

        assert_eq!(
            controller.process(request("https://example.com")),
            Dispatch::Started
        );
        backend.entered.notified().await;
        controller.reset();
        backend.release.notify_one();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(controller.view().phase, Phase::Idle);
        assert_eq!(backend.status_queries.load(Ordering::SeqCst), 0);
        assert!(controller.inner.lock_live().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_reset_and_process_always_settle() {
        for _ in 0..200 {
            let controller = Arc::new(controller_over(Arc::new(GatedBackend::default())));
            let barrier = Arc::new(Barrier::new(2));

            let first = {
                let controller = Arc::clone(&controller);
                let barrier = Arc::clone(&barrier);
                tokio::task::spawn_blocking(move || {
                    barrier.wait();
                    controller.process(request("https://a.example.com"));
                })
            };
            let second = {
                let controller = Arc::clone(&controller);
                let barrier = Arc::clone(&barrier);
                tokio::task::spawn_blocking(move || {
                    barrier.wait();
                    controller.reset();
                    controller.process(request("https://b.example.com"));
                })
            };
            first.await.expect("first caller");
            second.await.expect("second caller");

            let settled =
                tokio::time::timeout(Duration::from_secs(2), controller.wait_until_settled());
            let view = settled.await.expect("controller settled");
            assert_eq!(view.phase, Phase::Completed);
        }
    }
}
