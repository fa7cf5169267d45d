use crate::{AppState, ClientState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// Events tagged with a cycle other than the live one are dropped, so a
/// cancelled cycle that still reports back cannot disturb a newer one.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ProcessRequested(request) => {
            // At most one job per controller; anything but Idle ignores the action.
            if !matches!(state.client(), ClientState::Idle) {
                return (state, Vec::new());
            }
            let cycle = state.next_cycle();
            state.transition(ClientState::Submitting {
                cycle,
                request: request.clone(),
            });
            vec![Effect::SubmitJob { cycle, request }]
        }
        Msg::JobAccepted { cycle, job_id } => {
            match state.take_client() {
                ClientState::Submitting {
                    cycle: live,
                    request,
                } if live == cycle => {
                    state.transition(ClientState::Polling {
                        cycle,
                        request,
                        job_id,
                    });
                }
                other => state.restore_client(other),
            }
            Vec::new()
        }
        Msg::JobCompleted { cycle, result } => {
            match state.take_client() {
                ClientState::Polling {
                    cycle: live,
                    request,
                    job_id,
                } if live == cycle => {
                    state.transition(ClientState::Completed {
                        request,
                        job_id,
                        result,
                    });
                }
                other => state.restore_client(other),
            }
            Vec::new()
        }
        Msg::JobFailed { cycle, failure } => {
            match state.take_client() {
                ClientState::Submitting {
                    cycle: live,
                    request,
                } if live == cycle => {
                    state.transition(ClientState::Failed {
                        request,
                        job_id: None,
                        failure,
                    });
                }
                ClientState::Polling {
                    cycle: live,
                    request,
                    job_id,
                } if live == cycle => {
                    state.transition(ClientState::Failed {
                        request,
                        job_id: Some(job_id),
                        failure,
                    });
                }
                other => state.restore_client(other),
            }
            Vec::new()
        }
        Msg::ResetRequested => {
            if matches!(state.client(), ClientState::Idle) {
                return (state, Vec::new());
            }
            let live = state.client().live_cycle();
            state.transition(ClientState::Idle);
            live.map(|cycle| Effect::CancelCycle { cycle })
                .into_iter()
                .collect()
        }
    };

    (state, effects)
}
