use crate::{ControlError, Effect, Msg, RunPhase, SupervisorState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SupervisorState, msg: Msg) -> (SupervisorState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested => match state.phase() {
            RunPhase::Idle => {
                let run_id = state.begin_run();
                vec![Effect::SpawnRun { run_id }]
            }
            RunPhase::Running | RunPhase::Stopping => {
                vec![Effect::Rejected(ControlError::AlreadyRunning)]
            }
        },
        Msg::StopRequested => match (state.phase(), state.active_run()) {
            (RunPhase::Running, Some(run_id)) => {
                state.request_stop();
                vec![Effect::CancelRun { run_id }]
            }
            // Repeated stop while the first one is still being honoured.
            (RunPhase::Stopping, Some(run_id)) => vec![Effect::CancelRun { run_id }],
            _ => vec![Effect::Rejected(ControlError::NotRunning)],
        },
        Msg::CursorObserved(cursor) => {
            state.observe_cursor(cursor);
            Vec::new()
        }
        Msg::RunFinished { run_id, outcome } => {
            state.finish_run(run_id, outcome);
            Vec::new()
        }
    };

    (state, effects)
}
