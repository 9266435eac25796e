use std::sync::Once;

use scout_core::{
    update, ControlError, Effect, Msg, RunOutcome, RunPhase, RunStatus, SupervisorState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[test]
fn start_from_idle_spawns_a_run() {
    init_logging();
    let (state, effects) = update(SupervisorState::new(), Msg::StartRequested);

    assert_eq!(effects, vec![Effect::SpawnRun { run_id: 1 }]);
    assert_eq!(state.phase(), RunPhase::Running);
    assert_eq!(state.view().status(), RunStatus::Running);
    assert_eq!(state.view().runs_started, 1);
}

#[test]
fn second_start_is_rejected_while_active() {
    init_logging();
    let (state, _) = update(SupervisorState::new(), Msg::StartRequested);
    let (state, effects) = update(state, Msg::StartRequested);

    assert_eq!(effects, vec![Effect::Rejected(ControlError::AlreadyRunning)]);
    assert_eq!(state.view().runs_started, 1);
}

#[test]
fn stop_when_idle_is_rejected() {
    init_logging();
    let (state, effects) = update(SupervisorState::new(), Msg::StopRequested);
    assert_eq!(effects, vec![Effect::Rejected(ControlError::NotRunning)]);
    assert_eq!(state.phase(), RunPhase::Idle);
}

#[test]
fn stop_then_finish_allows_a_new_start() {
    init_logging();
    let (state, _) = update(SupervisorState::new(), Msg::StartRequested);
    let (state, effects) = update(state, Msg::StopRequested);
    assert_eq!(effects, vec![Effect::CancelRun { run_id: 1 }]);
    assert_eq!(state.phase(), RunPhase::Stopping);

    // Still counts as running until the run acknowledges the cancellation.
    let (state, effects) = update(state, Msg::StartRequested);
    assert_eq!(effects, vec![Effect::Rejected(ControlError::AlreadyRunning)]);

    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id: 1,
            outcome: RunOutcome::Cancelled { next_cursor: 2 },
        },
    );
    assert_eq!(state.view().status(), RunStatus::Idle);
    assert_eq!(state.view().last_cursor, Some(2));

    let (state, effects) = update(state, Msg::StartRequested);
    assert_eq!(effects, vec![Effect::SpawnRun { run_id: 2 }]);
    assert_eq!(state.view().runs_started, 2);
}

#[test]
fn failed_run_clears_the_active_marker() {
    init_logging();
    let (state, _) = update(SupervisorState::new(), Msg::StartRequested);
    let (state, _) = update(state, Msg::CursorObserved(4));
    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id: 1,
            outcome: RunOutcome::Failed {
                reason: "boom".to_string(),
            },
        },
    );

    let view = state.view();
    assert_eq!(view.status(), RunStatus::Idle);
    assert_eq!(view.active_run, None);
    assert_eq!(view.last_cursor, Some(4));
    assert!(matches!(view.last_outcome, Some(RunOutcome::Failed { .. })));
}

#[test]
fn stale_finish_does_not_touch_the_current_run() {
    init_logging();
    let (state, _) = update(SupervisorState::new(), Msg::StartRequested);
    let (state, _) = update(
        state,
        Msg::RunFinished {
            run_id: 7,
            outcome: RunOutcome::Completed { next_cursor: 9 },
        },
    );
    assert_eq!(state.phase(), RunPhase::Running);
    assert_eq!(state.active_run(), Some(1));
    assert_eq!(state.view().last_cursor, None);
}
