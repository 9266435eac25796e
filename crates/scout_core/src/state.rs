use std::fmt;

use crate::view_model::StatusView;

pub type RunId = u64;

/// Lifecycle of the single discovery run slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    /// Cancellation requested; the run has not observed it yet.
    Stopping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { next_cursor: usize },
    Cancelled { next_cursor: usize },
    Failed { reason: String },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed { next_cursor } => write!(f, "completed at cursor {next_cursor}"),
            RunOutcome::Cancelled { next_cursor } => write!(f, "cancelled at cursor {next_cursor}"),
            RunOutcome::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Misuse of the start/stop controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    AlreadyRunning,
    NotRunning,
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::AlreadyRunning => write!(f, "a discovery run is already active"),
            ControlError::NotRunning => write!(f, "no discovery run is active"),
        }
    }
}

impl std::error::Error for ControlError {}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SupervisorState {
    phase: RunPhase,
    active_run: Option<RunId>,
    last_run_id: RunId,
    last_cursor: Option<usize>,
    last_outcome: Option<RunOutcome>,
    runs_started: u64,
}

impl SupervisorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active_run
    }

    pub fn view(&self) -> StatusView {
        StatusView {
            phase: self.phase,
            active_run: self.active_run,
            last_cursor: self.last_cursor,
            last_outcome: self.last_outcome.clone(),
            runs_started: self.runs_started,
        }
    }

    pub(crate) fn begin_run(&mut self) -> RunId {
        self.last_run_id += 1;
        self.runs_started += 1;
        self.phase = RunPhase::Running;
        self.active_run = Some(self.last_run_id);
        self.last_run_id
    }

    pub(crate) fn request_stop(&mut self) {
        self.phase = RunPhase::Stopping;
    }

    pub(crate) fn observe_cursor(&mut self, cursor: usize) {
        self.last_cursor = Some(cursor);
    }

    /// Returns false when `run_id` is not the active run.
    pub(crate) fn finish_run(&mut self, run_id: RunId, outcome: RunOutcome) -> bool {
        if self.active_run != Some(run_id) {
            return false;
        }
        match &outcome {
            RunOutcome::Completed { next_cursor } | RunOutcome::Cancelled { next_cursor } => {
                self.last_cursor = Some(*next_cursor);
            }
            RunOutcome::Failed { .. } => {}
        }
        self.phase = RunPhase::Idle;
        self.active_run = None;
        self.last_outcome = Some(outcome);
        true
    }
}
