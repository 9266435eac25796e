use crate::{RunId, RunOutcome, RunPhase};

/// Coarse status reported to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusView {
    pub phase: RunPhase,
    pub active_run: Option<RunId>,
    pub last_cursor: Option<usize>,
    pub last_outcome: Option<RunOutcome>,
    pub runs_started: u64,
}

impl StatusView {
    /// A run that was asked to stop still counts as running until it ends.
    pub fn status(&self) -> RunStatus {
        match self.phase {
            RunPhase::Idle => RunStatus::Idle,
            RunPhase::Running | RunPhase::Stopping => RunStatus::Running,
        }
    }
}
