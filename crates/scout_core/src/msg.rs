use crate::{RunId, RunOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Caller asked for a new discovery run.
    StartRequested,
    /// Caller asked the active run to stop.
    StopRequested,
    /// The active run loaded or checkpointed the resumption cursor.
    CursorObserved(usize),
    /// A run ended, normally, by cancellation, or by failure.
    RunFinished { run_id: RunId, outcome: RunOutcome },
}
