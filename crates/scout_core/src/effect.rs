use crate::{ControlError, RunId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Launch a discovery run tracked under `run_id`.
    SpawnRun { run_id: RunId },
    /// Ask the active run to stop at its next Query or URL boundary.
    CancelRun { run_id: RunId },
    /// The request was refused; surface the error to the caller.
    Rejected(ControlError),
}
