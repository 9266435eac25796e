use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use scout_core::{update, ControlError, Effect, Msg, RunId, RunOutcome, StatusView, SupervisorState};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{DiscoveryWorker, EventSink, PipelineEvent};

/// Whether a run stops after one pass or keeps cycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Once,
    Continuous { interval: Duration },
}

struct ActiveRun {
    run_id: RunId,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Control {
    state: SupervisorState,
    active: Option<ActiveRun>,
}

struct Inner {
    control: Mutex<Control>,
    /// Id of the most recently finished run.
    finished: watch::Sender<RunId>,
    worker: DiscoveryWorker,
    mode: RunMode,
    sink: Arc<dyn EventSink>,
}

/// Owns the single discovery run slot.
///
/// Start and stop requests go through the pure supervisor state machine;
/// the effects it returns are carried out here. At most one run is active.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Supervisor {
    pub fn new(worker: DiscoveryWorker, mode: RunMode, sink: Arc<dyn EventSink>) -> Self {
        let (finished, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                control: Mutex::new(Control::default()),
                finished,
                worker,
                mode,
                sink,
            }),
        }
    }

    /// Launch a run in the background. Fails with
    /// [`ControlError::AlreadyRunning`] while another run is active or stopping.
    pub fn start(&self) -> Result<RunId, ControlError> {
        let mut control = self.inner.lock();
        for effect in self.inner.apply(&mut control, Msg::StartRequested) {
            match effect {
                Effect::SpawnRun { run_id } => {
                    let cancel = CancellationToken::new();
                    control.active = Some(ActiveRun {
                        run_id,
                        cancel: cancel.clone(),
                    });
                    engine_info!("starting discovery run {}", run_id);
                    spawn_run(self.inner.clone(), run_id, cancel);
                    return Ok(run_id);
                }
                Effect::Rejected(err) => return Err(err),
                Effect::CancelRun { .. } => {}
            }
        }
        Err(ControlError::AlreadyRunning)
    }

    /// Cancel the active run and wait until it has ended. A subsequent
    /// [`start`](Self::start) is then guaranteed to be accepted.
    pub async fn stop(&self) -> Result<RunOutcome, ControlError> {
        let run_id = {
            let mut control = self.inner.lock();
            let mut target = Err(ControlError::NotRunning);
            for effect in self.inner.apply(&mut control, Msg::StopRequested) {
                match effect {
                    Effect::CancelRun { run_id } => {
                        if let Some(active) = control.active.as_ref().filter(|a| a.run_id == run_id) {
                            active.cancel.cancel();
                        }
                        target = Ok(run_id);
                    }
                    Effect::Rejected(err) => target = Err(err),
                    Effect::SpawnRun { .. } => {}
                }
            }
            target?
        };
        engine_info!("stop requested for discovery run {}", run_id);
        Ok(self.wait_for(run_id).await)
    }

    pub fn status(&self) -> StatusView {
        self.inner.lock().state.view()
    }

    /// Wait for the active run to end on its own; `None` when idle.
    pub async fn wait(&self) -> Option<RunOutcome> {
        let run_id = self.status().active_run?;
        Some(self.wait_for(run_id).await)
    }

    async fn wait_for(&self, run_id: RunId) -> RunOutcome {
        let mut finished = self.inner.finished.subscribe();
        if finished.wait_for(|done| *done >= run_id).await.is_err() {
            engine_error!("run {} finished signal lost", run_id);
        }
        self.status()
            .last_outcome
            .unwrap_or_else(|| RunOutcome::Failed {
                reason: format!("run {run_id} ended without an outcome"),
            })
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, control: &mut Control, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut control.state);
        let (state, effects) = update(state, msg);
        control.state = state;
        effects
    }

    fn finish(&self, run_id: RunId, outcome: RunOutcome) {
        {
            let mut control = self.lock();
            engine_info!("discovery run {} {}", run_id, outcome);
            self.apply(&mut control, Msg::RunFinished { run_id, outcome });
            if control.active.as_ref().is_some_and(|a| a.run_id == run_id) {
                control.active = None;
            }
        }
        self.finished.send_replace(run_id);
    }

    fn last_cursor(&self) -> usize {
        self.lock().state.view().last_cursor.unwrap_or(0)
    }
}

/// Mirrors cursor progress into the supervisor state before forwarding.
impl EventSink for Inner {
    fn emit(&self, event: PipelineEvent) {
        if let PipelineEvent::PassStarted { cursor, .. }
        | PipelineEvent::CursorSaved { cursor }
        | PipelineEvent::CursorSaveFailed { cursor, .. } = &event
        {
            let mut control = self.lock();
            self.apply(&mut control, Msg::CursorObserved(*cursor));
        }
        self.sink.emit(event);
    }
}

fn spawn_run(inner: Arc<Inner>, run_id: RunId, cancel: CancellationToken) {
    let run = tokio::spawn(drive(inner.clone(), cancel));
    tokio::spawn(async move {
        let outcome = match run.await {
            Ok(outcome) => outcome,
            Err(err) => {
                engine_error!("discovery run {} aborted: {}", run_id, err);
                RunOutcome::Failed {
                    reason: format!("run task aborted: {err}"),
                }
            }
        };
        inner.finish(run_id, outcome);
    });
}

async fn drive(inner: Arc<Inner>, cancel: CancellationToken) -> RunOutcome {
    // Cursor reached by this run; later passes continue from it even when
    // it never made it to the progress store.
    let mut reached = None;
    loop {
        let report = inner
            .worker
            .run_pass_from(reached, &cancel, inner.as_ref())
            .await;
        if let RunOutcome::Completed { next_cursor } = report.outcome {
            reached = Some(next_cursor);
        }
        let interval = match (inner.mode, &report.outcome) {
            (RunMode::Once, _) | (_, RunOutcome::Cancelled { .. }) => return report.outcome,
            (RunMode::Continuous { interval }, _) => interval,
        };
        engine_info!("next pass in {:?}", interval);
        tokio::select! {
            _ = cancel.cancelled() => {
                return RunOutcome::Cancelled {
                    next_cursor: reached.unwrap_or_else(|| inner.last_cursor()),
                };
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
