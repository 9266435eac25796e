use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use scout_core::RunOutcome;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    BatchPersister, DeadLetterLog, DiscoveryWorker, EventSink, ExtractorGateway, PersisterReport,
    PipelineConfig, ProgressStore, RecordQueue, RecordStore, RunMode, SearchProvider, Supervisor,
};

/// External collaborators the pipeline is assembled from.
pub struct PipelineParts {
    pub search: Arc<dyn SearchProvider>,
    pub gateway: Arc<dyn ExtractorGateway>,
    pub progress: Arc<dyn ProgressStore>,
    pub store: Arc<dyn RecordStore>,
    pub sink: Arc<dyn EventSink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Outcome of the run that was active at shutdown, if any.
    pub run: Option<RunOutcome>,
    pub persister: PersisterReport,
}

/// A running pipeline: the supervisor owning discovery runs plus the batch
/// persister draining their records.
pub struct Pipeline {
    supervisor: Supervisor,
    queue: RecordQueue,
    persister: JoinHandle<PersisterReport>,
    persister_cancel: CancellationToken,
}

impl Pipeline {
    /// Spawn the batch persister and prepare the supervisor. No run is
    /// started; call `supervisor().start()` for that.
    pub fn launch(queries: Vec<String>, parts: PipelineParts, config: &PipelineConfig) -> Self {
        let batch_settings = config.batch_settings();
        if config.queue_capacity < batch_settings.batch_size {
            engine_warn!(
                "queue capacity {} is below the batch size {}; raising it",
                config.queue_capacity,
                batch_settings.batch_size
            );
        }
        let queue = RecordQueue::new(config.queue_capacity.max(batch_settings.batch_size));
        let worker = DiscoveryWorker::new(
            queries,
            parts.search,
            parts.gateway,
            parts.progress,
            queue.clone(),
            config.discovery_settings(),
        );
        let mode = if config.continuous {
            RunMode::Continuous {
                interval: config.run_interval(),
            }
        } else {
            RunMode::Once
        };
        let supervisor = Supervisor::new(worker, mode, parts.sink.clone());

        let mut persister = BatchPersister::new(
            queue.clone(),
            parts.store,
            batch_settings,
            parts.sink,
        );
        if let Some(path) = &config.dead_letter_path {
            persister = persister.with_dead_letter(DeadLetterLog::new(path.clone()));
        }
        let persister_cancel = CancellationToken::new();
        let persister = tokio::spawn(persister.run(persister_cancel.clone()));

        Self {
            supervisor,
            queue,
            persister,
            persister_cancel,
        }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn queue(&self) -> &RecordQueue {
        &self.queue
    }

    /// Stop any active run, close the queue and wait for the persister to
    /// write every remaining record, the trailing partial batch included.
    pub async fn shutdown(self) -> ShutdownReport {
        let run = self.supervisor.stop().await.ok();
        self.queue.close();
        engine_info!("draining {} queued records", self.queue.len());
        let persister = self.await_persister().await;
        ShutdownReport { run, persister }
    }

    /// Stop without draining; queued records are abandoned.
    pub async fn abort(self) -> ShutdownReport {
        let run = self.supervisor.stop().await.ok();
        self.persister_cancel.cancel();
        self.queue.close();
        let persister = self.await_persister().await;
        ShutdownReport { run, persister }
    }

    async fn await_persister(self) -> PersisterReport {
        match self.persister.await {
            Ok(report) => report,
            Err(err) => {
                engine_warn!("batch persister task failed: {}", err);
                PersisterReport::default()
            }
        }
    }
}
