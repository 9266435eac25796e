use std::sync::Arc;

use engine_logging::{engine_error, engine_info};
use scout_core::Batch;
use tokio_util::sync::CancellationToken;

use crate::{BatchSettings, DeadLetterLog, EventSink, PipelineEvent, RecordQueue, RecordStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersisterReport {
    pub batches: usize,
    pub records: usize,
    pub failed_batches: usize,
    pub dead_lettered: usize,
    /// Records of failed batches that reached neither the store nor the dead-letter log.
    pub lost_records: usize,
}

/// Consumes the record queue in batches and upserts each batch as one unit.
///
/// Batches form only when the configured policy allows. A partial batch is
/// written only once the queue is closed, as part of the final drain.
pub struct BatchPersister {
    queue: RecordQueue,
    store: Arc<dyn RecordStore>,
    settings: BatchSettings,
    dead_letter: Option<DeadLetterLog>,
    sink: Arc<dyn EventSink>,
}

impl BatchPersister {
    pub fn new(
        queue: RecordQueue,
        store: Arc<dyn RecordStore>,
        settings: BatchSettings,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            queue,
            store,
            settings,
            dead_letter: None,
            sink,
        }
    }

    pub fn with_dead_letter(mut self, log: DeadLetterLog) -> Self {
        self.dead_letter = Some(log);
        self
    }

    /// Run until the queue is closed and drained, or until `cancel` fires.
    /// Cancellation abandons whatever is still queued.
    pub async fn run(self, cancel: CancellationToken) -> PersisterReport {
        let mut report = PersisterReport::default();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    engine_info!("batch persister cancelled with {} records queued", self.queue.len());
                    break;
                }
                batch = self.queue.next_batch(self.settings.batch_size, self.settings.policy) => batch,
            };
            let Some(batch) = next else {
                engine_info!("record queue drained; batch persister exiting");
                break;
            };
            self.persist(batch, &mut report).await;
        }
        report
    }

    async fn persist(&self, batch: Batch, report: &mut PersisterReport) {
        let batch = Arc::new(batch);
        let store = self.store.clone();
        let shared = batch.clone();
        let result = tokio::task::spawn_blocking(move || {
            store.upsert_batch(&shared.records, &shared.group_label)
        })
        .await
        .unwrap_or_else(|err| Err(StoreError::Worker(err.to_string())));

        match result {
            Ok(written) => {
                report.batches += 1;
                report.records += written;
                engine_info!("persisted {} records for '{}'", written, batch.group_label);
                self.sink.emit(PipelineEvent::BatchPersisted {
                    group_label: batch.group_label.clone(),
                    records: written,
                });
            }
            Err(err) => {
                report.failed_batches += 1;
                let message = err.to_string();
                engine_error!(
                    "failed to persist {} records for '{}': {}",
                    batch.len(),
                    batch.group_label,
                    message
                );
                self.sink.emit(PipelineEvent::BatchFailed {
                    group_label: batch.group_label.clone(),
                    records: batch.len(),
                    message: message.clone(),
                });
                self.dead_letter_or_discard(&batch, &message, report);
            }
        }
    }

    fn dead_letter_or_discard(&self, batch: &Batch, message: &str, report: &mut PersisterReport) {
        let Some(log) = &self.dead_letter else {
            report.lost_records += batch.len();
            return;
        };
        match log.append(batch, message) {
            Ok(()) => {
                report.dead_lettered += batch.len();
                self.sink.emit(PipelineEvent::BatchDeadLettered {
                    group_label: batch.group_label.clone(),
                    records: batch.len(),
                });
            }
            Err(err) => {
                report.lost_records += batch.len();
                engine_error!(
                    "could not dead-letter batch for '{}' to {}: {}",
                    batch.group_label,
                    log.path().display(),
                    err
                );
            }
        }
    }
}
