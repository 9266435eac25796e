use std::io;
use std::sync::Arc;

use engine_logging::{engine_error, engine_info, engine_warn};
use scout_core::{query_window, Record, RunOutcome};
use tokio_util::sync::CancellationToken;

use crate::retry::{extract_with_retry, RetryOutcome};
use crate::{
    DiscoverySettings, EventSink, ExtractorGateway, PipelineEvent, ProgressError, ProgressStore,
    QueueClosed, RecordQueue, SearchProvider,
};

/// Result of one pass over the Query window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub outcome: RunOutcome,
    pub queries: usize,
    pub records: usize,
    pub dropped: usize,
}

/// Walks the Query list from the resumption cursor, searching and extracting
/// each Query's posts and handing the records to the queue. The cursor is
/// checkpointed after every fully processed Query.
pub struct DiscoveryWorker {
    queries: Arc<[String]>,
    search: Arc<dyn SearchProvider>,
    gateway: Arc<dyn ExtractorGateway>,
    progress: Arc<dyn ProgressStore>,
    queue: RecordQueue,
    settings: DiscoverySettings,
}

impl DiscoveryWorker {
    pub fn new(
        queries: Vec<String>,
        search: Arc<dyn SearchProvider>,
        gateway: Arc<dyn ExtractorGateway>,
        progress: Arc<dyn ProgressStore>,
        queue: RecordQueue,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            queries: queries.into(),
            search,
            gateway,
            progress,
            queue,
            settings,
        }
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    /// Process up to one window of Queries.
    ///
    /// Cancellation is honoured between Queries and between extraction
    /// attempts. A Query interrupted half-way is not checkpointed, so the
    /// next pass starts over with it.
    pub async fn run_pass(&self, cancel: &CancellationToken, sink: &dyn EventSink) -> PassReport {
        self.run_pass_from(None, cancel, sink).await
    }

    /// Like [`run_pass`](Self::run_pass), but starts at `reached`, the cursor
    /// an earlier pass of the same run got to, when there is one. The saved
    /// cursor may lag behind it after failed saves, and is only authoritative
    /// for a fresh run.
    pub async fn run_pass_from(
        &self,
        reached: Option<usize>,
        cancel: &CancellationToken,
        sink: &dyn EventSink,
    ) -> PassReport {
        let mut report = PassReport {
            outcome: RunOutcome::Completed { next_cursor: 0 },
            queries: 0,
            records: 0,
            dropped: 0,
        };

        let mut cursor = match (self.load_cursor().await, reached) {
            (Ok(loaded), Some(reached)) => {
                if loaded != reached {
                    engine_warn!("saved cursor {} is stale; continuing at {}", loaded, reached);
                }
                reached
            }
            (Ok(loaded), None) => loaded,
            (Err(err), Some(reached)) => {
                engine_warn!(
                    "cannot load resumption cursor, continuing at {}: {}",
                    reached,
                    err
                );
                reached
            }
            (Err(err), None) => {
                engine_error!("cannot load resumption cursor: {}", err);
                report.outcome = RunOutcome::Failed {
                    reason: err.to_string(),
                };
                return report;
            }
        };

        let total = self.queries.len();
        if cursor >= total && total > 0 && self.settings.wrap_around {
            engine_info!("all {} queries processed; starting over", total);
            cursor = 0;
            self.checkpoint(cursor, sink).await;
        }

        let window = query_window(total, cursor, self.settings.pass_limit);
        engine_info!(
            "pass starting at cursor {} with {} of {} queries",
            cursor,
            window.len(),
            total
        );
        sink.emit(PipelineEvent::PassStarted {
            cursor,
            window_len: window.len(),
        });

        let mut next_cursor = cursor;
        for index in window {
            if cancel.is_cancelled() {
                return self.cancelled(report, next_cursor);
            }
            let query = &self.queries[index];
            sink.emit(PipelineEvent::QueryStarted {
                index,
                query: query.clone(),
            });

            let urls = match self
                .search
                .search(query, self.settings.max_results_per_query)
                .await
            {
                Ok(urls) => urls,
                Err(err) => {
                    engine_warn!("search for '{}' failed, skipping it: {}", query, err);
                    sink.emit(PipelineEvent::SearchFailed {
                        index,
                        query: query.clone(),
                        message: err.to_string(),
                    });
                    Vec::new()
                }
            };

            let mut produced = 0;
            for url in urls {
                let outcome = extract_with_retry(
                    self.gateway.as_ref(),
                    &url,
                    self.settings.max_attempts,
                    self.settings.retry_delay,
                    cancel,
                )
                .await;
                match outcome {
                    RetryOutcome::Extracted { post, .. } => {
                        let record = Record::new(post, query.as_str());
                        let post_url = record.post_url.clone();
                        if let Err(QueueClosed(record)) = self.queue.put(record).await {
                            engine_warn!(
                                "queue closed; abandoning '{}' at {}",
                                query,
                                record.post_url
                            );
                            return self.cancelled(report, next_cursor);
                        }
                        sink.emit(PipelineEvent::RecordEnqueued {
                            post_url,
                            group_label: query.clone(),
                        });
                        produced += 1;
                        report.records += 1;
                    }
                    RetryOutcome::Dropped {
                        attempts,
                        last_error,
                    } => {
                        report.dropped += 1;
                        sink.emit(PipelineEvent::UrlDropped {
                            url,
                            attempts,
                            message: last_error.to_string(),
                        });
                    }
                    RetryOutcome::Cancelled { .. } => {
                        return self.cancelled(report, next_cursor);
                    }
                }
            }

            next_cursor = index + 1;
            report.queries += 1;
            sink.emit(PipelineEvent::QueryFinished {
                index,
                records: produced,
            });
            self.checkpoint(next_cursor, sink).await;
        }

        sink.emit(PipelineEvent::PassFinished {
            queries: report.queries,
            records: report.records,
            dropped: report.dropped,
        });
        engine_info!(
            "pass finished: {} queries, {} records, {} dropped urls",
            report.queries,
            report.records,
            report.dropped
        );
        report.outcome = RunOutcome::Completed { next_cursor };
        report
    }

    fn cancelled(&self, mut report: PassReport, next_cursor: usize) -> PassReport {
        engine_info!("pass cancelled; resumption cursor stays at {}", next_cursor);
        report.outcome = RunOutcome::Cancelled { next_cursor };
        report
    }

    async fn load_cursor(&self) -> Result<usize, ProgressError> {
        let progress = self.progress.clone();
        run_blocking(move || progress.load_cursor()).await
    }

    /// Persist the cursor before moving on. A failed save is logged; the run
    /// keeps going and a restart redoes the Queries since the last good save.
    async fn checkpoint(&self, cursor: usize, sink: &dyn EventSink) {
        let progress = self.progress.clone();
        match run_blocking(move || progress.save_cursor(cursor)).await {
            Ok(()) => sink.emit(PipelineEvent::CursorSaved { cursor }),
            Err(err) => {
                engine_warn!("failed to save resumption cursor {}: {}", cursor, err);
                sink.emit(PipelineEvent::CursorSaveFailed {
                    cursor,
                    message: err.to_string(),
                });
            }
        }
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, ProgressError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProgressError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| ProgressError::Io(io::Error::other(err.to_string())))?
}
