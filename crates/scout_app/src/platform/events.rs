use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use engine_logging::{engine_debug, engine_info, engine_warn};
use scout_engine::PipelineEvent;

/// Running totals printed when the event stream ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventTotals {
    pub queries: usize,
    pub records: usize,
    pub dropped: usize,
    pub persisted: usize,
    pub failed_batches: usize,
}

/// Drain pipeline events on a plain thread until every sender is gone.
pub fn spawn_event_logger(rx: mpsc::Receiver<PipelineEvent>) -> JoinHandle<EventTotals> {
    thread::spawn(move || {
        let mut totals = EventTotals::default();
        for event in rx {
            record(&mut totals, event);
        }
        engine_info!(
            "session totals: {} queries, {} records extracted, {} urls dropped, {} persisted, {} failed batches",
            totals.queries,
            totals.records,
            totals.dropped,
            totals.persisted,
            totals.failed_batches
        );
        totals
    })
}

fn record(totals: &mut EventTotals, event: PipelineEvent) {
    match event {
        PipelineEvent::QueryStarted { index, query } => {
            engine_debug!("query #{} '{}' started", index, query);
        }
        PipelineEvent::QueryFinished { index, records } => {
            totals.queries += 1;
            engine_info!("query #{} finished with {} records", index, records);
        }
        PipelineEvent::RecordEnqueued { .. } => totals.records += 1,
        PipelineEvent::UrlDropped { .. } => totals.dropped += 1,
        PipelineEvent::BatchPersisted { records, .. } => totals.persisted += records,
        PipelineEvent::BatchFailed { .. } => totals.failed_batches += 1,
        PipelineEvent::BatchDeadLettered {
            group_label,
            records,
        } => {
            engine_warn!("{} records of '{}' moved to the dead-letter log", records, group_label);
        }
        PipelineEvent::CursorSaved { cursor } => engine_debug!("cursor saved at {}", cursor),
        PipelineEvent::PassStarted { .. }
        | PipelineEvent::SearchFailed { .. }
        | PipelineEvent::CursorSaveFailed { .. }
        | PipelineEvent::PassFinished { .. } => {}
    }
}
