use std::sync::mpsc;

/// Observable milestones of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    PassStarted {
        cursor: usize,
        window_len: usize,
    },
    QueryStarted {
        index: usize,
        query: String,
    },
    SearchFailed {
        index: usize,
        query: String,
        message: String,
    },
    RecordEnqueued {
        post_url: String,
        group_label: String,
    },
    UrlDropped {
        url: String,
        attempts: u32,
        message: String,
    },
    QueryFinished {
        index: usize,
        records: usize,
    },
    CursorSaved {
        cursor: usize,
    },
    CursorSaveFailed {
        cursor: usize,
        message: String,
    },
    BatchPersisted {
        group_label: String,
        records: usize,
    },
    BatchFailed {
        group_label: String,
        records: usize,
        message: String,
    },
    BatchDeadLettered {
        group_label: String,
        records: usize,
    },
    PassFinished {
        queries: usize,
        records: usize,
        dropped: usize,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards events to a std channel; a dropped receiver silences the sink.
pub struct ChannelEventSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: PipelineEvent) {}
}
