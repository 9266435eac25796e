//! Scout engine: search, extraction, queueing and persistence around the core
//! state machine.
mod batcher;
mod config;
mod dead_letter;
mod decode;
mod discovery;
mod events;
mod extract;
mod fetch;
mod gateway;
mod persist;
mod pipeline;
mod progress;
mod queue;
mod retry;
mod search;
mod store;
mod supervisor;
mod types;

pub use batcher::{BatchPersister, PersisterReport};
pub use config::{BatchSettings, DiscoverySettings, FetchConfig, PipelineConfig, SearchConfig};
pub use dead_letter::{DeadLetterEntry, DeadLetterError, DeadLetterLog};
pub use decode::{decode_html, DecodedHtml};
pub use discovery::{DiscoveryWorker, PassReport};
pub use events::{ChannelEventSink, EventSink, NullEventSink, PipelineEvent};
pub use extract::{content_frame_url, PostExtractor, SelectorError, SmartEditorExtractor};
pub use fetch::{FetchSettings, FetchedPage, HttpFetcher};
pub use gateway::{BlogPageGateway, ExtractorGateway, GatewaySettings};
pub use persist::{append_line, write_atomically};
pub use pipeline::{Pipeline, PipelineParts, ShutdownReport};
pub use progress::{FileProgressStore, MemoryProgressStore, ProgressStore};
pub use queue::RecordQueue;
pub use retry::{extract_with_retry, RetryOutcome};
pub use search::{NaverBlogSearch, SearchCredentials, SearchProvider};
pub use store::{RecordStore, SqliteRecordStore, StoredPost};
pub use supervisor::{RunMode, Supervisor};
pub use types::{
    ExtractError, FailureKind, FetchError, FetchFailure, ProgressError, QueueClosed, SearchError,
    StoreError,
};
