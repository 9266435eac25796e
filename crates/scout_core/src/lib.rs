//! Scout core: data model, batching rules and the run supervisor state machine.
//!
//! Nothing in here performs IO; the engine crate drives it.
mod batch;
mod dedupe;
mod effect;
mod msg;
mod record;
mod state;
mod update;
mod view_model;
mod window;

pub use batch::{next_batch, Batch, BatchPolicy, DEFAULT_BATCH_SIZE};
pub use dedupe::{host_contains, normalize_url_for_dedupe};
pub use effect::Effect;
pub use msg::Msg;
pub use record::{
    classify_ad_images, join_tags, parse_sympathy, split_tags, AdFlag, ExtractedPost, Record,
    AD_IMAGE_PATTERNS, FAILURE_TITLE, TAGS_MAX_CHARS, UNKNOWN_FIELD,
};
pub use state::{ControlError, RunId, RunOutcome, RunPhase, SupervisorState};
pub use update::update;
pub use view_model::{RunStatus, StatusView};
pub use window::{normalize_queries, pass_limit, query_window, QUERIES_PER_PASS, QUERIES_PER_WORKER};
