use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::Record;

/// Records handed to storage per write.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// How pending records are cut into batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BatchPolicy {
    /// Take `size` records in FIFO order and attribute all of them to the
    /// first record's group label. A batch spanning two Queries stores the
    /// second Query's records under the first label.
    #[default]
    FirstLabel,
    /// Never mix groups: a shorter batch is cut as soon as the next pending
    /// record belongs to a different Query.
    SplitOnGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub group_label: String,
    pub records: Vec<Record>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn post_urls(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.post_url.as_str()).collect()
    }
}

/// Cut the next batch off the front of `pending`, if the policy allows one.
///
/// With `flush` set (queue closed for draining) a short trailing batch is
/// released too; otherwise fewer than `size` same-group records stay pending.
pub fn next_batch(
    pending: &mut VecDeque<Record>,
    size: usize,
    policy: BatchPolicy,
    flush: bool,
) -> Option<Batch> {
    let size = size.max(1);
    let first_label = pending.front()?.group_label.clone();

    let take = match policy {
        BatchPolicy::FirstLabel => {
            if pending.len() >= size {
                size
            } else if flush {
                pending.len()
            } else {
                return None;
            }
        }
        BatchPolicy::SplitOnGroup => {
            let run = pending
                .iter()
                .take(size)
                .take_while(|r| r.group_label == first_label)
                .count();
            let boundary = run < size && run < pending.len();
            if run == size || boundary || flush {
                run
            } else {
                return None;
            }
        }
    };

    let records: Vec<Record> = pending.drain(..take).collect();
    Some(Batch {
        group_label: first_label,
        records,
    })
}
