use std::collections::VecDeque;

use pretty_assertions::assert_eq;
use scout_core::{next_batch, AdFlag, BatchPolicy, Record};

fn record(url: &str, label: &str) -> Record {
    Record {
        post_url: url.to_string(),
        group_label: label.to_string(),
        writer: "writer".to_string(),
        published_date: "2024. 1. 1. 12:00".to_string(),
        title: format!("title {url}"),
        content: "body".to_string(),
        tags: Vec::new(),
        sympathy_count: 0,
        ad_image_urls: Vec::new(),
        ad_flag: AdFlag::Absent,
    }
}

fn pending(items: &[(&str, &str)]) -> VecDeque<Record> {
    items.iter().map(|(url, label)| record(url, label)).collect()
}

#[test]
fn first_label_waits_for_a_full_batch() {
    let mut queue = pending(&[("u1", "A"), ("u2", "A"), ("u3", "B")]);
    assert_eq!(next_batch(&mut queue, 5, BatchPolicy::FirstLabel, false), None);
    assert_eq!(queue.len(), 3);
}

#[test]
fn first_label_keeps_fifo_order() {
    let mut queue = pending(&[("u1", "A"), ("u2", "A"), ("u3", "A"), ("u4", "A"), ("u5", "A"), ("u6", "A")]);
    let batch = next_batch(&mut queue, 5, BatchPolicy::FirstLabel, false).expect("full batch");
    assert_eq!(batch.post_urls(), vec!["u1", "u2", "u3", "u4", "u5"]);
    assert_eq!(queue.len(), 1);
}

#[test]
fn first_label_attributes_mixed_batch_to_first_query() {
    let mut queue = pending(&[("u1", "A"), ("u2", "A"), ("u3", "B"), ("u4", "B"), ("u5", "B")]);
    let batch = next_batch(&mut queue, 5, BatchPolicy::FirstLabel, false).expect("full batch");
    assert_eq!(batch.group_label, "A");
    assert_eq!(batch.len(), 5);
    // The records keep their own labels; only the batch label is lossy.
    assert_eq!(batch.records[4].group_label, "B");
}

#[test]
fn first_label_flush_releases_short_tail() {
    let mut queue = pending(&[("u1", "A"), ("u2", "B"), ("u3", "B")]);
    let batch = next_batch(&mut queue, 5, BatchPolicy::FirstLabel, true).expect("flushed");
    assert_eq!(batch.post_urls(), vec!["u1", "u2", "u3"]);
    assert_eq!(batch.group_label, "A");
    assert!(queue.is_empty());
    assert_eq!(next_batch(&mut queue, 5, BatchPolicy::FirstLabel, true), None);
}

#[test]
fn split_on_group_cuts_at_query_boundary() {
    let mut queue = pending(&[("u1", "A"), ("u2", "A"), ("u3", "B"), ("u4", "B"), ("u5", "B")]);

    let first = next_batch(&mut queue, 5, BatchPolicy::SplitOnGroup, false).expect("A batch");
    assert_eq!(first.group_label, "A");
    assert_eq!(first.post_urls(), vec!["u1", "u2"]);

    // Three B records with nothing behind them: still waiting for more B.
    assert_eq!(next_batch(&mut queue, 5, BatchPolicy::SplitOnGroup, false), None);

    let tail = next_batch(&mut queue, 5, BatchPolicy::SplitOnGroup, true).expect("B flush");
    assert_eq!(tail.group_label, "B");
    assert_eq!(tail.post_urls(), vec!["u3", "u4", "u5"]);
}

#[test]
fn split_on_group_takes_full_batches_within_one_query() {
    let mut queue = pending(&[
        ("u1", "A"),
        ("u2", "A"),
        ("u3", "A"),
        ("u4", "A"),
        ("u5", "A"),
        ("u6", "A"),
        ("u7", "B"),
    ]);
    let batch = next_batch(&mut queue, 5, BatchPolicy::SplitOnGroup, false).expect("full batch");
    assert_eq!(batch.len(), 5);
    let rest = next_batch(&mut queue, 5, BatchPolicy::SplitOnGroup, false).expect("boundary");
    assert_eq!(rest.post_urls(), vec!["u6"]);
    assert_eq!(rest.group_label, "A");
}

#[test]
fn empty_queue_never_yields_a_batch() {
    let mut queue = VecDeque::new();
    assert_eq!(next_batch(&mut queue, 5, BatchPolicy::FirstLabel, true), None);
    assert_eq!(next_batch(&mut queue, 5, BatchPolicy::SplitOnGroup, true), None);
}
