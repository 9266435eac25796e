mod common;

use std::time::Duration;

use common::{init_logging, record};
use pretty_assertions::assert_eq;
use scout_core::BatchPolicy;
use scout_engine::{QueueClosed, RecordQueue};

#[tokio::test]
async fn records_come_out_in_insertion_order() {
    init_logging();
    let queue = RecordQueue::unbounded();
    for url in ["u1", "u2", "u3"] {
        queue.put(record(url, "A")).await.unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(queue.get().await.unwrap().post_url);
    }
    assert_eq!(seen, vec!["u1", "u2", "u3"]);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn put_waits_while_full() {
    init_logging();
    let queue = RecordQueue::new(1);
    queue.put(record("u1", "A")).await.unwrap();

    let producer = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.put(record("u2", "A")).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!producer.is_finished());
    assert_eq!(queue.len(), 1);

    assert_eq!(queue.get().await.unwrap().post_url, "u1");
    producer.await.unwrap().unwrap();
    assert_eq!(queue.get().await.unwrap().post_url, "u2");
}

#[tokio::test]
async fn consumer_wakes_when_a_batch_fills() {
    init_logging();
    let queue = RecordQueue::unbounded();
    let consumer = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.next_batch(2, BatchPolicy::FirstLabel).await })
    };

    queue.put(record("u1", "A")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!consumer.is_finished(), "a single record must not form a batch");

    queue.put(record("u2", "A")).await.unwrap();
    let batch = tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .expect("consumer woke")
        .unwrap()
        .expect("batch");
    assert_eq!(batch.post_urls(), vec!["u1", "u2"]);
}

#[tokio::test]
async fn close_flushes_the_remainder_then_ends() {
    init_logging();
    let queue = RecordQueue::unbounded();
    for url in ["u1", "u2", "u3"] {
        queue.put(record(url, "A")).await.unwrap();
    }
    queue.close();

    let first = queue.next_batch(2, BatchPolicy::FirstLabel).await.unwrap();
    let second = queue.next_batch(2, BatchPolicy::FirstLabel).await.unwrap();
    assert_eq!(first.post_urls(), vec!["u1", "u2"]);
    assert_eq!(second.post_urls(), vec!["u3"]);
    assert_eq!(queue.next_batch(2, BatchPolicy::FirstLabel).await, None);
}

#[tokio::test]
async fn put_after_close_returns_the_record() {
    init_logging();
    let queue = RecordQueue::new(4);
    queue.close();

    let QueueClosed(returned) = queue.put(record("u1", "A")).await.unwrap_err();
    assert_eq!(returned.post_url, "u1");
    assert_eq!(queue.get().await, None);
}

#[tokio::test]
async fn close_releases_a_blocked_producer() {
    init_logging();
    let queue = RecordQueue::new(1);
    queue.put(record("u1", "A")).await.unwrap();
    let producer = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.put(record("u2", "A")).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    queue.close();
    let result = producer.await.unwrap();
    assert!(matches!(result, Err(QueueClosed(r)) if r.post_url == "u2"));
    assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn a_full_queue_releases_a_short_batch() {
    init_logging();
    let queue = RecordQueue::new(3);
    let producer = {
        let queue = queue.clone();
        tokio::spawn(async move {
            for url in ["u1", "u2", "u3", "u4", "u5"] {
                queue.put(record(url, "A")).await.unwrap();
            }
        })
    };

    let first = tokio::time::timeout(
        Duration::from_secs(2),
        queue.next_batch(5, BatchPolicy::FirstLabel),
    )
    .await
    .expect("a full queue must not wait for more records")
    .unwrap();
    assert_eq!(first.len(), 3);

    tokio::time::timeout(Duration::from_secs(2), producer)
        .await
        .expect("producer unblocks once the batch is taken")
        .unwrap();
    assert_eq!(queue.len(), 2);
}
