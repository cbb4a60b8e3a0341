//! Integration tests for SqsQueue, run against LocalStack
//!
//! `cargo test -p queue -- --ignored` with LocalStack listening on port 4566.

mod common;

use std::time::Duration;

use crate::common::QueueTestContext;
use pretty_assertions::assert_eq;
use queue::{DeleteOutcome, QueueClient, SqsQueue, ATTRIBUTE_KEY_RECORD_ID, MAX_BATCH_SIZE};

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_count_poll_delete_happy_path() {
    let ctx = QueueTestContext::new("email-notify-happy-path").await;
    let queue = SqsQueue::new(ctx.sqs_client.clone());

    let handle = queue
        .queue_handle(&ctx.queue_name)
        .await
        .expect("Failed to resolve queue");
    assert_eq!(handle.url, ctx.queue_url);

    ctx.send("first", Some("record-1")).await;
    ctx.send("second", None).await;

    let count = queue
        .message_count(&handle)
        .await
        .expect("Failed to count messages");
    assert_eq!(count, 2);

    let mut received = Vec::new();
    while received.len() < 2 {
        let batch = queue
            .poll_batch(&handle, MAX_BATCH_SIZE, Duration::from_secs(1))
            .await
            .expect("Failed to poll messages");
        received.extend(batch);
    }

    let ids: Vec<Option<&str>> = received
        .iter()
        .map(|m| m.attribute(ATTRIBUTE_KEY_RECORD_ID))
        .collect();
    assert!(ids.contains(&Some("record-1")));
    assert!(ids.contains(&None));
    assert!(received.iter().all(|m| m.first_sent_ms > 0));

    let outcome = queue
        .delete_batch(&handle, &received)
        .await
        .expect("Failed to delete messages");
    assert_eq!(outcome, DeleteOutcome::AllDeleted);

    let remaining = queue
        .poll_batch(&handle, MAX_BATCH_SIZE, Duration::from_secs(1))
        .await
        .expect("Failed to poll messages");
    assert!(remaining.is_empty(), "Queue should be empty after delete");
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_delete_with_stale_receipt_handle_is_partial() {
    let ctx = QueueTestContext::new("email-notify-partial").await;
    let queue = SqsQueue::new(ctx.sqs_client.clone());
    let handle = queue
        .queue_handle(&ctx.queue_name)
        .await
        .expect("Failed to resolve queue");

    ctx.send("only", Some("record-1")).await;
    let mut batch = queue
        .poll_batch(&handle, MAX_BATCH_SIZE, Duration::from_secs(1))
        .await
        .expect("Failed to poll messages");
    assert_eq!(batch.len(), 1);

    let mut stale = batch[0].clone();
    stale.message_id = "stale".to_string();
    stale.receipt_handle = "not-a-real-receipt-handle".to_string();
    batch.push(stale);

    let outcome = queue
        .delete_batch(&handle, &batch)
        .await
        .expect("Partial failures must not be errors");
    assert_eq!(
        outcome,
        DeleteOutcome::Partial {
            failed: vec!["stale".to_string()]
        }
    );
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_unknown_queue_is_an_error() {
    let ctx = QueueTestContext::new("email-notify-missing").await;
    let queue = SqsQueue::new(ctx.sqs_client.clone());

    let result = queue.queue_handle("no-such-queue-for-this-test").await;
    assert!(result.is_err());
}
