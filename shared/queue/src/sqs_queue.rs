//! SQS implementation of the queue contract

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_sqs::types::{
    DeleteMessageBatchRequestEntry, Message, MessageSystemAttributeName, QueueAttributeName,
};
use aws_sdk_sqs::Client as SqsClient;
use tracing::{debug, warn};

use crate::client::QueueClient;
use crate::error::{QueueError, QueueResult};
use crate::types::{DeleteOutcome, QueueHandle, RawMessage};

/// Longest long-poll wait SQS accepts, in seconds
const MAX_WAIT_TIME_SECONDS: u64 = 20;

/// Queue client backed by AWS SQS
pub struct SqsQueue {
    sqs_client: Arc<SqsClient>,
}

impl SqsQueue {
    /// Creates a new SQS queue client
    ///
    /// # Arguments
    ///
    /// * `sqs_client` - Pre-configured SQS client
    #[must_use]
    pub const fn new(sqs_client: Arc<SqsClient>) -> Self {
        Self { sqs_client }
    }
}

#[async_trait]
impl QueueClient for SqsQueue {
    async fn queue_handle(&self, queue_name: &str) -> QueueResult<QueueHandle> {
        let result = self
            .sqs_client
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await
            .map_err(|source| QueueError::QueueUrl {
                name: queue_name.to_string(),
                source,
            })?;

        let url = result
            .queue_url()
            .ok_or_else(|| QueueError::QueueNotFound(queue_name.to_string()))?;

        Ok(QueueHandle {
            name: queue_name.to_string(),
            url: url.to_string(),
        })
    }

    async fn message_count(&self, queue: &QueueHandle) -> QueueResult<u64> {
        let result = self
            .sqs_client
            .get_queue_attributes()
            .queue_url(&queue.url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await?;

        let value = result
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .ok_or_else(|| QueueError::InvalidCount("attribute missing".to_string()))?;

        value
            .parse::<u64>()
            .map_err(|_| QueueError::InvalidCount(value.clone()))
    }

    async fn poll_batch(
        &self,
        queue: &QueueHandle,
        max_messages: i32,
        timeout: Duration,
    ) -> QueueResult<Vec<RawMessage>> {
        let wait_time_seconds = i32::try_from(timeout.as_secs().min(MAX_WAIT_TIME_SECONDS))
            .unwrap_or_default();

        let result = self
            .sqs_client
            .receive_message()
            .queue_url(&queue.url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_seconds)
            .message_attribute_names("All")
            .message_system_attribute_names(MessageSystemAttributeName::SentTimestamp)
            .message_system_attribute_names(
                MessageSystemAttributeName::ApproximateFirstReceiveTimestamp,
            )
            .send()
            .await?;

        let messages: Vec<RawMessage> = result.messages().iter().map(to_raw_message).collect();
        debug!(
            "Received {} messages from queue '{}'",
            messages.len(),
            queue.name
        );

        Ok(messages)
    }

    async fn delete_batch(
        &self,
        queue: &QueueHandle,
        messages: &[RawMessage],
    ) -> QueueResult<DeleteOutcome> {
        if messages.is_empty() {
            return Ok(DeleteOutcome::AllDeleted);
        }

        // Entry ids only need to be unique within the batch
        let entries = messages
            .iter()
            .enumerate()
            .map(|(ix, message)| {
                DeleteMessageBatchRequestEntry::builder()
                    .id(ix.to_string())
                    .receipt_handle(&message.receipt_handle)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let result = self
            .sqs_client
            .delete_message_batch()
            .queue_url(&queue.url)
            .set_entries(Some(entries))
            .send()
            .await?;

        let failed: Vec<String> = result
            .failed()
            .iter()
            .map(|entry| {
                warn!(
                    "Failed to delete message from queue '{}': {:?}",
                    queue.name, entry
                );
                entry
                    .id()
                    .parse::<usize>()
                    .ok()
                    .and_then(|ix| messages.get(ix))
                    .map_or_else(|| entry.id().to_string(), |m| m.message_id.clone())
            })
            .collect();

        if failed.is_empty() {
            Ok(DeleteOutcome::AllDeleted)
        } else {
            Ok(DeleteOutcome::Partial { failed })
        }
    }
}

/// Converts an SQS message, keeping it even when optional fields are missing
fn to_raw_message(message: &Message) -> RawMessage {
    let attributes: HashMap<String, String> = message
        .message_attributes()
        .map(|attrs| {
            attrs
                .iter()
                .filter_map(|(key, value)| {
                    value
                        .string_value()
                        .map(|v| (key.clone(), v.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    let timestamp = |name: &MessageSystemAttributeName| {
        message
            .attributes()
            .and_then(|attrs| attrs.get(name))
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0)
    };

    RawMessage {
        message_id: message.message_id().unwrap_or_default().to_string(),
        receipt_handle: message.receipt_handle().unwrap_or_default().to_string(),
        attributes,
        first_sent_ms: timestamp(&MessageSystemAttributeName::SentTimestamp),
        first_received_ms: timestamp(&MessageSystemAttributeName::ApproximateFirstReceiveTimestamp),
    }
}
