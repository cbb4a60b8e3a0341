use std::time::Duration;

use async_trait::async_trait;

use crate::error::QueueResult;
use crate::types::{DeleteOutcome, QueueHandle, RawMessage};

/// Queue operations the worker depends on
///
/// Delivery is at-least-once: a message that is not deleted, or whose delete
/// only partially succeeded, is expected to be received again later.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Resolves a queue name to a handle for the other operations
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the queue cannot be resolved
    async fn queue_handle(&self, queue_name: &str) -> QueueResult<QueueHandle>;

    /// Returns the approximate number of messages waiting in the queue
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the count cannot be read
    async fn message_count(&self, queue: &QueueHandle) -> QueueResult<u64>;

    /// Receives up to `max_messages` messages, waiting at most `timeout`
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the receive call fails
    async fn poll_batch(
        &self,
        queue: &QueueHandle,
        max_messages: i32,
        timeout: Duration,
    ) -> QueueResult<Vec<RawMessage>>;

    /// Deletes a batch of previously received messages
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the delete call itself fails. Individual entry
    /// failures are reported through [`DeleteOutcome::Partial`].
    async fn delete_batch(
        &self,
        queue: &QueueHandle,
        messages: &[RawMessage],
    ) -> QueueResult<DeleteOutcome>;
}
