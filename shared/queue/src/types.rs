use std::collections::HashMap;

/// Message attribute holding the record identifier
pub const ATTRIBUTE_KEY_RECORD_ID: &str = "id";

/// Maximum number of messages SQS returns from a single receive call
pub const MAX_BATCH_SIZE: i32 = 10;

/// A resolved queue, as returned by [`crate::QueueClient::queue_handle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueHandle {
    /// Queue name as configured
    pub name: String,
    /// Queue URL used for all subsequent calls
    pub url: String,
}

/// A message received from the queue, before any domain extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    /// Message ID assigned by the queue
    pub message_id: String,
    /// Receipt handle for deleting the message
    pub receipt_handle: String,
    /// String-valued message attributes
    pub attributes: HashMap<String, String>,
    /// Time the message was first sent, epoch milliseconds
    pub first_sent_ms: u64,
    /// Time the message was first received, epoch milliseconds
    pub first_received_ms: u64,
}

impl RawMessage {
    /// Looks up a message attribute by key
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Result of a batch delete that did not fail outright
///
/// Messages that could not be deleted reappear on a later poll, so a partial
/// result is reported rather than raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Every message in the batch was deleted
    AllDeleted,
    /// One or more messages were not deleted
    Partial {
        /// Message IDs the queue reported as failed
        failed: Vec<String>,
    },
}
