use aws_sdk_sqs::error::{BuildError, SdkError};
use aws_sdk_sqs::operation::delete_message_batch::DeleteMessageBatchError;
use aws_sdk_sqs::operation::get_queue_attributes::GetQueueAttributesError;
use aws_sdk_sqs::operation::get_queue_url::GetQueueUrlError;
use aws_sdk_sqs::operation::receive_message::ReceiveMessageError;
use thiserror::Error;

/// Result type alias for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Error types for queue operations
///
/// Every variant is fatal to the caller. A batch delete where only some
/// entries failed is not an error, see [`crate::DeleteOutcome::Partial`].
#[derive(Error, Debug)]
pub enum QueueError {
    /// Error resolving a queue name to its URL
    #[error("Failed to resolve queue URL for {name}")]
    QueueUrl {
        /// The queue name that was looked up
        name: String,
        /// The underlying SDK error
        #[source]
        source: SdkError<GetQueueUrlError>,
    },

    /// The queue URL lookup succeeded but returned no URL
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// Error reading queue attributes
    #[error("Failed to read queue attributes from SQS")]
    QueueAttributes(#[from] SdkError<GetQueueAttributesError>),

    /// The approximate message count attribute is missing or malformed
    #[error("Invalid message count attribute: {0}")]
    InvalidCount(String),

    /// Error receiving messages from SQS
    #[error("Failed to receive messages from SQS")]
    ReceiveMessage(#[from] SdkError<ReceiveMessageError>),

    /// Error deleting a batch of messages from SQS
    #[error("Failed to delete messages from SQS")]
    DeleteMessageBatch(#[from] SdkError<DeleteMessageBatchError>),

    /// Error building a request entry
    #[error("Failed to build SQS request: {0}")]
    BuildRequest(#[from] BuildError),
}
