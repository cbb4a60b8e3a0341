//! Errors that end the worker process

use queue::QueueError;
use thiserror::Error;

use crate::notifier::DeliveryError;
use crate::summary::SummaryError;
use crate::types::config::ConfigError;

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Fatal worker errors
///
/// Anything the worker can recover from, such as a partially failed batch
/// delete, is reported as a value instead and never reaches this type.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Configuration failed validation at startup
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A queue count, poll or delete call failed
    #[error("Queue operation failed: {0}")]
    Queue(#[from] QueueError),

    /// The summary attachment could not be written
    #[error("Failed to build summary attachment: {0}")]
    Summary(#[from] SummaryError),

    /// The notification body could not be rendered
    #[error("Failed to render notification body: {0}")]
    Template(#[from] tera::Error),

    /// The notification could not be turned into a deliverable message
    #[error("Failed to prepare notification email: {0}")]
    Compose(#[source] DeliveryError),

    /// Every delivery attempt failed
    #[error("Notification delivery failed after {attempts} attempts: {source}")]
    Delivery {
        /// Number of attempts made
        attempts: u32,
        /// Error from the last attempt
        #[source]
        source: DeliveryError,
    },
}
