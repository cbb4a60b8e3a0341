//! SQS queue integration for the email notify worker
//!
//! This crate defines the queue contract the worker drains (count, batch poll,
//! batch delete) and its AWS SQS implementation.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]
#![warn(missing_docs)]

/// The queue contract
pub mod client;
/// Error types for queue operations
pub mod error;
/// SQS implementation of the queue contract
pub mod sqs_queue;
/// Common types for queue operations
pub mod types;

pub use client::QueueClient;
pub use error::{QueueError, QueueResult};
pub use sqs_queue::SqsQueue;
pub use types::{
    DeleteOutcome, QueueHandle, RawMessage, ATTRIBUTE_KEY_RECORD_ID, MAX_BATCH_SIZE,
};
