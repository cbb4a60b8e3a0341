use std::fmt;

use chrono::{DateTime, Local};
use queue::{RawMessage, ATTRIBUTE_KEY_RECORD_ID};

/// Identifier recorded when a message carries no record id
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// What the worker keeps from each received message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTuple {
    identifier: String,
    first_sent_ms: u64,
    first_received_ms: u64,
}

impl MessageTuple {
    /// Creates a tuple from already extracted values
    #[must_use]
    pub fn new(identifier: impl Into<String>, first_sent_ms: u64, first_received_ms: u64) -> Self {
        Self {
            identifier: identifier.into(),
            first_sent_ms,
            first_received_ms,
        }
    }

    /// Extracts a tuple from a queue message
    ///
    /// A message without a record id still yields a tuple, identified as
    /// [`UNKNOWN_IDENTIFIER`].
    #[must_use]
    pub fn from_raw(message: &RawMessage) -> Self {
        let identifier = message
            .attribute(ATTRIBUTE_KEY_RECORD_ID)
            .unwrap_or(UNKNOWN_IDENTIFIER);

        Self::new(identifier, message.first_sent_ms, message.first_received_ms)
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub const fn first_sent_ms(&self) -> u64 {
        self.first_sent_ms
    }

    #[must_use]
    pub const fn first_received_ms(&self) -> u64 {
        self.first_received_ms
    }
}

impl fmt::Display for MessageTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Id: {} (first sent: {})",
            self.identifier,
            format_epoch_millis(self.first_sent_ms)
        )
    }
}

/// Renders epoch milliseconds as local wall-clock time, to the second
#[must_use]
pub fn format_epoch_millis(millis: u64) -> String {
    i64::try_from(millis / 1000)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map_or_else(
            || format!("{millis}ms"),
            |utc| utc.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
        )
}

/// Messages seen since the last notification, in the order they were polled
#[derive(Debug, Default)]
pub struct Accumulator {
    entries: Vec<MessageTuple>,
}

impl Accumulator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends one tuple per message, keeping poll order
    pub fn extend_from_batch(&mut self, messages: &[RawMessage]) {
        self.entries.extend(messages.iter().map(MessageTuple::from_raw));
    }

    #[must_use]
    pub fn entries(&self) -> &[MessageTuple] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry, keeping the allocation for the next cycle
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
