use std::time::Duration;

use queue::MAX_BATCH_SIZE;

/// Long poll waits are capped by SQS at this value
pub const MAX_POLL_WAIT: Duration = Duration::from_secs(20);

/// Settings for one drain cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainSettings {
    /// Name of the queue to drain
    pub queue_name: String,
    /// Long poll wait for each receive call
    pub poll_timeout: Duration,
    /// Delete each batch after it has been accumulated
    pub purge: bool,
    /// Pause after each cycle
    pub idle_wait: Duration,
    /// Messages requested per receive call
    pub batch_size: i32,
}

impl DrainSettings {
    /// The poll wait actually sent to SQS
    #[must_use]
    pub fn poll_wait(&self) -> Duration {
        self.poll_timeout.min(MAX_POLL_WAIT)
    }
}

impl Default for DrainSettings {
    fn default() -> Self {
        Self {
            queue_name: String::new(),
            poll_timeout: MAX_POLL_WAIT,
            purge: false,
            idle_wait: Duration::from_secs(60),
            batch_size: MAX_BATCH_SIZE,
        }
    }
}
