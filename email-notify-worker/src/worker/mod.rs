//! Drain and notify loop
//!
//! Each cycle counts the queue, drains it batch by batch into the
//! accumulator, emails one summary and resets. The worker then sleeps for
//! the idle interval and starts again, unless the cycle counted messages it
//! could not receive.

pub mod accumulator;
pub mod config;

use queue::{DeleteOutcome, QueueClient, QueueHandle};
use tracing::{debug, info, warn};

use crate::notifier::{MailTransport, Notifier};
use crate::summary::SummaryBuilder;
use crate::types::error::WorkerResult;

use self::accumulator::Accumulator;
use self::config::DrainSettings;

/// What a single cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The count check found no pending messages
    QueueEmpty,
    /// Messages were counted but none were received
    NothingDrained,
    /// A notification covering `count` messages was produced
    Notified { count: usize },
}

impl CycleOutcome {
    /// Whether the worker idles before the next count check
    ///
    /// A cycle that counted messages but received none goes straight back to
    /// the count check.
    #[must_use]
    pub const fn waits_before_next_cycle(self) -> bool {
        !matches!(self, Self::NothingDrained)
    }
}

/// Owns the accumulator and drives the queue and notifier through cycles
pub struct NotifyWorker<Q, T> {
    queue: Q,
    notifier: Notifier<T>,
    summary: SummaryBuilder,
    settings: DrainSettings,
    accumulator: Accumulator,
}

impl<Q: QueueClient, T: MailTransport> NotifyWorker<Q, T> {
    #[must_use]
    pub const fn new(
        queue: Q,
        notifier: Notifier<T>,
        summary: SummaryBuilder,
        settings: DrainSettings,
    ) -> Self {
        Self {
            queue,
            notifier,
            summary,
            settings,
            accumulator: Accumulator::new(),
        }
    }

    /// Runs cycles forever
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; the worker never stops otherwise
    pub async fn run(mut self) -> WorkerResult<()> {
        let handle = self.queue.queue_handle(&self.settings.queue_name).await?;
        info!(queue = %handle.name, url = %handle.url, "Resolved input queue");

        loop {
            let outcome = self.run_cycle(&handle).await?;
            debug!(?outcome, "Cycle complete");
            if !outcome.waits_before_next_cycle() {
                continue;
            }

            info!(
                "Waiting {} seconds before checking the queue again",
                self.settings.idle_wait.as_secs()
            );
            tokio::time::sleep(self.settings.idle_wait).await;
        }
    }

    /// Runs one count, drain and notify pass without the idle sleep
    ///
    /// # Errors
    ///
    /// Returns `WorkerError` if a queue call, the summary, rendering or
    /// delivery fails. A partially failed delete is logged and ignored.
    pub async fn run_cycle(&mut self, handle: &QueueHandle) -> WorkerResult<CycleOutcome> {
        let pending = self.queue.message_count(handle).await?;
        if pending == 0 {
            info!(queue = %handle.name, "No messages in queue");
            return Ok(CycleOutcome::QueueEmpty);
        }

        info!(queue = %handle.name, pending, "Messages in queue, draining");
        self.drain(handle).await?;

        if self.accumulator.is_empty() {
            info!(queue = %handle.name, "Queue reported messages but none were received");
            return Ok(CycleOutcome::NothingDrained);
        }

        let count = self.accumulator.len();
        let summary = self.summary.build(self.accumulator.entries())?;
        self.notifier
            .notify(self.accumulator.entries(), &summary)
            .await?;
        self.accumulator.reset();

        info!(count, "Notification cycle complete");
        Ok(CycleOutcome::Notified { count })
    }

    /// Polls until a receive call comes back empty
    async fn drain(&mut self, handle: &QueueHandle) -> WorkerResult<()> {
        loop {
            let messages = self
                .queue
                .poll_batch(handle, self.settings.batch_size, self.settings.poll_wait())
                .await?;

            if messages.is_empty() {
                return Ok(());
            }

            self.accumulator.extend_from_batch(&messages);
            debug!(
                received = messages.len(),
                accumulated = self.accumulator.len(),
                "Received batch"
            );

            if self.settings.purge {
                if let DeleteOutcome::Partial { failed } =
                    self.queue.delete_batch(handle, &messages).await?
                {
                    warn!(
                        failed = failed.len(),
                        ids = ?failed,
                        "Some messages could not be deleted and will be received again"
                    );
                }
            }
        }
    }

    /// Messages accumulated since the last notification
    #[must_use]
    pub const fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }
}
