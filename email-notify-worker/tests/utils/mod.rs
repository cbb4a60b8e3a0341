#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_sqs::error::SdkError;
use queue::{
    DeleteOutcome, QueueClient, QueueError, QueueHandle, QueueResult, RawMessage,
    ATTRIBUTE_KEY_RECORD_ID,
};
use tempfile::TempDir;

use email_notify_worker::notifier::{
    BodyTemplate, DeliveryError, DeliveryMode, EmailMessage, EmailSettings, MailTransport,
    Notifier,
};
use email_notify_worker::retry::RetryPolicy;
use email_notify_worker::summary::SummaryBuilder;
use email_notify_worker::worker::config::DrainSettings;
use email_notify_worker::worker::NotifyWorker;

pub const QUEUE_NAME: &str = "failed-records";
pub const ATTACHMENT_NAME: &str = "failed-ids.zip";
pub const TEMPLATE: &str = "Hello {{ recipient }},\n\n{{ failed_count }} records failed:\n{{ details }}";
pub const FIRST_SENT_MS: u64 = 1_700_000_000_000;

/// Initialize tracing for tests
fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Builds a received message carrying the given record id
pub fn raw_message(id: Option<&str>, ix: usize) -> RawMessage {
    let attributes = id
        .map(|id| HashMap::from([(ATTRIBUTE_KEY_RECORD_ID.to_string(), id.to_string())]))
        .unwrap_or_default();

    RawMessage {
        message_id: format!("msg-{ix}"),
        receipt_handle: format!("receipt-{ix}"),
        attributes,
        first_sent_ms: FIRST_SENT_MS,
        first_received_ms: FIRST_SENT_MS + 1_000,
    }
}

#[derive(Default)]
struct FakeQueueState {
    count: u64,
    batches: VecDeque<Vec<RawMessage>>,
    deleted: Vec<Vec<String>>,
    partial_delete: bool,
    fail_count: bool,
    count_calls: usize,
    fail_count_after: Option<usize>,
    fail_poll: bool,
    polls: usize,
}

/// In-memory queue serving scripted batches
#[derive(Clone, Default)]
pub struct FakeQueue {
    state: Arc<Mutex<FakeQueueState>>,
}

impl FakeQueue {
    /// A queue whose count matches the messages in `batches`
    pub fn with_batches(batches: Vec<Vec<RawMessage>>) -> Self {
        let queue = Self::default();
        {
            let mut state = queue.state.lock().unwrap();
            state.count = batches.iter().map(|b| b.len() as u64).sum();
            state.batches = batches.into();
        }
        queue
    }

    /// Queues another batch and raises the count to match
    pub fn push_batch(&self, batch: Vec<RawMessage>) {
        let mut state = self.state.lock().unwrap();
        state.count += batch.len() as u64;
        state.batches.push_back(batch);
    }

    pub fn set_count(&self, count: u64) {
        self.state.lock().unwrap().count = count;
    }

    pub fn fail_deletes_partially(&self) {
        self.state.lock().unwrap().partial_delete = true;
    }

    pub fn fail_count(&self) {
        self.state.lock().unwrap().fail_count = true;
    }

    /// Fails every count check after the first `calls`
    pub fn fail_count_after(&self, calls: usize) {
        self.state.lock().unwrap().fail_count_after = Some(calls);
    }

    pub fn count_calls(&self) -> usize {
        self.state.lock().unwrap().count_calls
    }

    pub fn fail_poll(&self) {
        self.state.lock().unwrap().fail_poll = true;
    }

    /// Message ids passed to each delete call
    pub fn deleted(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn polls(&self) -> usize {
        self.state.lock().unwrap().polls
    }
}

#[async_trait]
impl QueueClient for FakeQueue {
    async fn queue_handle(&self, queue_name: &str) -> QueueResult<QueueHandle> {
        Ok(QueueHandle {
            name: queue_name.to_string(),
            url: format!("http://localhost:4566/000000000000/{queue_name}"),
        })
    }

    async fn message_count(&self, _queue: &QueueHandle) -> QueueResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.count_calls += 1;
        let calls = state.count_calls;
        let exhausted = state.fail_count_after.is_some_and(|limit| calls > limit);
        if state.fail_count || exhausted {
            return Err(QueueError::InvalidCount("not a number".to_string()));
        }
        Ok(state.count)
    }

    async fn poll_batch(
        &self,
        _queue: &QueueHandle,
        max_messages: i32,
        _timeout: Duration,
    ) -> QueueResult<Vec<RawMessage>> {
        let mut state = self.state.lock().unwrap();
        state.polls += 1;
        if state.fail_poll {
            return Err(QueueError::ReceiveMessage(SdkError::timeout_error(
                "receive timed out",
            )));
        }
        let batch = state.batches.pop_front().unwrap_or_default();
        assert!(batch.len() <= usize::try_from(max_messages).unwrap());
        state.count = state.count.saturating_sub(batch.len() as u64);
        Ok(batch)
    }

    async fn delete_batch(
        &self,
        _queue: &QueueHandle,
        messages: &[RawMessage],
    ) -> QueueResult<DeleteOutcome> {
        let mut state = self.state.lock().unwrap();
        let ids: Vec<String> = messages.iter().map(|m| m.message_id.clone()).collect();
        state.deleted.push(ids.clone());

        if state.partial_delete {
            Ok(DeleteOutcome::Partial { failed: ids })
        } else {
            Ok(DeleteOutcome::AllDeleted)
        }
    }
}

/// Transport that records every email and can be told to fail
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    attempts: Arc<Mutex<u32>>,
    always_fail: bool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    type Envelope = EmailMessage;

    async fn prepare(&self, email: &EmailMessage) -> Result<EmailMessage, DeliveryError> {
        Ok(email.clone())
    }

    async fn send(&self, email: &EmailMessage) -> Result<(), DeliveryError> {
        *self.attempts.lock().unwrap() += 1;
        if self.always_fail {
            return Err(DeliveryError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// A worker wired to fakes, with its scratch directory
pub struct TestContext {
    pub queue: FakeQueue,
    pub transport: RecordingTransport,
    pub handle: QueueHandle,
    pub worker: NotifyWorker<FakeQueue, RecordingTransport>,
    pub scratch: TempDir,
}

impl TestContext {
    pub async fn new(
        queue: FakeQueue,
        transport: RecordingTransport,
        inline_limit: usize,
        purge: bool,
        mode: DeliveryMode,
    ) -> Self {
        Self::with_idle_wait(
            queue,
            transport,
            inline_limit,
            purge,
            mode,
            Duration::from_millis(1),
        )
        .await
    }

    pub async fn with_idle_wait(
        queue: FakeQueue,
        transport: RecordingTransport,
        inline_limit: usize,
        purge: bool,
        mode: DeliveryMode,
        idle_wait: Duration,
    ) -> Self {
        setup_tracing();

        let scratch = tempfile::tempdir().expect("Failed to create scratch dir");
        let settings = EmailSettings {
            sender: "worker@example.com".to_string(),
            recipient: "ops@example.com".to_string(),
            cc: vec![],
            subject: "Failed records".to_string(),
        };
        let template = BodyTemplate::parse(TEMPLATE).expect("Template should parse");
        let notifier =
            Notifier::new(settings, template, transport.clone(), mode).with_retry_policy(
                RetryPolicy {
                    max_attempts: 3,
                    delay: Duration::from_millis(1),
                },
            );

        let summary = SummaryBuilder::new(inline_limit, scratch.path(), ATTACHMENT_NAME);
        let drain = DrainSettings {
            queue_name: QUEUE_NAME.to_string(),
            poll_timeout: Duration::from_secs(1),
            purge,
            idle_wait,
            ..DrainSettings::default()
        };

        let handle = queue
            .queue_handle(QUEUE_NAME)
            .await
            .expect("Fake queue resolves");
        let worker = NotifyWorker::new(queue.clone(), notifier, summary, drain);

        Self {
            queue,
            transport,
            handle,
            worker,
            scratch,
        }
    }
}
