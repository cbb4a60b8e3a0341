//! Queue test setup utilities

#![allow(dead_code)]

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_sqs::types::MessageAttributeValue;
use aws_sdk_sqs::Client as SqsClient;
use std::sync::Arc;
use uuid::Uuid;

/// Test context that provides an SQS client and a throwaway queue on LocalStack
pub struct QueueTestContext {
    pub sqs_client: Arc<SqsClient>,
    pub queue_name: String,
    pub queue_url: String,
}

impl QueueTestContext {
    /// Creates a new test context with a uniquely named standard queue
    pub async fn new(test_name: &str) -> Self {
        let queue_name = format!("{}-{}", test_name, Uuid::new_v4());

        // Setup LocalStack client with hardcoded credentials for CI
        let credentials = Credentials::from_keys(
            "test", // AWS_ACCESS_KEY_ID
            "test", // AWS_SECRET_ACCESS_KEY
            None,   // no session token
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url("http://localhost:4566")
            .region(aws_config::Region::new("us-east-1"))
            .credentials_provider(credentials)
            .load()
            .await;

        let sqs_client = Arc::new(SqsClient::new(&config));

        let result = sqs_client
            .create_queue()
            .queue_name(&queue_name)
            .send()
            .await
            .expect("Failed to create test queue");

        let queue_url = result
            .queue_url()
            .expect("Queue URL not returned")
            .to_string();

        Self {
            sqs_client,
            queue_name,
            queue_url,
        }
    }

    /// Sends a message, tagging it with a record id when one is given
    pub async fn send(&self, body: &str, record_id: Option<&str>) {
        let mut request = self
            .sqs_client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body);

        if let Some(id) = record_id {
            request = request.message_attributes(
                "id",
                MessageAttributeValue::builder()
                    .data_type("String")
                    .string_value(id)
                    .build()
                    .expect("Failed to build message attribute"),
            );
        }

        request.send().await.expect("Failed to send test message");
    }
}

impl Drop for QueueTestContext {
    fn drop(&mut self) {
        // Clean up the queue
        let client = self.sqs_client.clone();
        let queue_url = self.queue_url.clone();

        // Use tokio runtime to delete queue
        let handle = tokio::runtime::Handle::try_current();
        if let Ok(handle) = handle {
            handle.spawn(async move {
                let _ = client.delete_queue().queue_url(&queue_url).send().await;
            });
        }
    }
}
