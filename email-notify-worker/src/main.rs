use std::sync::Arc;

use anyhow::anyhow;
use aws_sdk_sqs::Client as SqsClient;
use queue::SqsQueue;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use email_notify_worker::notifier::{Notifier, SmtpMailTransport};
use email_notify_worker::types::config::{ConfigError, ServiceConfig};
use email_notify_worker::types::environment::Environment;
use email_notify_worker::worker::NotifyWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize rustls crypto provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    let config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(ConfigError::Parse(e)) => e.exit(),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let env = Environment::from_env();
    info!("{}", email_notify_worker::startup_banner(&env));
    config.log_summary();

    let sqs_client = Arc::new(SqsClient::new(&env.aws_config(config.poll_timeout()).await));
    let queue = SqsQueue::new(sqs_client);

    let transport = SmtpMailTransport::new(&config.smtp_settings())?;
    let notifier = Notifier::new(
        config.email_settings(),
        config.body_template()?,
        transport,
        config.delivery_mode(),
    );

    let worker = NotifyWorker::new(
        queue,
        notifier,
        config.summary_builder(),
        config.drain_settings(),
    );

    if let Err(e) = worker.run().await {
        error!("Worker error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
