//! Notification email composition and delivery
//!
//! The notifier turns one cycle's accumulated messages into an
//! [`EmailMessage`] and either logs it (debug mode) or hands it to a
//! [`MailTransport`] with bounded retry (live mode).

pub mod smtp;
pub mod template;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::summary::Summary;
use crate::types::error::{WorkerError, WorkerResult};
use crate::worker::accumulator::MessageTuple;

pub use smtp::SmtpMailTransport;
pub use template::{BodyAttributes, BodyTemplate};

/// Errors delivering a single email
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Invalid address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Fixed header fields of every notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub sender: String,
    pub recipient: String,
    pub cc: Vec<String>,
    pub subject: String,
}

/// A fully rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachment: Option<PathBuf>,
}

impl fmt::Display for EmailMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "From: {}", self.from)?;
        writeln!(f, "To: {}", self.to)?;
        if !self.cc.is_empty() {
            writeln!(f, "Cc: {}", self.cc.join(", "))?;
        }
        writeln!(f, "Subject: {}", self.subject)?;
        if let Some(path) = &self.attachment {
            writeln!(f, "Attachment: {}", path.display())?;
        }
        writeln!(f)?;
        write!(f, "{}", self.body)
    }
}

/// Something that can deliver an [`EmailMessage`]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// The transport's wire form of an email
    type Envelope: Send + Sync;

    /// Builds the wire form once per notification; failures are not retried
    async fn prepare(&self, email: &EmailMessage) -> Result<Self::Envelope, DeliveryError>;

    /// Delivers a prepared email, making a single attempt
    async fn send(&self, envelope: &Self::Envelope) -> Result<(), DeliveryError>;
}

/// Whether notifications are sent or only logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Write the rendered email to the log and never contact the transport
    Debug,
    /// Deliver through the transport
    Live,
}

impl From<bool> for DeliveryMode {
    fn from(send: bool) -> Self {
        if send {
            Self::Live
        } else {
            Self::Debug
        }
    }
}

/// Renders and delivers the notification for one cycle
pub struct Notifier<T> {
    settings: EmailSettings,
    template: BodyTemplate,
    transport: T,
    mode: DeliveryMode,
    retry_policy: RetryPolicy,
}

impl<T: MailTransport> Notifier<T> {
    #[must_use]
    pub fn new(
        settings: EmailSettings,
        template: BodyTemplate,
        transport: T,
        mode: DeliveryMode,
    ) -> Self {
        Self {
            settings,
            template,
            transport,
            mode,
            retry_policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Builds the email for the given entries and summary
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Template` if the body fails to render
    pub fn compose(&self, entries: &[MessageTuple], summary: &Summary) -> WorkerResult<EmailMessage> {
        let body = self.template.render(&BodyAttributes {
            recipient: &self.settings.recipient,
            failed_count: entries.len(),
            details: summary.details(),
        })?;

        Ok(EmailMessage {
            from: self.settings.sender.clone(),
            to: self.settings.recipient.clone(),
            cc: self.settings.cc.clone(),
            subject: self.settings.subject.clone(),
            body,
            attachment: summary.attachment().map(Path::to_path_buf),
        })
    }

    /// Composes and delivers the notification
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Template` if the body fails to render,
    /// `WorkerError::Compose` if the transport cannot build the message and
    /// `WorkerError::Delivery` once every attempt has failed
    pub async fn notify(&self, entries: &[MessageTuple], summary: &Summary) -> WorkerResult<()> {
        let email = self.compose(entries, summary)?;

        if self.mode == DeliveryMode::Debug {
            info!("Email is in debug mode. Logging message instead of sending");
            info!("==========================================================");
            info!("\n{email}");
            info!("==========================================================");
            return Ok(());
        }

        info!(
            subject = %email.subject,
            to = %email.to,
            attachment = email.attachment.is_some(),
            "Sending notification email"
        );

        let envelope = self
            .transport
            .prepare(&email)
            .await
            .map_err(WorkerError::Compose)?;

        retry_with_backoff(&self.retry_policy, || self.transport.send(&envelope))
            .await
            .map_err(|source| WorkerError::Delivery {
                attempts: self.retry_policy.max_attempts,
                source,
            })
    }
}
