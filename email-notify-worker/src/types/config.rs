//! Service configuration loaded from flags and environment variables

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use lettre::message::Mailbox;
use queue::MAX_BATCH_SIZE;
use thiserror::Error;
use tracing::info;

use crate::notifier::smtp::SmtpSettings;
use crate::notifier::{BodyTemplate, DeliveryMode, EmailSettings};
use crate::summary::SummaryBuilder;
use crate::worker::config::DrainSettings;

const REDACTED: &str = "********";

/// Configuration errors detected at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Parse(#[from] clap::Error),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} is not a valid mailbox '{address}': {source}")]
    InvalidAddress {
        field: &'static str,
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Email template does not parse: {0}")]
    Template(#[source] tera::Error),

    #[error("Attachment name must be a bare file name, got '{0}'")]
    AttachmentName(String),
}

/// Every setting of the worker; each flag can also be given through its
/// environment variable
#[derive(Parser, Debug, Clone)]
#[command(name = "email-notify-worker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drains an SQS queue and emails a summary of the messages it held")]
#[command(args_override_self = true)]
pub struct ServiceConfig {
    /// Name of the queue to drain
    #[arg(long, env = "SQS_EMAIL_NOTIFY_IN_QUEUE")]
    pub in_queue: String,

    /// Bucket holding oversized message payloads
    #[arg(long, env = "SQS_MESSAGE_BUCKET")]
    pub message_bucket: String,

    /// Long poll wait and queue call timeout, in seconds
    #[arg(long, env = "SQS_EMAIL_NOTIFY_QUEUE_POLL_TIMEOUT")]
    pub queue_poll_timeout: u64,

    /// Delete messages once they have been read
    #[arg(
        long,
        env = "SQS_EMAIL_NOTIFY_PURGE_MESSAGES",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        required = true
    )]
    pub purge_messages: bool,

    /// Pause between cycles, in minutes
    #[arg(long, env = "SQS_EMAIL_NOTIFY_WAIT_TIME")]
    pub wait_time: u64,

    /// Scratch directory for the summary attachment
    #[arg(long, env = "SQS_EMAIL_NOTIFY_TMP_DIR", default_value = "/tmp")]
    pub tmp_dir: PathBuf,

    #[arg(long, env = "SQS_EMAIL_NOTIFY_SMTP_HOST")]
    pub smtp_host: String,

    #[arg(long, env = "SQS_EMAIL_NOTIFY_SMTP_PORT")]
    pub smtp_port: u16,

    #[arg(long, env = "SQS_EMAIL_NOTIFY_SMTP_USER")]
    pub smtp_user: Option<String>,

    /// SMTP authentication is only attempted when this is set
    #[arg(long, env = "SQS_EMAIL_NOTIFY_SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    #[arg(long, env = "SQS_EMAIL_NOTIFY_EMAIL_SENDER")]
    pub email_sender: String,

    #[arg(long, env = "SQS_EMAIL_NOTIFY_EMAIL_RECIPIENT")]
    pub email_recipient: String,

    /// Comma separated list of CC addresses
    #[arg(long, env = "SQS_EMAIL_NOTIFY_EMAIL_CC", value_delimiter = ',')]
    pub email_cc: Vec<String>,

    #[arg(long, env = "SQS_EMAIL_NOTIFY_EMAIL_SUBJECT")]
    pub email_subject: String,

    /// Body template, in tera syntax
    #[arg(long, env = "SQS_EMAIL_NOTIFY_EMAIL_TEMPLATE")]
    pub email_template: String,

    /// Largest number of identifiers listed in the body before switching to
    /// an attachment
    #[arg(long, env = "SQS_EMAIL_NOTIFY_EMAIL_ID_LIMIT")]
    pub email_id_limit: usize,

    #[arg(long, env = "SQS_EMAIL_NOTIFY_EMAIL_ATTACH_NAME")]
    pub email_attach_name: String,

    /// Send emails (true) or only log them (false)
    #[arg(
        long,
        env = "SQS_EMAIL_NOTIFY_EMAIL_SEND",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        required = true
    )]
    pub email_send: bool,
}

impl ServiceConfig {
    /// Parses flags and environment variables, then validates the result
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is missing, malformed or invalid
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::try_parse()?;
        config.validate()?;

        Ok(config)
    }

    /// Checks values clap cannot check on its own
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("SQS_EMAIL_NOTIFY_IN_QUEUE", &self.in_queue),
            ("SQS_MESSAGE_BUCKET", &self.message_bucket),
            ("SQS_EMAIL_NOTIFY_SMTP_HOST", &self.smtp_host),
            ("SQS_EMAIL_NOTIFY_EMAIL_SUBJECT", &self.email_subject),
            ("SQS_EMAIL_NOTIFY_EMAIL_TEMPLATE", &self.email_template),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(field));
            }
        }

        if self.queue_poll_timeout == 0 {
            return Err(ConfigError::Zero("SQS_EMAIL_NOTIFY_QUEUE_POLL_TIMEOUT"));
        }
        if self.smtp_port == 0 {
            return Err(ConfigError::Zero("SQS_EMAIL_NOTIFY_SMTP_PORT"));
        }

        validate_mailbox("SQS_EMAIL_NOTIFY_EMAIL_SENDER", &self.email_sender)?;
        validate_mailbox("SQS_EMAIL_NOTIFY_EMAIL_RECIPIENT", &self.email_recipient)?;
        for cc in self.cc_addresses() {
            validate_mailbox("SQS_EMAIL_NOTIFY_EMAIL_CC", cc)?;
        }

        let name = self.email_attach_name.trim();
        if name.is_empty() || Path::new(name).file_name() != Some(OsStr::new(name)) {
            return Err(ConfigError::AttachmentName(self.email_attach_name.clone()));
        }

        self.body_template()?;

        Ok(())
    }

    /// Parses the configured body template
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Template` if the template does not parse
    pub fn body_template(&self) -> Result<BodyTemplate, ConfigError> {
        BodyTemplate::parse(&self.email_template).map_err(ConfigError::Template)
    }

    /// CC addresses with blanks dropped, so an empty variable means no CC
    fn cc_addresses(&self) -> impl Iterator<Item = &str> {
        self.email_cc
            .iter()
            .map(|cc| cc.trim())
            .filter(|cc| !cc.is_empty())
    }

    /// The SMTP password, treating an empty value as unset
    fn smtp_password(&self) -> Option<&str> {
        self.smtp_password.as_deref().filter(|p| !p.is_empty())
    }

    /// What the startup log shows for the SMTP password
    fn redacted_password(&self) -> &'static str {
        if self.smtp_password().is_some() {
            REDACTED
        } else {
            ""
        }
    }

    /// Logs every setting, with the SMTP password redacted
    pub fn log_summary(&self) {
        info!("Configuration:");
        info!("  SQS_EMAIL_NOTIFY_IN_QUEUE: {}", self.in_queue);
        info!("  SQS_MESSAGE_BUCKET: {}", self.message_bucket);
        info!("  SQS_EMAIL_NOTIFY_QUEUE_POLL_TIMEOUT: {}s", self.queue_poll_timeout);
        info!("  SQS_EMAIL_NOTIFY_PURGE_MESSAGES: {}", self.purge_messages);
        info!("  SQS_EMAIL_NOTIFY_WAIT_TIME: {}m", self.wait_time);
        info!("  SQS_EMAIL_NOTIFY_TMP_DIR: {}", self.tmp_dir.display());
        info!("  SQS_EMAIL_NOTIFY_SMTP_HOST: {}", self.smtp_host);
        info!("  SQS_EMAIL_NOTIFY_SMTP_PORT: {}", self.smtp_port);
        info!(
            "  SQS_EMAIL_NOTIFY_SMTP_USER: {}",
            self.smtp_user.as_deref().unwrap_or_default()
        );
        info!("  SQS_EMAIL_NOTIFY_SMTP_PASSWORD: {}", self.redacted_password());
        info!("  SQS_EMAIL_NOTIFY_EMAIL_SENDER: {}", self.email_sender);
        info!("  SQS_EMAIL_NOTIFY_EMAIL_RECIPIENT: {}", self.email_recipient);
        info!(
            "  SQS_EMAIL_NOTIFY_EMAIL_CC: {}",
            self.cc_addresses().collect::<Vec<_>>().join(",")
        );
        info!("  SQS_EMAIL_NOTIFY_EMAIL_SUBJECT: {}", self.email_subject);
        info!("  SQS_EMAIL_NOTIFY_EMAIL_TEMPLATE: {}", self.email_template);
        info!("  SQS_EMAIL_NOTIFY_EMAIL_ID_LIMIT: {}", self.email_id_limit);
        info!("  SQS_EMAIL_NOTIFY_EMAIL_ATTACH_NAME: {}", self.email_attach_name);
        info!("  SQS_EMAIL_NOTIFY_EMAIL_SEND: {}", self.email_send);
    }

    #[must_use]
    pub fn email_settings(&self) -> EmailSettings {
        EmailSettings {
            sender: self.email_sender.trim().to_string(),
            recipient: self.email_recipient.trim().to_string(),
            cc: self.cc_addresses().map(str::to_string).collect(),
            subject: self.email_subject.clone(),
        }
    }

    #[must_use]
    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            user: self.smtp_user.clone().unwrap_or_default(),
            password: self.smtp_password().map(str::to_string),
        }
    }

    #[must_use]
    pub fn summary_builder(&self) -> SummaryBuilder {
        SummaryBuilder::new(
            self.email_id_limit,
            &self.tmp_dir,
            self.email_attach_name.trim(),
        )
    }

    #[must_use]
    pub fn drain_settings(&self) -> DrainSettings {
        DrainSettings {
            queue_name: self.in_queue.clone(),
            poll_timeout: self.poll_timeout(),
            purge: self.purge_messages,
            idle_wait: Duration::from_secs(self.wait_time.saturating_mul(60)),
            batch_size: MAX_BATCH_SIZE,
        }
    }

    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_poll_timeout)
    }

    #[must_use]
    pub fn delivery_mode(&self) -> DeliveryMode {
        DeliveryMode::from(self.email_send)
    }
}

fn validate_mailbox(field: &'static str, address: &str) -> Result<(), ConfigError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map(|_| ())
        .map_err(|source| ConfigError::InvalidAddress {
            field,
            address: address.to_string(),
            source,
        })
}
