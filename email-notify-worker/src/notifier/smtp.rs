//! SMTP mail transport
//!
//! Wraps lettre's `AsyncSmtpTransport`. The relay's certificate is not
//! verified. Port 465 uses implicit TLS, every other port upgrades with
//! STARTTLS when the relay offers it.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::{DeliveryError, EmailMessage, MailTransport};

const IMPLICIT_TLS_PORT: u16 = 465;
const ATTACHMENT_CONTENT_TYPE: &str = "application/zip";

/// Connection settings for the mail relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Authentication is used only when a password is set
    pub password: Option<String>,
}

/// Sends notifications through an SMTP relay
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// Builds the transport; no connection is made until the first send
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Smtp` if the TLS parameters cannot be built
    pub fn new(settings: &SmtpSettings) -> Result<Self, DeliveryError> {
        let tls_parameters = TlsParameters::builder(settings.host.clone())
            .dangerous_accept_invalid_certs(true)
            .build()?;
        let tls = if settings.port == IMPLICIT_TLS_PORT {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls);

        if let Some(password) = &settings.password {
            info!("Sending email with auth");
            builder = builder.credentials(Credentials::new(settings.user.clone(), password.clone()));
        } else {
            info!("Sending email with no auth");
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse()
        .map_err(|source| DeliveryError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

/// Converts the rendered notification into a MIME message
///
/// # Errors
///
/// Returns `DeliveryError` if an address is invalid, the attachment cannot
/// be read, or the message cannot be assembled
pub async fn build_message(email: &EmailMessage) -> Result<Message, DeliveryError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&email.from)?)
        .to(parse_mailbox(&email.to)?)
        .subject(&email.subject);

    for cc in &email.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }

    let text = SinglePart::builder()
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone());

    let Some(path) = &email.attachment else {
        return Ok(builder.singlepart(text)?);
    };

    let content = tokio::fs::read(path)
        .await
        .map_err(|source| DeliveryError::Attachment {
            path: path.clone(),
            source,
        })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = ContentType::parse(ATTACHMENT_CONTENT_TYPE)
        .map_err(|e| DeliveryError::Transport(e.to_string()))?;
    let attachment = Attachment::new(filename).body(content, content_type);

    Ok(builder.multipart(MultiPart::mixed().singlepart(text).singlepart(attachment))?)
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    type Envelope = Message;

    async fn prepare(&self, email: &EmailMessage) -> Result<Message, DeliveryError> {
        build_message(email).await
    }

    async fn send(&self, message: &Message) -> Result<(), DeliveryError> {
        self.transport.send(message.clone()).await?;

        Ok(())
    }
}
