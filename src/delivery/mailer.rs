use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;
use crate::Result;

/// A file attached to an outbound message
#[derive(Debug, Clone, PartialEq)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Everything needed to send one delivery message
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub to: Address,
    pub subject: String,
    pub body: String,
    pub attachment: MailAttachment,
}

/// Trait for handing a message to a mail relay
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Transmit `message`; no retries
    async fn send(&self, message: OutboundMessage) -> Result<()>;
}

/// SMTP relay with STARTTLS and username/password login
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a transport for `mail.smtp_host`; the username doubles as the sender address
    pub fn new(mail: &MailConfig, username: &str, password: &str) -> Result<Self> {
        let from: Address = username
            .trim()
            .parse()
            .context("MAIL_USERNAME must be a valid email address")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&mail.smtp_host)
            .with_context(|| format!("Failed to configure SMTP relay {}", mail.smtp_host))?
            .port(mail.smtp_port)
            .credentials(Credentials::new(username.trim().to_string(), password.to_string()))
            .build();

        Ok(Self {
            transport,
            from: Mailbox::new(None, from),
        })
    }
}

/// Convert an outbound message into a MIME message with one attachment
pub fn build_message(from: &Mailbox, message: OutboundMessage) -> Result<Message> {
    let content_type = ContentType::parse(&message.attachment.content_type)
        .map_err(|e| anyhow::anyhow!("Invalid attachment content type: {:?}", e))?;

    let attachment = Attachment::new(message.attachment.filename)
        .body(message.attachment.data, content_type);

    let email = Message::builder()
        .from(from.clone())
        .to(Mailbox::new(None, message.to))
        .subject(message.subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(message.body))
                .singlepart(attachment),
        )
        .context("Failed to build email message")?;

    Ok(email)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        let recipient = message.to.to_string();
        let email = build_message(&self.from, message)?;

        tracing::info!("Sending mashup to {}", recipient);
        self.transport
            .send(email)
            .await
            .context("SMTP transmission failed")?;

        Ok(())
    }
}
