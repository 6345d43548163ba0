//! SMTP mail transport (lettre, tokio executor, pooled connections).

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{SmtpConfig, TlsMode};
use crate::domain::OutgoingEmail;
use crate::error::TransportError;
use crate::ports::MailTransport;

pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, TransportError> {
        let from = config
            .from_mailbox()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        let setup = |e: lettre::transport::smtp::Error| TransportError::Setup(e.to_string());
        let mut builder = match config.tls {
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            TlsMode::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(setup)?
            }
            TlsMode::Wrapper => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host).map_err(setup)?
            }
        };
        builder = builder
            .port(config.port)
            .timeout(Some(config.timeout()));
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            tls = ?config.tls,
            "smtp transport configured"
        );
        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

/// Plain-text message from `from` to the email's recipient.
pub fn build_message(from: &Mailbox, email: &OutgoingEmail) -> Result<Message, TransportError> {
    let to: Mailbox = email
        .to()
        .parse()
        .map_err(|e| TransportError::InvalidMessage(format!("recipient `{}`: {e}", email.to())))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(email.subject())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body().to_string())
        .map_err(|e| TransportError::InvalidMessage(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
        let message = build_message(&self.from, email)?;
        let response = self
            .mailer
            .send(message)
            .await
            .map_err(|e| TransportError::Delivery(e.to_string()))?;
        tracing::debug!(to = %email.to(), code = %response.code(), "smtp accepted message");
        Ok(())
    }
}
