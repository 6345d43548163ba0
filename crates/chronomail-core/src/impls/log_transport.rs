use async_trait::async_trait;

use crate::domain::OutgoingEmail;
use crate::error::TransportError;
use crate::ports::MailTransport;

/// Transport that only logs what it would send. Used for local runs
/// without an SMTP relay.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
        tracing::info!(
            to = %email.to(),
            subject = %email.subject(),
            body_len = email.body().len(),
            "email delivered (log transport)"
        );
        Ok(())
    }
}
