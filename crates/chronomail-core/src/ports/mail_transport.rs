//! MailTransport port - メール配送の抽象化
//!
//! # 実装
//! - **SmtpMailTransport**: lettre による SMTP 配送（本番用）
//! - **LogMailTransport**: ログに出すだけ（開発用）

use async_trait::async_trait;

use crate::domain::OutgoingEmail;
use crate::error::TransportError;

/// MailTransport attempts one delivery and reports the outcome.
///
/// # Contract
/// - `email.to()` is passed through unchanged; callers validate it beforehand.
/// - A returned error means "not delivered". Retrying is the caller's business.
/// - No timeout is imposed from outside; implementations bring their own.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError>;
}
