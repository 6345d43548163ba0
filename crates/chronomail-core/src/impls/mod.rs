//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryScheduleStore**: スケジュールの正本（任意で JSON スナップショットに永続化）
//! - **SmtpMailTransport**: lettre による SMTP 送信
//! - **LogMailTransport**: 送信内容をログに出すだけの開発用トランスポート

pub mod log_transport;
pub mod memory_store;
pub mod smtp;

pub use self::log_transport::LogMailTransport;
pub use self::memory_store::InMemoryScheduleStore;
pub use self::smtp::SmtpMailTransport;
