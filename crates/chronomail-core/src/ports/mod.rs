//! Ports - 抽象化レイヤー
//!
//! 外部システム（時計、ID 生成、メール配送、永続化）へのインターフェースです。
//! 実装は `impls` にあります。

pub mod clock;
pub mod id_generator;
pub mod mail_transport;
pub mod schedule_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::mail_transport::MailTransport;
pub use self::schedule_store::ScheduleStore;
