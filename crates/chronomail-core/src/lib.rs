//! chronomail-core
//!
//! Deferred email delivery: schedules are stored as pending records and a
//! periodic dispatcher sends the ones that are due, with bounded retries.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, record, request, email, retry）
//! - **ports**: 抽象化レイヤー（ScheduleStore, MailTransport, Clock, IdGenerator）
//! - **impls**: ports の実装（InMemoryScheduleStore, SmtpMailTransport, LogMailTransport）
//! - **app**: アプリケーション層（AppBuilder, ScheduleService, Dispatcher）
//! - **config**: 設定値と起動時検証
//! - **observability**: ステータス別の件数
//! - **error**: エラー型

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;

#[cfg(test)]
mod testing;
