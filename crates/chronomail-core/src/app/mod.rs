//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: 設定の検証とワイヤリング
//! - **ScheduleService**: 予約・一覧・キャンセル・即時送信
//! - **Dispatcher**: 期限の来た予約を定期送信するループ

pub mod builder;
pub mod dispatcher;
pub mod service;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::dispatcher::{CycleReport, Dispatcher, DispatcherHandle};
pub use self::service::ScheduleService;
