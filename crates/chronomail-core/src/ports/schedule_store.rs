//! ScheduleStore port - スケジュールの正本（source of truth）
//!
//! # 実装
//! - **InMemoryScheduleStore**: メモリ + JSON スナップショット

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewSchedule, ScheduleId, ScheduleRecord, ScheduleStatus};
use crate::error::StoreError;
use crate::observability::StatusCounts;

/// ScheduleStore holds every schedule record, including terminal ones.
///
/// # Design
/// - The store assigns `id` and `created_at` on insert.
/// - Records are never deleted.
/// - Status changes are atomic with respect to every other write. Cancel runs
///   entirely inside [`ScheduleStore::cancel_if_pending`]; the dispatcher
///   commits through [`ScheduleStore::update_if_status`]. Together they keep
///   a concurrent cancel and dispatch from both taking effect, and a cancel
///   from overwriting attempts recorded meanwhile.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Persist a new pending record.
    async fn insert(&self, schedule: NewSchedule) -> Result<ScheduleRecord, StoreError>;

    async fn get(&self, id: ScheduleId) -> Result<Option<ScheduleRecord>, StoreError>;

    /// Every record, in insertion order.
    async fn list_all(&self) -> Result<Vec<ScheduleRecord>, StoreError>;

    /// Records with `status`, ordered by `scheduled_time` ascending.
    async fn list_by_status(
        &self,
        status: ScheduleStatus,
    ) -> Result<Vec<ScheduleRecord>, StoreError>;

    /// Pending records with `scheduled_time <= as_of` (the due set).
    async fn list_due_pending(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ScheduleRecord>, StoreError>;

    /// Unconditional overwrite of an existing record.
    async fn update(&self, record: &ScheduleRecord) -> Result<(), StoreError>;

    /// Overwrite only if the stored record still has status `expected`.
    ///
    /// Returns `false` (and writes nothing) when the stored status differs.
    /// Fails with [`StoreError::NotFound`] for an unknown id.
    async fn update_if_status(
        &self,
        record: &ScheduleRecord,
        expected: ScheduleStatus,
    ) -> Result<bool, StoreError>;

    /// Cancel the record if it is still pending, reading and writing under
    /// the same lock so no concurrent write in between is lost.
    ///
    /// Returns `false` for an unknown id or a record that already left
    /// `Pending`.
    async fn cancel_if_pending(&self, id: ScheduleId) -> Result<bool, StoreError>;

    /// Number of records per status.
    async fn count_by_status(&self) -> Result<StatusCounts, StoreError> {
        let records = self.list_all().await?;
        Ok(records.iter().map(|r| r.status).collect())
    }
}
