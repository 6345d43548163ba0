//! In-memory schedule store with an optional JSON snapshot.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{NewSchedule, ScheduleId, ScheduleRecord, ScheduleStatus};
use crate::error::StoreError;
use crate::observability::StatusCounts;
use crate::ports::{Clock, IdGenerator, ScheduleStore, UlidGenerator};

const SNAPSHOT_VERSION: u32 = 1;

/// Index entry for pending records.
///
/// Field order matters: the derived `Ord` sorts by due time first, with the
/// id as a tie-breaker so equal times don't collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct DueKey {
    scheduled_time: DateTime<Utc>,
    id: ScheduleId,
}

impl DueKey {
    fn of(record: &ScheduleRecord) -> Self {
        Self {
            scheduled_time: record.scheduled_time,
            id: record.id,
        }
    }
}

/// On-disk layout. Records are kept in insertion order.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    records: Vec<ScheduleRecord>,
}

/// In-memory store state.
#[derive(Default)]
struct StoreState {
    /// All records (single source of truth).
    records: HashMap<ScheduleId, ScheduleRecord>,

    /// Insertion order.
    order: Vec<ScheduleId>,

    /// Pending records by due time.
    pending: BTreeSet<DueKey>,
}

impl StoreState {
    fn from_records(records: Vec<ScheduleRecord>) -> Result<Self, StoreError> {
        let mut state = Self::default();
        for record in records {
            if state.records.contains_key(&record.id) {
                return Err(StoreError::DuplicateId(record.id));
            }
            state.push(record);
        }
        Ok(state)
    }

    fn push(&mut self, record: ScheduleRecord) {
        if record.status == ScheduleStatus::Pending {
            self.pending.insert(DueKey::of(&record));
        }
        self.order.push(record.id);
        self.records.insert(record.id, record);
    }

    /// Undo the most recent `push`.
    fn pop(&mut self) {
        let Some(id) = self.order.pop() else {
            return;
        };
        if let Some(record) = self.records.remove(&id) {
            self.pending.remove(&DueKey::of(&record));
        }
    }

    /// Swap in a new version of an existing record, keeping the index in
    /// sync. Returns the previous version.
    fn replace(&mut self, record: ScheduleRecord) -> Option<ScheduleRecord> {
        let slot = self.records.get_mut(&record.id)?;
        let old = std::mem::replace(slot, record);
        self.pending.remove(&DueKey::of(&old));
        let new = &self.records[&old.id];
        if new.status == ScheduleStatus::Pending {
            self.pending.insert(DueKey::of(new));
        }
        Some(old)
    }

    fn ordered(&self) -> Vec<ScheduleRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .cloned()
            .collect()
    }

    fn pending_until(&self, as_of: Option<DateTime<Utc>>) -> Vec<ScheduleRecord> {
        self.pending
            .iter()
            .take_while(|key| as_of.is_none_or(|t| key.scheduled_time <= t))
            .filter_map(|key| self.records.get(&key.id))
            .cloned()
            .collect()
    }
}

/// In-memory [`ScheduleStore`].
///
/// Design:
/// - One async mutex guards all state, so every operation (including the
///   conditional update) is atomic with respect to the others.
/// - When opened with a snapshot path, every mutation rewrites the snapshot
///   before the lock is released. A failed write rolls the mutation back, so
///   memory never runs ahead of disk.
pub struct InMemoryScheduleStore {
    state: Mutex<StoreState>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryScheduleStore {
    /// Memory-only store.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let ids = Arc::new(UlidGenerator::new(Arc::clone(&clock)));
        Self::with_id_generator(clock, ids)
    }

    pub fn with_id_generator(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            ids,
            clock,
            snapshot_path: None,
        }
    }

    /// Store backed by a snapshot file. Loads existing records if the file
    /// exists; it is created on the first write otherwise.
    pub async fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Snapshot>(&bytes)?.records,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), count = records.len(), "loaded schedule snapshot");

        let mut store = Self::new(clock);
        store.state = Mutex::new(StoreState::from_records(records)?);
        store.snapshot_path = Some(path);
        Ok(store)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Write the whole state to the snapshot file (temp file + rename).
    async fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            records: state.ordered(),
        };
        let json = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Apply `record` as a replacement and persist, restoring the previous
    /// version if the snapshot write fails.
    async fn commit_replace(
        &self,
        state: &mut StoreState,
        record: &ScheduleRecord,
    ) -> Result<(), StoreError> {
        let old = state
            .replace(record.clone())
            .ok_or(StoreError::NotFound(record.id))?;
        if let Err(e) = self.persist(state).await {
            state.replace(old);
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn insert(&self, schedule: NewSchedule) -> Result<ScheduleRecord, StoreError> {
        let mut state = self.state.lock().await;

        // Ids are never reused, even across a reload.
        let id = loop {
            let candidate = self.ids.generate_schedule_id();
            if !state.records.contains_key(&candidate) {
                break candidate;
            }
        };
        let record = ScheduleRecord::new(id, schedule, self.clock.now());

        state.push(record.clone());
        if let Err(e) = self.persist(&state).await {
            state.pop();
            return Err(e);
        }

        tracing::debug!(id = %record.id, scheduled_time = %record.scheduled_time, "schedule stored");
        Ok(record)
    }

    async fn get(&self, id: ScheduleId) -> Result<Option<ScheduleRecord>, StoreError> {
        Ok(self.state.lock().await.records.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ScheduleRecord>, StoreError> {
        Ok(self.state.lock().await.ordered())
    }

    async fn list_by_status(
        &self,
        status: ScheduleStatus,
    ) -> Result<Vec<ScheduleRecord>, StoreError> {
        let state = self.state.lock().await;
        if status == ScheduleStatus::Pending {
            return Ok(state.pending_until(None));
        }
        let mut records: Vec<_> = state
            .ordered()
            .into_iter()
            .filter(|r| r.status == status)
            .collect();
        records.sort_by_key(|r| r.scheduled_time);
        Ok(records)
    }

    async fn list_due_pending(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ScheduleRecord>, StoreError> {
        Ok(self.state.lock().await.pending_until(Some(as_of)))
    }

    async fn update(&self, record: &ScheduleRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        self.commit_replace(&mut state, record).await
    }

    async fn update_if_status(
        &self,
        record: &ScheduleRecord,
        expected: ScheduleStatus,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let current = state
            .records
            .get(&record.id)
            .map(|r| r.status)
            .ok_or(StoreError::NotFound(record.id))?;
        if current != expected {
            return Ok(false);
        }
        self.commit_replace(&mut state, record).await?;
        Ok(true)
    }

    async fn cancel_if_pending(&self, id: ScheduleId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(mut record) = state.records.get(&id).cloned() else {
            return Ok(false);
        };
        if record.cancel().is_err() {
            return Ok(false);
        }
        self.commit_replace(&mut state, &record).await?;
        Ok(true)
    }

    async fn count_by_status(&self) -> Result<StatusCounts, StoreError> {
        let state = self.state.lock().await;
        Ok(state.records.values().map(|r| r.status).collect())
    }
}
