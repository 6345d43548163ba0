//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::domain::{NewSchedule, OutgoingEmail, ScheduleId, ScheduleRecord, ScheduleStatus};
use crate::error::{StoreError, TransportError};
use crate::ports::{MailTransport, ScheduleStore};

/// Transport that replays a scripted list of results (then succeeds) and
/// remembers every email it was asked to send.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<(), TransportError>>>,
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Result<(), TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call.
    pub fn failing(times: usize) -> Self {
        Self::new((0..times).map(|i| Err(TransportError::Delivery(format!("attempt {i} refused")))))
    }

    pub fn attempts(&self) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Transport that parks every send until the test releases it.
#[derive(Default)]
pub struct GatedTransport {
    entered: Notify,
    release: Notify,
}

impl GatedTransport {
    /// Wait until a send is parked in the transport.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let one parked (or the next) send complete successfully.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl MailTransport for GatedTransport {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), TransportError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

/// Store wrapper that holds every cancel at the store's door until the test
/// opens it; all other calls go straight through.
pub struct GatedCancelStore<S> {
    inner: Arc<S>,
    arrived: Notify,
    open: Notify,
}

impl<S> GatedCancelStore<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            arrived: Notify::new(),
            open: Notify::new(),
        }
    }

    /// Wait until a cancel is parked.
    pub async fn cancel_arrived(&self) {
        self.arrived.notified().await;
    }

    /// Let one parked (or the next) cancel through.
    pub fn open(&self) {
        self.open.notify_one();
    }
}

#[async_trait]
impl<S: ScheduleStore> ScheduleStore for GatedCancelStore<S> {
    async fn insert(&self, schedule: NewSchedule) -> Result<ScheduleRecord, StoreError> {
        self.inner.insert(schedule).await
    }

    async fn get(&self, id: ScheduleId) -> Result<Option<ScheduleRecord>, StoreError> {
        self.inner.get(id).await
    }

    async fn list_all(&self) -> Result<Vec<ScheduleRecord>, StoreError> {
        self.inner.list_all().await
    }

    async fn list_by_status(
        &self,
        status: ScheduleStatus,
    ) -> Result<Vec<ScheduleRecord>, StoreError> {
        self.inner.list_by_status(status).await
    }

    async fn list_due_pending(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ScheduleRecord>, StoreError> {
        self.inner.list_due_pending(as_of).await
    }

    async fn update(&self, record: &ScheduleRecord) -> Result<(), StoreError> {
        self.inner.update(record).await
    }

    async fn update_if_status(
        &self,
        record: &ScheduleRecord,
        expected: ScheduleStatus,
    ) -> Result<bool, StoreError> {
        self.inner.update_if_status(record, expected).await
    }

    async fn cancel_if_pending(&self, id: ScheduleId) -> Result<bool, StoreError> {
        self.arrived.notify_one();
        self.open.notified().await;
        self.inner.cancel_if_pending(id).await
    }
}
