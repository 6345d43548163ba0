//! ScheduleService - API 層から呼ばれるユースケース
//!
//! Validation happens here, before anything touches the store or the
//! transport. Not-found is reported as `None` / `false`, never as an error.

use std::sync::Arc;

use crate::domain::{
    OutgoingEmail, Recipient, ScheduleId, ScheduleRecord, ScheduleRequest, ScheduleStatus,
    SendRequest,
};
use crate::error::ScheduleError;
use crate::observability::StatusCounts;
use crate::ports::{MailTransport, ScheduleStore};

pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    transport: Arc<dyn MailTransport>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>, transport: Arc<dyn MailTransport>) -> Self {
        Self { store, transport }
    }

    /// Store a new pending schedule.
    ///
    /// A `scheduled_time` in the past is accepted; the record is simply due
    /// on the next dispatch cycle. Callers that require a future time check
    /// it with [`ScheduleRequest::ensure_future`] first.
    #[tracing::instrument(
        skip(self, request),
        fields(recipient = %request.recipient_email, scheduled_time = %request.scheduled_time)
    )]
    pub async fn schedule_email(
        &self,
        request: ScheduleRequest,
    ) -> Result<ScheduleRecord, ScheduleError> {
        let schedule = request.into_new_schedule()?;
        let record = self.store.insert(schedule).await?;
        tracing::info!(id = %record.id, "email scheduled");
        Ok(record)
    }

    /// Every record, in insertion order.
    pub async fn list_all(&self) -> Result<Vec<ScheduleRecord>, ScheduleError> {
        Ok(self.store.list_all().await?)
    }

    /// Pending records, soonest first.
    pub async fn list_pending(&self) -> Result<Vec<ScheduleRecord>, ScheduleError> {
        Ok(self.store.list_by_status(ScheduleStatus::Pending).await?)
    }

    pub async fn get_schedule(
        &self,
        id: ScheduleId,
    ) -> Result<Option<ScheduleRecord>, ScheduleError> {
        Ok(self.store.get(id).await?)
    }

    /// Records addressed to `address`, latest `scheduled_time` first.
    pub async fn list_by_recipient(
        &self,
        address: &str,
    ) -> Result<Vec<ScheduleRecord>, ScheduleError> {
        let address = address.trim();
        let mut records: Vec<_> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|r| r.recipient_address == address)
            .collect();
        records.sort_by(|a, b| b.scheduled_time.cmp(&a.scheduled_time));
        Ok(records)
    }

    pub async fn status_counts(&self) -> Result<StatusCounts, ScheduleError> {
        Ok(self.store.count_by_status().await?)
    }

    /// Cancel a pending schedule.
    ///
    /// Returns `false` when the id is unknown or the record already left
    /// `Pending`, including when a dispatch commits first.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_schedule(&self, id: ScheduleId) -> Result<bool, ScheduleError> {
        let cancelled = self.store.cancel_if_pending(id).await?;
        if cancelled {
            tracing::info!("schedule cancelled");
        } else {
            tracing::debug!("nothing to cancel");
        }
        Ok(cancelled)
    }

    /// Deliver right away through the transport. Nothing is stored.
    #[tracing::instrument(skip(self, request), fields(recipient = %request.receivers_mail))]
    pub async fn send_immediate(&self, request: SendRequest) -> Result<(), ScheduleError> {
        let recipient = Recipient::parse(&request.receivers_mail)?;
        let email = OutgoingEmail::new(
            recipient.as_str(),
            request.subject.as_deref(),
            request.body.as_deref(),
        );
        self.transport.send(&email).await?;
        tracing::info!("email sent");
        Ok(())
    }
}
