//! Caller-facing requests accepted by the schedule service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NewSchedule, Recipient};
use crate::error::ValidationError;

/// Request to deliver an email at `scheduled_time`.
///
/// The recipient is kept raw so that validation errors are reported by the
/// service rather than by whatever decoded the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub recipient_email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub scheduled_time: DateTime<Utc>,
}

impl ScheduleRequest {
    pub fn new(
        recipient_email: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        scheduled_time: DateTime<Utc>,
    ) -> Self {
        Self {
            recipient_email: recipient_email.into(),
            subject: Some(subject.into()),
            body: Some(body.into()),
            scheduled_time,
        }
    }

    /// Boundary rule: a new schedule must lie strictly after `now`.
    ///
    /// The service itself accepts past times (they are simply due on the next
    /// cycle); API layers call this before handing the request over.
    pub fn ensure_future(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.scheduled_time > now {
            Ok(())
        } else {
            Err(ValidationError::ScheduledTimeNotInFuture)
        }
    }

    pub(crate) fn into_new_schedule(self) -> Result<NewSchedule, ValidationError> {
        Ok(NewSchedule {
            recipient: Recipient::parse(&self.recipient_email)?,
            subject: self.subject.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            scheduled_time: self.scheduled_time,
        })
    }
}

/// Request to deliver an email right away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub receivers_mail: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}
