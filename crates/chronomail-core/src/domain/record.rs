//! Schedule record: the unit of deferred work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Recipient, RetryPolicy, ScheduleId, ScheduleStatus};
use crate::error::TransitionError;

/// A new schedule, before the store has assigned an id and creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSchedule {
    pub recipient: Recipient,
    pub subject: String,
    pub body: String,
    pub scheduled_time: DateTime<Utc>,
}

/// Persisted schedule.
///
/// Design:
/// - This is the single source of truth for a schedule's lifecycle.
/// - All state transitions happen through the methods below, which keep
///   `sent_time` set iff the status is `Sent`, and `retry_count` monotonic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub id: ScheduleId,
    pub recipient_address: String,
    pub subject: String,
    pub body: String,
    pub scheduled_time: DateTime<Utc>,
    pub sent_time: Option<DateTime<Utc>>,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub retry_count: u32,

    /// Message of the most recent failed attempt, kept for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ScheduleRecord {
    /// Materialize a pending record. Called by the store at insert time.
    pub fn new(id: ScheduleId, schedule: NewSchedule, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            recipient_address: schedule.recipient.into(),
            subject: schedule.subject,
            body: schedule.body,
            scheduled_time: schedule.scheduled_time,
            sent_time: None,
            status: ScheduleStatus::Pending,
            created_at,
            retry_count: 0,
            last_error: None,
        }
    }

    /// Pending and its time has come.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ScheduleStatus::Pending && self.scheduled_time <= now
    }

    fn ensure_transition(&self, to: ScheduleStatus) -> Result<(), TransitionError> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(TransitionError {
                from: self.status,
                to,
            })
        }
    }

    /// Pending -> Cancelled.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.ensure_transition(ScheduleStatus::Cancelled)?;
        self.status = ScheduleStatus::Cancelled;
        Ok(())
    }

    /// Pending -> Sent. `retry_count` is left as is.
    pub fn mark_sent(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure_transition(ScheduleStatus::Sent)?;
        self.status = ScheduleStatus::Sent;
        self.sent_time = Some(at);
        Ok(())
    }

    /// Count one failed attempt. Returns the resulting status: `Failed` once
    /// the ceiling is reached, otherwise still `Pending`.
    pub fn record_failure(
        &mut self,
        error: impl Into<String>,
        policy: &RetryPolicy,
    ) -> Result<ScheduleStatus, TransitionError> {
        self.ensure_transition(ScheduleStatus::Failed)?;
        self.retry_count += 1;
        self.last_error = Some(error.into());
        if policy.is_exhausted(self.retry_count) {
            self.status = ScheduleStatus::Failed;
        }
        Ok(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use ulid::Ulid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn pending(scheduled_time: DateTime<Utc>) -> ScheduleRecord {
        let schedule = NewSchedule {
            recipient: Recipient::parse("alice@example.com").unwrap(),
            subject: "hi".to_string(),
            body: "body".to_string(),
            scheduled_time,
        };
        ScheduleRecord::new(ScheduleId::from_ulid(Ulid::new()), schedule, t0())
    }

    #[test]
    fn new_record_starts_pending() {
        let r = pending(t0() + Duration::hours(1));
        assert_eq!(r.status, ScheduleStatus::Pending);
        assert_eq!(r.retry_count, 0);
        assert_eq!(r.sent_time, None);
        assert_eq!(r.created_at, t0());
        assert_eq!(r.recipient_address, "alice@example.com");
    }

    #[rstest]
    #[case::past(-1, true)]
    #[case::exactly_now(0, true)]
    #[case::future(1, false)]
    fn due_when_scheduled_time_has_passed(#[case] offset_secs: i64, #[case] due: bool) {
        let r = pending(t0() + Duration::seconds(offset_secs));
        assert_eq!(r.is_due(t0()), due);
    }

    #[test]
    fn terminal_record_is_never_due() {
        let mut r = pending(t0() - Duration::hours(1));
        r.cancel().unwrap();
        assert!(!r.is_due(t0()));
    }

    #[test]
    fn cancel_twice_is_illegal() {
        let mut r = pending(t0());
        r.cancel().unwrap();
        let err = r.cancel().unwrap_err();
        assert_eq!(err.from, ScheduleStatus::Cancelled);
        assert_eq!(r.status, ScheduleStatus::Cancelled);
    }

    #[test]
    fn mark_sent_sets_sent_time_and_keeps_retry_count() {
        let mut r = pending(t0());
        let policy = RetryPolicy::default();
        r.record_failure("boom", &policy).unwrap();
        r.record_failure("boom", &policy).unwrap();

        let done = t0() + Duration::minutes(3);
        r.mark_sent(done).unwrap();

        assert_eq!(r.status, ScheduleStatus::Sent);
        assert_eq!(r.sent_time, Some(done));
        assert_eq!(r.retry_count, 2);
    }

    #[test]
    fn failures_reach_ceiling() {
        let mut r = pending(t0());
        let policy = RetryPolicy::default();

        assert_eq!(r.record_failure("e1", &policy), Ok(ScheduleStatus::Pending));
        assert_eq!(r.record_failure("e2", &policy), Ok(ScheduleStatus::Pending));
        assert_eq!(r.record_failure("e3", &policy), Ok(ScheduleStatus::Failed));
        assert_eq!(r.retry_count, 3);
        assert_eq!(r.last_error.as_deref(), Some("e3"));
        assert_eq!(r.sent_time, None);

        // Terminal: neither another failure nor a success is accepted.
        assert!(r.record_failure("e4", &policy).is_err());
        assert!(r.mark_sent(t0()).is_err());
        assert_eq!(r.retry_count, 3);
    }

    #[test]
    fn cancelled_record_cannot_be_sent() {
        let mut r = pending(t0());
        r.cancel().unwrap();
        assert!(r.mark_sent(t0()).is_err());
        assert_eq!(r.sent_time, None);
    }

    #[test]
    fn json_shape_is_camel_case() {
        let r = pending(t0());
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["recipientAddress"], "alice@example.com");
        assert_eq!(v["status"], "PENDING");
        assert_eq!(v["retryCount"], 0);
        assert!(v["sentTime"].is_null());
        assert!(v.get("lastError").is_none());
    }
}
