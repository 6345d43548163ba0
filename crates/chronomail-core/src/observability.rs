use serde::{Deserialize, Serialize};

use crate::domain::ScheduleStatus;

/// Number of schedule records per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub sent: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: ScheduleStatus) {
        match status {
            ScheduleStatus::Pending => self.pending += 1,
            ScheduleStatus::Sent => self.sent += 1,
            ScheduleStatus::Failed => self.failed += 1,
            ScheduleStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn get(&self, status: ScheduleStatus) -> usize {
        match status {
            ScheduleStatus::Pending => self.pending,
            ScheduleStatus::Sent => self.sent,
            ScheduleStatus::Failed => self.failed,
            ScheduleStatus::Cancelled => self.cancelled,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.sent + self.failed + self.cancelled
    }
}

impl FromIterator<ScheduleStatus> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = ScheduleStatus>>(iter: I) -> Self {
        let mut counts = Self::default();
        for status in iter {
            counts.add(status);
        }
        counts
    }
}
