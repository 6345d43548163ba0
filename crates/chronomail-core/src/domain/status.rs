//! Schedule status state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a schedule record.
///
/// State transitions:
/// - Pending -> Sent       (delivery succeeded)
/// - Pending -> Failed     (retry ceiling reached)
/// - Pending -> Cancelled  (explicit cancel)
///
/// Sent, Failed and Cancelled are terminal; nothing leaves them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    /// Waiting for its scheduled time (or for another attempt).
    #[default]
    Pending,

    /// Delivered.
    Sent,

    /// Gave up after the retry ceiling.
    Failed,

    /// Cancelled before delivery.
    Cancelled,
}

impl ScheduleStatus {
    pub const ALL: [ScheduleStatus; 4] = [
        ScheduleStatus::Pending,
        ScheduleStatus::Sent,
        ScheduleStatus::Failed,
        ScheduleStatus::Cancelled,
    ];

    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        !matches!(self, ScheduleStatus::Pending)
    }

    /// Is `self -> next` a legal transition?
    pub fn can_transition_to(self, next: ScheduleStatus) -> bool {
        matches!(
            (self, next),
            (
                ScheduleStatus::Pending,
                ScheduleStatus::Sent | ScheduleStatus::Failed | ScheduleStatus::Cancelled
            )
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "PENDING",
            ScheduleStatus::Sent => "SENT",
            ScheduleStatus::Failed => "FAILED",
            ScheduleStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
