use thiserror::Error;

use crate::domain::{ScheduleId, ScheduleStatus};

/// Input rejected before anything is stored or sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("recipient email cannot be empty")]
    MissingRecipient,

    #[error("invalid recipient email `{address}`: {reason}")]
    InvalidRecipient { address: String, reason: String },

    #[error("scheduled time must be in the future")]
    ScheduledTimeNotInFuture,
}

/// A delivery attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The message could not be built (bad address, header, ...).
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The transport accepted the message but delivery failed.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// The transport itself could not be configured.
    #[error("transport setup failed: {0}")]
    Setup(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("schedule not found: {0}")]
    NotFound(ScheduleId),

    #[error("snapshot contains schedule {0} more than once")]
    DuplicateId(ScheduleId),

    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Attempted to move a record along an edge the state machine does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal transition {from} -> {to}")]
pub struct TransitionError {
    pub from: ScheduleStatus,
    pub to: ScheduleStatus,
}

/// Errors surfaced by the schedule service to its callers.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
