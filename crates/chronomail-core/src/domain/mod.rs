//! Domain model (ids, schedule records, status state machine, retry policy).
//!
//! Nothing in here knows about storage, timers or SMTP. Records only change
//! through the transition methods on [`ScheduleRecord`].

pub mod email;
pub mod ids;
pub mod record;
pub mod request;
pub mod retry;
pub mod status;

pub use email::{DEFAULT_SUBJECT, OutgoingEmail, Recipient};
pub use ids::{Id, IdMarker, ParseIdError, ScheduleId};
pub use record::{NewSchedule, ScheduleRecord};
pub use request::{ScheduleRequest, SendRequest};
pub use retry::RetryPolicy;
pub use status::ScheduleStatus;
