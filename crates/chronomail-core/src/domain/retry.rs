//! Retry policy: decides when a failing schedule is given up on.

use serde::{Deserialize, Serialize};

/// Bounded-retry policy for scheduled deliveries.
///
/// There is no backoff: a failed record stays pending and is reconsidered on
/// the next dispatch cycle. The only judgment is "how many failures are too
/// many".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Number of failed attempts after which the record is marked failed.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// A ceiling of zero would fail records that were never attempted, so it
    /// is clamped to one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Has `retry_count` failures reached the ceiling?
    pub fn is_exhausted(&self, retry_count: u32) -> bool {
        retry_count >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}
