//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use ulid::Ulid;

use crate::domain::ScheduleId;
use crate::ports::Clock;

/// IdGenerator produces identifiers usable across processes.
///
/// # Thread Safety
/// - `Send + Sync` (shared by the store across tasks)
pub trait IdGenerator: Send + Sync {
    fn generate_schedule_id(&self) -> ScheduleId;
}

/// ULID generator whose timestamp part comes from a [`Clock`].
///
/// With a `FixedClock` the timestamp is deterministic; the random part still
/// keeps ids distinct.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_schedule_id(&self) -> ScheduleId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        ScheduleId::from(ulid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_schedule_id();
        let id2 = id_gen.generate_schedule_id();
        let id3 = id_gen.generate_schedule_id();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn ulid_generator_with_fixed_clock_shares_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.generate_schedule_id();
        let id2 = id_gen.generate_schedule_id();

        assert_ne!(id1, id2);
        assert_eq!(id1.as_ulid().timestamp_ms(), fixed_time.timestamp_millis() as u64);
        assert_eq!(id2.as_ulid().timestamp_ms(), fixed_time.timestamp_millis() as u64);
        assert!(id1.to_string().starts_with("sched-"));
    }
}
