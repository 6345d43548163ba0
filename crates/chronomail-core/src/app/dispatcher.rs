//! Dispatcher - 期限の来たスケジュールを定期的に送信する
//!
//! Design:
//! - One cycle = read the due set, then deliver each record independently.
//! - Each record is re-read before sending and committed with
//!   `update_if_status(.., Pending)`, so a cancel that lands first always
//!   wins and the dispatch outcome is discarded.
//! - Cycles never overlap: `run_cycle` holds `cycle_lock` for its whole
//!   duration, whether it was called by the timer loop or directly.
//! - Shutdown only stops new cycles. A cycle in flight (and the transport
//!   call inside it) runs to completion.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{StreamExt, stream};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::DispatcherConfig;
use crate::domain::{OutgoingEmail, RetryPolicy, ScheduleId, ScheduleStatus};
use crate::error::StoreError;
use crate::ports::{Clock, MailTransport, ScheduleStore};

/// Summary of one dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Size of the due set at the start of the cycle.
    pub due: usize,
    pub sent: usize,
    /// Failed attempts that stay pending for another try.
    pub retried: usize,
    /// Failed attempts that reached the retry ceiling.
    pub failed: usize,
    /// Records that were no longer pending when looked at or committed.
    pub skipped: usize,
    /// Store errors.
    pub errors: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Sent => self.sent += 1,
            Outcome::Retried => self.retried += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Error => self.errors += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Sent,
    Retried,
    Failed,
    Skipped,
    Error,
}

pub struct Dispatcher {
    store: Arc<dyn ScheduleStore>,
    transport: Arc<dyn MailTransport>,
    clock: Arc<dyn Clock>,
    retry_policy: RetryPolicy,
    interval: Duration,
    concurrency: usize,
    cycle_lock: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        transport: Arc<dyn MailTransport>,
        clock: Arc<dyn Clock>,
        config: &DispatcherConfig,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            retry_policy: config.retry_policy(),
            interval: config.interval(),
            concurrency: config.concurrency.max(1),
            cycle_lock: Mutex::new(()),
        }
    }

    /// Run one cycle over everything due at `clock.now()`.
    #[tracing::instrument(skip(self))]
    pub async fn run_cycle(&self) -> CycleReport {
        let _guard = self.cycle_lock.lock().await;

        let now = self.clock.now();
        let due = match self.store.list_due_pending(now).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = %e, "failed to load due schedules");
                return CycleReport {
                    errors: 1,
                    ..Default::default()
                };
            }
        };

        let mut report = CycleReport {
            due: due.len(),
            ..Default::default()
        };
        let outcomes: Vec<Outcome> = stream::iter(due)
            .map(|record| self.process(record.id))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        for outcome in outcomes {
            report.record(outcome);
        }

        if report.due > 0 {
            tracing::info!(
                due = report.due,
                sent = report.sent,
                retried = report.retried,
                failed = report.failed,
                skipped = report.skipped,
                errors = report.errors,
                "dispatch cycle finished"
            );
        } else {
            tracing::debug!("nothing due");
        }
        report
    }

    async fn process(&self, id: ScheduleId) -> Outcome {
        match self.try_process(id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(%id, error = %e, "dispatch of schedule failed");
                Outcome::Error
            }
        }
    }

    async fn try_process(&self, id: ScheduleId) -> Result<Outcome, StoreError> {
        let Some(mut record) = self.store.get(id).await? else {
            return Ok(Outcome::Skipped);
        };
        if record.status != ScheduleStatus::Pending {
            tracing::debug!(%id, status = %record.status, "schedule no longer pending");
            return Ok(Outcome::Skipped);
        }

        let email = OutgoingEmail::from_record(&record);
        let transition = match self.transport.send(&email).await {
            Ok(()) => record.mark_sent(self.clock.now()).map(|()| Outcome::Sent),
            Err(e) => {
                tracing::warn!(
                    %id,
                    to = %record.recipient_address,
                    attempt = record.retry_count + 1,
                    error = %e,
                    "delivery failed"
                );
                record
                    .record_failure(e.to_string(), &self.retry_policy)
                    .map(|status| match status {
                        ScheduleStatus::Failed => Outcome::Failed,
                        _ => Outcome::Retried,
                    })
            }
        };
        let outcome = match transition {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(%id, error = %e, "dispatch outcome not applicable");
                return Ok(Outcome::Skipped);
            }
        };

        if !self
            .store
            .update_if_status(&record, ScheduleStatus::Pending)
            .await?
        {
            tracing::warn!(%id, ?outcome, "schedule changed during delivery; outcome discarded");
            return Ok(Outcome::Skipped);
        }

        match outcome {
            Outcome::Sent => tracing::info!(%id, to = %record.recipient_address, "scheduled email sent"),
            Outcome::Failed => tracing::warn!(
                %id,
                retries = record.retry_count,
                "schedule failed permanently"
            ),
            _ => tracing::debug!(%id, retries = record.retry_count, "schedule will be retried"),
        }
        Ok(outcome)
    }

    /// Start the periodic loop. The first cycle runs immediately.
    pub fn spawn(self: Arc<Self>) -> DispatcherHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval = ?self.interval, "dispatcher started");

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        // A dropped sender counts as shutdown.
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        self.run_cycle().await;
                    }
                }
            }
            tracing::info!("dispatcher stopped");
        });

        DispatcherHandle { shutdown_tx, join }
    }
}

/// Owner-side handle of a spawned dispatcher loop.
pub struct DispatcherHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Stop scheduling new cycles. Does not interrupt a running cycle.
    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for the loop to exit.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "dispatcher task panicked");
        }
    }
}
