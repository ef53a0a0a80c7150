//! Periodic removal of events whose scheduled time has passed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use eventposter_core::DomainResult;
use eventposter_core::time::{format_timestamp, parse_timestamp};

use crate::repo::EventRepository;

/// Deletes past events; registrations follow by cascade.
#[derive(Debug, Clone)]
pub struct ExpirySweeper {
    events: EventRepository,
}

impl ExpirySweeper {
    pub fn new(events: EventRepository) -> Self {
        Self { events }
    }

    /// Sweep against the current time. Returns the number of events removed.
    pub async fn sweep_expired_events(&self) -> DomainResult<usize> {
        self.sweep_at(Utc::now()).await
    }

    /// Sweep against `now`.
    ///
    /// Each candidate's stored date is re-parsed and compared again before it
    /// is deleted. Unparseable dates and per-event delete failures are logged
    /// and skipped; only a failure to select candidates is returned.
    #[instrument(skip(self), fields(now = %format_timestamp(now)), err)]
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let candidates = self.events.expiry_candidates(now).await?;
        let mut removed = 0;

        for candidate in candidates {
            let event_date = match parse_timestamp(&candidate.event_date) {
                Ok(date) => date,
                Err(err) => {
                    warn!(
                        event_id = %candidate.id,
                        error = %err,
                        "skipping event with unparseable date"
                    );
                    continue;
                }
            };
            if event_date >= now {
                continue;
            }

            match self.events.delete_raw(&candidate.id).await {
                Ok(true) => {
                    removed += 1;
                    info!(
                        event_id = %candidate.id,
                        title = %candidate.title,
                        event_date = %format_timestamp(event_date),
                        "deleted expired event"
                    );
                }
                Ok(false) => debug!(event_id = %candidate.id, "expired event already gone"),
                Err(err) => {
                    warn!(event_id = %candidate.id, error = %err, "failed to delete expired event");
                }
            }
        }

        if removed > 0 {
            info!(removed, "expiry sweep finished");
        }
        Ok(removed)
    }

    /// Run a sweep immediately and then every `every`, for as long as the
    /// runtime lives.
    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = self.sweep_expired_events().await {
                    error!(error = %err, "expiry sweep failed");
                }
            }
        })
    }
}
