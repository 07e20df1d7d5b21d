use crate::models::Heartbeat;
use crate::notifier::Notifier;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Shared counter of completed stock checks, reported in each heartbeat
#[derive(Clone, Default)]
pub struct CheckCounter(Arc<AtomicU64>);

impl CheckCounter {
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Posts a heartbeat immediately and then once per interval until cancelled.
/// The first one is marked as the startup heartbeat.
pub struct HeartbeatService {
    notifier: Notifier,
    interval: Duration,
    started_at: DateTime<Utc>,
    checks: CheckCounter,
}

impl HeartbeatService {
    pub fn new(notifier: Notifier, interval: Duration) -> Self {
        Self {
            notifier,
            interval,
            started_at: Utc::now(),
            checks: CheckCounter::default(),
        }
    }

    /// Handle for the code performing stock checks
    pub fn checks(&self) -> CheckCounter {
        self.checks.clone()
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    pub async fn run(self, cancel: CancellationToken) {
        log::info!(
            "[heartbeat] Starting, interval {}s",
            self.interval.as_secs()
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut first = true;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("[heartbeat] Received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.beat(first.then_some("Notifier started")).await;
                    first = false;
                }
            }
        }
    }

    async fn beat(&self, note: Option<&str>) {
        let mut heartbeat = Heartbeat::new(self.started_at, self.checks.get());
        if let Some(note) = note {
            heartbeat = heartbeat.with_note(note);
        }
        // A failed heartbeat must not stop the loop
        if let Err(e) = self.notifier.send_heartbeat(&heartbeat).await {
            log::error!("[heartbeat] Failed to send heartbeat: {}", e);
        }
    }
}
