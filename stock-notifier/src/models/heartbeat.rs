use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Periodic "still alive" report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub started_at: DateTime<Utc>,
    pub sent_at: DateTime<Utc>,
    pub checks_completed: u64,
    #[serde(default)]
    pub note: Option<String>,
}

impl Heartbeat {
    pub fn new(started_at: DateTime<Utc>, checks_completed: u64) -> Self {
        Self {
            started_at,
            sent_at: Utc::now(),
            checks_completed,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn uptime(&self) -> Duration {
        let elapsed = self.sent_at - self.started_at;
        if elapsed < Duration::zero() {
            Duration::zero()
        } else {
            elapsed
        }
    }
}

/// Render a duration as `1d 2h 3m`, or seconds when under a minute
pub fn format_uptime(uptime: Duration) -> String {
    let total_secs = uptime.num_seconds().max(0);
    if total_secs < 60 {
        return format!("{}s", total_secs);
    }

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{}h", hours));
    }
    parts.push(format!("{}m", minutes));
    parts.join(" ")
}
