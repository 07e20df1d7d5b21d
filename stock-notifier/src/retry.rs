//! Delivery retry helper with exponential backoff
//!
//! Webhook deliveries that fail with a transient error (timeout, 5xx,
//! connection errors) are retried after a per-destination backoff delay.
//! Rate limiting (429) is not handled here: serenity's ratelimiter owns it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Minimum backoff delay
const MIN_BACKOFF: Duration = Duration::from_secs(1);
/// Maximum backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Quiet period after which a destination's backoff starts over
const RESET_AFTER: Duration = Duration::from_secs(120);

/// Attempts per delivery, including the first
pub const MAX_DELIVERY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
struct BackoffState {
    current_delay: Duration,
    last_error_at: Instant,
    error_count: u32,
}

impl Default for BackoffState {
    fn default() -> Self {
        BackoffState {
            current_delay: MIN_BACKOFF,
            last_error_at: Instant::now(),
            error_count: 0,
        }
    }
}

/// Backoff tracking keyed by destination (a redacted webhook URL)
#[derive(Default)]
pub struct DeliveryBackoff {
    states: RwLock<HashMap<String, BackoffState>>,
}

impl DeliveryBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful delivery, resetting backoff
    pub fn record_success(&self, key: &str) {
        if self.states.write().remove(key).is_some() {
            log::debug!("[RETRY] Success for '{}', backoff reset", key);
        }
    }

    /// Record a failed delivery and get the delay before the next attempt
    pub fn record_error(&self, key: &str) -> Duration {
        let mut states = self.states.write();
        let state = states.entry(key.to_string()).or_default();
        let now = Instant::now();

        if state.error_count > 0 && now.duration_since(state.last_error_at) > RESET_AFTER {
            state.current_delay = MIN_BACKOFF;
            state.error_count = 1;
        } else {
            state.error_count += 1;
            if state.error_count > 1 {
                state.current_delay = (state.current_delay * 2).min(MAX_BACKOFF);
            }
        }

        state.last_error_at = now;
        log::debug!(
            "[RETRY] Error #{} for '{}', backoff: {}s",
            state.error_count,
            key,
            state.current_delay.as_secs()
        );
        state.current_delay
    }

    /// Current delay for a destination without recording an error
    pub fn current_delay(&self, key: &str) -> Option<Duration> {
        self.states.read().get(key).map(|s| s.current_delay)
    }
}

/// Whether an HTTP status indicates a transient failure
pub fn is_retryable_status(status: u16) -> bool {
    matches!(
        status,
        408 | // Request Timeout
        500 | // Internal Server Error (sometimes transient)
        502 | // Bad Gateway
        503 | // Service Unavailable
        504 | // Gateway Timeout
        520..=524 // Cloudflare origin errors
    )
}

/// Whether an error message describes a transient network failure
pub fn is_retryable_error(error: &str) -> bool {
    let error_lower = error.to_lowercase();

    error_lower.contains("timeout")
        || error_lower.contains("timed out")
        || error_lower.contains("connection")
        || error_lower.contains("error sending request")
        || error_lower.contains("dns")
        || error_lower.contains("bad gateway")
        || error_lower.contains("service unavailable")
}
