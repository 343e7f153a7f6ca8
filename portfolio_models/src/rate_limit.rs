use std::time::Duration;

use chrono::{DateTime, Utc};

/// Fixed window rate limit: at most `max_requests` per key within `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u64,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The request has been counted and may proceed.
    Allowed {
        remaining: u64,
        reset_at: DateTime<Utc>,
    },
    /// The quota of the current window is used up.
    Exceeded { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}
