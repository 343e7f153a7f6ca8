use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use portfolio_di::Build;
use portfolio_models::rate_limit::{RateLimitDecision, RateLimitPolicy};
use portfolio_shared_contracts::{rate_limit::RateLimitService, time::TimeService};
use portfolio_utils::trace_instrument;
use tokio::sync::Mutex;
use tracing::debug;

/// In-process fixed window rate limiter.
///
/// Counters live in memory only and are lost on restart.
#[derive(Debug, Clone, Build)]
pub struct RateLimitServiceImpl<Time> {
    time: Time,
    config: RateLimitServiceConfig,
    #[state]
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

#[derive(Debug, Clone)]
pub struct RateLimitServiceConfig {
    /// Number of tracked keys above which expired windows are pruned.
    pub capacity: usize,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    reset_at: DateTime<Utc>,
}

impl<Time> RateLimitService for RateLimitServiceImpl<Time>
where
    Time: TimeService,
{
    #[trace_instrument(skip(self))]
    async fn check(&self, key: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        let now = self.time.now();
        let mut windows = self.windows.lock().await;

        if windows.len() >= self.config.capacity && !windows.contains_key(key) {
            let before = windows.len();
            windows.retain(|_, window| window.reset_at > now);
            debug!(pruned = before - windows.len(), "pruned expired rate limit windows");
        }

        let window = windows.entry(key.to_owned()).or_insert(Window {
            count: 0,
            reset_at: window_end(now, policy.window),
        });

        if now >= window.reset_at {
            *window = Window {
                count: 0,
                reset_at: window_end(now, policy.window),
            };
        }

        if window.count >= policy.max_requests {
            return RateLimitDecision::Exceeded {
                retry_after: (window.reset_at - now).to_std().unwrap_or_default(),
            };
        }

        window.count += 1;

        RateLimitDecision::Allowed {
            remaining: policy.max_requests - window.count,
            reset_at: window.reset_at,
        }
    }
}

/// End of a window starting at `now`, saturating at the latest representable
/// time.
fn window_end(now: DateTime<Utc>, window: std::time::Duration) -> DateTime<Utc> {
    TimeDelta::from_std(window)
        .ok()
        .and_then(|window| now.checked_add_signed(window))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const POLICY: RateLimitPolicy = RateLimitPolicy {
        max_requests: 5,
        window: Duration::from_secs(15 * 60),
    };

    #[derive(Debug, Clone)]
    struct FakeTime(Arc<std::sync::Mutex<DateTime<Utc>>>);

    impl FakeTime {
        fn new() -> Self {
            Self(Arc::new(std::sync::Mutex::new(
                "2024-05-01T12:00:00Z".parse().unwrap(),
            )))
        }

        fn advance(&self, duration: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + duration;
        }
    }

    impl TimeService for FakeTime {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn make_sut(time: FakeTime, capacity: usize) -> RateLimitServiceImpl<FakeTime> {
        RateLimitServiceImpl {
            time,
            config: RateLimitServiceConfig { capacity },
            windows: Default::default(),
        }
    }

    #[tokio::test]
    async fn allows_up_to_max_requests() {
        // Arrange
        let time = FakeTime::new();
        let start = time.now();
        let sut = make_sut(time, 1024);

        // Act
        let mut decisions = Vec::new();
        for _ in 0..6 {
            decisions.push(sut.check("contact:127.0.0.1", POLICY).await);
        }

        // Assert
        let reset_at = start + POLICY.window;
        assert_eq!(
            &decisions[..5],
            &[4, 3, 2, 1, 0].map(|remaining| RateLimitDecision::Allowed {
                remaining,
                reset_at
            })
        );
        assert_eq!(
            decisions[5],
            RateLimitDecision::Exceeded {
                retry_after: POLICY.window
            }
        );
    }

    #[tokio::test]
    async fn retry_after_shrinks_within_window() {
        // Arrange
        let time = FakeTime::new();
        let sut = make_sut(time.clone(), 1024);
        for _ in 0..5 {
            sut.check("k", POLICY).await;
        }
        time.advance(Duration::from_secs(10 * 60));

        // Act
        let result = sut.check("k", POLICY).await;

        // Assert
        assert_eq!(
            result,
            RateLimitDecision::Exceeded {
                retry_after: Duration::from_secs(5 * 60)
            }
        );
    }

    #[tokio::test]
    async fn window_resets_after_expiry() {
        // Arrange
        let time = FakeTime::new();
        let sut = make_sut(time.clone(), 1024);
        for _ in 0..6 {
            sut.check("k", POLICY).await;
        }
        time.advance(POLICY.window);

        // Act
        let result = sut.check("k", POLICY).await;

        // Assert
        assert_eq!(
            result,
            RateLimitDecision::Allowed {
                remaining: 4,
                reset_at: time.now() + POLICY.window,
            }
        );
    }

    #[tokio::test]
    async fn keys_are_independent() {
        // Arrange
        let sut = make_sut(FakeTime::new(), 1024);
        for _ in 0..5 {
            sut.check("contact:10.0.0.1", POLICY).await;
        }

        // Act
        let exhausted = sut.check("contact:10.0.0.1", POLICY).await;
        let other = sut.check("contact:10.0.0.2", POLICY).await;

        // Assert
        assert!(!exhausted.is_allowed());
        assert!(other.is_allowed());
    }

    #[tokio::test]
    async fn concurrent_requests_never_exceed_quota() {
        // Arrange
        let sut = make_sut(FakeTime::new(), 1024);

        // Act
        let decisions =
            futures::future::join_all((0..20).map(|_| sut.check("k", POLICY))).await;

        // Assert
        let allowed = decisions.iter().filter(|d| d.is_allowed()).count();
        assert_eq!(allowed, 5);
    }

    #[tokio::test]
    async fn prunes_expired_windows_at_capacity() {
        // Arrange
        let time = FakeTime::new();
        let sut = make_sut(time.clone(), 2);
        sut.check("a", POLICY).await;
        sut.check("b", POLICY).await;
        time.advance(POLICY.window);

        // Act
        sut.check("c", POLICY).await;

        // Assert
        let windows = sut.windows.lock().await;
        assert_eq!(windows.len(), 1);
        assert!(windows.contains_key("c"));
    }

    #[tokio::test]
    async fn huge_window_saturates() {
        // Arrange
        let sut = make_sut(FakeTime::new(), 1024);
        let policy = RateLimitPolicy {
            max_requests: 1,
            window: Duration::MAX,
        };

        // Act
        let first = sut.check("k", policy).await;
        let second = sut.check("k", policy).await;

        // Assert
        assert_eq!(
            first,
            RateLimitDecision::Allowed {
                remaining: 0,
                reset_at: DateTime::<Utc>::MAX_UTC,
            }
        );
        assert!(!second.is_allowed());
    }
}
