use std::future::Future;

use portfolio_models::rate_limit::{RateLimitDecision, RateLimitPolicy};

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait RateLimitService: Send + Sync + 'static {
    /// Count a request for `key` and decide whether it may proceed.
    ///
    /// Checking and counting happen atomically, so concurrent requests for
    /// the same key can never exceed the quota together.
    fn check(
        &self,
        key: &str,
        policy: RateLimitPolicy,
    ) -> impl Future<Output = RateLimitDecision> + Send;
}

#[cfg(feature = "mock")]
impl MockRateLimitService {
    pub fn with_check(
        mut self,
        key: String,
        policy: RateLimitPolicy,
        result: RateLimitDecision,
    ) -> Self {
        self.expect_check()
            .once()
            .with(
                mockall::predicate::eq(key),
                mockall::predicate::eq(policy),
            )
            .return_once(move |_, _| Box::pin(std::future::ready(result)));
        self
    }
}
