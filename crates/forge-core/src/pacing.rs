//! Per-provider call pacing.
//!
//! Upstream services throttle aggressively; the pacer suspends a caller
//! until at least the provider's minimum inter-call interval has elapsed
//! since that provider's last dispatch. The check-and-record is a single
//! atomic step inside governor, so concurrent `generate` calls sharing
//! one pacer cannot both observe "enough time has passed" and burst.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::RwLock;
use tracing::debug;

/// Limiter type for one provider.
pub type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Suspends callers until a provider may be called again.
#[derive(Clone, Default)]
pub struct ProviderPacer {
    limiters: Arc<RwLock<HashMap<String, Arc<DirectLimiter>>>>,
}

impl ProviderPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the provider's turn, recording the new slot atomically.
    ///
    /// A zero interval means the provider needs no pacing (e.g. a local
    /// subprocess) and returns immediately.
    pub async fn await_turn(&self, provider: &str, min_interval: Duration) {
        if min_interval.is_zero() {
            return;
        }
        let limiter = self.get_limiter(provider, min_interval).await;
        limiter.until_ready().await;
        debug!(provider, "Pacer granted turn");
    }

    /// Get or create the limiter for a provider.
    async fn get_limiter(&self, provider: &str, min_interval: Duration) -> Arc<DirectLimiter> {
        {
            let limiters = self.limiters.read().await;
            if let Some(limiter) = limiters.get(provider) {
                return Arc::clone(limiter);
            }
        }

        let mut limiters = self.limiters.write().await;
        // Double-check after acquiring the write lock.
        if let Some(limiter) = limiters.get(provider) {
            return Arc::clone(limiter);
        }

        let quota = Quota::with_period(min_interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::new(1).expect("1 is non-zero")));
        let limiter = Arc::new(RateLimiter::direct(quota));
        limiters.insert(provider.to_string(), Arc::clone(&limiter));
        limiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_second_turn_waits_for_interval() {
        let pacer = ProviderPacer::new();
        let interval = Duration::from_millis(120);

        let start = Instant::now();
        pacer.await_turn("pollinations", interval).await;
        pacer.await_turn("pollinations", interval).await;

        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let pacer = ProviderPacer::new();
        let start = Instant::now();
        for _ in 0..10 {
            pacer.await_turn("ffmpeg", Duration::ZERO).await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_providers_are_paced_independently() {
        let pacer = ProviderPacer::new();
        let interval = Duration::from_millis(200);

        let start = Instant::now();
        pacer.await_turn("groq", interval).await;
        pacer.await_turn("mistral", interval).await;

        // Distinct providers each get their first slot immediately.
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_concurrent_callers_cannot_burst() {
        let pacer = ProviderPacer::new();
        let interval = Duration::from_millis(120);

        let start = Instant::now();
        tokio::join!(
            pacer.await_turn("craiyon", interval),
            pacer.await_turn("craiyon", interval),
        );

        // One of the two concurrent callers must have been held back.
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
