//! Fixed-interval pacing between batch items

use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug_span};

/// Spaces out batch items by at least a fixed interval
///
/// The first permit is granted immediately; each later one waits until the
/// interval has elapsed since the previous permit. A zero interval disables
/// pacing.
#[derive(Clone)]
pub struct Pacer {
    interval: Duration,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl Pacer {
    /// Create a pacer granting one permit per `interval`
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval).map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self { interval, limiter }
    }

    /// A pacer that never waits
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    /// The configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next permit
    ///
    /// Returns `false` if `cancel` fired before the permit was granted.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        let Some(limiter) = &self.limiter else {
            return true;
        };

        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = limiter.until_ready().instrument(debug_span!("pacer")) => true,
        }
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("interval", &self.interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_first_permit_is_immediate() {
        let pacer = Pacer::new(Duration::from_secs(5));
        let token = CancellationToken::new();

        let start = Instant::now();
        assert!(pacer.wait(&token).await);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_permits_are_spaced() {
        let pacer = Pacer::new(Duration::from_millis(100));
        let token = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..3 {
            assert!(pacer.wait(&token).await);
        }
        // Two intervals between three permits
        assert!(start.elapsed() >= Duration::from_millis(190));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let pacer = Pacer::unpaced();
        let token = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..100 {
            assert!(pacer.wait(&token).await);
        }
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(pacer.interval(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_wait() {
        let pacer = Pacer::new(Duration::from_secs(30));
        let token = CancellationToken::new();
        assert!(pacer.wait(&token).await);

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        assert!(!pacer.wait(&token).await);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancelled_token_refuses_permit() {
        let pacer = Pacer::unpaced();
        let token = CancellationToken::new();
        token.cancel();

        assert!(!pacer.wait(&token).await);
    }
}
