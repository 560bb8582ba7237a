use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const MIN_RATE: f64 = 0.01;
const MIN_WAIT: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl Bucket {
    fn level(&self, now: Instant, rate: f64, capacity: f64) -> f64 {
        let elapsed = now.duration_since(self.refilled_at).as_secs_f64();
        (self.tokens + elapsed * rate).min(capacity)
    }
}

/// Token bucket shared by every clone of a reasoning client.
///
/// Capacity equals the refill rate (at least one token), so up to one
/// second of classification calls may burst before callers wait.
#[derive(Clone)]
pub struct TokenBucketRateLimiter {
    bucket: Arc<Mutex<Bucket>>,
    capacity: f64,
    rate: f64,
}

impl TokenBucketRateLimiter {
    /// Non-positive or NaN rates are raised to a small positive floor.
    pub fn new(requests_per_second: f64) -> Self {
        let rate = if requests_per_second.is_finite() && requests_per_second > MIN_RATE {
            requests_per_second
        } else {
            MIN_RATE
        };
        let capacity = rate.max(1.0);

        Self {
            bucket: Arc::new(Mutex::new(Bucket {
                tokens: capacity,
                refilled_at: Instant::now(),
            })),
            capacity,
            rate,
        }
    }

    /// Take one token, sleeping until one is available.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                let now = Instant::now();
                let level = bucket.level(now, self.rate, self.capacity);
                if level >= 1.0 {
                    bucket.tokens = level - 1.0;
                    bucket.refilled_at = now;
                    return;
                }
                Duration::from_secs_f64((1.0 - level) / self.rate).max(MIN_WAIT)
            };
            sleep(wait).await;
        }
    }

    #[cfg(test)]
    async fn available_tokens(&self) -> f64 {
        let bucket = self.bucket.lock().await;
        bucket.level(Instant::now(), self.rate, self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_consumes_tokens() {
        let limiter = TokenBucketRateLimiter::new(10.0);

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert!(limiter.available_tokens().await < 10.0);
    }

    #[tokio::test]
    async fn test_empty_bucket_waits_for_refill() {
        let limiter = TokenBucketRateLimiter::new(2.0);
        limiter.acquire().await;
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(400), "waited only {elapsed:?}");
    }

    #[tokio::test]
    async fn test_non_positive_rate_is_clamped() {
        let limiter = TokenBucketRateLimiter::new(0.0);
        limiter.acquire().await;
        assert!(limiter.available_tokens().await < 1.0);
    }

    #[tokio::test]
    async fn test_clones_share_one_bucket() {
        let limiter = TokenBucketRateLimiter::new(1.0);
        let clone = limiter.clone();
        limiter.acquire().await;
        assert!(clone.available_tokens().await < 1.0);
    }
}
