//! Token bucket pacing for hosting API requests.
//!
//! The search API allows a fixed number of requests per minute; the pacer
//! makes callers wait out the deficit instead of failing, so a collection
//! run proceeds at the sustainable rate without bare sleeps scattered
//! through the loop.

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

/// Token bucket: tokens accrue at a constant rate and each request spends
/// one. The bucket starts full.
struct TokenBucket {
    capacity: f32,
    tokens: f32,
    refill_rate: f32,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute.max(1) as f32;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    /// Take a token, or report how long until one is available.
    fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let needed = 1.0 - self.tokens;
            Err(Duration::from_secs_f32(needed / self.refill_rate))
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Async pacer over a token bucket.
pub struct RequestPacer {
    bucket: Mutex<TokenBucket>,
}

impl RequestPacer {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(requests_per_minute)),
        }
    }

    /// Wait until a request slot is available.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                match bucket.try_acquire() {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_starts_full() {
        let mut bucket = TokenBucket::new(10);
        for _ in 0..10 {
            assert!(bucket.try_acquire().is_ok());
        }
        assert!(bucket.try_acquire().is_err());
    }

    #[test]
    fn test_bucket_reports_wait_time() {
        let mut bucket = TokenBucket::new(10);
        for _ in 0..10 {
            bucket.try_acquire().unwrap();
        }
        let wait = bucket.try_acquire().unwrap_err();
        // At 10 rpm one token refills in 6 seconds.
        assert!(wait.as_millis() > 0);
        assert!(wait.as_secs() <= 6);
    }

    #[test]
    fn test_zero_rpm_clamped_to_one() {
        let mut bucket = TokenBucket::new(0);
        assert!(bucket.try_acquire().is_ok());
    }

    #[tokio::test]
    async fn test_pacer_allows_burst_up_to_capacity() {
        let pacer = RequestPacer::new(5);
        // Full bucket: five immediate acquisitions.
        for _ in 0..5 {
            pacer.acquire().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_waits_when_drained() {
        let pacer = RequestPacer::new(60); // 1 token per second
        for _ in 0..60 {
            pacer.acquire().await;
        }

        let start = Instant::now();
        pacer.acquire().await;
        // Paused-time test: the sleep advances the virtual clock.
        assert!(start.elapsed() >= Duration::from_millis(900));
    }
}
