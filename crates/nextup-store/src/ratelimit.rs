//! Token-bucket rate limiter for outbound store calls.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// Poll interval while waiting for a token.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Token bucket with lazy refill.
///
/// Refill happens on each `acquire` as `min(capacity, tokens + elapsed * rate)`,
/// so no background timer is needed. `acquire` cannot fail, only delay.
/// The bucket is mutex-guarded so it stays correct if write concurrency is
/// ever raised above one worker.
pub struct TokenBucket {
    capacity: f64,
    refill_per_second: f64,
    inner: Mutex<Bucket>,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_per_second: f64) -> Self {
        Self {
            capacity: capacity as f64,
            refill_per_second,
            inner: Mutex::new(Bucket {
                tokens: capacity as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token if available right now.
    fn try_acquire(&self) -> bool {
        let mut bucket = self.inner.lock().expect("token bucket lock poisoned");
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            bucket.tokens =
                (bucket.tokens + elapsed * self.refill_per_second).min(self.capacity);
            bucket.last_refill = now;
        }
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Wait (cooperatively) until a token is available, then consume it.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            trace!("token bucket empty, waiting for refill");
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
