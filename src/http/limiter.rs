use crate::config::RateLimitConfig;
use crate::error::{PantryError, Result};
use log::debug;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Token bucket gating outbound requests.
///
/// The bucket starts full with `burst` permits and regains one whole permit
/// per `interval`. Waiters queue on a fair mutex, so permits are handed out in
/// arrival order. Time is read from `tokio::time`, which lets tests drive the
/// bucket with a paused clock.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    interval: Duration,
    state: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant, capacity: u32, interval: Duration) {
        if self.tokens >= capacity {
            self.last_refill = now;
            return;
        }
        let elapsed = now.saturating_duration_since(self.last_refill);
        let ticks = (elapsed.as_nanos() / interval.as_nanos()).min(u32::MAX as u128) as u32;
        if ticks == 0 {
            return;
        }
        self.tokens = self.tokens.saturating_add(ticks).min(capacity);
        if self.tokens >= capacity {
            self.last_refill = now;
        } else {
            self.last_refill += interval * ticks;
        }
    }
}

impl RateLimiter {
    pub fn new(cfg: RateLimitConfig) -> Self {
        let capacity = cfg.burst.max(1);
        let interval = if cfg.interval.is_zero() {
            Duration::from_millis(1)
        } else {
            cfg.interval
        };
        Self {
            capacity,
            interval,
            state: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Permits currently in the bucket. Takes the bucket lock, so this queues
    /// behind any caller already waiting in [`acquire`](Self::acquire).
    pub async fn available(&self) -> u32 {
        let mut bucket = self.state.lock().await;
        bucket.refill(Instant::now(), self.capacity, self.interval);
        bucket.tokens
    }

    /// Wait for one permit. A cancelled token aborts the wait without
    /// consuming anything.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(PantryError::Cancelled);
        }
        let mut bucket = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PantryError::Cancelled),
            guard = self.state.lock() => guard,
        };
        let started = Instant::now();
        loop {
            let now = Instant::now();
            bucket.refill(now, self.capacity, self.interval);
            if bucket.tokens > 0 {
                bucket.tokens -= 1;
                let waited = now.duration_since(started);
                if !waited.is_zero() {
                    debug!("rate limiter: permit granted after {:?}", waited);
                }
                return Ok(());
            }
            let ready_at = bucket.last_refill + self.interval;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PantryError::Cancelled),
                _ = tokio::time::sleep_until(ready_at) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn burst_is_immediate() {
        let rl = limiter();
        let cancel = CancellationToken::new();
        let t0 = Instant::now();
        rl.acquire(&cancel).await.unwrap();
        rl.acquire(&cancel).await.unwrap();
        assert_eq!(Instant::now(), t0);
        assert_eq!(rl.available().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn steady_state_is_one_per_interval() {
        let rl = limiter();
        let cancel = CancellationToken::new();
        let t0 = Instant::now();
        for _ in 0..5 {
            rl.acquire(&cancel).await.unwrap();
        }
        assert_eq!(Instant::now() - t0, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_admissions_are_spaced() {
        let rl = Arc::new(limiter());
        let cancel = CancellationToken::new();
        let mut handles = Vec::new();
        for _ in 0..6 {
            let rl = rl.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                rl.acquire(&cancel).await.unwrap();
                Instant::now()
            }));
        }
        let mut stamps = Vec::new();
        for h in handles {
            stamps.push(h.await.unwrap());
        }
        stamps.sort();
        assert_eq!(stamps[0], stamps[1]);
        for pair in stamps[1..].windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_served_in_arrival_order() {
        let rl = Arc::new(limiter());
        let cancel = CancellationToken::new();
        rl.acquire(&cancel).await.unwrap();
        rl.acquire(&cancel).await.unwrap();

        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for i in 0..5usize {
            let rl = rl.clone();
            let cancel = cancel.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                rl.acquire(&cancel).await.unwrap();
                order.lock().unwrap().push(i);
            }));
            // Let waiter `i` queue on the bucket before the next one is spawned.
            tokio::task::yield_now().await;
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn refills_after_idle_but_caps_at_burst() {
        let rl = limiter();
        let cancel = CancellationToken::new();
        rl.acquire(&cancel).await.unwrap();
        rl.acquire(&cancel).await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(rl.available().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_waiting() {
        let rl = limiter();
        let cancel = CancellationToken::new();
        rl.acquire(&cancel).await.unwrap();
        rl.acquire(&cancel).await.unwrap();

        let waiter = CancellationToken::new();
        let trigger = waiter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });
        let err = rl.acquire(&waiter).await.unwrap_err();
        assert!(matches!(err, PantryError::Cancelled));

        // The cancelled waiter took nothing; the next permit still arrives on schedule.
        tokio::time::advance(Duration::from_millis(800)).await;
        assert_eq!(rl.available().await, 1);
    }

    #[tokio::test]
    async fn pre_cancelled_token_is_rejected() {
        let rl = limiter();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            rl.acquire(&cancel).await,
            Err(PantryError::Cancelled)
        ));
        assert_eq!(rl.available().await, 2);
    }
}
