use crate::config::FetchConfig;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Uniformly random duration in `[min_ms, max_ms]`
pub fn random_between(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}

/// Exponential retry backoff with up to 25% added jitter
///
/// `retry` is 1 for the wait before the second attempt.
pub fn backoff_delay(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
    let exp = base_ms.saturating_mul(1u64 << retry.saturating_sub(1).min(16));
    let capped = exp.min(max_ms);
    let jitter = if capped == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=capped / 4)
    };
    Duration::from_millis(capped + jitter)
}

/// Spaces out requests across every worker of one crawl
///
/// The delay before each request grows with the number of requests already
/// made and with the age of the crawl, is capped, and carries random jitter.
/// Requests are spaced globally: concurrent callers queue for slots.
#[derive(Debug)]
pub struct Pacer {
    base_ms: AtomicU64,
    request_growth: f64,
    age_growth: f64,
    max_ms: u64,
    jitter: f64,
    requests: AtomicU64,
    started: Instant,
    next_slot: Mutex<Instant>,
}

impl Pacer {
    pub fn new(base_ms: u64, config: &FetchConfig) -> Self {
        let now = Instant::now();
        Self {
            base_ms: AtomicU64::new(base_ms),
            request_growth: config.pacing_request_growth,
            age_growth: config.pacing_age_growth,
            max_ms: config.pacing_max_ms,
            jitter: config.pacing_jitter,
            requests: AtomicU64::new(0),
            started: now,
            next_slot: Mutex::new(now),
        }
    }

    /// Raises the base delay, e.g. to honor a robots.txt Crawl-delay
    pub fn set_min_delay(&self, ms: u64) {
        self.base_ms.fetch_max(ms, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Paced delay without jitter for a given request count and crawl age
    pub fn delay_for(&self, requests: u64, age: Duration) -> Duration {
        let base = self.base_ms.load(Ordering::Relaxed) as f64;
        let minutes = age.as_secs_f64() / 60.0;
        let factor = 1.0 + self.request_growth * requests as f64 + self.age_growth * minutes;
        let ms = (base * factor).min(self.max_ms.max(self.base_ms.load(Ordering::Relaxed)) as f64);
        Duration::from_millis(ms.round() as u64)
    }

    /// Waits for this caller's request slot
    pub async fn wait(&self) {
        let count = self.requests.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay_for(count, self.started.elapsed());
        let delay = delay + self.jitter_for(delay);

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = if *next > now { *next } else { now };
            *next = slot + delay;
            slot
        };

        tokio::time::sleep_until(slot).await;
    }

    fn jitter_for(&self, delay: Duration) -> Duration {
        let max = (delay.as_millis() as f64 * self.jitter) as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}
