//! Rate Limiter
//!
//! Sliding-window admission control keyed by operation name (`"search"`,
//! `"delete"`, `"share"`, ...). Each limiter keeps, per key, the instants of
//! the admissions still inside the window; old entries are pruned lazily on
//! every call, so there are no background timers.
//!
//! Limiters are plain values. Build them once (see [`Limiters`]) and pass
//! them to whatever issues remote calls.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::common::{ApiError, ApiResult, Clock, SystemClock};

const MIN_ACQUIRE_WAIT: Duration = Duration::from_millis(1);
/// Sleep used by [`RateLimiter::acquire`] when the window reports no wait
const FALLBACK_ACQUIRE_WAIT: Duration = Duration::from_millis(100);

/// Sliding-window limiter: at most `max` admissions per key in any `window`.
pub struct RateLimiter {
    max: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    buckets: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max: usize, window: Duration) -> Self {
        Self::with_clock(max, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max,
            window,
            clock,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit one operation for `key` if the window has room.
    ///
    /// On admission the current instant is recorded. A rejection records
    /// nothing. Pruning, the count check and the append happen under one lock.
    pub fn is_allowed(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut buckets = self.lock();
        let stamps = buckets.entry(key.to_string()).or_default();
        prune(stamps, now, self.window);

        if stamps.len() < self.max {
            stamps.push_back(now);
            true
        } else {
            false
        }
    }

    /// Admissions left for `key` in the current window
    pub fn remaining(&self, key: &str) -> usize {
        let now = self.clock.now();
        let mut buckets = self.lock();
        match buckets.get_mut(key) {
            Some(stamps) => {
                prune(stamps, now, self.window);
                self.max.saturating_sub(stamps.len())
            }
            None => self.max,
        }
    }

    /// Time until the oldest admission for `key` leaves the window.
    /// Zero when nothing is recorded.
    pub fn time_until_reset(&self, key: &str) -> Duration {
        let now = self.clock.now();
        let buckets = self.lock();
        match buckets.get(key).and_then(|stamps| stamps.front()) {
            Some(oldest) => (*oldest + self.window).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Forget every key
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Single-shot admission: a refusal becomes a rate-limited error.
    pub fn check(&self, key: &str) -> ApiResult<()> {
        if self.is_allowed(key) {
            Ok(())
        } else {
            warn!(bucket = key, "Rate limit exceeded");
            Err(ApiError::rate_limited(key))
        }
    }

    /// Wait until `key` is admitted.
    ///
    /// Used for per-item work inside bulk runs. Instead of polling on a fixed
    /// interval the task sleeps until the oldest admission leaves the window,
    /// then tries again; throughput is the same as the window allows.
    pub async fn acquire(&self, key: &str) {
        loop {
            if self.is_allowed(key) {
                return;
            }
            let wait = match self.time_until_reset(key) {
                Duration::ZERO => FALLBACK_ACQUIRE_WAIT,
                wait => wait.max(MIN_ACQUIRE_WAIT),
            };
            debug!(bucket = key, wait_ms = wait.as_millis() as u64, "Waiting for rate limit window");
            tokio::time::sleep(wait).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = stamps.front() {
        if now.saturating_duration_since(*oldest) >= window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}

/// Per-family limits used by the remote adapters
pub const DRIVE_MAX: usize = 10;
pub const DRIVE_WINDOW: Duration = Duration::from_millis(1000);
pub const GMAIL_MAX: usize = 5;
pub const GMAIL_WINDOW: Duration = Duration::from_millis(1000);
pub const BULK_MAX: usize = 3;
pub const BULK_WINDOW: Duration = Duration::from_millis(60_000);

/// The three limiter instances shared by one running session
pub struct Limiters {
    pub drive: RateLimiter,
    pub gmail: RateLimiter,
    pub bulk: RateLimiter,
}

impl Limiters {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            drive: RateLimiter::with_clock(DRIVE_MAX, DRIVE_WINDOW, Arc::clone(&clock)),
            gmail: RateLimiter::with_clock(GMAIL_MAX, GMAIL_WINDOW, Arc::clone(&clock)),
            bulk: RateLimiter::with_clock(BULK_MAX, BULK_WINDOW, clock),
        }
    }

    /// Clear all windows (sign-out)
    pub fn reset(&self) {
        self.drive.reset();
        self.gmail.reset();
        self.bulk.reset();
    }
}

impl Default for Limiters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ManualClock;

    fn limiter(max: usize, window_ms: u64) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(
            max,
            Duration::from_millis(window_ms),
            clock.clone() as Arc<dyn Clock>,
        );
        (limiter, clock)
    }

    #[test]
    fn admits_up_to_max_then_rejects() {
        let (limiter, clock) = limiter(3, 1000);

        assert!(limiter.is_allowed("k"));
        assert!(limiter.is_allowed("k"));
        assert!(limiter.is_allowed("k"));
        assert!(!limiter.is_allowed("k"));

        clock.advance(Duration::from_millis(1001));
        assert!(limiter.is_allowed("k"));
    }

    #[test]
    fn window_slides_rather_than_resetting() {
        let (limiter, clock) = limiter(2, 1000);

        assert!(limiter.is_allowed("k"));
        clock.advance(Duration::from_millis(600));
        assert!(limiter.is_allowed("k"));
        assert!(!limiter.is_allowed("k"));

        // first admission leaves the window, second is still inside
        clock.advance(Duration::from_millis(400));
        assert!(limiter.is_allowed("k"));
        assert!(!limiter.is_allowed("k"));
    }

    #[test]
    fn keys_are_independent() {
        let (limiter, _clock) = limiter(1, 1000);
        assert!(limiter.is_allowed("search"));
        assert!(!limiter.is_allowed("search"));
        assert!(limiter.is_allowed("delete"));
    }

    #[test]
    fn rejection_records_nothing() {
        let (limiter, clock) = limiter(1, 1000);
        assert!(limiter.is_allowed("k"));
        clock.advance(Duration::from_millis(900));
        assert!(!limiter.is_allowed("k"));
        assert!(!limiter.is_allowed("k"));

        clock.advance(Duration::from_millis(100));
        assert!(limiter.is_allowed("k"));
    }

    #[test]
    fn remaining_and_time_until_reset() {
        let (limiter, clock) = limiter(3, 1000);
        assert_eq!(limiter.remaining("k"), 3);
        assert_eq!(limiter.time_until_reset("k"), Duration::ZERO);

        limiter.is_allowed("k");
        clock.advance(Duration::from_millis(250));
        limiter.is_allowed("k");

        assert_eq!(limiter.remaining("k"), 1);
        assert_eq!(limiter.time_until_reset("k"), Duration::from_millis(750));

        clock.advance(Duration::from_millis(2000));
        assert_eq!(limiter.remaining("k"), 3);
        assert_eq!(limiter.time_until_reset("k"), Duration::ZERO);
    }

    #[test]
    fn reset_clears_every_key() {
        let (limiter, _clock) = limiter(1, 60_000);
        assert!(limiter.is_allowed("a"));
        assert!(limiter.is_allowed("b"));
        limiter.reset();
        assert!(limiter.is_allowed("a"));
        assert!(limiter.is_allowed("b"));
    }

    #[test]
    fn check_maps_refusal_to_rate_limited_error() {
        let (limiter, _clock) = limiter(1, 1000);
        assert!(limiter.check("search").is_ok());
        let err = limiter.check("search").unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn default_limiters_use_fixed_parameters() {
        let limiters = Limiters::new();
        assert_eq!((limiters.drive.max(), limiters.drive.window()), (10, Duration::from_millis(1000)));
        assert_eq!((limiters.gmail.max(), limiters.gmail.window()), (5, Duration::from_millis(1000)));
        assert_eq!((limiters.bulk.max(), limiters.bulk.window()), (3, Duration::from_millis(60_000)));
    }

    #[test]
    fn real_clock_window_expires() {
        let limiter = RateLimiter::new(3, Duration::from_millis(50));
        assert!(limiter.is_allowed("k"));
        assert!(limiter.is_allowed("k"));
        assert!(limiter.is_allowed("k"));
        assert!(!limiter.is_allowed("k"));
        std::thread::sleep(Duration::from_millis(70));
        assert!(limiter.is_allowed("k"));
    }

    #[tokio::test]
    async fn acquire_waits_for_the_window() {
        let limiter = RateLimiter::new(2, Duration::from_millis(80));
        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire("bulk").await;
        }
        // third admission must wait for the first to leave the window
        assert!(start.elapsed() >= Duration::from_millis(80));
        assert_eq!(limiter.remaining("bulk"), 0);
    }

    #[test]
    fn concurrent_admissions_never_exceed_max() {
        let limiter = Arc::new(RateLimiter::new(25, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || (0..10).filter(|_| limiter.is_allowed("k")).count())
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 25);
    }
}
