//! Per-client sliding-window-log rate limiting.
//!
//! Each client keeps the exact timestamps of its admitted requests inside
//! the trailing window. This is exact (no burst smoothing) and costs memory
//! proportional to requests-in-window per client.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::clock::Clock;
use crate::config::RateLimitConfig;

/// Shared admission table keyed by client identifier.
#[derive(Debug)]
pub struct RateLimiter {
    /// client id -> admitted request times (ms since epoch), oldest first
    clients: DashMap<String, VecDeque<u64>>,
    limit: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clients: DashMap::new(),
            limit,
            window,
            clock,
        }
    }

    pub fn from_config(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.limit, Duration::from_secs(config.window_secs), clock)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit or reject one request from `client_id`.
    ///
    /// Pruning, the limit check and the append all happen under the key's
    /// shard lock, so two racing requests cannot both take the last slot.
    /// Rejected attempts are not recorded.
    pub fn admit(&self, client_id: &str) -> bool {
        if self.limit == 0 {
            return false;
        }

        let window = self.window_millis();
        let mut requests = self.clients.entry(client_id.to_owned()).or_default();
        let now = self.clock.now_millis();
        prune(&mut requests, now, window);

        if requests.len() >= self.limit {
            return false;
        }
        requests.push_back(now);
        true
    }

    /// Evict clients with no requests left in their window.
    /// Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let window = self.window_millis();
        let now = self.clock.now_millis();
        let mut removed = 0;
        self.clients.retain(|_, requests| {
            prune(requests, now, window);
            let keep = !requests.is_empty();
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of clients currently held in the table.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Drop timestamps that have aged a full window or more.
fn prune(requests: &mut VecDeque<u64>, now: u64, window: u64) {
    while let Some(&oldest) = requests.front() {
        if now.saturating_sub(oldest) >= window {
            requests.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Barrier;
    use std::thread;

    fn limiter(limit: usize, window_secs: u64) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at(Duration::from_secs(1_700_000_000)));
        (
            RateLimiter::new(limit, Duration::from_secs(window_secs), clock.clone()),
            clock,
        )
    }

    #[test]
    fn admits_up_to_limit_then_rejects() {
        let (limiter, clock) = limiter(3, 60);

        assert!(limiter.admit("A"));
        clock.advance(Duration::from_secs(1));
        assert!(limiter.admit("A"));
        clock.advance(Duration::from_secs(1));
        assert!(limiter.admit("A"));
        assert!(!limiter.admit("A"));

        clock.advance(Duration::from_secs(61));
        assert!(limiter.admit("A"));
    }

    #[test]
    fn window_slides_one_slot_at_a_time() {
        let (limiter, clock) = limiter(2, 10);

        assert!(limiter.admit("A"));
        clock.advance(Duration::from_secs(5));
        assert!(limiter.admit("A"));
        assert!(!limiter.admit("A"));

        // first request ages out, second is still inside the window
        clock.advance(Duration::from_secs(5));
        assert!(limiter.admit("A"));
        assert!(!limiter.admit("A"));
    }

    #[test]
    fn rejected_attempts_are_not_recorded() {
        let (limiter, clock) = limiter(1, 10);

        assert!(limiter.admit("A"));
        for _ in 0..5 {
            clock.advance(Duration::from_secs(1));
            assert!(!limiter.admit("A"));
        }
        clock.advance(Duration::from_secs(5));
        assert!(limiter.admit("A"));
    }

    #[test]
    fn clients_are_isolated() {
        let (limiter, _) = limiter(2, 60);

        assert!(limiter.admit("A"));
        assert!(limiter.admit("A"));
        assert!(!limiter.admit("A"));

        assert!(limiter.admit("B"));
        assert!(limiter.admit("B"));
        assert!(!limiter.admit("B"));
    }

    #[test]
    fn zero_limit_always_rejects() {
        let (limiter, _) = limiter(0, 60);
        assert!(!limiter.admit("A"));
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn concurrent_admits_take_exactly_the_free_slots() {
        const N: usize = 32;
        let (limiter, _) = limiter(N - 1, 60);
        let barrier = Barrier::new(N);

        let admitted: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..N)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        limiter.admit("same-client")
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });

        assert_eq!(admitted, N - 1);
    }

    #[test]
    fn sweep_evicts_idle_clients_only() {
        let (limiter, clock) = limiter(5, 60);

        assert!(limiter.admit("idle"));
        clock.advance(Duration::from_secs(30));
        assert!(limiter.admit("active"));
        clock.advance(Duration::from_secs(31));

        assert_eq!(limiter.tracked_clients(), 2);
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(limiter.admit("idle"));
    }
}
