//! Background eviction of idle rate-limit entries.
//!
//! Without it the limiter's table would grow by one entry per distinct
//! client for the life of the process.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;
use crate::security::RateLimiter;

/// Run [`RateLimiter::sweep`] every `interval` until shutdown.
pub fn spawn(
    limiter: Arc<RateLimiter>,
    interval: Duration,
    mut shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep();
                    let tracked = limiter.tracked_clients();
                    metrics::record_tracked_clients(tracked);
                    if removed > 0 {
                        tracing::debug!(removed, tracked, "Swept idle rate-limit clients");
                    }
                }
                () = shutdown.recv() => {
                    tracing::debug!("Rate-limit sweeper stopping");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::lifecycle::Shutdown;

    #[tokio::test(start_paused = true)]
    async fn evicts_idle_clients_and_stops_on_shutdown() {
        let clock = Arc::new(ManualClock::at(Duration::from_secs(1_000)));
        let limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(60), clock.clone()));
        assert!(limiter.admit("10.0.0.1"));
        assert!(limiter.admit("10.0.0.2"));
        clock.advance(Duration::from_secs(120));

        let shutdown = Shutdown::new();
        let task = spawn(limiter.clone(), Duration::from_secs(30), shutdown.subscribe());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(limiter.tracked_clients(), 0);

        shutdown.trigger();
        task.await.unwrap();
    }
}
