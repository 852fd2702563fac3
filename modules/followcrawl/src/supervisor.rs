use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

/// Backoff schedule for restarting a failed worker.
#[derive(Debug, Clone, Copy)]
pub struct RestartPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// A run lasting at least this long resets the backoff to `initial_backoff`.
    pub healthy_after: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(300),
            healthy_after: Duration::from_secs(300),
        }
    }
}

impl RestartPolicy {
    /// Delay before the next restart, given the delay used for the last one.
    pub fn next_backoff(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_backoff)
    }
}

/// Keeps long-running workers alive: each run is a spawned task, and a task
/// that panics or returns an error is restarted after a backoff.
#[derive(Debug, Clone, Default)]
pub struct Supervisor {
    policy: RestartPolicy,
}

impl Supervisor {
    pub fn new(policy: RestartPolicy) -> Self {
        Self { policy }
    }

    /// Supervise the worker built by `make` until it returns `Ok(())`.
    ///
    /// Returns how many times the worker was restarted.
    pub async fn run<F, Fut>(&self, name: &'static str, make: F) -> u32
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut restarts = 0u32;
        let mut backoff = self.policy.initial_backoff;

        loop {
            info!(worker = name, restarts, "Starting worker");
            let started = Instant::now();

            match tokio::spawn(make()).await {
                Ok(Ok(())) => {
                    info!(worker = name, restarts, "Worker finished");
                    return restarts;
                }
                Ok(Err(e)) => {
                    error!(worker = name, error = %e, "Worker failed");
                }
                Err(join_err) if join_err.is_panic() => {
                    error!(worker = name, "Worker panicked");
                }
                Err(join_err) => {
                    error!(worker = name, error = %join_err, "Worker task cancelled");
                }
            }

            if started.elapsed() >= self.policy.healthy_after {
                backoff = self.policy.initial_backoff;
            }

            warn!(
                worker = name,
                backoff_ms = backoff.as_millis() as u64,
                "Restarting worker after backoff"
            );
            tokio::time::sleep(backoff).await;
            backoff = self.policy.next_backoff(backoff);
            restarts += 1;
        }
    }
}
