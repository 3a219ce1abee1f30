//! Bounded-retry readiness probe for the identity provider.

use std::future::Future;
use std::time::Duration;

use crate::config::CONFIG;
use crate::error::{AppError, Result};

/// Polls a caller-supplied probe with a fixed delay between attempts until
/// it succeeds or the attempt budget is exhausted. No exponential backoff:
/// the bounded total wait (10 x 3s by default) is intentional for container
/// startup ordering.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    max_attempts: u32,
    delay: Duration,
}

impl ReadinessProbe {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub fn from_config() -> Self {
        Self::new(
            CONFIG.identity.probe_max_attempts,
            Duration::from_millis(CONFIG.identity.probe_delay_ms),
        )
    }

    /// Run the probe until it succeeds. Attempts are 1-indexed and capped at
    /// `max_attempts`; the delay is only slept between attempts, so a probe
    /// that succeeds on attempt N sleeps N-1 times. On exhaustion the last
    /// observed error is carried in `DependencyUnavailable`.
    pub async fn wait_until_ready<F, Fut>(&self, mut probe: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match probe().await {
                Ok(()) => {
                    tracing::info!("Dependency ready after {} attempt(s)", attempt);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        "Readiness probe attempt {}/{} failed: {}",
                        attempt,
                        self.max_attempts,
                        e
                    );
                    last_error = Some(e);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }

        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts were made".to_string());
        Err(AppError::DependencyUnavailable(format!(
            "probe exhausted after {} attempts, last error: {}",
            self.max_attempts, detail
        )))
    }
}
