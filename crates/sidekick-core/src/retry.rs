// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry for page-readiness polling.
//!
//! Every "wait until the page is ready" loop in the runtime goes through
//! [`retry_until`]. There is no unbounded variant: a policy always carries a
//! maximum attempt count, and exhaustion is reported as
//! [`SidekickError::Transient`] after a warning is logged.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::SidekickError;

/// Attempt cap and delay schedule for a polling loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total probes, including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each failed probe.
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            backoff_factor: 1.5,
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Same delay between every probe.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            backoff_factor: 1.0,
            max_delay: delay,
        }
    }

    /// Delay to wait after failed probe number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let factor = self.backoff_factor.max(1.0).powi(exponent);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.round() as u64)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Probe until it yields `Some`, sleeping per `policy` between attempts.
///
/// `what` names the condition in log messages ("chat input visible").
pub async fn retry_until<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut probe: F,
) -> Result<T, SidekickError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let attempts = policy.attempts();
    for attempt in 1..=attempts {
        if let Some(value) = probe(attempt).await {
            if attempt > 1 {
                debug!(what, attempt, "condition met after retry");
            }
            return Ok(value);
        }
        if attempt < attempts {
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }

    warn!(what, attempts, "giving up waiting");
    Err(SidekickError::Transient {
        message: format!("timed out waiting for {what}"),
        attempts,
    })
}

/// Boolean form of [`retry_until`].
pub async fn wait_for<F, Fut>(policy: &RetryPolicy, what: &str, mut predicate: F) -> Result<(), SidekickError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    retry_until(policy, what, |_| {
        let ready = predicate();
        async move { ready.await.then_some(()) }
    })
    .await
}
