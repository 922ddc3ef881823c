// Copyright 2026 Gearscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Retry of whole lookup attempts that timed out.

use crate::error::LookupError;
use std::future::Future;
use std::time::Duration;

/// Ceiling for a single backoff sleep.
const MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sleep before retry number `retry` (1-based).
    fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }

    /// Run `attempt` until it succeeds, fails with something other than a
    /// timeout, or the retries are spent. `attempt` receives the 0-based
    /// attempt number and must start from fresh state.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T, LookupError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LookupError>>,
    {
        let mut retries = 0u32;
        loop {
            match attempt(retries).await {
                Err(e) if e.is_timeout() && retries < self.max_retries => {
                    retries += 1;
                    let delay = self.delay(retries);
                    tracing::warn!(
                        retry = retries,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "attempt timed out, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }
}
