//! Backoff for model requests that fail transiently.
//!
//! Only the transport and the endpoint's own overload signals are retried.
//! A malformed body or a 4xx other than 408/429 will fail the same way again.

use crate::config::ApiConfig;
use crate::error::ApiError;
use std::time::Duration;

const FIRST_DELAY: Duration = Duration::from_millis(250);
const DELAY_CAP: Duration = Duration::from_secs(8);

#[derive(Clone, Copy, Debug)]
pub(super) struct RetryPolicy {
    /// Extra sends after the first one fails.
    pub(super) retries: u32,
    pub(super) first_delay: Duration,
    pub(super) delay_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            first_delay: FIRST_DELAY,
            delay_cap: DELAY_CAP,
        }
    }
}

impl RetryPolicy {
    pub(super) fn from_config(config: &ApiConfig) -> Self {
        Self {
            retries: config.max_retries,
            ..Self::default()
        }
    }

    /// Wait before the next send after `failures` consecutive failures, the
    /// latest being `err`. `None` means give up and surface `err`.
    ///
    /// A 503 on a streaming request is never retried here; the caller falls
    /// back to a plain request instead.
    pub(super) fn next_delay(
        &self,
        err: &ApiError,
        failures: u32,
        streaming: bool,
    ) -> Option<Duration> {
        if failures == 0 || failures > self.retries || !is_transient(err, streaming) {
            return None;
        }
        let doublings = (failures - 1).min(16);
        let delay = self
            .first_delay
            .checked_mul(1 << doublings)
            .unwrap_or(self.delay_cap);
        Some(delay.min(self.delay_cap))
    }
}

fn is_transient(err: &ApiError, streaming: bool) -> bool {
    match err {
        ApiError::Http(inner) => inner.is_timeout() || inner.is_connect(),
        ApiError::Status { code: 503, .. } if streaming => false,
        ApiError::Status { code, .. } => matches!(code, 408 | 429 | 500..=599),
        ApiError::InvalidResponse(_) => false,
    }
}
