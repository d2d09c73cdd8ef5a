//! Shared retry policy for calls to external sources.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{LitrevError, Result};

pub const DEFAULT_TRIALS: u32 = 100;
pub const DEFAULT_WAIT: Duration = Duration::from_secs(10);

/// Bounded retry loop with a fixed wait between failures. A cancellation
/// from the operator aborts immediately, both between trials and during
/// the wait.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    trials: u32,
    wait: Duration,
    cancel: CancellationToken,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TRIALS, DEFAULT_WAIT)
    }
}

impl RetryPolicy {
    pub fn new(trials: u32, wait: Duration) -> Self {
        Self {
            trials: trials.max(1),
            wait,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run `op` until it succeeds, the trial budget is spent, or the
    /// operator cancels. Exhaustion surfaces as
    /// [`LitrevError::RetriesExhausted`]; callers at the resolver level
    /// convert that into "source unavailable, move on".
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut remaining = self.trials;
        loop {
            if self.cancel.is_cancelled() {
                return Err(LitrevError::Cancelled);
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(LitrevError::Cancelled) => return Err(LitrevError::Cancelled),
                Err(err) => {
                    remaining -= 1;
                    if remaining == 0 {
                        return Err(LitrevError::RetriesExhausted {
                            trials: self.trials,
                            last: err.to_string(),
                        });
                    }
                    warn!("{what} failed ({err}), retrying in {:?}", self.wait);
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(LitrevError::Cancelled),
                        _ = tokio::time::sleep(self.wait) => {}
                    }
                }
            }
        }
    }
}
