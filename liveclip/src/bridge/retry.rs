use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use super::BridgeError;

/// What a single attempt produced.
///
/// `Empty` is not a failure: the mediator simply has nothing for us yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Ready(T),
    Empty,
}

/// Why a single attempt did not produce anything.
#[derive(Debug)]
pub enum AttemptError {
    /// The mediator answered with this status code.
    Status(u16),
    /// The request never got an answer (refused, reset, timed out).
    Transport(String),
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for every further retry.
    pub backoff_base: Duration,
    pub max_backoff: Duration,
    /// Wall-clock budget for one logical call, retries included. Also used as
    /// the timeout of each individual request.
    pub timeout: Duration,
    /// Status codes worth retrying. 404 is in here because the mediator uses
    /// it for "nothing pending yet".
    pub retry_statuses: Vec<u16>,
}

pub const DEFAULT_RETRY_STATUSES: [u16; 6] = [429, 500, 502, 503, 504, 404];

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            backoff_base: Duration::from_millis(100),
            max_backoff: Duration::from_secs(120),
            timeout: Duration::from_secs(10 * 60),
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    pub fn retries_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Delay to wait after the `attempt`-th failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(62) as i32;
        let secs = self.backoff_base.as_secs_f64() * 2f64.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_backoff.as_secs_f64()))
    }
}

/// Lets another thread abort a retry loop that is waiting on the mediator.
/// Clones share the same flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Clear the flag so the token can be used for another call.
    pub fn reset(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // The sender lives as long as `self`, so this cannot happen.
                return std::future::pending().await;
            }
        }
    }
}

/// Run `op` until it yields `Outcome::Ready`, retrying on `Outcome::Empty`,
/// on transport failures and on the statuses the policy lists.
///
/// Gives up with `BridgeError::RetryExhausted` once `max_attempts` attempts
/// were made, or once the policy's timeout runs out (an attempt in flight is
/// cut short, and no backoff is started that would end past it). Gives up
/// with `BridgeError::Cancelled` as soon as `cancel` fires.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancelToken,
    what: &str,
    mut op: F,
) -> Result<T, BridgeError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Outcome<T>, AttemptError>>,
{
    let started = Instant::now();
    let mut last_failure = String::from("no attempt was made");

    for attempt in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }

        let remaining = policy.timeout.saturating_sub(started.elapsed());
        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
            result = tokio::time::timeout(remaining, op(attempt)) => result,
        };
        let result = match result {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "[BRIDGE] {} gave up during attempt {}: timeout of {:?} reached",
                    what,
                    attempt,
                    policy.timeout
                );
                return Err(BridgeError::RetryExhausted {
                    attempts: attempt,
                    last_failure: format!("attempt {} cut short by the timeout", attempt),
                });
            }
        };

        last_failure = match result {
            Ok(Outcome::Ready(value)) => {
                if attempt > 1 {
                    log::debug!("[BRIDGE] {} succeeded on attempt {}", what, attempt);
                }
                return Ok(value);
            }
            Ok(Outcome::Empty) => "nothing pending".to_string(),
            Err(AttemptError::Status(status)) if policy.retries_status(status) => {
                format!("status {}", status)
            }
            Err(AttemptError::Status(status)) => return Err(BridgeError::Status(status)),
            Err(AttemptError::Transport(msg)) => msg,
        };

        if attempt == policy.max_attempts {
            break;
        }

        let delay = policy.backoff(attempt);
        if started.elapsed() + delay > policy.timeout {
            log::warn!(
                "[BRIDGE] {} gave up after {} attempt(s): timeout of {:?} reached",
                what,
                attempt,
                policy.timeout
            );
            return Err(BridgeError::RetryExhausted {
                attempts: attempt,
                last_failure,
            });
        }

        log::debug!(
            "[BRIDGE] {} attempt {}/{} failed ({}); retrying in {:?}",
            what,
            attempt,
            policy.max_attempts,
            last_failure,
            delay
        );
        tokio::select! {
            _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }

    log::warn!(
        "[BRIDGE] {} gave up after {} attempt(s): {}",
        what,
        policy.max_attempts,
        last_failure
    );
    Err(BridgeError::RetryExhausted {
        attempts: policy.max_attempts,
        last_failure,
    })
}
