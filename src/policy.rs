use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use tokio::time::{sleep, timeout};

use crate::config::DirectoryConfig;
use crate::error::{AuthError, StoreError};

/// Errors the policy can classify for retry purposes
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        StoreError::is_transient(self)
    }
}

impl Transient for AuthError {
    fn is_transient(&self) -> bool {
        match self {
            AuthError::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Outcome of a remote call that did not succeed
#[derive(Debug)]
pub enum CallFailure<E> {
    /// No answer within the policy's timeout
    Timeout(Duration),
    /// The backend answered with an error
    Failed(E),
}

impl<E: Transient> CallFailure<E> {
    fn is_transient(&self) -> bool {
        match self {
            CallFailure::Timeout(_) => true,
            CallFailure::Failed(e) => e.is_transient(),
        }
    }
}

/// Timeout and retry rules applied to every remote call.
///
/// Reads may be repeated at most once after a transient failure. Writes are
/// attempted exactly once so a slow success is never duplicated.
#[derive(Debug, Clone, Copy)]
pub struct CallPolicy {
    timeout: Duration,
    read_retries: u32,
    retry_delay: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        CallPolicy {
            timeout: Duration::from_secs(10),
            read_retries: 1,
            retry_delay: Duration::from_millis(250),
        }
    }
}

impl CallPolicy {
    pub fn new(timeout: Duration, read_retries: u32, retry_delay: Duration) -> Self {
        CallPolicy {
            timeout,
            read_retries: read_retries.min(1),
            retry_delay,
        }
    }

    pub fn from_config(config: &DirectoryConfig) -> Self {
        Self::new(
            Duration::from_secs(config.timeout),
            config.read_retries,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn read_retries(&self) -> u32 {
        self.read_retries
    }

    /// Run an idempotent call, retrying once on a transient failure
    pub async fn read<T, E, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, CallFailure<E>>
    where
        E: Transient + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.read_retries + 1;
        let mut attempt = 1;

        loop {
            debug!("{} (attempt {}/{})", operation, attempt, attempts);

            let failure = match self.bounded(call()).await {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            if attempt >= attempts || !failure.is_transient() {
                return Err(failure);
            }

            warn!(
                "{} failed (attempt {}/{}): {}",
                operation,
                attempt,
                attempts,
                describe(&failure)
            );
            debug!("Waiting {:?} before retry", self.retry_delay);
            sleep(self.retry_delay).await;
            attempt += 1;
        }
    }

    /// Run a non-idempotent call once
    pub async fn write<T, E, Fut>(&self, operation: &str, call: Fut) -> Result<T, CallFailure<E>>
    where
        E: std::fmt::Display,
        Fut: Future<Output = Result<T, E>>,
    {
        debug!("{}", operation);
        let result = self.bounded(call).await;
        if let Err(failure) = &result {
            warn!("{} failed: {}", operation, describe(failure));
        }
        result
    }

    async fn bounded<T, E, Fut>(&self, call: Fut) -> Result<T, CallFailure<E>>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        match timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CallFailure::Failed(e)),
            Err(_) => Err(CallFailure::Timeout(self.timeout)),
        }
    }
}

fn describe<E: std::fmt::Display>(failure: &CallFailure<E>) -> String {
    match failure {
        CallFailure::Timeout(limit) => format!("timed out after {:?}", limit),
        CallFailure::Failed(e) => e.to_string(),
    }
}
