//! Idempotent retry executor
//!
//! Wraps a fallible async operation with exponential backoff. The caller
//! supplies the "is this retryable" predicate; anything it rejects is
//! re-raised on first failure without sleeping. An optional observer sees
//! every retry for logging/metrics but cannot alter control flow.

use std::time::Duration;

/// Retry policy: attempt count and backoff shape
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first (not "retries after")
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    /// Per-attempt delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Run `op` under the given policy.
///
/// `is_retryable` is consulted on every failure; `on_retry(attempt, err,
/// delay)` fires before each backoff sleep. The final error is returned
/// unchanged, so callers keep their own error taxonomy.
pub async fn retry<T, E, Op, Fut>(
    policy: &RetryPolicy,
    mut is_retryable: impl FnMut(&E) -> bool,
    mut on_retry: impl FnMut(u32, &E, Duration),
    mut op: Op,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = policy.initial_delay.min(policy.max_delay);
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts || !is_retryable(&err) {
                    return Err(err);
                }
                on_retry(attempt, &err, delay);
                tokio::time::sleep(delay).await;
                delay = delay.mul_f64(policy.multiplier).min(policy.max_delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Timeout,
        Validation,
    }

    fn retryable(err: &TestError) -> bool {
        matches!(err, TestError::Timeout)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let calls = Cell::new(0u32);
        let result = retry(
            &RetryPolicy::default(),
            retryable,
            |_, _, _| {},
            || async {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(TestError::Timeout)
                } else {
                    Ok("done")
                }
            },
        )
        .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_rejects_immediately() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retry(
            &RetryPolicy::default(),
            retryable,
            |_, _, _| panic!("observer must not fire for non-retryable errors"),
            || async {
                calls.set(calls.get() + 1);
                Err(TestError::Validation)
            },
        )
        .await;
        assert_eq!(result, Err(TestError::Validation));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempts() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retry(
            &RetryPolicy::default(),
            retryable,
            |_, _, _| {},
            || async {
                calls.set(calls.get() + 1);
                Err(TestError::Timeout)
            },
        )
        .await;
        assert_eq!(result, Err(TestError::Timeout));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_and_caps() {
        let delays = std::cell::RefCell::new(Vec::new());
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_secs(4),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        };
        let _: Result<(), _> = retry(
            &policy,
            retryable,
            |_, _, delay| delays.borrow_mut().push(delay),
            || async { Err(TestError::Timeout) },
        )
        .await;
        assert_eq!(
            *delays.borrow(),
            vec![
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(10),
                Duration::from_secs(10),
            ]
        );
    }
}
