//! Re-issuing failed page fetches.
//!
//! The cursor never retries on its own. Wrap a fetcher in [`Retrying`] to
//! give every `(page_size, offset)` call a bounded number of attempts, with
//! exponential backoff between them. A fetch is a read at a fixed offset, so
//! issuing it again returns the same page as long as the source is stable.

use crate::fetch::{AsyncPageFetcher, PageFetcher};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Whether a failed fetch may be issued again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Classified as permanent; the fetch was not repeated.
    #[error("{0}")]
    Fatal(E),
    /// Still failing after every attempt the policy allows.
    #[error("Page fetch failed after {attempts} attempts: {source}")]
    AttemptsExceeded { attempts: usize, source: E },
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(source) | RetryError::AttemptsExceeded { source, .. } => source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// At least one attempt is always made; a zero `max_delay` means "no
    /// growth past `base_delay`".
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: if max_delay.is_zero() {
                base_delay
            } else {
                max_delay
            },
        }
    }

    /// Five attempts, 250 ms doubling up to 5 s.
    pub fn for_database() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }

    /// The waits between attempts for one fetch, in order.
    pub fn delays(&self) -> Backoff {
        Backoff {
            base: self.base_delay,
            max: self.max_delay,
            retry: 0,
            remaining: self.max_attempts.saturating_sub(1),
        }
    }
}

/// Delay schedule for a single fetch: `base * 2^n` capped at the policy
/// maximum, with the exponent capped at 6. Yields one item per retry left.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    retry: u32,
    remaining: usize,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let delay = self.base.saturating_mul(1u32 << self.retry.min(6)).min(self.max);
        self.retry += 1;
        Some(delay)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Backoff {}

/// Fetcher decorator: a failed `(page_size, offset)` call is issued again,
/// unchanged, until it succeeds, the classifier says stop, or the policy
/// runs out of attempts.
pub struct Retrying<F, C> {
    inner: F,
    policy: RetryPolicy,
    classify: C,
}

impl<F, C> Retrying<F, C> {
    pub fn new(inner: F, policy: RetryPolicy, classify: C) -> Self {
        Retrying {
            inner,
            policy,
            classify,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

/// After attempt number `attempt` failed with `err`: how long to wait, or
/// the error to give back to the cursor.
fn wait_before_next<E, C>(
    classify: &C,
    backoff: &mut Backoff,
    attempt: usize,
    err: E,
    page_size: u64,
    offset: u64,
) -> Result<Duration, RetryError<E>>
where
    C: Fn(&E) -> RetryDisposition,
{
    if classify(&err) == RetryDisposition::Stop {
        return Err(RetryError::Fatal(err));
    }

    match backoff.next() {
        Some(delay) => {
            debug!(offset, page_size, attempt, ?delay, "Page fetch failed, retrying");
            Ok(delay)
        }
        None => {
            warn!(offset, page_size, attempts = attempt, "Page fetch still failing, giving up");
            Err(RetryError::AttemptsExceeded {
                attempts: attempt,
                source: err,
            })
        }
    }
}

impl<F, C> PageFetcher for Retrying<F, C>
where
    F: PageFetcher,
    C: Fn(&F::Error) -> RetryDisposition,
{
    type Row = F::Row;
    type Error = RetryError<F::Error>;

    fn fetch_page(&mut self, page_size: u64, offset: u64) -> Result<Vec<Self::Row>, Self::Error> {
        let mut backoff = self.policy.delays();
        let mut attempt = 1;

        loop {
            match self.inner.fetch_page(page_size, offset) {
                Ok(rows) => return Ok(rows),
                Err(err) => {
                    let delay =
                        wait_before_next(&self.classify, &mut backoff, attempt, err, page_size, offset)?;
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl<F, C> AsyncPageFetcher for Retrying<F, C>
where
    F: AsyncPageFetcher,
    C: Fn(&F::Error) -> RetryDisposition + Send + Sync,
{
    type Row = F::Row;
    type Error = RetryError<F::Error>;

    async fn fetch_page(
        &self,
        page_size: u64,
        offset: u64,
    ) -> Result<Vec<Self::Row>, Self::Error> {
        let mut backoff = self.policy.delays();
        let mut attempt = 1;

        loop {
            match self.inner.fetch_page(page_size, offset).await {
                Ok(rows) => return Ok(rows),
                Err(err) => {
                    let delay =
                        wait_before_next(&self.classify, &mut backoff, attempt, err, page_size, offset)?;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(ms: &[u64]) -> Vec<Duration> {
        ms.iter().copied().map(Duration::from_millis).collect()
    }

    #[test]
    fn delays_double_then_cap() {
        let policy = RetryPolicy::new(6, Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(policy.delays().collect::<Vec<_>>(), millis(&[100, 200, 400, 500, 500]));
    }

    #[test]
    fn exponent_stops_growing_after_six_doublings() {
        let policy = RetryPolicy::new(10, Duration::from_millis(1), Duration::from_secs(3600));
        assert_eq!(
            policy.delays().collect::<Vec<_>>(),
            millis(&[1, 2, 4, 8, 16, 32, 64, 64, 64])
        );
    }

    #[test]
    fn one_retry_fewer_than_attempts() {
        assert_eq!(RetryPolicy::default().delays().len(), 2);
        assert_eq!(RetryPolicy::for_database().delays().len(), 4);
        assert_eq!(RetryPolicy::new(1, Duration::from_millis(5), Duration::ZERO).delays().len(), 0);
    }

    #[test]
    fn new_clamps_attempts_and_zero_max_delay() {
        let policy = RetryPolicy::new(0, Duration::from_millis(50), Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.max_delay, Duration::from_millis(50));
    }

    #[test]
    fn stop_wins_over_remaining_attempts() {
        let mut backoff = RetryPolicy::default().delays();
        let result = wait_before_next(&|_: &&str| RetryDisposition::Stop, &mut backoff, 1, "bad sql", 10, 0);
        assert!(matches!(result, Err(RetryError::Fatal("bad sql"))));
        assert_eq!(backoff.len(), 2);
    }

    #[test]
    fn exhausted_schedule_reports_attempts() {
        let mut backoff = RetryPolicy::new(1, Duration::ZERO, Duration::ZERO).delays();
        let result = wait_before_next(&|_: &&str| RetryDisposition::Retry, &mut backoff, 1, "reset", 10, 20);
        match result {
            Err(RetryError::AttemptsExceeded { attempts, source }) => {
                assert_eq!(attempts, 1);
                assert_eq!(source, "reset");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
