// ── Convergence poller ──
//
// Bounded wait for an asynchronous remote state to settle. The poller is
// domain-agnostic: the probe decides what "done", "not yet", and "failed"
// mean, and the poller only honours that verdict and the time bound.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

/// Verdict of a single probe invocation.
#[derive(Debug)]
pub enum Probe<E> {
    /// Terminal success; stop polling.
    Done,
    /// Not converged yet. Carries the error observed this attempt, if any,
    /// so a later timeout can report it.
    Retry(Option<E>),
    /// Terminal failure; stop polling and surface the error.
    Fatal(E),
}

/// Why polling stopped without converging.
#[derive(Debug, Error)]
pub enum PollError<E>
where
    E: std::error::Error + 'static,
{
    /// The probe reported a terminal failure.
    #[error(transparent)]
    Failed(E),

    /// The time bound elapsed while the probe still asked for a retry.
    #[error(
        "timed out after {timeout:?} ({attempts} attempts): {}",
        describe_last(.last_error)
    )]
    Timeout {
        timeout: Duration,
        attempts: u32,
        #[source]
        last_error: Option<E>,
    },
}

fn describe_last<E: fmt::Display>(last_error: &Option<E>) -> String {
    match last_error {
        Some(err) => err.to_string(),
        None => "still not converged".into(),
    }
}

/// Invoke `probe` immediately and then every `interval` until it returns a
/// terminal verdict or `timeout` has elapsed. The last sleep is cut short
/// at the deadline, so a long `interval` never stretches the wait.
///
/// A zero `timeout` means "do not retry": the probe runs exactly once and
/// its verdict is returned as-is, with `Retry(None)` counting as success and
/// `Retry(Some(err))` as failure. It never means "wait forever". There is no
/// cancellation hook; only a `Fatal` verdict stops the loop early.
pub async fn poll_until<F, Fut, E>(
    mut probe: F,
    interval: Duration,
    timeout: Duration,
) -> Result<(), PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Probe<E>>,
    E: std::error::Error + 'static,
{
    if timeout.is_zero() {
        debug!("zero poll timeout, probing once");
        return match probe().await {
            Probe::Done | Probe::Retry(None) => Ok(()),
            Probe::Retry(Some(err)) | Probe::Fatal(err) => Err(PollError::Failed(err)),
        };
    }

    let started = Instant::now();
    let deadline = started + timeout;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let last_error = match probe().await {
            Probe::Done => {
                debug!(attempts, elapsed_ms = elapsed_ms(started), "converged");
                return Ok(());
            }
            Probe::Fatal(err) => {
                debug!(attempts, error = %err, "probe failed");
                return Err(PollError::Failed(err));
            }
            Probe::Retry(err) => err,
        };

        debug!(
            attempt = attempts,
            elapsed_ms = elapsed_ms(started),
            error = last_error.as_ref().map(tracing::field::display),
            "not converged yet"
        );

        tokio::time::sleep_until((Instant::now() + interval).min(deadline)).await;

        if Instant::now() >= deadline {
            return Err(PollError::Timeout {
                timeout,
                attempts,
                last_error,
            });
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Interval and bound for one asynchronous lifecycle wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// [`poll_until`] with these settings.
    pub async fn poll<F, Fut, E>(&self, probe: F) -> Result<(), PollError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Probe<E>>,
        E: std::error::Error + 'static,
    {
        poll_until(probe, self.interval, self.timeout).await
    }
}
