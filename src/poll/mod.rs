// ABOUTME: Bounded retry-with-delay polling for eventually-consistent state.
// ABOUTME: A probe reports ready, not-yet-ready, or a hard error that stops polling.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::config::PollSettings;

/// What a single probe invocation observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness<T, P = String> {
    Ready(T),
    /// Not there yet; carries the observed state for diagnostics.
    NotReady(P),
}

#[derive(Debug, thiserror::Error)]
pub enum PollError<E> {
    /// The probe reported a hard error. No further attempts were made.
    #[error("{operation} failed on attempt {attempt}: {source}")]
    Failed {
        operation: String,
        attempt: u32,
        #[source]
        source: E,
    },

    /// The attempt budget ran out before the probe reported ready.
    #[error("{operation} not ready after {attempts} attempts (last state: {last_state})")]
    TimeoutExceeded {
        operation: String,
        attempts: u32,
        last_state: String,
    },
}

/// Invokes a probe up to `max_attempts` times, sleeping `interval` between
/// attempts (never after the last one).
///
/// Probes must be idempotent and side-effect free; they are re-invoked
/// verbatim on every attempt.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessPoller {
    interval: Duration,
    max_attempts: u32,
}

impl ReadinessPoller {
    /// A zero budget is clamped to a single attempt.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn poll<T, P, E, F, Fut>(&self, operation: &str, probe: F) -> Result<T, PollError<E>>
    where
        P: fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Readiness<T, P>, E>>,
    {
        self.poll_with(operation, probe, |_, _| {}).await
    }

    /// Like `poll`, calling `on_pending` with the attempt number and observed
    /// state after every not-ready attempt.
    pub async fn poll_with<T, P, E, F, Fut, G>(
        &self,
        operation: &str,
        mut probe: F,
        mut on_pending: G,
    ) -> Result<T, PollError<E>>
    where
        P: fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Readiness<T, P>, E>>,
        G: FnMut(u32, &P),
    {
        let mut last_state = String::from("never polled");

        for attempt in 1..=self.max_attempts {
            match probe(attempt).await {
                Ok(Readiness::Ready(value)) => {
                    tracing::debug!(operation, attempt, "ready");
                    return Ok(value);
                }
                Ok(Readiness::NotReady(state)) => {
                    tracing::debug!(operation, attempt, state = %state, "not ready");
                    on_pending(attempt, &state);
                    last_state = state.to_string();
                }
                Err(source) => {
                    return Err(PollError::Failed {
                        operation: operation.to_string(),
                        attempt,
                        source,
                    });
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(PollError::TimeoutExceeded {
            operation: operation.to_string(),
            attempts: self.max_attempts,
            last_state,
        })
    }
}

impl From<PollSettings> for ReadinessPoller {
    fn from(settings: PollSettings) -> Self {
        Self::new(settings.interval, settings.max_attempts)
    }
}
