//! Poll loop and backoff schedule for submitted analyses.
//!
//! No matter how large the timeout budget, at most [`MAX_POLLS`] status
//! checks happen per submission. Successive waits grow quadratically:
//! attempt `i` waits `(c * i)^2` ms where `c = sqrt(remaining) / sqrt(385)`,
//! 385 being the sum of squares 1..=10, so the unclamped schedule spends
//! exactly the remaining budget across the 10 attempts.
//!
//! The timeout budget is inclusive of the initial delay: `remaining` is
//! `timeout - initial_delay`, clamped at zero.

use std::time::{Duration, Instant};

use crate::core::models::AnalysisStatus;
use crate::error::{Error, Result};
use crate::util::time::humanize_ms;

/// Maximum number of status checks per poll run.
pub const MAX_POLLS: u32 = 10;

/// Sum of squares 1^2 + 2^2 + ... + 10^2, the normalizer that makes the
/// schedule total `remaining` (solve `remaining = sum((c*i)^2)` for `c`).
const SUM_OF_SQUARES: f64 = 385.0;

/// Default total poll budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timing knobs for a poll run.
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Total budget, inclusive of `initial_delay`.
    pub timeout: Duration,
    /// Wait before the first status check. Useful when submission already
    /// told us the job was not a cache hit.
    pub initial_delay: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            initial_delay: Duration::ZERO,
        }
    }
}

/// The scale constant `c` for a remaining budget in milliseconds.
#[must_use]
pub fn backoff_coefficient(remaining_ms: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let remaining = remaining_ms as f64;
    remaining.sqrt() / SUM_OF_SQUARES.sqrt()
}

/// Unclamped wait before attempt `i` (1-based), in milliseconds.
#[must_use]
pub fn poll_step_ms(coefficient: f64, attempt: u32) -> f64 {
    (coefficient * f64::from(attempt)).powi(2)
}

/// Poll `check_status` until the job finishes, then return `fetch_issues`.
///
/// The two callbacks are invoked once per attempt at most; each carries its
/// own auth-retry policy, so a 401 mid-poll refreshes and retries that
/// attempt alone rather than restarting the run.
///
/// # Errors
///
/// [`Error::Timeout`] when the budget elapses, [`Error::MaxPollsExceeded`]
/// when all attempts are spent, [`Error::AnalysisFailed`] when the server
/// reports the job errored, plus whatever the callbacks surface.
pub async fn poll<S, SF, I, IF, T>(
    uuid: &str,
    options: PollOptions,
    mut check_status: S,
    mut fetch_issues: I,
) -> Result<T>
where
    S: FnMut() -> SF,
    SF: Future<Output = Result<AnalysisStatus>>,
    I: FnMut() -> IF,
    IF: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let timeout = options.timeout;

    if !options.initial_delay.is_zero() {
        tracing::debug!(
            uuid,
            delay_ms = options.initial_delay.as_millis() as u64,
            "waiting before first status check"
        );
        tokio::time::sleep(options.initial_delay).await;
    }

    // In theory timeout - initial_delay > 0; saturate anyway.
    let remaining = timeout.saturating_sub(options.initial_delay);
    let coefficient = backoff_coefficient(u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX));

    let mut last_status = AnalysisStatus::Other("unknown".to_string());

    for attempt in 1..=MAX_POLLS {
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(timeout_error(elapsed, &last_status, uuid));
        }

        let step = Duration::from_secs_f64(poll_step_ms(coefficient, attempt) / 1000.0);
        let wait = step.min(timeout.saturating_sub(elapsed));
        tracing::debug!(
            uuid,
            attempt,
            wait_ms = wait.as_millis() as u64,
            status = %last_status,
            "poll backoff"
        );
        tokio::time::sleep(wait).await;

        last_status = check_status().await?;
        match &last_status {
            AnalysisStatus::Finished => return fetch_issues().await,
            AnalysisStatus::Error => {
                return Err(Error::AnalysisFailed {
                    uuid: uuid.to_string(),
                });
            }
            _ => {}
        }
    }

    Err(Error::MaxPollsExceeded {
        attempts: MAX_POLLS,
        elapsed: humanize_ms(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)),
        status: last_status.as_str().to_lowercase(),
        uuid: uuid.to_string(),
    })
}

fn timeout_error(elapsed: Duration, status: &AnalysisStatus, uuid: &str) -> Error {
    Error::Timeout {
        elapsed: humanize_ms(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)),
        status: status.as_str().to_lowercase(),
        uuid: uuid.to_string(),
    }
}
