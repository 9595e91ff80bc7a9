//! Bounded waits.
//!
//! Every wait for an external condition (HTTP reachable, log marker present)
//! is an explicit budget: a number of attempts, the pause between them, and
//! what running out means.

use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// What exhausting a budget means to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Abort the sequence.
    Fatal,
    /// Warn, assume a default and continue.
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaitBudget {
    pub attempts: u32,
    pub interval: Duration,
    pub policy: TimeoutPolicy,
}

impl WaitBudget {
    pub fn fatal(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts,
            interval,
            policy: TimeoutPolicy::Fatal,
        }
    }

    pub fn soft(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts,
            interval,
            policy: TimeoutPolicy::Soft,
        }
    }

    /// Upper bound on the time spent sleeping between attempts.
    pub fn total_wait(&self) -> Duration {
        self.interval * self.attempts.saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// The condition held on attempt `attempt` (1-based).
    Satisfied { attempt: u32, value: T },
    /// Every attempt was used without the condition holding.
    Exhausted { attempts: u32, policy: TimeoutPolicy },
}

impl<T> WaitOutcome<T> {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, WaitOutcome::Satisfied { .. })
    }
}

/// Run `attempt` up to `budget.attempts` times, sleeping `budget.interval`
/// between attempts, until it yields `Some`.
///
/// Each attempt completes before the next one starts. There is no early
/// cancellation: only an error from `attempt` ends the wait before the budget
/// is spent.
pub async fn poll_until<T, E, F, Fut>(
    what: &str,
    budget: WaitBudget,
    mut attempt: F,
) -> Result<WaitOutcome<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    for n in 1..=budget.attempts {
        if let Some(value) = attempt(n).await? {
            debug!("{}: satisfied on attempt {}/{}", what, n, budget.attempts);
            return Ok(WaitOutcome::Satisfied { attempt: n, value });
        }

        debug!("{}: attempt {}/{} not yet", what, n, budget.attempts);
        if n < budget.attempts {
            sleep(budget.interval).await;
        }
    }

    Ok(WaitOutcome::Exhausted {
        attempts: budget.attempts,
        policy: budget.policy,
    })
}
