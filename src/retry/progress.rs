//! Retry progress lines and their rate limiting.
//!
//! Each matched failure may produce one line of the form
//!
//! ```text
//! [try:<n>/<max|N>:<delay>[,limit_time:<spent>/<budget>][,cancelled:<bool>]] <diagnostic>
//! ```
//!
//! Fast loops with a large or unbounded attempt bound would flood the sink,
//! so intermediate lines are dropped while attempt time plus delay stays
//! under [`RATE_LIMIT_WINDOW`].

use std::{fmt::Write as _, time::Duration};

use super::{Retry, attempt::Attempt};
use crate::duration::{format, plain_seconds, round_centis};

/// Attempts faster than this (including the delay) are candidates for
/// suppression.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_millis(100);

/// Bounds below this always log every attempt.
pub const RATE_LIMIT_MIN_ATTEMPTS: u32 = 30;

/// Delays at or above this render as a duration string even without a time
/// budget.
pub const LONG_DELAY_THRESHOLD: Duration = Duration::from_secs(90);

/// With whole-second delay and budget, attempts at least this long
/// (including the delay) report spent time in whole seconds.
const WHOLE_SECONDS_AFTER: Duration = Duration::from_secs(3);

/// True if the progress line for `attempt` should be dropped.
///
/// The first attempt, the last attempt of a bounded loop and any attempt
/// observed with the cancellation token set are never dropped.
pub(super) fn is_throttled(retry: &Retry, attempt: &Attempt, cancelled: bool) -> bool {
    let fast = attempt.duration.saturating_add(retry.delay) < RATE_LIMIT_WINDOW;
    let many = retry
        .max_attempts
        .is_none_or(|max| max.get() >= RATE_LIMIT_MIN_ATTEMPTS);
    let intermediate = attempt.number > 1
        && retry
            .max_attempts
            .is_none_or(|max| attempt.number < max.get());
    fast && many && intermediate && !cancelled
}

/// The bracketed `[try:...]` prefix for `attempt`.
pub(super) fn prefix(retry: &Retry, attempt: &Attempt, cancelled: bool) -> String {
    let bound = retry
        .max_attempts
        .map_or_else(|| "N".to_owned(), |max| max.to_string());
    let mut out = format!("[try:{}/{bound}", attempt.number);
    let _ = match retry.time_budget {
        Some(budget) => write!(
            out,
            ":{},limit_time:{}/{}",
            format(retry.delay),
            format(spent(retry, attempt, budget)),
            format(budget)
        ),
        None if retry.delay >= LONG_DELAY_THRESHOLD => write!(out, ":{}", format(retry.delay)),
        None => write!(out, ":{}", plain_seconds(retry.delay)),
    };
    if retry.cancel.is_some() {
        let _ = write!(out, ",cancelled:{cancelled}");
    }
    out.push(']');
    out
}

/// Time spent so far, rounded for display.
fn spent(retry: &Retry, attempt: &Attempt, budget: Duration) -> Duration {
    let whole = retry.delay.subsec_nanos() == 0 && budget.subsec_nanos() == 0;
    if whole && attempt.duration.saturating_add(retry.delay) >= WHOLE_SECONDS_AFTER {
        let round_up = u64::from(attempt.spent.subsec_nanos() >= 500_000_000);
        Duration::from_secs(attempt.spent.as_secs().saturating_add(round_up))
    } else {
        round_centis(attempt.spent)
    }
}
