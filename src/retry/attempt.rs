//! Per-invocation retry state.
//!
//! [`RetryLoop`] is created when a retried call starts and is fed every
//! matched failure. It counts attempts, reports progress and decides whether
//! the loop waits or stops. It never reads the clock itself; callers pass
//! the instants they observed, so the synchronous loop can use the system
//! clock and the asynchronous loop the tokio clock.

use std::time::{Duration, Instant};

use super::{Retry, progress};
use crate::exception::Exception;

/// One matched failure.
#[derive(Clone, Copy, Debug)]
pub(super) struct Attempt {
    /// One-based attempt number.
    pub(super) number: u32,
    /// How long the failed attempt ran.
    pub(super) duration: Duration,
    /// Time since the loop started.
    pub(super) spent: Duration,
}

/// Why a loop gave up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StopReason {
    Exhausted,
    OutOfTime,
    Cancelled,
}

/// What the loop does after a matched failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Step {
    /// Sleep for the remaining delay, then try again.
    Wait(Duration),
    /// Return the failure to the caller.
    Stop,
}

pub(super) struct RetryLoop<'a> {
    retry: &'a Retry,
    started: Instant,
    attempts: u32,
    unreported: Option<Attempt>,
}

impl<'a> RetryLoop<'a> {
    pub(super) fn new(retry: &'a Retry, started: Instant) -> Self {
        Self {
            retry,
            started,
            attempts: 0,
            unreported: None,
        }
    }

    /// Record a matched failure of the attempt begun at `attempt_started`
    /// and observed at `now`.
    pub(super) fn fail(&mut self, exception: &Exception, attempt_started: Instant, now: Instant) -> Step {
        self.attempts = self.attempts.saturating_add(1);
        let attempt = Attempt {
            number: self.attempts,
            duration: now.saturating_duration_since(attempt_started),
            spent: now.saturating_duration_since(self.started),
        };
        let wait = self.retry.delay.saturating_sub(attempt.duration);
        let cancelled = self.retry.is_cancelled();
        let stop = self.stop_reason(&attempt, wait, cancelled);

        let reported = stop.is_some() || !progress::is_throttled(self.retry, &attempt, cancelled);
        if reported {
            self.report(exception, &attempt, cancelled);
        }
        self.unreported = (!reported).then_some(attempt);

        match stop {
            Some(reason) => {
                tracing::debug!(
                    attempt = attempt.number,
                    ?reason,
                    kind = exception.kind().name(),
                    "retry loop stopping"
                );
                Step::Stop
            }
            None => {
                tracing::trace!(attempt = attempt.number, ?wait, "retrying");
                Step::Wait(wait)
            }
        }
    }

    fn stop_reason(&self, attempt: &Attempt, wait: Duration, cancelled: bool) -> Option<StopReason> {
        if self
            .retry
            .max_attempts
            .is_some_and(|max| attempt.number >= max.get())
        {
            Some(StopReason::Exhausted)
        } else if self
            .retry
            .time_budget
            .is_some_and(|budget| attempt.spent.saturating_add(wait) >= budget)
        {
            Some(StopReason::OutOfTime)
        } else if cancelled {
            Some(StopReason::Cancelled)
        } else {
            None
        }
    }

    /// True if the token fired during the last wait; the next attempt must
    /// not start.
    ///
    /// The failed attempt becomes the final one, so its progress line is
    /// written now if throttling dropped it earlier.
    pub(super) fn cancelled_while_waiting(&mut self, exception: &Exception) -> bool {
        if !self.retry.is_cancelled() {
            return false;
        }
        if let Some(attempt) = self.unreported.take() {
            self.report(exception, &attempt, true);
        }
        tracing::debug!(
            attempt = self.attempts,
            reason = ?StopReason::Cancelled,
            "retry loop stopping"
        );
        true
    }

    fn report(&self, exception: &Exception, attempt: &Attempt, cancelled: bool) {
        let reporting = &self.retry.core.reporting;
        if reporting.silent {
            return;
        }
        let prefix = progress::prefix(self.retry, attempt, cancelled);
        reporting
            .sink()
            .warning(&format!("{prefix} {}", reporting.describe(exception)));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{kinds, policy::PolicyBuilder, sink::DiagnosticSink};

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl Lines {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().expect("lines lock"))
        }
    }

    impl DiagnosticSink for Lines {
        fn error(&self, message: &str) { panic!("unexpected error line: {message}") }

        fn warning(&self, message: &str) { self.0.lock().expect("lines lock").push(message.to_owned()); }
    }

    fn failure() -> Exception { Exception::new(&kinds::RUNTIME_ERROR, "down") }

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    #[test]
    fn attempt_bound_stops_on_last_attempt() {
        let retry = Retry::builder(&kinds::EXCEPTION)
            .max_attempts(3)
            .silent(true)
            .build()
            .expect("valid");
        let t0 = Instant::now();
        let mut state = RetryLoop::new(&retry, t0);
        assert_eq!(state.fail(&failure(), t0, t0), Step::Wait(Duration::ZERO));
        assert_eq!(state.fail(&failure(), t0, t0), Step::Wait(Duration::ZERO));
        assert_eq!(state.fail(&failure(), t0, t0), Step::Stop);
    }

    #[test]
    fn delay_is_reduced_by_attempt_duration() {
        let retry = Retry::builder(&kinds::EXCEPTION)
            .delay(Duration::from_secs(1))
            .silent(true)
            .build()
            .expect("valid");
        let t0 = Instant::now();
        let mut state = RetryLoop::new(&retry, t0);
        assert_eq!(state.fail(&failure(), t0, t0 + ms(300)), Step::Wait(ms(700)));
        assert_eq!(state.fail(&failure(), t0, t0 + ms(2_000)), Step::Wait(Duration::ZERO));
    }

    #[test]
    fn budget_counts_pending_delay() {
        let retry = Retry::builder(&kinds::EXCEPTION)
            .delay(0.03)
            .time_budget(0.1)
            .silent(true)
            .build()
            .expect("valid");
        let t0 = Instant::now();
        let mut state = RetryLoop::new(&retry, t0);
        let mut attempts = 0;
        let mut start = t0;
        loop {
            attempts += 1;
            match state.fail(&failure(), start, start) {
                Step::Wait(wait) => start += wait,
                Step::Stop => break,
            }
        }
        assert_eq!(attempts, 4);
    }

    #[test]
    fn fast_loop_with_large_bound_logs_first_and_final_attempts() {
        let lines = Arc::new(Lines::default());
        let retry = Retry::builder(&kinds::EXCEPTION)
            .max_attempts(50)
            .sink(Arc::clone(&lines))
            .build()
            .expect("valid");
        let t0 = Instant::now();
        let mut state = RetryLoop::new(&retry, t0);
        while state.fail(&failure(), t0, t0) != Step::Stop {}
        let lines = lines.take();
        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(lines[0].starts_with("[try:1/50:0] ["), "{}", lines[0]);
        assert!(lines[1].starts_with("[try:50/50:0] ["), "{}", lines[1]);
        assert!(lines[1].ends_with(".RuntimeError] down"), "{}", lines[1]);
    }

    #[test]
    fn small_bound_logs_every_attempt() {
        let lines = Arc::new(Lines::default());
        let retry = Retry::builder(&kinds::EXCEPTION)
            .max_attempts(5)
            .sink(Arc::clone(&lines))
            .build()
            .expect("valid");
        let t0 = Instant::now();
        let mut state = RetryLoop::new(&retry, t0);
        while state.fail(&failure(), t0, t0) != Step::Stop {}
        assert_eq!(lines.take().len(), 5);
    }

    #[test]
    fn throttled_attempt_is_reported_when_cancelled_during_its_wait() {
        let token = CancellationToken::new();
        let lines = Arc::new(Lines::default());
        let retry = Retry::builder(&kinds::EXCEPTION)
            .cancel_on(token.clone())
            .sink(Arc::clone(&lines))
            .build()
            .expect("valid");
        let t0 = Instant::now();
        let mut state = RetryLoop::new(&retry, t0);
        assert_eq!(state.fail(&failure(), t0, t0), Step::Wait(Duration::ZERO));
        assert_eq!(state.fail(&failure(), t0, t0), Step::Wait(Duration::ZERO));
        assert_eq!(lines.take().len(), 1, "second attempt is throttled");

        token.cancel();
        assert!(state.cancelled_while_waiting(&failure()));
        let lines = lines.take();
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].starts_with("[try:2/N:0,cancelled:true] ["), "{}", lines[0]);
    }

    #[test]
    fn maximal_delay_and_budget_stop_without_overflow() {
        let lines = Arc::new(Lines::default());
        let retry = Retry::builder(&kinds::EXCEPTION)
            .delay(Duration::MAX)
            .time_budget(Duration::MAX)
            .sink(Arc::clone(&lines))
            .build()
            .expect("valid");
        let t0 = Instant::now();
        let mut state = RetryLoop::new(&retry, t0);
        assert_eq!(state.fail(&failure(), t0, t0 + ms(5)), Step::Stop);
        assert_eq!(lines.take().len(), 1);
    }

    #[test]
    fn cancellation_stops_after_bound_and_budget_checks() {
        let token = CancellationToken::new();
        let lines = Arc::new(Lines::default());
        let retry = Retry::builder(&kinds::EXCEPTION)
            .cancel_on(token.clone())
            .sink(Arc::clone(&lines))
            .build()
            .expect("valid");
        let t0 = Instant::now();
        let mut state = RetryLoop::new(&retry, t0);
        assert_eq!(state.fail(&failure(), t0, t0), Step::Wait(Duration::ZERO));
        assert!(!state.cancelled_while_waiting(&failure()));
        token.cancel();
        assert!(state.cancelled_while_waiting(&failure()));
        assert_eq!(state.fail(&failure(), t0, t0), Step::Stop);
        let lines = lines.take();
        assert!(lines[0].starts_with("[try:1/N:0,cancelled:false]"), "{}", lines[0]);
        assert!(lines[1].starts_with("[try:2/N:0,cancelled:true]"), "{}", lines[1]);
    }
}
