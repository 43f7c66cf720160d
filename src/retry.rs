//! Repeated attempts.
//!
//! [`Retry`] re-invokes a unit of work until it succeeds, fails with an
//! exception outside its filter, or a stop condition fires. Stop conditions
//! are checked after every matched failure, in order: the attempt bound, the
//! time budget (elapsed time plus the pending delay), then cancellation. On
//! stopping, the most recent exception is returned unchanged.
//!
//! The configured delay is a floor on the spacing between attempt starts: a
//! failed attempt that took longer than the delay is retried immediately.
//! Synchronous units sleep the thread between attempts; asynchronous units
//! wait on the tokio timer.
//!
//! ```
//! use std::cell::Cell;
//!
//! use exceptionx::{Exception, PolicyBuilder, Retry, kinds};
//!
//! let calls = Cell::new(0);
//! let retry = Retry::builder(&kinds::TIMEOUT_ERROR)
//!     .max_attempts(3)
//!     .silent(true)
//!     .build()
//!     .expect("valid policy");
//! let result = retry.call(|| {
//!     calls.set(calls.get() + 1);
//!     if calls.get() < 3 {
//!         return Err(Exception::new(&kinds::TIMEOUT_ERROR, "slow"));
//!     }
//!     Ok("done")
//! });
//! assert_eq!(result.unwrap(), "done");
//! assert_eq!(calls.get(), 3);
//! ```

use std::{
    future::Future,
    num::NonZeroU32,
    sync::Arc,
    time::{Duration, Instant},
};

use futures::{FutureExt, future::BoxFuture};
use tokio_util::sync::CancellationToken;

use crate::{
    duration::Interval,
    error::ConfigError,
    exception::Exception,
    panic,
    policy::{CommonOptions, Core, KindFilter, PolicyBuilder},
};

mod attempt;
mod progress;

use attempt::{RetryLoop, Step};
pub use progress::{LONG_DELAY_THRESHOLD, RATE_LIMIT_MIN_ATTEMPTS, RATE_LIMIT_WINDOW};

/// A reusable retry policy.
///
/// Retry only reports progress and propagates; it has no fallback, callback
/// or exit disposition. Wrap a retried unit in a [`TryExcept`](crate::TryExcept)
/// to dispose of the final failure.
#[derive(Clone, Debug)]
pub struct Retry {
    core: Core,
    delay: Duration,
    max_attempts: Option<NonZeroU32>,
    time_budget: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl Retry {
    /// Start configuring a policy retrying exceptions in `filter`.
    pub fn builder(filter: impl Into<KindFilter>) -> RetryBuilder {
        RetryBuilder {
            common: CommonOptions::new(filter.into()),
            delay: Interval::ZERO,
            max_attempts: 0,
            time_budget: Interval::ZERO,
            cancel: None,
        }
    }

    /// Minimum spacing between attempt starts.
    #[must_use]
    pub fn delay(&self) -> Duration { self.delay }

    /// Attempt bound; `None` when unbounded.
    #[must_use]
    pub fn max_attempts(&self) -> Option<NonZeroU32> { self.max_attempts }

    /// Wall-clock budget for the whole loop; `None` when unbounded.
    #[must_use]
    pub fn time_budget(&self) -> Option<Duration> { self.time_budget }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Run `unit` until it succeeds or the policy gives up.
    ///
    /// # Errors
    ///
    /// Returns the first exception outside the filter, or the last matched
    /// exception once a stop condition fires.
    pub fn call<T, W>(&self, mut unit: W) -> Result<T, Exception>
    where
        W: FnMut() -> Result<T, Exception>,
    {
        self.run(std::any::type_name::<W>(), &mut unit)
    }

    /// Run the futures produced by `unit` until one succeeds or the policy
    /// gives up. The inter-attempt delay is a tokio sleep that ends early if
    /// the cancellation token fires.
    ///
    /// # Errors
    ///
    /// As for [`call`](Self::call).
    ///
    /// # Panics
    ///
    /// Panics if a failed attempt is retried outside a tokio runtime with the
    /// time driver enabled.
    pub async fn call_async<T, W, Fut>(&self, mut unit: W) -> Result<T, Exception>
    where
        W: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Exception>>,
    {
        self.run_async(std::any::type_name::<W>(), &mut unit).await
    }

    /// Bind this policy to `unit`, producing a retried function.
    pub fn wrap<T, F>(self, unit: F) -> impl Fn() -> Result<T, Exception>
    where
        F: Fn() -> Result<T, Exception>,
    {
        let name = std::any::type_name::<F>();
        move || self.run(name, &mut &unit)
    }

    /// Bind this policy to an asynchronous `unit`.
    ///
    /// # Panics
    ///
    /// The returned futures panic when they retry outside a tokio runtime
    /// with the time driver enabled.
    pub fn wrap_async<T, F, Fut>(self, unit: F) -> impl Fn() -> BoxFuture<'static, Result<T, Exception>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Exception>> + Send + 'static,
        T: Send + 'static,
    {
        let name = std::any::type_name::<F>();
        let policy = Arc::new(self);
        let unit = Arc::new(unit);
        move || {
            let policy = Arc::clone(&policy);
            let unit = Arc::clone(&unit);
            async move {
                let mut attempt = move || unit();
                policy.run_async(name, &mut attempt).await
            }
            .boxed()
        }
    }

    fn run<T, W>(&self, name: &'static str, unit: &mut W) -> Result<T, Exception>
    where
        W: FnMut() -> Result<T, Exception>,
    {
        let mut state = RetryLoop::new(self, Instant::now());
        loop {
            let started = Instant::now();
            let outcome = if self.core.catch_panics {
                panic::catch(&mut *unit, name)
            } else {
                unit()
            };
            let exception = match outcome {
                Ok(value) => return Ok(value),
                Err(exception) if self.core.matcher.matches(&exception) => exception,
                Err(exception) => return Err(exception),
            };
            match state.fail(&exception, started, Instant::now()) {
                Step::Stop => return Err(exception),
                Step::Wait(delay) => {
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    if state.cancelled_while_waiting(&exception) {
                        return Err(exception);
                    }
                }
            }
        }
    }

    async fn run_async<T, W, Fut>(&self, name: &'static str, unit: &mut W) -> Result<T, Exception>
    where
        W: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Exception>>,
    {
        let mut state = RetryLoop::new(self, now());
        loop {
            let started = now();
            let outcome = if self.core.catch_panics {
                panic::catch_async(async { unit().await }, name).await
            } else {
                unit().await
            };
            let exception = match outcome {
                Ok(value) => return Ok(value),
                Err(exception) if self.core.matcher.matches(&exception) => exception,
                Err(exception) => return Err(exception),
            };
            match state.fail(&exception, started, now()) {
                Step::Stop => return Err(exception),
                Step::Wait(delay) => {
                    self.wait(delay).await;
                    if state.cancelled_while_waiting(&exception) {
                        return Err(exception);
                    }
                }
            }
        }
    }

    async fn wait(&self, delay: Duration) {
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = token.cancelled() => {}
                }
            }
            None if delay.is_zero() => tokio::task::yield_now().await,
            None => tokio::time::sleep(delay).await,
        }
    }
}

impl Default for Retry {
    /// Retry every exception, forever, without delay or diagnostics.
    fn default() -> Self {
        Self {
            core: CommonOptions::new(KindFilter::any()).silenced().into_core(),
            delay: Duration::ZERO,
            max_attempts: None,
            time_budget: None,
            cancel: None,
        }
    }
}

/// Reads the tokio clock so paused-time tests observe virtual time.
fn now() -> Instant { tokio::time::Instant::now().into_std() }

/// Builder for [`Retry`].
#[derive(Clone)]
#[must_use]
pub struct RetryBuilder {
    common: CommonOptions,
    delay: Interval,
    max_attempts: u32,
    time_budget: Interval,
    cancel: Option<CancellationToken>,
}

impl RetryBuilder {
    /// Minimum spacing between attempt starts. Defaults to zero.
    pub fn delay(mut self, delay: impl Into<Interval>) -> Self {
        self.delay = delay.into();
        self
    }

    /// Give up after `max_attempts` matched failures; `0` means unbounded.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Give up once elapsed time plus the pending delay would reach
    /// `budget`; zero means unbounded.
    pub fn time_budget(mut self, budget: impl Into<Interval>) -> Self {
        self.time_budget = budget.into();
        self
    }

    /// Stop retrying once `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Validate the options and build the policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an interval is negative, non-finite or
    /// malformed, or if the kind filter is empty.
    pub fn build(self) -> Result<Retry, ConfigError> {
        let delay = self.delay.resolve("delay")?;
        let time_budget = self.time_budget.resolve("time_budget")?;
        Ok(Retry {
            core: self.common.finish()?,
            delay,
            max_attempts: NonZeroU32::new(self.max_attempts),
            time_budget: (!time_budget.is_zero()).then_some(time_budget),
            cancel: self.cancel,
        })
    }
}

impl PolicyBuilder for RetryBuilder {
    fn common(&mut self) -> &mut CommonOptions { &mut self.common }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rstest::rstest;

    use super::*;
    use crate::kinds;

    #[rstest]
    #[case(Retry::builder(&kinds::ERROR).delay(-0.5))]
    #[case(Retry::builder(&kinds::ERROR).time_budget(f64::INFINITY))]
    #[case(Retry::builder(&kinds::ERROR).delay("soon"))]
    fn invalid_intervals_fail_fast(#[case] builder: RetryBuilder) {
        assert!(builder.build().is_err());
    }

    #[test]
    fn zero_bounds_mean_unbounded() {
        let retry = Retry::builder(&kinds::ERROR)
            .max_attempts(0)
            .time_budget(Duration::ZERO)
            .build()
            .expect("valid");
        assert_eq!(retry.max_attempts(), None);
        assert_eq!(retry.time_budget(), None);
    }

    #[test]
    fn string_intervals_are_parsed() {
        let retry = Retry::builder(&kinds::ERROR)
            .delay("1.5m")
            .time_budget("1h")
            .build()
            .expect("valid");
        assert_eq!(retry.delay(), Duration::from_secs(90));
        assert_eq!(retry.time_budget(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn default_retries_until_success() {
        let calls = Cell::new(0);
        let value = Retry::default()
            .call(|| {
                calls.set(calls.get() + 1);
                if calls.get() < 5 {
                    return Err(Exception::new(&kinds::OS_ERROR, "flaky"));
                }
                Ok(calls.get())
            })
            .expect("eventually succeeds");
        assert_eq!(value, 5);
    }

    #[test]
    fn cancelled_token_stops_after_first_failure() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = Cell::new(0);
        let retry = Retry::builder(&kinds::LOOKUP_ERROR)
            .silent(true)
            .cancel_on(token)
            .build()
            .expect("valid");
        let err = retry
            .call(|| -> Result<(), Exception> {
                calls.set(calls.get() + 1);
                Err(Exception::new(&kinds::KEY_ERROR, "gone"))
            })
            .expect_err("cancelled");
        assert!(err.is(&kinds::KEY_ERROR));
        assert_eq!(calls.get(), 1);
    }
}
