//! Guarded execution.
//!
//! [`TryExcept`] runs a unit of work and intercepts matching exceptions:
//! each intercepted exception is reported, handed to the callback and,
//! optionally, ends the process. The caller receives the fallback instead of
//! the error. Exceptions that do not match propagate unchanged, and
//! successful results are returned as-is.
//!
//! ```
//! use exceptionx::{Exception, PolicyBuilder, TryExcept, kinds, raise};
//!
//! fn parse(text: &str) -> Result<i32, Exception> {
//!     if text.is_empty() {
//!         raise!(&kinds::VALUE_ERROR, "empty input");
//!     }
//!     Ok(text.parse()?)
//! }
//!
//! let guard = TryExcept::builder(&kinds::VALUE_ERROR)
//!     .silent(true)
//!     .fallback(-1)
//!     .build()
//!     .expect("valid policy");
//! assert_eq!(guard.call(|| parse("12")).unwrap(), 12);
//! assert_eq!(guard.call(|| parse("")).unwrap(), -1);
//! ```

use std::{future::Future, sync::Arc};

use futures::{FutureExt, future::BoxFuture};

use crate::{
    error::ConfigError,
    exception::Exception,
    panic,
    policy::{
        Absent,
        CommonOptions,
        Core,
        Disposition,
        DisposeConfig,
        DisposeOptions,
        Fallback,
        Invocation,
        KindFilter,
        PolicyBuilder,
        Substitute,
    },
};

/// A reusable guarded-execution policy.
///
/// `B` is the fallback strategy: [`Absent`] (the default) yields
/// `Option<T>`, [`Substitute`] yields `T`. Policies are cheap to clone and may
/// be shared across threads.
#[derive(Clone, Debug)]
pub struct TryExcept<B = Absent> {
    core: Core,
    disposition: Disposition,
    fallback: B,
}

impl TryExcept {
    /// Start configuring a policy intercepting exceptions in `filter`.
    #[must_use]
    pub fn builder(filter: impl Into<KindFilter>) -> TryExceptBuilder {
        TryExceptBuilder {
            common: CommonOptions::new(filter.into()),
            dispose: DisposeConfig::default(),
            fallback: Absent,
        }
    }
}

impl Default for TryExcept {
    /// Intercept every exception, report it to standard error and yield
    /// `None`.
    fn default() -> Self {
        let core = CommonOptions::new(KindFilter::any()).into_core();
        let disposition = DisposeConfig::default().finish(core.reporting.clone());
        Self {
            core,
            disposition,
            fallback: Absent,
        }
    }
}

impl<B> TryExcept<B> {
    /// Run `unit` under this policy.
    ///
    /// # Errors
    ///
    /// Returns the unit's exception when it does not match, or the
    /// callback's error when the callback fails.
    pub fn call<T, W>(&self, unit: W) -> Result<B::Output, Exception>
    where
        W: FnOnce() -> Result<T, Exception>,
        B: Fallback<T>,
    {
        self.guard(Invocation::of::<W>(), unit)
    }

    /// Await the future produced by `unit` under this policy.
    ///
    /// # Errors
    ///
    /// As for [`call`](Self::call).
    pub async fn call_async<T, W, Fut>(&self, unit: W) -> Result<B::Output, Exception>
    where
        W: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Exception>>,
        B: Fallback<T>,
    {
        self.guard_async(Invocation::of::<W>(), unit).await
    }

    /// Bind this policy to `unit`, producing a guarded function that can be
    /// called repeatedly.
    pub fn wrap<T, F>(self, unit: F) -> impl Fn() -> Result<B::Output, Exception>
    where
        F: Fn() -> Result<T, Exception>,
        B: Fallback<T>,
    {
        let invocation = Invocation::of::<F>();
        move || self.guard(invocation, &unit)
    }

    /// Bind this policy to an asynchronous `unit`.
    ///
    /// Each call of the returned function starts a fresh invocation of
    /// `unit`; the futures are `Send` and may be spawned.
    pub fn wrap_async<T, F, Fut>(
        self,
        unit: F,
    ) -> impl Fn() -> BoxFuture<'static, Result<B::Output, Exception>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Exception>> + Send + 'static,
        T: Send + 'static,
        B: Fallback<T> + Send + Sync + 'static,
        B::Output: Send,
    {
        let invocation = Invocation::of::<F>();
        let policy = Arc::new(self);
        let unit = Arc::new(unit);
        move || {
            let policy = Arc::clone(&policy);
            let unit = Arc::clone(&unit);
            async move { policy.guard_async(invocation, || unit()).await }.boxed()
        }
    }

    fn guard<T, W>(&self, invocation: Invocation, unit: W) -> Result<B::Output, Exception>
    where
        W: FnOnce() -> Result<T, Exception>,
        B: Fallback<T>,
    {
        let outcome = if self.core.catch_panics {
            panic::catch(unit, invocation.unit())
        } else {
            unit()
        };
        self.settle(outcome, &invocation)
    }

    async fn guard_async<T, W, Fut>(
        &self,
        invocation: Invocation,
        unit: W,
    ) -> Result<B::Output, Exception>
    where
        W: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Exception>>,
        B: Fallback<T>,
    {
        let outcome = if self.core.catch_panics {
            panic::catch_async(async move { unit().await }, invocation.unit()).await
        } else {
            unit().await
        };
        self.settle(outcome, &invocation)
    }

    fn settle<T>(
        &self,
        outcome: Result<T, Exception>,
        invocation: &Invocation,
    ) -> Result<B::Output, Exception>
    where
        B: Fallback<T>,
    {
        match outcome {
            Ok(value) => Ok(self.fallback.success(value)),
            Err(exception) if self.core.matcher.matches(&exception) => {
                tracing::debug!(
                    kind = exception.kind().name(),
                    unit = invocation.unit(),
                    "exception intercepted"
                );
                self.disposition.dispose(&exception, invocation)?;
                Ok(self.fallback.substitute())
            }
            Err(exception) => Err(exception),
        }
    }
}

/// Builder for [`TryExcept`].
///
/// Common options come from [`PolicyBuilder`] and disposition options from
/// [`DisposeOptions`]; bring both into scope (or use the
/// [`prelude`](crate::prelude)).
#[derive(Clone)]
#[must_use]
pub struct TryExceptBuilder<B = Absent> {
    common: CommonOptions,
    dispose: DisposeConfig,
    fallback: B,
}

impl TryExceptBuilder {
    /// Yield a clone of `value` whenever an exception is suppressed.
    ///
    /// The built policy then returns `T` rather than `Option<T>`.
    pub fn fallback<T: Clone>(self, value: T) -> TryExceptBuilder<Substitute<T>> {
        TryExceptBuilder {
            common: self.common,
            dispose: self.dispose,
            fallback: Substitute(value),
        }
    }
}

impl<B> TryExceptBuilder<B> {
    /// Validate the options and build the policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyFilter`] if the kind filter is empty.
    pub fn build(self) -> Result<TryExcept<B>, ConfigError> {
        let core = self.common.finish()?;
        let disposition = self.dispose.finish(core.reporting.clone());
        Ok(TryExcept {
            core,
            disposition,
            fallback: self.fallback,
        })
    }
}

impl<B> PolicyBuilder for TryExceptBuilder<B> {
    fn common(&mut self) -> &mut CommonOptions { &mut self.common }
}

impl<B> DisposeOptions for TryExceptBuilder<B> {
    fn dispose_config(&mut self) -> &mut DisposeConfig { &mut self.dispose }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds;

    #[test]
    fn any_filter_intercepts_everything() {
        let guard = TryExcept::builder(KindFilter::any()).silent(true).build().expect("valid");
        let out: Option<()> = guard
            .call(|| Err(Exception::new(&kinds::NOT_IMPLEMENTED_ERROR, "todo")))
            .expect("suppressed");
        assert_eq!(out, None);
    }

    #[test]
    fn default_policy_reports_and_yields_none() {
        let out = TryExcept::default()
            .call(|| -> Result<u8, Exception> { Err(Exception::new(&kinds::KEY_ERROR, "missing id")) })
            .expect("suppressed");
        assert_eq!(out, None);
        let debug = format!("{:?}", TryExcept::default());
        assert!(debug.contains("silent: false"), "{debug}");
    }

    #[test]
    fn empty_filter_fails_to_build() {
        let err = TryExcept::builder(Vec::<&crate::ErrorKind>::new()).build().expect_err("empty filter");
        assert_eq!(err, ConfigError::EmptyFilter);
    }

    #[test]
    fn invocation_names_the_unit() {
        let seen = std::sync::Mutex::new(None);
        let seen = Arc::new(seen);
        let sink = Arc::clone(&seen);
        let guard = TryExcept::builder(&kinds::KEY_ERROR)
            .silent(true)
            .callback(move |_, invocation| {
                *sink.lock().expect("lock") = Some(invocation.unit());
                Ok(())
            })
            .build()
            .expect("valid");
        let _ = guard.call(|| -> Result<(), Exception> { Err(Exception::new(&kinds::KEY_ERROR, "k")) });
        let unit = seen.lock().expect("lock").expect("callback ran");
        assert!(unit.contains("invocation_names_the_unit"), "{unit}");
    }
}
