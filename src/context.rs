//! Scoped guarded blocks.
//!
//! A [`TryContext`] applies guarded-execution matching and disposition to a
//! block of code that produces no value. A matched exception escaping the
//! block is reported, handed to the callback (and may end the process); the
//! block then completes normally. Anything else propagates.
//!
//! The [`guarded!`](crate::guarded) macro runs an inline block under a
//! context, so `?` and [`raise!`](crate::raise) can be used inside it:
//!
//! ```
//! use exceptionx::{Exception, PolicyBuilder, TryContext, guarded, kinds};
//!
//! fn cleanup() -> Result<(), Exception> {
//!     let ctx = TryContext::builder(&kinds::FILE_NOT_FOUND_ERROR)
//!         .silent(true)
//!         .build()?;
//!     guarded!(ctx, {
//!         std::fs::remove_file("exceptionx-doc-stale.lock")?;
//!     })?;
//!     Ok(())
//! }
//!
//! assert!(cleanup().is_ok());
//! ```

use std::future::Future;

use crate::{
    error::ConfigError,
    exception::Exception,
    panic,
    policy::{
        CommonOptions,
        Core,
        Disposition,
        DisposeConfig,
        DisposeOptions,
        Invocation,
        KindFilter,
        PolicyBuilder,
    },
};

/// A reusable scoped-block policy.
#[derive(Clone, Debug)]
pub struct TryContext {
    core: Core,
    disposition: Disposition,
}

impl TryContext {
    /// Start configuring a context intercepting exceptions in `filter`.
    pub fn builder(filter: impl Into<KindFilter>) -> TryContextBuilder {
        TryContextBuilder {
            common: CommonOptions::new(filter.into()),
            dispose: DisposeConfig::default(),
        }
    }

    /// Run `block`, swallowing a matching exception.
    ///
    /// # Errors
    ///
    /// Returns the block's exception when it does not match, or the
    /// callback's error when the callback fails.
    pub fn run<B>(&self, block: B) -> Result<(), Exception>
    where
        B: FnOnce() -> Result<(), Exception>,
    {
        let invocation = Invocation::of::<B>();
        let outcome = if self.core.catch_panics {
            panic::catch(block, invocation.unit())
        } else {
            block()
        };
        self.settle(outcome, &invocation)
    }

    /// Await `block`, swallowing a matching exception.
    ///
    /// # Errors
    ///
    /// As for [`run`](Self::run).
    pub async fn run_async<F>(&self, block: F) -> Result<(), Exception>
    where
        F: Future<Output = Result<(), Exception>>,
    {
        let invocation = Invocation::of::<F>();
        let outcome = if self.core.catch_panics {
            panic::catch_async(block, invocation.unit()).await
        } else {
            block.await
        };
        self.settle(outcome, &invocation)
    }

    fn settle(&self, outcome: Result<(), Exception>, invocation: &Invocation) -> Result<(), Exception> {
        match outcome {
            Err(exception) if self.core.matcher.matches(&exception) => {
                self.disposition.dispose(&exception, invocation)
            }
            other => other,
        }
    }
}

/// Builder for [`TryContext`].
#[derive(Clone)]
#[must_use]
pub struct TryContextBuilder {
    common: CommonOptions,
    dispose: DisposeConfig,
}

impl TryContextBuilder {
    /// Validate the options and build the context.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyFilter`] if the kind filter is empty.
    pub fn build(self) -> Result<TryContext, ConfigError> {
        let core = self.common.finish()?;
        let disposition = self.dispose.finish(core.reporting.clone());
        Ok(TryContext { core, disposition })
    }
}

impl PolicyBuilder for TryContextBuilder {
    fn common(&mut self) -> &mut CommonOptions { &mut self.common }
}

impl DisposeOptions for TryContextBuilder {
    fn dispose_config(&mut self) -> &mut DisposeConfig { &mut self.dispose }
}

/// Run a block under a [`TryContext`].
///
/// Expands to `ctx.run(|| { block; Ok(()) })`, so the block may use `?` and
/// the result must be handled like any other `Result`.
#[macro_export]
macro_rules! guarded {
    ($ctx:expr, $body:block) => {
        $ctx.run(|| -> ::core::result::Result<(), $crate::Exception> {
            $body;
            ::core::result::Result::Ok(())
        })
    };
}
