//! Building blocks shared by every policy.
//!
//! A policy decides whether an [`Exception`] is *matched* (intercepted) or
//! passed through untouched, and what to do with a matched one. Matching
//! combines a [`KindFilter`], an optional message substring and an invert
//! flag; the substring condition applies whether or not the filter is
//! inverted. Disposition of a matched exception runs, in order: report to
//! the sink unless silenced, invoke the callback, terminate the process if
//! requested.
//!
//! Builder options common to all policies live on [`PolicyBuilder`];
//! disposition options (callback, exit) on [`DisposeOptions`].

use std::{fmt, sync::Arc};

use crate::{
    diagnostic::describe,
    error::ConfigError,
    exception::Exception,
    kind::{ErrorKind, standard},
    sink::{DiagnosticSink, SharedSink, default_sink},
};

mod fallback;

pub use fallback::{Absent, Fallback, Substitute};

/// Exit status requested when a policy terminates the process.
pub const EXIT_CODE: i32 = 4;

/// The set of kinds a policy selects.
///
/// A filter matches a kind when any of its members is that kind or one of
/// its ancestors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindFilter(Vec<&'static ErrorKind>);

impl KindFilter {
    /// A filter selecting every kind.
    #[must_use]
    pub fn any() -> Self { Self(vec![&standard::EXCEPTION]) }

    /// True if `kind` falls under this filter.
    #[must_use]
    pub fn matches(&self, kind: &ErrorKind) -> bool {
        self.0.iter().any(|selected| kind.is_a(selected))
    }

    /// The selected kinds.
    #[must_use]
    pub fn kinds(&self) -> &[&'static ErrorKind] { &self.0 }
}

impl Default for KindFilter {
    fn default() -> Self { Self::any() }
}

impl From<&'static ErrorKind> for KindFilter {
    fn from(kind: &'static ErrorKind) -> Self { Self(vec![kind]) }
}

impl<const N: usize> From<[&'static ErrorKind; N]> for KindFilter {
    fn from(kinds: [&'static ErrorKind; N]) -> Self { Self(kinds.to_vec()) }
}

impl From<&[&'static ErrorKind]> for KindFilter {
    fn from(kinds: &[&'static ErrorKind]) -> Self { Self(kinds.to_vec()) }
}

impl From<Vec<&'static ErrorKind>> for KindFilter {
    fn from(kinds: Vec<&'static ErrorKind>) -> Self { Self(kinds) }
}

/// Describes the unit of work a policy is running, for callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Invocation {
    unit: &'static str,
}

impl Invocation {
    pub(crate) fn of<W>() -> Self {
        Self {
            unit: std::any::type_name::<W>(),
        }
    }

    /// Type path of the wrapped closure or block.
    #[must_use]
    pub fn unit(&self) -> &'static str { self.unit }
}

/// Side-effect callback run for every matched exception.
///
/// Returning `Err` aborts the disposition: the error is propagated to the
/// caller in place of the suppressed exception.
pub type Callback = Arc<dyn Fn(&Exception, &Invocation) -> Result<(), Exception> + Send + Sync>;

/// Terminates the host process.
pub trait Terminator: Send + Sync {
    /// Exit with `code`; never returns.
    fn terminate(&self, code: i32) -> !;
}

/// [`Terminator`] calling [`std::process::exit`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn terminate(&self, code: i32) -> ! { std::process::exit(code) }
}

/// Decides which exceptions a policy intercepts.
#[derive(Clone, Debug)]
pub(crate) struct Matcher {
    filter: KindFilter,
    message: Option<String>,
    invert: bool,
}

impl Matcher {
    pub(crate) fn matches(&self, exception: &Exception) -> bool {
        let contains = self
            .message
            .as_deref()
            .is_none_or(|needle| exception.message().contains(needle));
        contains && self.filter.matches(exception.kind()) != self.invert
    }
}

/// How intercepted exceptions are described and where they are sent.
#[derive(Clone)]
pub(crate) struct Reporting {
    pub(crate) silent: bool,
    raw: bool,
    last_frame: bool,
    sink: SharedSink,
}

impl Reporting {
    pub(crate) fn describe(&self, exception: &Exception) -> String {
        describe(exception, self.raw, self.last_frame)
    }

    pub(crate) fn sink(&self) -> &dyn DiagnosticSink { &*self.sink }
}

impl fmt::Debug for Reporting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporting")
            .field("silent", &self.silent)
            .field("raw", &self.raw)
            .field("last_frame", &self.last_frame)
            .finish_non_exhaustive()
    }
}

/// The ordered log, callback, exit sequence applied to matched exceptions.
#[derive(Clone)]
pub(crate) struct Disposition {
    reporting: Reporting,
    callback: Option<Callback>,
    terminator: Option<Arc<dyn Terminator>>,
}

impl Disposition {
    pub(crate) fn dispose(
        &self,
        exception: &Exception,
        invocation: &Invocation,
    ) -> Result<(), Exception> {
        if !self.reporting.silent {
            self.reporting
                .sink()
                .error(&self.reporting.describe(exception));
        }
        if let Some(callback) = &self.callback {
            callback(exception, invocation)?;
        }
        if let Some(terminator) = &self.terminator {
            log::debug!("terminating after {} with status {EXIT_CODE}", exception.kind());
            terminator.terminate(EXIT_CODE);
        }
        Ok(())
    }
}

impl fmt::Debug for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposition")
            .field("reporting", &self.reporting)
            .field("callback", &self.callback.as_ref().map(|_| "Some(<callback>)"))
            .field("exits", &self.terminator.is_some())
            .finish()
    }
}

/// Options every policy builder accepts.
#[doc(hidden)]
#[derive(Clone)]
pub struct CommonOptions {
    filter: KindFilter,
    message: Option<String>,
    invert: bool,
    silent: bool,
    raw: bool,
    last_frame: bool,
    sink: Option<SharedSink>,
    catch_panics: bool,
}

impl CommonOptions {
    pub(crate) fn new(filter: KindFilter) -> Self {
        Self {
            filter,
            message: None,
            invert: false,
            silent: false,
            raw: false,
            last_frame: false,
            sink: None,
            catch_panics: false,
        }
    }

    pub(crate) fn silenced(mut self) -> Self {
        self.silent = true;
        self
    }

    pub(crate) fn finish(self) -> Result<Core, ConfigError> {
        if self.filter.0.is_empty() {
            return Err(ConfigError::EmptyFilter);
        }
        Ok(self.into_core())
    }

    /// Convert without validation; only for options known to be valid.
    pub(crate) fn into_core(self) -> Core {
        Core {
            matcher: Matcher {
                filter: self.filter,
                message: self.message,
                invert: self.invert,
            },
            reporting: Reporting {
                silent: self.silent,
                raw: self.raw,
                last_frame: self.last_frame,
                sink: self.sink.unwrap_or_else(default_sink),
            },
            catch_panics: self.catch_panics,
        }
    }
}

/// Validated common options.
#[derive(Clone, Debug)]
pub(crate) struct Core {
    pub(crate) matcher: Matcher,
    pub(crate) reporting: Reporting,
    pub(crate) catch_panics: bool,
}

/// Disposition options accepted by guarded-execution builders.
#[doc(hidden)]
#[derive(Clone, Default)]
pub struct DisposeConfig {
    callback: Option<Callback>,
    exit_after: bool,
    terminator: Option<Arc<dyn Terminator>>,
}

impl DisposeConfig {
    pub(crate) fn finish(self, reporting: Reporting) -> Disposition {
        let terminator = self
            .exit_after
            .then(|| self.terminator.unwrap_or_else(|| Arc::new(ProcessExit)));
        Disposition {
            reporting,
            callback: self.callback,
            terminator,
        }
    }
}

/// Builder options shared by [`TryExcept`](crate::TryExcept),
/// [`Retry`](crate::Retry) and [`TryContext`](crate::TryContext).
pub trait PolicyBuilder: Sized {
    #[doc(hidden)]
    fn common(&mut self) -> &mut CommonOptions;

    /// Only match exceptions whose message contains `needle`.
    #[must_use]
    fn message_contains(mut self, needle: impl Into<String>) -> Self {
        self.common().message = Some(needle.into());
        self
    }

    /// Match exceptions *outside* the kind filter instead of inside it.
    #[must_use]
    fn invert(mut self, invert: bool) -> Self {
        self.common().invert = invert;
        self
    }

    /// Suppress diagnostic output.
    #[must_use]
    fn silent(mut self, silent: bool) -> Self {
        self.common().silent = silent;
        self
    }

    /// Report the full trace instead of a one-line attribution.
    #[must_use]
    fn raw(mut self, raw: bool) -> Self {
        self.common().raw = raw;
        self
    }

    /// Attribute diagnostics to the raise site rather than the outermost
    /// caller frame.
    #[must_use]
    fn last_frame(mut self, last_frame: bool) -> Self {
        self.common().last_frame = last_frame;
        self
    }

    /// Send diagnostics to `sink` instead of standard error.
    #[must_use]
    fn sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.common().sink = Some(Arc::new(sink));
        self
    }

    /// Convert panics in the unit of work into `PanicError` exceptions.
    #[must_use]
    fn catch_panics(mut self, catch_panics: bool) -> Self {
        self.common().catch_panics = catch_panics;
        self
    }
}

/// Disposition options for guarded execution and scoped blocks.
pub trait DisposeOptions: Sized {
    #[doc(hidden)]
    fn dispose_config(&mut self) -> &mut DisposeConfig;

    /// Run `callback` for every matched exception, after it is reported.
    #[must_use]
    fn callback<C>(mut self, callback: C) -> Self
    where
        C: Fn(&Exception, &Invocation) -> Result<(), Exception> + Send + Sync + 'static,
    {
        self.dispose_config().callback = Some(Arc::new(callback));
        self
    }

    /// Terminate the process with [`EXIT_CODE`] once a matched exception has
    /// been reported and the callback has run.
    #[must_use]
    fn exit_after(mut self, exit_after: bool) -> Self {
        self.dispose_config().exit_after = exit_after;
        self
    }

    /// Replace the [`ProcessExit`] terminator used by
    /// [`exit_after`](Self::exit_after).
    #[must_use]
    fn terminator(mut self, terminator: impl Terminator + 'static) -> Self {
        self.dispose_config().terminator = Some(Arc::new(terminator));
        self
    }
}
