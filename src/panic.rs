//! Utilities for turning panics into exceptions.
//!
//! Policies built with `catch_panics(true)` run their unit of work under
//! `catch_unwind`; a caught payload becomes an [`Exception`] of kind
//! [`PANIC_ERROR`](crate::kinds::PANIC_ERROR) whose message is the panic
//! message, so it flows through the same matching as any other failure.

use std::{
    any::Any,
    fmt,
    future::Future,
    panic::{AssertUnwindSafe, catch_unwind},
};

use futures::FutureExt;

use crate::{
    exception::{Exception, Frame},
    kind::standard::PANIC_ERROR,
};

/// Wrapper that formats a panic payload when logged or displayed.
///
/// The payload is downcast to `String` or `&'static str` if possible and falls
/// back to `Debug` formatting otherwise.
///
/// ```
/// use exceptionx::panic::format_panic;
/// assert_eq!(format_panic(Box::new("boom")).to_string(), "boom");
/// assert!(format_panic(Box::new(5_u32)).to_string().contains("Any"));
/// ```
#[derive(Debug)]
#[must_use]
pub struct PanicMessage(Box<dyn Any + Send>);

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.0.downcast_ref::<String>() {
            f.write_str(s)
        } else if let Some(s) = self.0.downcast_ref::<&'static str>() {
            f.write_str(s)
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

/// Create a [`PanicMessage`] for the given payload.
pub fn format_panic(panic: Box<dyn Any + Send>) -> PanicMessage { PanicMessage(panic) }

impl PanicMessage {
    /// Convert into a `PanicError` exception attributed to `unit`, the type
    /// path of the unit of work that panicked.
    #[must_use]
    pub fn into_exception(self, unit: &'static str) -> Exception {
        Exception::with_frame(&PANIC_ERROR, self.to_string(), Frame::unit(unit))
    }
}

/// Run `unit`, converting a panic into a `PanicError` exception.
pub(crate) fn catch<T, W>(unit: W, name: &'static str) -> Result<T, Exception>
where
    W: FnOnce() -> Result<T, Exception>,
{
    catch_unwind(AssertUnwindSafe(unit))
        .unwrap_or_else(|panic| Err(format_panic(panic).into_exception(name)))
}

/// Await `future`, converting a panic into a `PanicError` exception.
pub(crate) async fn catch_async<T, Fut>(future: Fut, name: &'static str) -> Result<T, Exception>
where
    Fut: Future<Output = Result<T, Exception>>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(format_panic(panic).into_exception(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caught_panic_becomes_panic_error() {
        let result: Result<(), Exception> = catch(|| panic!("worker exploded"), "app::jobs::run");
        let err = result.expect_err("panic should be converted");
        assert!(err.is(&PANIC_ERROR));
        assert_eq!(err.message(), "worker exploded");
        assert_eq!(err.frames()[0].qualname().as_deref(), Some("run"));
    }

    #[test]
    fn errors_pass_through_untouched() {
        let result: Result<(), Exception> = catch(
            || Err(Exception::new(&crate::kinds::KEY_ERROR, "k")),
            "app::jobs::run",
        );
        assert!(result.expect_err("error expected").is(&crate::kinds::KEY_ERROR));
    }

    async fn explode() -> Result<(), Exception> { panic!("async boom") }

    #[tokio::test]
    async fn caught_async_panic_becomes_panic_error() {
        let result = catch_async(explode(), "app::jobs::poll").await;
        assert_eq!(result.expect_err("converted").message(), "async boom");
    }
}
