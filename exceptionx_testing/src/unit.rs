//! Scripted units of work.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use exceptionx::{ErrorKind, Exception};

/// A unit of work that fails a fixed number of times, then succeeds with
/// its call count.
///
/// Clones share the call counter.
#[derive(Clone, Debug)]
pub struct ScriptedUnit {
    calls: Arc<AtomicU32>,
    failures: Option<u32>,
    kind: &'static ErrorKind,
    message: String,
    latency: Duration,
}

impl ScriptedUnit {
    /// Fail with `kind` on the first `failures` calls.
    #[must_use]
    pub fn failing_times(failures: u32, kind: &'static ErrorKind) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures: Some(failures),
            kind,
            message: String::from("scripted failure"),
            latency: Duration::ZERO,
        }
    }

    /// Fail with `kind` on every call.
    #[must_use]
    pub fn always_failing(kind: &'static ErrorKind) -> Self {
        Self {
            failures: None,
            ..Self::failing_times(0, kind)
        }
    }

    /// Use `message` for the raised exceptions. Each message is suffixed with
    /// ` #<call>`.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Make every asynchronous call take `latency` before completing.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of calls so far.
    #[must_use]
    pub fn calls(&self) -> u32 { self.calls.load(Ordering::SeqCst) }

    /// Run synchronously.
    ///
    /// # Errors
    ///
    /// Fails while the scripted failures last.
    pub fn call(&self) -> Result<u32, Exception> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failures.is_none_or(|failures| call <= failures) {
            return Err(Exception::new(self.kind, format!("{} #{call}", self.message)));
        }
        Ok(call)
    }

    /// Run asynchronously, sleeping for the configured latency first.
    ///
    /// # Errors
    ///
    /// As for [`call`](Self::call).
    pub async fn call_async(&self) -> Result<u32, Exception> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.call()
    }
}
