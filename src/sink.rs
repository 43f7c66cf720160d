//! Destinations for diagnostic lines.
//!
//! A [`DiagnosticSink`] receives the formatted lines a policy emits: guarded
//! execution reports intercepted failures through [`DiagnosticSink::error`]
//! and retry reports progress through [`DiagnosticSink::warning`]. Policies
//! default to [`StderrSink`].

use std::{
    io::{self, Write},
    sync::Arc,
};

use chrono::Local;
use log::Level;

/// Receiver of policy diagnostics.
///
/// Implementations must be cheap to call from any thread; policies hold them
/// behind an `Arc` and share them across invocations.
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use exceptionx::DiagnosticSink;
///
/// #[derive(Default)]
/// struct Collect(Mutex<Vec<String>>);
///
/// impl DiagnosticSink for Collect {
///     fn error(&self, message: &str) { self.0.lock().unwrap().push(message.to_owned()); }
///
///     fn warning(&self, message: &str) { self.error(message) }
/// }
/// ```
pub trait DiagnosticSink: Send + Sync {
    /// Report an intercepted failure.
    fn error(&self, message: &str);

    /// Report retry progress.
    fn warning(&self, message: &str);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn error(&self, message: &str) { (**self).error(message) }

    fn warning(&self, message: &str) { (**self).warning(message) }
}

/// Writes `[<local time>] <message>` lines to standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl StderrSink {
    fn write_line(out: &mut impl Write, message: &str) -> io::Result<()> {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(out, "[{now}] {message}")
    }

    fn write(message: &str) {
        // A closed stderr has nowhere left to report to.
        let _ = Self::write_line(&mut io::stderr().lock(), message);
    }
}

impl DiagnosticSink for StderrSink {
    fn error(&self, message: &str) { Self::write(message) }

    fn warning(&self, message: &str) { Self::write(message) }
}

/// Routes diagnostics to the `log` facade.
///
/// Errors are logged at [`Level::Error`] and progress at [`Level::Warn`]
/// under the configured target.
#[derive(Clone, Copy, Debug)]
pub struct LogSink {
    target: &'static str,
}

impl LogSink {
    /// Target used by [`LogSink::default`].
    pub const DEFAULT_TARGET: &'static str = "exceptionx";

    /// Create a sink logging under `target`.
    #[must_use]
    pub const fn new(target: &'static str) -> Self { Self { target } }

    /// The log target.
    #[must_use]
    pub const fn target(&self) -> &'static str { self.target }
}

impl Default for LogSink {
    fn default() -> Self { Self::new(Self::DEFAULT_TARGET) }
}

impl DiagnosticSink for LogSink {
    fn error(&self, message: &str) { log::log!(target: self.target, Level::Error, "{message}") }

    fn warning(&self, message: &str) { log::log!(target: self.target, Level::Warn, "{message}") }
}

pub(crate) type SharedSink = Arc<dyn DiagnosticSink>;

pub(crate) fn default_sink() -> SharedSink { Arc::new(StderrSink) }

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    #[test]
    fn stderr_lines_carry_a_local_timestamp() {
        let mut out = Vec::new();
        StderrSink::write_line(&mut out, "[app.main.line3.ValueError] bad").expect("write to buffer");
        StderrSink::write_line(&mut out, "[app.main.line9.KeyError] id").expect("write to buffer");

        let text = String::from_utf8(out).expect("utf-8 output");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2, "one line per message: {text:?}");
        let shape = Regex::new(r"^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\] ").expect("valid pattern");
        for line in &lines {
            assert!(shape.is_match(line), "{line}");
        }
        assert!(lines[0].ends_with("] [app.main.line3.ValueError] bad"), "{}", lines[0]);
    }

    #[test]
    fn stderr_is_the_default_sink() {
        let sink = default_sink();
        sink.error("[exceptionx.sink.line1.ValueError] smoke");
        sink.warning("[try:1/N:0] [exceptionx.sink.line1.ValueError] smoke");
    }
}
