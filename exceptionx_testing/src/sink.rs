//! A diagnostic sink that keeps what it receives.

use std::sync::{Arc, Mutex, PoisonError};

use exceptionx::DiagnosticSink;

#[derive(Default)]
struct Lines {
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// Records every diagnostic line.
///
/// Clones share the same buffer, so a test can hand one clone to a policy
/// and inspect the other.
#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Lines>>);

impl RecordingSink {
    fn lines(&self) -> std::sync::MutexGuard<'_, Lines> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lines received through [`DiagnosticSink::error`].
    #[must_use]
    pub fn errors(&self) -> Vec<String> { self.lines().errors.clone() }

    /// Lines received through [`DiagnosticSink::warning`].
    #[must_use]
    pub fn warnings(&self) -> Vec<String> { self.lines().warnings.clone() }

    /// True if nothing has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let lines = self.lines();
        lines.errors.is_empty() && lines.warnings.is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn error(&self, message: &str) { self.lines().errors.push(message.to_owned()); }

    fn warning(&self, message: &str) { self.lines().warnings.push(message.to_owned()); }
}
