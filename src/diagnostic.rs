//! One-line descriptions of exceptions.
//!
//! [`describe`] renders an [`Exception`] either as its full trace or as a
//! single attribution line:
//!
//! ```text
//! [<module>.<qualname>.line<N>.<KindName>] <message>
//! ```
//!
//! The attributed frame is the outermost one recorded outside this crate, or
//! the innermost (the raise site) when `last_frame` is requested. If no frame
//! qualifies the raw trace is emitted instead, followed by
//! [`INTERNAL_FAILURE_NOTE`].

use std::{backtrace::BacktraceStatus, error::Error as _, fmt::Write as _};

use thiserror::Error;

use crate::exception::{Exception, Frame};

/// Appended to the raw trace when no attribution line could be produced.
pub const INTERNAL_FAILURE_NOTE: &str = "Please note that this failure occurred inside the \
                                         exceptionx diagnostic path, not in your code.";

/// Why an attribution line could not be produced.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
enum AttributionError {
    #[error("exception carries no attribution frames")]
    NoFrames,
    #[error("every attribution frame belongs to exceptionx")]
    OnlyInternalFrames,
}

/// Describe `exception` for a diagnostic sink.
///
/// With `raw` set the full trace from [`traceback`] is returned. Otherwise a
/// single attribution line is built from the frame selected by `last_frame`.
///
/// ```
/// use exceptionx::{diagnostic::describe, exception, kinds};
///
/// fn load() -> exceptionx::Exception { exception!(&kinds::KEY_ERROR, "missing id") }
///
/// let line = describe(&load(), false, false);
/// assert!(line.contains(".load.line"), "{line}");
/// assert!(line.ends_with(".KeyError] missing id"), "{line}");
/// ```
#[must_use]
pub fn describe(exception: &Exception, raw: bool, last_frame: bool) -> String {
    if raw {
        return traceback(exception);
    }
    match attribution(exception, last_frame) {
        Ok(line) => line,
        Err(failure) => {
            tracing::debug!(%failure, kind = exception.kind().name(), "falling back to raw trace");
            format!("{}\n{INTERNAL_FAILURE_NOTE}", traceback(exception))
        }
    }
}

fn attribution(exception: &Exception, last_frame: bool) -> Result<String, AttributionError> {
    let frames = exception.frames();
    if frames.is_empty() {
        return Err(AttributionError::NoFrames);
    }
    let frame = if last_frame {
        frames.first()
    } else {
        frames.iter().rev().find(|frame| !frame.is_internal())
    }
    .ok_or(AttributionError::OnlyInternalFrames)?;

    Ok(format!(
        "[{}.{}.line{}.{}] {}",
        frame.module().unwrap_or_else(|| frame.file()),
        frame.qualname().as_deref().unwrap_or("<unknown>"),
        frame.line(),
        exception.kind().name(),
        exception.message(),
    ))
}

/// Render the full trace of `exception`: kind and message, every frame from
/// the raise site outward, the source chain and, when captured, the
/// backtrace.
#[must_use]
pub fn traceback(exception: &Exception) -> String {
    let mut out = format!("{}: {}", exception.kind().name(), exception.message());
    for frame in exception.frames() {
        let _ = write!(out, "\n    at {}", location(frame));
    }
    let mut source = exception.source();
    while let Some(cause) = source {
        let _ = write!(out, "\ncaused by: {cause}");
        source = cause.source();
    }
    if exception.backtrace().status() == BacktraceStatus::Captured {
        let _ = write!(out, "\nstack backtrace:\n{}", exception.backtrace());
    }
    out
}

fn location(frame: &Frame) -> String {
    match frame.function() {
        Some(function) => {
            let function = function
                .strip_suffix(crate::exception::frame::HELPER)
                .and_then(|path| path.strip_suffix("::"))
                .unwrap_or(function);
            format!("{function} ({}:{})", frame.file(), frame.line())
        }
        None => format!("{}:{}", frame.file(), frame.line()),
    }
}
