//! The concrete error value carried by units of work.
//!
//! An [`Exception`] pairs an [`ErrorKind`] handle with a message and the
//! attribution frames collected while it travelled outward. Units of work
//! return `Result<T, Exception>`; the [`exception!`](crate::exception) and
//! [`raise!`](crate::raise) macros build one with a frame for the raise site,
//! and [`ResultExt::at`] appends a frame at each propagation point that should
//! show up in diagnostics.

use std::{
    backtrace::Backtrace,
    error::Error as StdError,
    fmt,
    num::{ParseFloatError, ParseIntError},
    str::Utf8Error,
};

use crate::kind::{ErrorKind, standard};

pub mod frame;

pub use frame::Frame;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error raised by a unit of work.
///
/// Frames are stored innermost first: index zero is where the exception was
/// created and later entries are successive callers.
pub struct Exception {
    kind: &'static ErrorKind,
    message: String,
    frames: Vec<Frame>,
    source: Option<BoxError>,
    backtrace: Backtrace,
}

impl Exception {
    /// Create an exception attributed to the caller's source location.
    ///
    /// The location carries no module or function information; use
    /// [`exception!`](crate::exception) for full attribution.
    #[track_caller]
    #[must_use]
    pub fn new(kind: &'static ErrorKind, message: impl Into<String>) -> Self {
        Self::with_frame(kind, message, Frame::caller())
    }

    /// Create an exception attributed to `frame`.
    #[must_use]
    pub fn with_frame(kind: &'static ErrorKind, message: impl Into<String>, frame: Frame) -> Self {
        Self {
            kind,
            message: message.into(),
            frames: vec![frame],
            source: None,
            backtrace: Backtrace::capture(),
        }
    }

    /// Create an exception with no attribution at all.
    ///
    /// Diagnostics for such an exception fall back to the raw trace.
    #[must_use]
    pub fn detached(kind: &'static ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            frames: Vec::new(),
            source: None,
            backtrace: Backtrace::capture(),
        }
    }

    /// Wrap a foreign error, using its `Display` output as the message.
    #[track_caller]
    #[must_use]
    pub fn from_error<E>(kind: &'static ErrorKind, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let mut exception = Self::new(kind, error.to_string());
        exception.source = Some(Box::new(error));
        exception
    }

    /// Record an outer frame the exception passed through.
    #[must_use]
    pub fn at(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    /// The exception's kind.
    #[must_use]
    pub fn kind(&self) -> &'static ErrorKind { self.kind }

    /// True if the exception's kind is `kind` or descends from it.
    #[must_use]
    pub fn is(&self, kind: &ErrorKind) -> bool { self.kind.is_a(kind) }

    /// The message, as shown by `Display`.
    #[must_use]
    pub fn message(&self) -> &str { &self.message }

    /// Attribution frames, innermost first.
    #[must_use]
    pub fn frames(&self) -> &[Frame] { &self.frames }

    /// Backtrace captured at construction; empty unless `RUST_BACKTRACE` or
    /// `RUST_LIB_BACKTRACE` enables capture.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace { &self.backtrace }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.message) }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exception")
            .field("kind", &self.kind.name())
            .field("message", &self.message)
            .field("frames", &self.frames)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl StdError for Exception {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn StdError + 'static))
    }
}

impl From<std::io::Error> for Exception {
    #[track_caller]
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind as Io;

        let kind = match error.kind() {
            Io::NotFound => &standard::FILE_NOT_FOUND_ERROR,
            Io::PermissionDenied => &standard::PERMISSION_ERROR,
            Io::TimedOut => &standard::TIMEOUT_ERROR,
            Io::Interrupted => &standard::INTERRUPTED_ERROR,
            Io::ConnectionRefused | Io::ConnectionReset | Io::ConnectionAborted => {
                &standard::CONNECTION_ERROR
            }
            Io::UnexpectedEof => &standard::EOF_ERROR,
            _ => &standard::OS_ERROR,
        };
        Self::from_error(kind, error)
    }
}

impl From<ParseIntError> for Exception {
    #[track_caller]
    fn from(error: ParseIntError) -> Self { Self::from_error(&standard::VALUE_ERROR, error) }
}

impl From<ParseFloatError> for Exception {
    #[track_caller]
    fn from(error: ParseFloatError) -> Self { Self::from_error(&standard::VALUE_ERROR, error) }
}

impl From<Utf8Error> for Exception {
    #[track_caller]
    fn from(error: Utf8Error) -> Self { Self::from_error(&standard::UNICODE_ERROR, error) }
}

impl From<crate::error::ConfigError> for Exception {
    /// Rejected configuration surfaces as a `ParameterError`.
    #[track_caller]
    fn from(error: crate::error::ConfigError) -> Self {
        Self::from_error(crate::registry::resolve("ParameterError"), error)
    }
}

impl From<crate::error::RegistryError> for Exception {
    #[track_caller]
    fn from(error: crate::error::RegistryError) -> Self {
        use crate::error::RegistryError;

        let kind = match &error {
            RegistryError::NotFound(_) => &standard::NAME_ERROR,
            RegistryError::Reserved(_) => &standard::ATTRIBUTE_ERROR,
        };
        Self::from_error(kind, error)
    }
}

/// Extension methods for results carrying an [`Exception`].
pub trait ResultExt {
    /// Append `frame` to the error's attribution, if this is an error.
    ///
    /// ```
    /// use exceptionx::{Exception, ResultExt, frame, kinds};
    ///
    /// fn inner() -> Result<(), Exception> { Err(Exception::new(&kinds::KEY_ERROR, "id")) }
    ///
    /// fn outer() -> Result<(), Exception> { inner().at(frame!()) }
    ///
    /// let err = outer().unwrap_err();
    /// assert_eq!(err.frames().len(), 2);
    /// ```
    #[must_use]
    fn at(self, frame: Frame) -> Self;
}

impl<T> ResultExt for Result<T, Exception> {
    fn at(self, frame: Frame) -> Self { self.map_err(|error| error.at(frame)) }
}

/// Build an [`Exception`] attributed to the current function.
///
/// ```
/// use exceptionx::{exception, kinds};
///
/// let err = exception!(&kinds::VALUE_ERROR, "bad value {}", 7);
/// assert_eq!(err.to_string(), "bad value 7");
/// assert!(err.is(&kinds::VALUE_ERROR));
/// ```
#[macro_export]
macro_rules! exception {
    ($kind:expr) => {
        $crate::Exception::with_frame($kind, ::std::string::String::new(), $crate::frame!())
    };
    ($kind:expr, $($arg:tt)+) => {
        $crate::Exception::with_frame($kind, ::std::format!($($arg)+), $crate::frame!())
    };
}

/// Return early with an [`Exception`] attributed to the current function.
///
/// ```
/// use exceptionx::{Exception, kind, raise};
///
/// fn check(n: i32) -> Result<i32, Exception> {
///     if n < 0 {
///         raise!(kind!(NegativeError), "{n} is negative");
///     }
///     Ok(n)
/// }
///
/// let err = check(-1).unwrap_err();
/// assert_eq!(err.kind().name(), "NegativeError");
/// ```
#[macro_export]
macro_rules! raise {
    ($($arg:tt)+) => {
        return ::core::result::Result::Err(::core::convert::From::from($crate::exception!($($arg)+)))
    };
}

#[cfg(test)]
mod tests {
    use std::{error::Error as _, io};

    use super::*;

    #[test]
    fn io_errors_map_to_os_kinds() {
        let err = Exception::from(io::Error::new(io::ErrorKind::NotFound, "config.toml"));
        assert_eq!(err.kind(), &standard::FILE_NOT_FOUND_ERROR);
        assert!(err.is(&standard::OS_ERROR));
        assert_eq!(err.to_string(), "config.toml");
        assert!(err.source().is_some());
    }

    #[test]
    fn configuration_errors_become_parameter_errors() {
        let err = Exception::from(crate::error::ConfigError::EmptyFilter);
        assert_eq!(err.kind().name(), "ParameterError");
        assert!(err.is(&standard::ERROR));
        assert!(err.source().is_some());
    }

    #[test]
    fn question_mark_converts_parse_errors() {
        fn parse() -> Result<u8, Exception> { Ok("x".parse::<u8>()?) }

        let err = parse().expect_err("not a number");
        assert!(err.is(&standard::VALUE_ERROR));
        assert_eq!(err.frames().len(), 1);
        assert!(err.frames()[0].module().is_none());
    }

    #[test]
    fn raise_attributes_the_enclosing_function() {
        fn fail() -> Result<(), Exception> {
            crate::raise!(&standard::RUNTIME_ERROR, "stopped at {}", 3);
        }

        let err = fail().expect_err("always raises");
        assert_eq!(err.message(), "stopped at 3");
        let frame = err.frames()[0];
        assert_eq!(frame.qualname().as_deref(), Some("raise_attributes_the_enclosing_function.fail"));
    }

    #[test]
    fn frames_accumulate_outward() {
        let err = Exception::new(&standard::KEY_ERROR, "k")
            .at(crate::frame!())
            .at(crate::frame!());
        assert_eq!(err.frames().len(), 3);
        assert!(err.frames()[0].module().is_none());
        assert!(err.frames()[2].module().is_some());
    }
}
