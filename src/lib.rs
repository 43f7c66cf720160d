#![doc(html_root_url = "https://docs.rs/exceptionx/latest")]
//! Public API for the `exceptionx` library.
//!
//! This crate provides two things:
//!
//! - named error kinds created on demand through a process-wide registry
//!   ([`registry::resolve`], [`kind!`]), and
//! - reusable policies that wrap units of work: [`TryExcept`] suppresses and
//!   reports a matching failure, [`Retry`] re-runs the unit until it succeeds
//!   or a bound is reached, and [`TryContext`] applies the suppress-and-report
//!   behaviour to a block of code.
//!
//! A unit of work is any closure returning `Result<T, Exception>`; raising is
//! returning `Err`.
//!
//! ```
//! use exceptionx::prelude::*;
//!
//! fn parse(text: &str) -> Result<u32, Exception> {
//!     if text.is_empty() {
//!         raise!(kind!(EmptyInputError), "no input");
//!     }
//!     Ok(text.parse()?)
//! }
//!
//! let guard = TryExcept::builder(&kinds::VALUE_ERROR)
//!     .silent(true)
//!     .fallback(0)
//!     .build()
//!     .expect("valid policy");
//! assert_eq!(guard.call(|| parse("x1")).expect("suppressed"), 0);
//! ```

pub mod context;
pub mod diagnostic;
pub mod duration;
pub mod error;
pub mod exception;
pub mod kind;
pub mod panic;
pub mod policy;
pub mod prelude;
pub mod registry;
pub mod retry;
pub mod sink;
pub mod try_except;

pub use context::TryContext;
pub use error::{ConfigError, RegistryError};
pub use duration::Interval;
pub use exception::{Exception, Frame, ResultExt};
pub use kind::{ErrorKind, standard as kinds};
pub use policy::{Callback, DisposeOptions, Invocation, KindFilter, PolicyBuilder, Terminator};
pub use registry::{History, Registry};
pub use retry::Retry;
pub use sink::{DiagnosticSink, LogSink, StderrSink};
pub use try_except::TryExcept;
