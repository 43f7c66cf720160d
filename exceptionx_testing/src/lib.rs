//! Test support for crates exercising [`exceptionx`] policies.
//!
//! Provides a shared log capture fixture, a sink that records diagnostic
//! lines, scripted units of work that fail a chosen number of times and a
//! terminator that panics instead of ending the test process.
//!
//! ```rust
//! use exceptionx::{PolicyBuilder, Retry, kinds};
//! use exceptionx_testing::{RecordingSink, ScriptedUnit};
//!
//! let sink = RecordingSink::default();
//! let unit = ScriptedUnit::failing_times(2, &kinds::TIMEOUT_ERROR);
//! let retry = Retry::builder(&kinds::TIMEOUT_ERROR)
//!     .max_attempts(5)
//!     .sink(sink.clone())
//!     .build()
//!     .unwrap();
//! assert_eq!(retry.call(|| unit.call()).unwrap(), 3);
//! assert_eq!(sink.warnings().len(), 2);
//! ```

pub mod logging;
pub mod sink;
pub mod terminator;
pub mod unit;

pub use logging::{LoggerHandle, logger};
pub use sink::RecordingSink;
pub use terminator::PanickingTerminator;
pub use unit::ScriptedUnit;
