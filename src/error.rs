//! Canonical error types for the crate.
//!
//! These describe failures of `exceptionx` itself: rejected policy
//! configuration and registry lookups. Failures of the units of work a policy
//! wraps travel as [`Exception`](crate::Exception) values instead.

use thiserror::Error;

use crate::duration::DurationError;

/// Invalid policy construction arguments.
///
/// Returned by the `build()` method of every policy builder; a policy that
/// was built successfully never reports configuration problems later.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A duration string could not be parsed.
    #[error("parameter \"{field}\" is not a valid duration: {source}")]
    InvalidDuration {
        /// Builder field that carried the value.
        field: &'static str,
        /// Parser failure.
        #[source]
        source: DurationError,
    },
    /// A numeric interval was below zero.
    #[error("parameter \"{field}\" must be greater than or equal to 0, not {value}")]
    NegativeInterval {
        /// Builder field that carried the value.
        field: &'static str,
        /// Rejected value in seconds.
        value: f64,
    },
    /// A numeric interval was NaN or infinite.
    #[error("parameter \"{field}\" must be a finite number of seconds, not {value}")]
    NonFiniteInterval {
        /// Builder field that carried the value.
        field: &'static str,
        /// Rejected value in seconds.
        value: f64,
    },
    /// The kind filter selected nothing.
    #[error("the kind filter must name at least one error kind")]
    EmptyFilter,
}

/// Failures of registry operations other than create-or-fetch.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No kind of that name has been registered.
    #[error("no error kind named \"{0}\" has been registered")]
    NotFound(String),
    /// The name is reserved (`__name__` form) and never denotes a kind.
    #[error("\"{0}\" is a reserved name, not an error kind")]
    Reserved(String),
}
