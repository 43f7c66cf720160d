//! Human-readable duration codec.
//!
//! Durations are written as an optional run of `<n>d`, `<n>h`, `<n>m` and
//! `<n>s` components in that order, each `n` a whole or decimal number; the
//! trailing `s` may be omitted and units are case-insensitive. A bare integer
//! means seconds.
//!
//! ```
//! use std::time::Duration;
//!
//! use exceptionx::duration::{format, parse};
//!
//! assert_eq!(parse("1h2m3s").unwrap(), Duration::from_secs(3723));
//! assert_eq!(format(Duration::from_secs(90)), "1m30s");
//! assert_eq!(format(parse("45").unwrap()), "45s");
//! ```

use std::{fmt::Write as _, sync::LazyLock, time::Duration};

use regex::Regex;
use thiserror::Error;

use crate::error::ConfigError;

const UNITS: [u64; 4] = [86_400, 3_600, 60, 1];

static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        (?:(\d+(?:\.\d+)?)d)?
        (?:(\d+(?:\.\d+)?)h)?
        (?:(\d+(?:\.\d+)?)m)?
        (?:(\d+(?:\.\d+)?)s?)?
        $",
    )
    .unwrap_or_else(|err| unreachable!("duration pattern is valid: {err}"))
});

/// Errors produced when parsing a duration string.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// The input was empty.
    #[error("empty duration")]
    Empty,
    /// The input does not follow the `1d2h3m4s` grammar.
    #[error("duration {0:?} format is incorrect")]
    Malformed(String),
    /// The value does not fit in a [`Duration`].
    #[error("duration {0:?} is out of range")]
    OutOfRange(String),
}

/// Parse a duration string such as `"1h2m3s"`, `"1.5m"` or `"45"`.
///
/// # Errors
///
/// Returns [`DurationError::Empty`] for an empty string,
/// [`DurationError::Malformed`] when the text does not follow the grammar and
/// [`DurationError::OutOfRange`] when the total overflows [`Duration`].
pub fn parse(text: &str) -> Result<Duration, DurationError> {
    if text.is_empty() {
        return Err(DurationError::Empty);
    }
    if text.bytes().all(|b| b.is_ascii_digit()) {
        return text
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| DurationError::OutOfRange(text.to_owned()));
    }

    let captures = PATTERN
        .captures(text)
        .ok_or_else(|| DurationError::Malformed(text.to_owned()))?;

    let mut total = 0.0_f64;
    for (group, unit) in captures.iter().skip(1).zip(UNITS) {
        let Some(group) = group else { continue };
        let value: f64 = group
            .as_str()
            .parse()
            .map_err(|_| DurationError::Malformed(text.to_owned()))?;
        #[expect(clippy::cast_precision_loss, reason = "unit sizes are small")]
        let unit = unit as f64;
        total += value * unit;
    }

    Duration::try_from_secs_f64(total).map_err(|_| DurationError::OutOfRange(text.to_owned()))
}

/// Format a duration as `1d2h3m4.5s`, dropping zero components.
///
/// Sub-second precision is rounded to hundredths. A zero duration formats as
/// `"0s"`.
#[must_use]
pub fn format(duration: Duration) -> String {
    let rounded = round_centis(duration);
    let mut secs = rounded.as_secs();
    let centis = u64::from(rounded.subsec_millis() / 10);

    let mut out = String::new();
    for (suffix, size) in ['d', 'h', 'm'].into_iter().zip(UNITS) {
        if secs >= size {
            let _ = write!(out, "{}{suffix}", secs / size);
            secs %= size;
        }
    }

    let hundredths = secs * 100 + centis;
    if hundredths > 0 {
        let (whole, frac) = (hundredths / 100, hundredths % 100);
        let _ = match frac {
            0 => write!(out, "{whole}s"),
            f if f % 10 == 0 => write!(out, "{whole}.{}s", f / 10),
            f => write!(out, "{whole}.{f:02}s"),
        };
    }

    if out.is_empty() { "0s".to_owned() } else { out }
}

/// Render a duration as a bare number of seconds: `0`, `2`, `0.5`.
#[must_use]
pub fn plain_seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        duration.as_secs_f64().to_string()
    }
}

/// Round a duration to the nearest hundredth of a second.
#[must_use]
pub fn round_centis(duration: Duration) -> Duration {
    let centis = (u64::from(duration.subsec_nanos()) + 5_000_000) / 10_000_000;
    Duration::from_secs(duration.as_secs()).saturating_add(Duration::from_millis(centis * 10))
}

/// Interval accepted by policy builders.
///
/// Converts from [`Duration`], whole or fractional seconds and duration
/// strings; validation is deferred to the builder's `build()` so every
/// problem surfaces at construction time.
#[derive(Clone, Debug, PartialEq)]
pub enum Interval {
    /// An exact duration.
    Exact(Duration),
    /// A number of seconds, possibly fractional.
    Seconds(f64),
    /// A duration string in the grammar accepted by [`parse`].
    Text(String),
}

impl Interval {
    /// The zero interval.
    pub const ZERO: Interval = Interval::Exact(Duration::ZERO);

    pub(crate) fn resolve(self, field: &'static str) -> Result<Duration, ConfigError> {
        match self {
            Self::Exact(duration) => Ok(duration),
            Self::Seconds(value) if value.is_nan() || value.is_infinite() => {
                Err(ConfigError::NonFiniteInterval { field, value })
            }
            Self::Seconds(value) if value < 0.0 => {
                Err(ConfigError::NegativeInterval { field, value })
            }
            Self::Seconds(value) => Duration::try_from_secs_f64(value)
                .map_err(|_| ConfigError::NonFiniteInterval { field, value }),
            Self::Text(text) => {
                parse(&text).map_err(|source| ConfigError::InvalidDuration { field, source })
            }
        }
    }
}

impl Default for Interval {
    fn default() -> Self { Self::ZERO }
}

impl From<Duration> for Interval {
    fn from(value: Duration) -> Self { Self::Exact(value) }
}

impl From<u64> for Interval {
    fn from(value: u64) -> Self { Self::Exact(Duration::from_secs(value)) }
}

impl From<u32> for Interval {
    fn from(value: u32) -> Self { Self::Exact(Duration::from_secs(u64::from(value))) }
}

impl From<i32> for Interval {
    fn from(value: i32) -> Self { Self::Seconds(f64::from(value)) }
}

impl From<f64> for Interval {
    fn from(value: f64) -> Self { Self::Seconds(value) }
}

impl From<&str> for Interval {
    fn from(value: &str) -> Self { Self::Text(value.to_owned()) }
}

impl From<String> for Interval {
    fn from(value: String) -> Self { Self::Text(value) }
}
