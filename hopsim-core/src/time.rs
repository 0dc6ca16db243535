//! Simulated time.
//!
//! [`SimTime`] is an absolute point on the virtual clock and [`SimDelay`] a
//! signed offset between two such points. Both have a nanosecond resolution
//! and both can be parsed from human friendly strings:
//!
//! ```
//! use hopsim_core::time::{SimDelay, SimTime};
//!
//! let start: SimTime = "4s".parse().unwrap();
//! let interval: SimDelay = "100us".parse().unwrap();
//!
//! assert_eq!(start, SimTime::from_secs(4));
//! assert_eq!(interval, SimDelay::from_micros(100));
//! assert_eq!(start.checked_add(interval), Some(SimTime::from_nanos(4_000_100_000)));
//! ```
use core::fmt;
use logos::{Lexer, Logos};
use std::{
    ops::{Add, AddAssign, Sub},
    str::FromStr,
    time,
};
use thiserror::Error;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// An absolute instant of the simulated clock, in nanoseconds since the
/// beginning of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimTime(u64);

/// A signed distance between two [`SimTime`]s, in nanoseconds.
///
/// Negative delays are representable on purpose: they are what a caller
/// gets wrong, and the [`Scheduler`] reports them as
/// [`ScheduleError::InvalidDelay`].
///
/// [`Scheduler`]: crate::scheduler::Scheduler
/// [`ScheduleError::InvalidDelay`]: crate::scheduler::ScheduleError::InvalidDelay
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimDelay(i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("Cannot parse an empty duration")]
    Empty,
    #[error("Failed to parse `{input}': unexpected token")]
    InvalidToken { input: String },
    #[error("Expecting duration to start with a number. Cannot parse `{input}'")]
    ExpectedNumber { input: String },
    #[error("Expecting a measure (ns, us, ms, s, m), failed to parse `{input}'")]
    MissingUnit { input: String },
    #[error("Duration `{input}' does not fit in the simulated clock")]
    Overflow { input: String },
}

impl SimTime {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u64::MAX);

    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros * NANOS_PER_MICRO)
    }

    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * NANOS_PER_MILLI)
    }

    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * NANOS_PER_SEC)
    }

    /// Create an instant from fractional seconds, rounded to the nearest
    /// nanosecond.
    ///
    /// Returns `None` for negative, non finite or out of range values.
    pub fn try_from_secs_f64(secs: f64) -> Option<Self> {
        let nanos = (secs * NANOS_PER_SEC as f64).round();
        if !nanos.is_finite() || nanos < 0.0 || nanos > u64::MAX as f64 {
            return None;
        }
        Some(Self(nanos as u64))
    }

    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    /// Move this instant by `delay`, `None` if the result would fall before
    /// [`SimTime::ZERO`] or after [`SimTime::MAX`].
    pub fn checked_add(self, delay: SimDelay) -> Option<Self> {
        self.0.checked_add_signed(delay.0).map(Self)
    }

    /// The signed delay elapsed from `earlier` to `self`.
    ///
    /// Saturates at the bounds of [`SimDelay`].
    pub fn delay_since(self, earlier: SimTime) -> SimDelay {
        let diff = self.0 as i128 - earlier.0 as i128;
        SimDelay(diff.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    #[inline]
    pub fn into_duration(self) -> time::Duration {
        time::Duration::from_nanos(self.0)
    }
}

impl SimDelay {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros * NANOS_PER_MICRO as i64)
    }

    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * NANOS_PER_MILLI as i64)
    }

    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * NANOS_PER_SEC as i64)
    }

    /// Create a delay from fractional microseconds, rounded to the nearest
    /// nanosecond. Non finite values saturate (`NaN` becomes zero).
    ///
    /// ```
    /// # use hopsim_core::time::SimDelay;
    /// assert_eq!(SimDelay::from_micros_f64(100.0), SimDelay::from_micros(100));
    /// assert_eq!(SimDelay::from_micros_f64(0.5), SimDelay::from_nanos(500));
    /// assert!(SimDelay::from_micros_f64(-1.0).is_negative());
    /// ```
    pub fn from_micros_f64(micros: f64) -> Self {
        Self((micros * NANOS_PER_MICRO as f64).round() as i64)
    }

    /// Create a delay from fractional seconds, rounded to the nearest
    /// nanosecond. Non finite values saturate (`NaN` becomes zero).
    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * NANOS_PER_SEC as f64).round() as i64)
    }

    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }
}

impl Add for SimDelay {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for SimDelay {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for SimDelay {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl From<time::Duration> for SimDelay {
    fn from(value: time::Duration) -> Self {
        Self(i64::try_from(value.as_nanos()).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <time::Duration as fmt::Debug>::fmt(&self.into_duration(), f)
    }
}

impl fmt::Display for SimDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            f.write_str("-")?;
        }
        let magnitude = time::Duration::from_nanos(self.0.unsigned_abs());
        <time::Duration as fmt::Debug>::fmt(&magnitude, f)
    }
}

impl FromStr for SimTime {
    type Err = TimeParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_nanos(s).map(Self)
    }
}

impl FromStr for SimDelay {
    type Err = TimeParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_start();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let nanos = i64::try_from(parse_nanos(rest)?).map_err(|_| TimeParseError::Overflow {
            input: s.to_owned(),
        })?;
        Ok(Self(if negative { -nanos } else { nanos }))
    }
}

/// parse a sequence of `<number><unit>` and sum them up in nanoseconds
fn parse_nanos(s: &str) -> Result<u64, TimeParseError> {
    let mut lex = Lexer::<Token>::new(s);
    let mut total: u64 = 0;
    let mut any = false;

    let overflow = || TimeParseError::Overflow {
        input: s.to_owned(),
    };

    while let Some(next) = lex.next() {
        let number = next.map_err(|()| TimeParseError::InvalidToken {
            input: s.to_owned(),
        })?;
        if number != Token::Value {
            return Err(TimeParseError::ExpectedNumber {
                input: s.to_owned(),
            });
        }
        let value = lex.slice();

        let Some(Ok(measure)) = lex.next() else {
            return Err(TimeParseError::MissingUnit {
                input: s.to_owned(),
            });
        };
        let unit = match measure {
            Token::NanoSeconds => 1,
            Token::MicroSeconds => NANOS_PER_MICRO,
            Token::MilliSeconds => NANOS_PER_MILLI,
            Token::Seconds => NANOS_PER_SEC,
            Token::Minutes => 60 * NANOS_PER_SEC,
            Token::Value => {
                return Err(TimeParseError::MissingUnit {
                    input: s.to_owned(),
                });
            }
        };

        let nanos = if value.contains('.') {
            let fractional: f64 = value.parse().map_err(|_| TimeParseError::InvalidToken {
                input: s.to_owned(),
            })?;
            let nanos = (fractional * unit as f64).round();
            if nanos > u64::MAX as f64 {
                return Err(overflow());
            }
            nanos as u64
        } else {
            let integral: u64 = value.parse().map_err(|_| overflow())?;
            integral.checked_mul(unit).ok_or_else(overflow)?
        };

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        any = true;
    }

    if any {
        Ok(total)
    } else {
        Err(TimeParseError::Empty)
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")]
enum Token {
    #[token("ns")]
    NanoSeconds,
    #[regex("us|μs|µs")]
    MicroSeconds,
    #[token("ms")]
    MilliSeconds,
    #[token("s")]
    Seconds,
    #[token("m")]
    Minutes,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Value,
}
