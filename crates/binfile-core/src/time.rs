//! Process time samples.
//!
//! Pure arithmetic for wall/user/system triples. Sampling the native
//! counters lives behind [`NativeClock`], implemented by the native crate.

use std::fmt;
use std::ops::Sub;

use crate::error::ErrorCode;

/// Microseconds, signed so that `-1` can mark an unavailable sample.
pub type Microseconds = i64;

/// Microseconds per second.
pub const MICROS_PER_SEC: i64 = 1_000_000;

/// A wall/user/system time triple, in microseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Times {
    pub wall: Microseconds,
    pub user: Microseconds,
    pub system: Microseconds,
}

impl Times {
    /// Sentinel stored when the native counters could not be read.
    pub const UNAVAILABLE: Self = Self {
        wall: -1,
        user: -1,
        system: -1,
    };

    #[must_use]
    pub const fn new(wall: Microseconds, user: Microseconds, system: Microseconds) -> Self {
        Self { wall, user, system }
    }

    /// Returns `true` if any component carries the unavailable sentinel.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        self.wall < 0 || self.user < 0 || self.system < 0
    }

    /// User plus system time; `-1` if the sample is unavailable.
    #[must_use]
    pub const fn cpu(&self) -> Microseconds {
        if self.is_unavailable() {
            return -1;
        }
        self.user + self.system
    }

    /// Render as `"{w}s wall, {u}s user + {s}s system = {c}s CPU ({p}%)"`
    /// with `places` fractional digits (clamped to 0..=9). An unavailable
    /// sample renders as `"unavailable"`.
    #[must_use]
    pub fn format(&self, places: usize) -> String {
        if self.is_unavailable() {
            return "unavailable".to_string();
        }
        let places = places.min(9);
        let secs = |us: Microseconds| us as f64 / MICROS_PER_SEC as f64;
        let pct = if self.wall > 0 {
            self.cpu() as f64 * 100.0 / self.wall as f64
        } else {
            0.0
        };
        format!(
            "{:.p$}s wall, {:.p$}s user + {:.p$}s system = {:.p$}s CPU ({:.1}%)",
            secs(self.wall),
            secs(self.user),
            secs(self.system),
            secs(self.cpu()),
            pct,
            p = places
        )
    }
}

impl Sub for Times {
    type Output = Times;

    /// Component-wise difference. An unavailable operand yields
    /// [`Times::UNAVAILABLE`].
    fn sub(self, rhs: Times) -> Times {
        if self.is_unavailable() || rhs.is_unavailable() {
            return Times::UNAVAILABLE;
        }
        Times {
            wall: self.wall - rhs.wall,
            user: self.user - rhs.user,
            system: self.system - rhs.system,
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(6))
    }
}

/// Source of raw process time samples.
///
/// One implementation exists per platform family; timers depend only on
/// this trait.
pub trait NativeClock {
    /// Capture the current wall, user and system time.
    fn sample(&self) -> Result<Times, ErrorCode>;
}

impl<C: NativeClock + ?Sized> NativeClock for &C {
    fn sample(&self) -> Result<Times, ErrorCode> {
        (**self).sample()
    }
}

/// Microseconds per native clock tick, given the tick rate in Hz.
///
/// Returns `None` for a non-positive rate.
#[must_use]
pub fn tick_factor(ticks_per_sec: i64) -> Option<i64> {
    if ticks_per_sec <= 0 {
        return None;
    }
    let factor = MICROS_PER_SEC / ticks_per_sec;
    if factor == 0 { None } else { Some(factor) }
}
