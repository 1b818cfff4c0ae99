//! Process clock and elapsed-time recorder.
//!
//! [`PosixClock`] samples `times(2)`: wall ticks plus user/system CPU time
//! (including reaped children), scaled to microseconds. [`Timer`] records
//! the difference between two samples and is generic over the clock so
//! tests can drive it deterministically.

use binfile_core::errno;
use binfile_core::time::tick_factor;
use binfile_core::{ErrorCode, NativeClock, Operation, Times};

use crate::error::ClockError;
use crate::log;
use crate::native;

/// The native process clock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PosixClock;

impl NativeClock for PosixClock {
    fn sample(&self) -> Result<Times, ErrorCode> {
        let native_err = |e| ErrorCode::from_native(Operation::Times, e);
        let hz = native::sys_clock_ticks().map_err(native_err)?;
        let factor = tick_factor(hz).ok_or_else(|| native_err(errno::EINVAL))?;
        let raw = native::sys_times().map_err(native_err)?;
        Ok(Times::new(
            raw.elapsed.saturating_mul(factor),
            raw.user.saturating_mul(factor),
            raw.system.saturating_mul(factor),
        ))
    }
}

fn report<T>(result: Result<T, ErrorCode>) -> Result<T, ClockError> {
    result.map_err(|code| {
        log::record_clock_failure(code);
        ClockError::new(code)
    })
}

fn report_with<T>(result: Result<T, ErrorCode>, ec: &mut ErrorCode) -> Option<T> {
    if let Err(code) = &result {
        log::record_clock_failure(*code);
    }
    ec.capture(result)
}

/// Current process times.
pub fn process_times() -> Result<Times, ClockError> {
    report(PosixClock.sample())
}

/// Current process times; [`Times::UNAVAILABLE`] on failure.
pub fn process_times_with(ec: &mut ErrorCode) -> Times {
    report_with(PosixClock.sample(), ec).unwrap_or(Times::UNAVAILABLE)
}

/// Records wall, user and system time elapsed since it was started.
///
/// A sample failure at start or stop is kept as the timer's fault: every
/// later [`stop`](Self::stop) or [`elapsed`](Self::elapsed) reports it
/// again, through either channel, until the next successful `start`.
#[derive(Debug, Clone)]
pub struct Timer<C: NativeClock = PosixClock> {
    clock: C,
    epoch: Times,
    elapsed: Times,
    stopped: bool,
    fault: Option<ErrorCode>,
}

impl Timer<PosixClock> {
    /// Create a timer on the native clock and start it.
    ///
    /// A failed first sample surfaces on the first reading.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(PosixClock)
    }

    /// Create and start a timer on the native clock, failing if the first
    /// sample fails.
    pub fn try_new() -> Result<Self, ClockError> {
        Self::try_with_clock(PosixClock)
    }

    /// [`try_new`](Self::try_new), reporting failure through `ec`.
    pub fn new_with(ec: &mut ErrorCode) -> Self {
        Self::with_clock_with(PosixClock, ec)
    }
}

impl Default for Timer<PosixClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: NativeClock> Timer<C> {
    fn unstarted(clock: C) -> Self {
        Self {
            clock,
            epoch: Times::UNAVAILABLE,
            elapsed: Times::UNAVAILABLE,
            stopped: false,
            fault: None,
        }
    }

    /// Create a timer on `clock` and start it.
    ///
    /// A failed first sample is logged and kept as the timer's fault.
    pub fn with_clock(clock: C) -> Self {
        let mut timer = Self::unstarted(clock);
        if let Err(code) = timer.try_start() {
            log::record_clock_failure(code);
        }
        timer
    }

    /// Create a timer on `clock` and start it, failing if the first sample
    /// fails.
    pub fn try_with_clock(clock: C) -> Result<Self, ClockError> {
        let mut timer = Self::unstarted(clock);
        report(timer.try_start())?;
        Ok(timer)
    }

    /// [`try_with_clock`](Self::try_with_clock), reporting failure through
    /// `ec`. The returned timer carries the fault like
    /// [`with_clock`](Self::with_clock).
    pub fn with_clock_with(clock: C, ec: &mut ErrorCode) -> Self {
        let mut timer = Self::unstarted(clock);
        report_with(timer.try_start(), ec);
        timer
    }

    /// Returns `true` after [`stop`](Self::stop) and before the next start.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn try_start(&mut self) -> Result<(), ErrorCode> {
        self.stopped = false;
        self.elapsed = Times::UNAVAILABLE;
        match self.clock.sample() {
            Ok(now) => {
                self.epoch = now;
                self.fault = None;
                Ok(())
            }
            Err(code) => {
                self.epoch = Times::UNAVAILABLE;
                self.fault = Some(code);
                Err(code)
            }
        }
    }

    fn try_stop(&mut self) -> Result<Times, ErrorCode> {
        if !self.stopped {
            self.stopped = true;
            if self.fault.is_none() {
                match self.clock.sample() {
                    Ok(now) => self.elapsed = now - self.epoch,
                    Err(code) => self.fault = Some(code),
                }
            }
        }
        self.fault.map_or(Ok(self.elapsed), Err)
    }

    fn try_elapsed(&self) -> Result<Times, ErrorCode> {
        if let Some(code) = self.fault {
            return Err(code);
        }
        if self.stopped {
            return Ok(self.elapsed);
        }
        self.clock.sample().map(|now| now - self.epoch)
    }

    /// Clear the stopped state and capture a fresh epoch.
    pub fn start(&mut self) -> Result<(), ClockError> {
        report(self.try_start())
    }

    /// [`start`](Self::start), reporting failure through `ec`.
    pub fn start_with(&mut self, ec: &mut ErrorCode) {
        report_with(self.try_start(), ec);
    }

    /// Stop and return the elapsed triple.
    ///
    /// Stopping a stopped timer returns the stored result unchanged.
    pub fn stop(&mut self) -> Result<Times, ClockError> {
        report(self.try_stop())
    }

    /// [`stop`](Self::stop), reporting failure through `ec`. Returns
    /// [`Times::UNAVAILABLE`] on failure.
    pub fn stop_with(&mut self, ec: &mut ErrorCode) -> Times {
        report_with(self.try_stop(), ec).unwrap_or(Times::UNAVAILABLE)
    }

    /// Time since start, or the stored triple once stopped.
    pub fn elapsed(&self) -> Result<Times, ClockError> {
        report(self.try_elapsed())
    }

    /// [`elapsed`](Self::elapsed), reporting failure through `ec`.
    pub fn elapsed_with(&self, ec: &mut ErrorCode) -> Times {
        report_with(self.try_elapsed(), ec).unwrap_or(Times::UNAVAILABLE)
    }
}
