//! Playback rate.
//!
//! # Curve
//!
//! A bounded control value `c ∈ [0, 100]` (a speed slider) maps to the delay
//! between two automatic steps:
//!
//!   delay(c) = 1 / (1 + 2^((c - 50) / 10))  seconds
//!
//! | control | delay    |
//! |---------|----------|
//! | 0       | ≈ 970 ms |
//! | 50      | 500 ms   |
//! | 100     | ≈ 30 ms  |
//!
//! The extremes approach "as fast as possible" and "near-stopped" without
//! ever reaching a zero or infinite delay.

use std::fmt;
use std::time::Duration;

/// Speed-slider value clamped to `0..=100`.  Higher is faster.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StepRate(u8);

impl StepRate {
    pub const MIN: StepRate = StepRate(0);
    pub const MAX: StepRate = StepRate(100);
    pub const DEFAULT: StepRate = StepRate(50);

    /// Clamp `control` into range.
    pub fn new(control: u8) -> Self {
        StepRate(control.min(Self::MAX.0))
    }

    #[inline]
    pub fn control(self) -> u8 {
        self.0
    }

    /// `by` notches faster, saturating at [`StepRate::MAX`].
    pub fn faster(self, by: u8) -> Self {
        Self::new(self.0.saturating_add(by))
    }

    /// `by` notches slower, saturating at [`StepRate::MIN`].
    pub fn slower(self, by: u8) -> Self {
        Self::new(self.0.saturating_sub(by))
    }

    /// Delay between two automatic steps in play mode.
    pub fn delay(self) -> Duration {
        let exponent = (f64::from(self.0) - 50.0) / 10.0;
        Duration::from_secs_f64(1.0 / (1.0 + exponent.exp2()))
    }
}

impl Default for StepRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for StepRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} ms/step)", self.0, self.delay().as_millis())
    }
}
