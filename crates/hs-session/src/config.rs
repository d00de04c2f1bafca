//! Session-wide knobs.

use std::time::Duration;

use hs_gate::StepRate;

/// Settings fixed at build time; `rate` and `playing` are only the initial
/// values and can be changed on the live session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub rate: StepRate,

    /// Start in play mode instead of paused.
    pub playing: bool,

    /// Invoke the behavior again on the same world whenever it returns,
    /// instead of ending the run as completed.
    pub repeat_behavior: bool,

    /// Upper bound on how long the driver waits for the behavior to park
    /// after a grant, and for a cancelled run to exit.
    pub settle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rate:            StepRate::DEFAULT,
            playing:         false,
            repeat_behavior: false,
            settle_timeout:  Duration::from_secs(2),
        }
    }
}
