//! Engine configuration
//!
//! Tuning knobs for the simulation seams. The engine is embedded as a
//! library; file- or environment-based configuration belongs to the host
//! that wires it up.

use std::time::Duration;

/// Default wall-clock duration of one simulated minute
pub const DEFAULT_MINUTE_SCALE: Duration = Duration::from_secs(1);

/// Default failure period for the built-in outcome policy (1-in-N fails)
pub const DEFAULT_FAILURE_PERIOD: u64 = 10;

/// Configuration for a [`SwarmEngine`](crate::SwarmEngine)
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Wall-clock duration one simulated minute maps to. Task durations are
    /// expressed in minutes; completion jobs sleep `minutes * minute_scale`.
    pub minute_scale: Duration,

    /// Failure period for the default outcome policy: every Nth modeled
    /// execution fails. Ignored when a custom policy is injected.
    pub failure_period: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            minute_scale: DEFAULT_MINUTE_SCALE,
            failure_period: DEFAULT_FAILURE_PERIOD,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wall-clock duration of one simulated minute
    pub fn with_minute_scale(mut self, scale: Duration) -> Self {
        self.minute_scale = scale;
        self
    }

    /// Set the default outcome policy's failure period
    pub fn with_failure_period(mut self, period: u64) -> Self {
        self.failure_period = period.max(1);
        self
    }

    /// Wall-clock duration for a simulated span of minutes
    pub fn scaled(&self, minutes: f64) -> Duration {
        self.minute_scale.mul_f64(minutes.max(0.0))
    }
}
