//! Injectable strategy seams
//!
//! The engine models resource costs, execution durations, and execution
//! outcomes rather than running real workloads. Each of those models sits
//! behind a trait so hosts and tests can swap it. The defaults are
//! deterministic: same inputs, same answers.

use crate::catalog::AgentType;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Modeled outcome of one task execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failure,
}

/// Estimates the memory cost of spawning one agent
pub trait CostEstimator: Send + Sync {
    /// Estimated memory footprint in MB for an agent of the given type
    fn estimate_mb(&self, agent_type: AgentType) -> f64;
}

/// Default cost estimator: midpoint of the catalog range for the type
///
/// Worker 192 MB, coordinator 384 MB, specialist 300 MB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointCostEstimator;

impl CostEstimator for MidpointCostEstimator {
    fn estimate_mb(&self, agent_type: AgentType) -> f64 {
        let (low, high) = agent_type.memory_cost_range();
        (low + high) / 2.0
    }
}

/// Estimates the base execution duration of a task, before priority and
/// parallelization multipliers are applied
pub trait DurationEstimator: Send + Sync {
    /// Base duration in minutes. Implementations should stay within the
    /// nominal 5-30 minute band.
    fn base_minutes(&self, definition: &str) -> f64;
}

/// Default duration estimator: a fixed base, 15 minutes unless configured
#[derive(Debug, Clone, Copy)]
pub struct FixedDurationEstimator {
    minutes: f64,
}

impl FixedDurationEstimator {
    pub fn new(minutes: f64) -> Self {
        Self { minutes }
    }
}

impl Default for FixedDurationEstimator {
    fn default() -> Self {
        Self { minutes: 15.0 }
    }
}

impl DurationEstimator for FixedDurationEstimator {
    fn base_minutes(&self, _definition: &str) -> f64 {
        self.minutes
    }
}

/// Decides whether a modeled execution succeeds or fails
pub trait OutcomePolicy: Send + Sync {
    fn next_outcome(&self) -> TaskOutcome;
}

/// Default outcome policy: success-biased and deterministic
///
/// Every `period`-th decision fails; everything else succeeds. A period of
/// 10 gives a 90% success rate without randomness.
#[derive(Debug)]
pub struct EveryNthFails {
    period: u64,
    counter: AtomicU64,
}

impl EveryNthFails {
    pub fn new(period: u64) -> Self {
        Self {
            period: period.max(1),
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for EveryNthFails {
    fn default() -> Self {
        Self::new(10)
    }
}

impl OutcomePolicy for EveryNthFails {
    fn next_outcome(&self) -> TaskOutcome {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.period == 0 {
            TaskOutcome::Failure
        } else {
            TaskOutcome::Success
        }
    }
}

/// Outcome policy that never fails; useful in tests
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSucceed;

impl OutcomePolicy for AlwaysSucceed {
    fn next_outcome(&self) -> TaskOutcome {
        TaskOutcome::Success
    }
}

/// Time source for timestamps and completion delays
///
/// Production uses [`SystemClock`]. Tests use [`ManualClock`] so completion
/// jobs resolve without wall-clock sleeping.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time via chrono and tokio timers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock whose sleeps return immediately and advance `now()`
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Advance the clock without sleeping
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::zero());
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        // Yield so concurrent completion jobs interleave like real sleeps
        tokio::task::yield_now().await;
    }
}
