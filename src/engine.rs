//! Engine assembly
//!
//! Wires the shared store, the injectable strategies, and the four
//! components into one handle a host can embed. Strategies default to the
//! deterministic implementations; tests and hosts swap them through the
//! builder.

use crate::config::EngineConfig;
use crate::strategy::{
    Clock, CostEstimator, DurationEstimator, EveryNthFails, FixedDurationEstimator,
    MidpointCostEstimator, OutcomePolicy, SystemClock,
};
use crate::swarm::events::{EngineEvent, EventBus};
use crate::swarm::monitor::SwarmMonitor;
use crate::swarm::pool::AgentPool;
use crate::swarm::registry::SwarmRegistry;
use crate::swarm::scheduler::TaskScheduler;
use crate::swarm::store::SwarmStore;
use std::sync::Arc;

/// The swarm orchestration engine
///
/// Owns the shared state store and exposes the registry, pool, scheduler,
/// and monitor that operate on it. Cheap to share behind an `Arc`.
pub struct SwarmEngine {
    registry: SwarmRegistry,
    pool: AgentPool,
    scheduler: TaskScheduler,
    monitor: SwarmMonitor,
    events: EventBus,
}

impl Default for SwarmEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SwarmEngine {
    /// Build an engine with the default configuration and strategies
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring an engine
    pub fn builder() -> SwarmEngineBuilder {
        SwarmEngineBuilder::default()
    }

    /// Swarm creation and lookup
    pub fn registry(&self) -> &SwarmRegistry {
        &self.registry
    }

    /// Agent spawning and listing
    pub fn pool(&self) -> &AgentPool {
        &self.pool
    }

    /// Task submission and completion supervision
    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// Derived health, memory, and throughput views
    pub fn monitor(&self) -> &SwarmMonitor {
        &self.monitor
    }

    /// Register a listener for engine lifecycle events
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.events.add_listener(listener);
    }
}

/// Builder for [`SwarmEngine`]
#[derive(Default)]
pub struct SwarmEngineBuilder {
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    cost: Option<Arc<dyn CostEstimator>>,
    duration: Option<Arc<dyn DurationEstimator>>,
    outcome: Option<Arc<dyn OutcomePolicy>>,
}

impl SwarmEngineBuilder {
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_cost_estimator(mut self, cost: Arc<dyn CostEstimator>) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_duration_estimator(mut self, duration: Arc<dyn DurationEstimator>) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_outcome_policy(mut self, outcome: Arc<dyn OutcomePolicy>) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn build(self) -> SwarmEngine {
        let store = Arc::new(SwarmStore::new());
        let events = EventBus::new();

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cost = self.cost.unwrap_or_else(|| Arc::new(MidpointCostEstimator));
        let duration = self
            .duration
            .unwrap_or_else(|| Arc::new(FixedDurationEstimator::default()));
        let outcome = self
            .outcome
            .unwrap_or_else(|| Arc::new(EveryNthFails::new(self.config.failure_period)));

        SwarmEngine {
            registry: SwarmRegistry::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                events.clone(),
            ),
            pool: AgentPool::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                cost,
                events.clone(),
            ),
            scheduler: TaskScheduler::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                duration,
                outcome,
                events.clone(),
                self.config,
            ),
            monitor: SwarmMonitor::new(store, clock),
            events,
        }
    }
}
