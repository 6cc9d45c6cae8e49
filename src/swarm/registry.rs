//! Swarm registry
//!
//! Creates and looks up swarms, owns their configuration bounds, and keeps
//! the aggregate counters zeroed at birth.

use super::events::{EngineEvent, EventBus};
use super::store::SwarmStore;
use super::types::{CreateSwarmRequest, Swarm, SwarmStatus};
use crate::strategy::Clock;
use crate::{metrics, ApiaryError, Result};
use std::sync::Arc;
use tracing::info;

/// Inclusive bounds for `max_agents`
pub const AGENT_BOUNDS: (usize, usize) = (1, 100);

/// Inclusive bounds for `memory_limit_mb`
pub const MEMORY_BOUNDS: (f64, f64) = (512.0, 8192.0);

/// Creates, validates, and resolves swarms
pub struct SwarmRegistry {
    store: Arc<SwarmStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl SwarmRegistry {
    pub(crate) fn new(store: Arc<SwarmStore>, clock: Arc<dyn Clock>, events: EventBus) -> Self {
        Self {
            store,
            clock,
            events,
        }
    }

    /// Create a new swarm
    ///
    /// Fails with a conflict if the name is taken, or a validation error if
    /// a bound is violated. The new swarm starts initialized with every
    /// counter at zero.
    pub fn create_swarm(&self, request: CreateSwarmRequest) -> Result<Swarm> {
        self.validate(&request)?;

        let swarm = Swarm {
            id: self.store.next_swarm_id(),
            name: request.name.clone(),
            max_agents: request.max_agents,
            strategy: request.strategy,
            memory_limit_mb: request.memory_limit_mb,
            status: SwarmStatus::Initialized,
            created_at: self.clock.now(),
            active_agents: 0,
            queued_tasks: 0,
            completed_tasks: 0,
            total_memory_used_mb: 0.0,
        };

        self.store.insert_swarm(swarm.clone())?;

        info!(
            swarm = %swarm.id,
            name = %swarm.name,
            max_agents = swarm.max_agents,
            memory_limit_mb = swarm.memory_limit_mb,
            strategy = %swarm.strategy,
            "Created swarm"
        );
        metrics::record_swarm_created();
        self.events.emit(EngineEvent::SwarmCreated {
            swarm_id: swarm.id.clone(),
            name: swarm.name.clone(),
        });

        Ok(swarm)
    }

    /// Find a swarm by generated id or human-chosen name
    pub fn find(&self, swarm_ref: &str) -> Result<Swarm> {
        self.store.snapshot(swarm_ref)
    }

    fn validate(&self, request: &CreateSwarmRequest) -> Result<()> {
        if request.name.trim().is_empty() {
            return Err(ApiaryError::Validation(
                "Swarm name must not be empty".to_string(),
            ));
        }

        let (min_agents, max_agents) = AGENT_BOUNDS;
        if request.max_agents < min_agents || request.max_agents > max_agents {
            return Err(ApiaryError::Validation(format!(
                "max_agents must be between {} and {}, got {}",
                min_agents, max_agents, request.max_agents
            )));
        }

        let (min_memory, max_memory) = MEMORY_BOUNDS;
        if request.memory_limit_mb < min_memory || request.memory_limit_mb > max_memory {
            return Err(ApiaryError::Validation(format!(
                "memory_limit_mb must be between {} and {}, got {}",
                min_memory, max_memory, request.memory_limit_mb
            )));
        }

        Ok(())
    }
}
