//! Agent pool manager
//!
//! Spawns agents into swarms under the agent-count and memory-budget bounds.
//! The bound checks and the counter increments they authorize run inside one
//! per-swarm exclusive section, so concurrent spawns against a near-full
//! swarm can never jointly exceed either bound.

use super::events::{EngineEvent, EventBus};
use super::store::SwarmStore;
use super::types::{Agent, AgentStatus, SpawnRequest};
use crate::strategy::{Clock, CostEstimator};
use crate::{metrics, ApiaryError, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Spawns and lists agents bound to a swarm
pub struct AgentPool {
    store: Arc<SwarmStore>,
    clock: Arc<dyn Clock>,
    cost: Arc<dyn CostEstimator>,
    events: EventBus,
}

impl AgentPool {
    pub(crate) fn new(
        store: Arc<SwarmStore>,
        clock: Arc<dyn Clock>,
        cost: Arc<dyn CostEstimator>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            clock,
            cost,
            events,
        }
    }

    /// Spawn an agent into the referenced swarm
    ///
    /// Capacity preconditions are checked and committed atomically: the
    /// swarm must have an agent slot free and enough memory budget left for
    /// the type's estimated cost.
    pub fn spawn(&self, swarm_ref: &str, request: SpawnRequest) -> Result<Agent> {
        let cell = self.store.resolve(swarm_ref)?;
        let cost_mb = self.cost.estimate_mb(request.agent_type);

        let (agent, swarm_name, used_mb) = {
            let mut state = cell.lock().unwrap();

            if !state.swarm.has_agent_capacity() {
                let reason = format!(
                    "Swarm '{}' is at its agent limit ({}/{})",
                    state.swarm.name, state.swarm.active_agents, state.swarm.max_agents
                );
                drop(state);
                self.reject(swarm_ref, "agent_limit", &reason);
                return Err(ApiaryError::Capacity(reason));
            }

            if !state.swarm.fits_memory(cost_mb) {
                let reason = format!(
                    "Agent would exceed memory limit of swarm '{}': {:.0} MB needed, {:.0} MB available",
                    state.swarm.name,
                    cost_mb,
                    state.swarm.available_memory_mb()
                );
                drop(state);
                self.reject(swarm_ref, "memory", &reason);
                return Err(ApiaryError::Capacity(reason));
            }

            let id = self.store.next_agent_id();
            let name = request.name.clone().unwrap_or_else(|| {
                let suffix = id.as_str().rsplit('-').next().unwrap_or("0");
                format!("{}-{}", request.agent_type, suffix)
            });
            let capabilities = match request.capabilities {
                Some(caps) => caps.into_iter().collect(),
                None => request.agent_type.default_capabilities(),
            };
            let now = self.clock.now();

            let agent = Agent {
                id,
                name,
                agent_type: request.agent_type,
                swarm_id: state.swarm.id.clone(),
                priority: request.priority,
                capabilities,
                status: AgentStatus::Active,
                spawned_at: now,
                last_heartbeat: now,
                memory_usage_mb: cost_mb,
                current_task_id: None,
                tasks_completed: 0,
            };

            state.swarm.active_agents += 1;
            state.swarm.total_memory_used_mb += cost_mb;
            state.insert_agent(agent.clone());

            (
                agent,
                state.swarm.name.clone(),
                state.swarm.total_memory_used_mb,
            )
        };

        info!(
            swarm = %swarm_name,
            agent = %agent.id,
            agent_type = %agent.agent_type,
            memory_mb = cost_mb,
            "Spawned agent"
        );
        metrics::record_agent_spawned(&agent.agent_type.to_string());
        metrics::set_swarm_memory(&swarm_name, used_mb);
        self.events.emit(EngineEvent::AgentSpawned {
            swarm_id: agent.swarm_id.clone(),
            agent_id: agent.id.clone(),
            memory_mb: cost_mb,
        });

        Ok(agent)
    }

    /// List the swarm's agents in insertion order
    pub fn list(&self, swarm_ref: &str) -> Result<Vec<Agent>> {
        let cell = self.store.resolve(swarm_ref)?;
        let state = cell.lock().unwrap();
        Ok(state.agents_in_order())
    }

    fn reject(&self, swarm_ref: &str, kind: &str, reason: &str) {
        warn!(swarm = swarm_ref, kind, "{}", reason);
        metrics::record_rejection(kind);
        if let Ok(swarm) = self.store.snapshot(swarm_ref) {
            self.events.emit(EngineEvent::SpawnRejected {
                swarm_id: swarm.id,
                reason: reason.to_string(),
            });
        }
    }
}
