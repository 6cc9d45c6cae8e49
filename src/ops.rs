//! Operation boundary
//!
//! The five operations a remote dispatch layer calls on the engine. Each
//! takes a flat set of named parameters, applies the documented defaults,
//! and returns a uniform envelope: `{success: true, ..., message}` on
//! success or `{success: false, error, message}` on failure. No raw error
//! ever crosses this boundary; the taxonomy is mapped to stable codes.
//!
//! Every call emits one structured tracing event and bumps the
//! per-operation counter, which is where an external telemetry sink taps in.

use crate::catalog::AgentType;
use crate::engine::SwarmEngine;
use crate::swarm::monitor::MonitorOptions;
use crate::swarm::types::{
    CoordinationStrategy, CreateSwarmRequest, Priority, SpawnRequest, TaskRequest,
};
use crate::{metrics, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Parameters for the initialize-swarm operation
///
/// Defaults: 5 agents, centralized strategy, 2048 MB.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeSwarmParams {
    pub name: String,
    pub max_agents: Option<usize>,
    pub strategy: Option<String>,
    pub memory_limit_mb: Option<f64>,
}

/// Parameters for the spawn-agent operation
///
/// Defaults: generated name, catalog capabilities for the type, normal
/// priority.
#[derive(Debug, Clone, Deserialize)]
pub struct SpawnAgentParams {
    pub swarm: String,
    pub agent_type: String,
    pub name: Option<String>,
    pub capabilities: Option<Vec<String>>,
    pub priority: Option<String>,
}

/// Parameters for the orchestrate-task operation
///
/// Defaults: normal priority, serial execution, 60 minute ceiling, no
/// capability requirements.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestrateTaskParams {
    pub swarm: String,
    pub task: String,
    pub priority: Option<String>,
    pub parallel: Option<bool>,
    pub max_execution_minutes: Option<f64>,
    pub required_capabilities: Option<Vec<String>>,
}

/// Parameters for the get-memory-usage operation
#[derive(Debug, Clone, Deserialize)]
pub struct GetMemoryUsageParams {
    pub swarm: String,
    pub detailed: Option<bool>,
}

/// Parameters for the monitor-swarm operation
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSwarmParams {
    pub swarm: String,
    pub include_metrics: Option<bool>,
    pub include_agents: Option<bool>,
    pub include_tasks: Option<bool>,
}

/// Create a new swarm
pub fn initialize_swarm(engine: &SwarmEngine, params: InitializeSwarmParams) -> Value {
    respond("initialize-swarm", || {
        let mut request = CreateSwarmRequest::new(params.name);
        if let Some(max_agents) = params.max_agents {
            request = request.with_max_agents(max_agents);
        }
        if let Some(strategy) = params.strategy.as_deref() {
            request = request.with_strategy(strategy.parse::<CoordinationStrategy>()?);
        }
        if let Some(limit) = params.memory_limit_mb {
            request = request.with_memory_limit_mb(limit);
        }

        let swarm = engine.registry().create_swarm(request)?;
        let message = format!("Swarm '{}' initialized", swarm.name);
        Ok((json!({ "swarm": swarm }), message))
    })
}

/// Spawn an agent into a swarm
pub fn spawn_agent(engine: &SwarmEngine, params: SpawnAgentParams) -> Value {
    respond("spawn-agent", || {
        let agent_type = params.agent_type.parse::<AgentType>()?;
        let mut request = SpawnRequest::new(agent_type);
        if let Some(name) = params.name {
            request = request.with_name(name);
        }
        if let Some(capabilities) = params.capabilities {
            request = request.with_capabilities(capabilities);
        }
        if let Some(priority) = params.priority.as_deref() {
            request = request.with_priority(priority.parse::<Priority>()?);
        }

        let agent = engine.pool().spawn(&params.swarm, request)?;
        let message = format!("Agent '{}' spawned into swarm '{}'", agent.name, params.swarm);
        Ok((json!({ "agent": agent }), message))
    })
}

/// Submit a task for orchestration
pub fn orchestrate_task(engine: &SwarmEngine, params: OrchestrateTaskParams) -> Value {
    respond("orchestrate-task", || {
        let mut request = TaskRequest::new(params.task);
        if let Some(priority) = params.priority.as_deref() {
            request = request.with_priority(priority.parse::<Priority>()?);
        }
        if let Some(parallel) = params.parallel {
            request = request.with_parallel(parallel);
        }
        if let Some(minutes) = params.max_execution_minutes {
            request = request.with_max_execution_minutes(minutes);
        }
        if let Some(capabilities) = params.required_capabilities {
            request = request.with_required_capabilities(capabilities);
        }

        let task = engine.scheduler().submit(&params.swarm, request)?;
        let message = format!(
            "Task '{}' queued on {} agent(s)",
            task.id,
            task.assigned_agent_ids.len()
        );
        Ok((json!({ "task": task }), message))
    })
}

/// Report a swarm's memory accounting
pub fn get_memory_usage(engine: &SwarmEngine, params: GetMemoryUsageParams) -> Value {
    respond("get-memory-usage", || {
        let detailed = params.detailed.unwrap_or(false);
        let report = engine.monitor().memory_usage(&params.swarm, detailed)?;
        let message = format!(
            "Swarm '{}' using {:.0} of {:.0} MB",
            report.swarm_name, report.used_memory_mb, report.memory_limit_mb
        );
        Ok((json!({ "memory": report }), message))
    })
}

/// Report a swarm's composite status
pub fn monitor_swarm(engine: &SwarmEngine, params: MonitorSwarmParams) -> Value {
    respond("monitor-swarm", || {
        let options = MonitorOptions {
            include_metrics: params.include_metrics.unwrap_or(false),
            include_agents: params.include_agents.unwrap_or(false),
            include_tasks: params.include_tasks.unwrap_or(false),
        };
        let report = engine.monitor().status(&params.swarm, options)?;
        let message = format!(
            "Swarm '{}' is {:?} (score {:.0})",
            report.swarm.name, report.health.status, report.health.score
        );
        Ok((json!({ "status": report }), message))
    })
}

/// Run one operation and wrap its outcome in the uniform envelope
fn respond<F>(operation: &'static str, call: F) -> Value
where
    F: FnOnce() -> Result<(Value, String)>,
{
    match call() {
        Ok((fields, message)) => {
            info!(operation, success = true, "{}", message);
            metrics::record_operation(operation, true);

            let mut envelope = json!({
                "success": true,
                "message": message,
            });
            if let (Some(envelope_map), Some(field_map)) =
                (envelope.as_object_mut(), fields.as_object())
            {
                for (key, value) in field_map {
                    envelope_map.insert(key.clone(), value.clone());
                }
            }
            envelope
        }
        Err(err) => {
            info!(operation, success = false, error = err.code(), "{}", err);
            metrics::record_operation(operation, false);

            json!({
                "success": false,
                "error": err.code(),
                "message": err.to_string(),
            })
        }
    }
}
