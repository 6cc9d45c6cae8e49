//! Shared in-memory state store
//!
//! One process-resident store owns every swarm, its agents, and its tasks.
//! Each swarm's slice of state lives behind its own mutex: capacity checks
//! and the increments they authorize happen under one lock acquisition, so
//! concurrent writers can never split a check from its effect. Lookups go
//! through two indices, id and name, maintained together on insert.
//!
//! Lock order when both are needed: name index before swarm map.

use super::types::{Agent, AgentId, Swarm, SwarmId, Task, TaskId};
use crate::{ApiaryError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// A swarm's record plus everything it owns, guarded as one unit
#[derive(Debug)]
pub struct SwarmState {
    /// The swarm record with its derived counters
    pub swarm: Swarm,

    /// Agents by id
    pub agents: HashMap<AgentId, Agent>,

    /// Agent insertion order, for stable listings
    pub agent_order: Vec<AgentId>,

    /// Tasks by id
    pub tasks: HashMap<TaskId, Task>,
}

impl SwarmState {
    fn new(swarm: Swarm) -> Self {
        Self {
            swarm,
            agents: HashMap::new(),
            agent_order: Vec::new(),
            tasks: HashMap::new(),
        }
    }

    /// Insert an agent, preserving insertion order
    pub fn insert_agent(&mut self, agent: Agent) {
        self.agent_order.push(agent.id.clone());
        self.agents.insert(agent.id.clone(), agent);
    }

    /// Snapshot all agents in insertion order
    pub fn agents_in_order(&self) -> Vec<Agent> {
        self.agent_order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .cloned()
            .collect()
    }
}

/// Handle to one swarm's guarded state
pub type SwarmCell = Arc<Mutex<SwarmState>>;

/// Process-wide store for all orchestration state
pub struct SwarmStore {
    /// id -> swarm state
    swarms: RwLock<HashMap<SwarmId, SwarmCell>>,

    /// name -> id, kept consistent with the swarm map on every insert
    names: RwLock<HashMap<String, SwarmId>>,

    swarm_seq: AtomicU64,
    agent_seq: AtomicU64,
    task_seq: AtomicU64,
}

impl Default for SwarmStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SwarmStore {
    pub fn new() -> Self {
        Self {
            swarms: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
            swarm_seq: AtomicU64::new(0),
            agent_seq: AtomicU64::new(0),
            task_seq: AtomicU64::new(0),
        }
    }

    /// Generate the next swarm id
    pub fn next_swarm_id(&self) -> SwarmId {
        let n = self.swarm_seq.fetch_add(1, Ordering::Relaxed) + 1;
        SwarmId::new(format!("swarm-{}", n))
    }

    /// Generate the next agent id
    pub fn next_agent_id(&self) -> AgentId {
        let n = self.agent_seq.fetch_add(1, Ordering::Relaxed) + 1;
        AgentId::new(format!("agent-{}", n))
    }

    /// Generate the next task id
    pub fn next_task_id(&self) -> TaskId {
        let n = self.task_seq.fetch_add(1, Ordering::Relaxed) + 1;
        TaskId::new(format!("task-{}", n))
    }

    /// Current value of the agent sequence, used for generated agent names
    pub fn agent_count_hint(&self) -> u64 {
        self.agent_seq.load(Ordering::Relaxed)
    }

    /// Insert a new swarm, registering both indices in one step
    ///
    /// Fails with a conflict if the name is already taken. The name index
    /// write lock is held across the check and both inserts, so two
    /// concurrent creates with the same name cannot both succeed.
    pub fn insert_swarm(&self, swarm: Swarm) -> Result<()> {
        let mut names = self.names.write().unwrap();
        if names.contains_key(&swarm.name) {
            return Err(ApiaryError::Conflict(format!(
                "Swarm name '{}' already exists",
                swarm.name
            )));
        }

        names.insert(swarm.name.clone(), swarm.id.clone());

        let mut swarms = self.swarms.write().unwrap();
        swarms.insert(swarm.id.clone(), Arc::new(Mutex::new(SwarmState::new(swarm))));
        Ok(())
    }

    /// Resolve a swarm reference, accepting either the generated id or the
    /// human-chosen name
    pub fn resolve(&self, swarm_ref: &str) -> Result<SwarmCell> {
        {
            let swarms = self.swarms.read().unwrap();
            if let Some(cell) = swarms.get(&SwarmId::new(swarm_ref)) {
                return Ok(Arc::clone(cell));
            }
        }

        let id = {
            let names = self.names.read().unwrap();
            names.get(swarm_ref).cloned()
        };

        if let Some(id) = id {
            let swarms = self.swarms.read().unwrap();
            if let Some(cell) = swarms.get(&id) {
                return Ok(Arc::clone(cell));
            }
        }

        Err(ApiaryError::NotFound(format!(
            "Swarm '{}' not found",
            swarm_ref
        )))
    }

    /// Snapshot a swarm record by id or name
    pub fn snapshot(&self, swarm_ref: &str) -> Result<Swarm> {
        let cell = self.resolve(swarm_ref)?;
        let state = cell.lock().unwrap();
        Ok(state.swarm.clone())
    }
}
