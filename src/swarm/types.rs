//! Core entities: swarms, agents, and tasks
//!
//! Pure data types plus the small amount of behavior that belongs on them
//! (state predicates, efficiency scoring, lifecycle mutations). All
//! coordination logic lives in the registry, pool, and scheduler.

use crate::catalog::AgentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Type-safe wrapper for swarm IDs
///
/// Format: `swarm-{n}` from a process-wide counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwarmId(String);

impl SwarmId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SwarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe wrapper for agent IDs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe wrapper for task IDs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How agents inside a swarm coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationStrategy {
    /// Single coordinator fans work out
    Centralized,

    /// Peers negotiate among themselves
    Distributed,

    /// Coordinator for planning, peers for execution
    Hybrid,
}

impl fmt::Display for CoordinationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Centralized => write!(f, "centralized"),
            Self::Distributed => write!(f, "distributed"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl FromStr for CoordinationStrategy {
    type Err = crate::ApiaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "centralized" => Ok(Self::Centralized),
            "distributed" => Ok(Self::Distributed),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(crate::ApiaryError::Validation(format!(
                "Unknown coordination strategy '{}' (expected centralized, distributed, or hybrid)",
                other
            ))),
        }
    }
}

/// Priority for agents and tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    /// Multiplier applied to a task's base duration estimate
    pub fn duration_multiplier(&self) -> f64 {
        match self {
            Self::Urgent => 0.5,
            Self::High => 0.7,
            Self::Normal => 1.0,
            Self::Low => 1.5,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Urgent => write!(f, "urgent"),
            Self::High => write!(f, "high"),
            Self::Normal => write!(f, "normal"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Priority {
    type Err = crate::ApiaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(Self::Urgent),
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            "low" => Ok(Self::Low),
            other => Err(crate::ApiaryError::Validation(format!(
                "Unknown priority '{}' (expected urgent, high, normal, or low)",
                other
            ))),
        }
    }
}

/// Swarm lifecycle state
///
/// Only `Initialized` is ever produced; no teardown operation exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwarmStatus {
    Initialized,
}

/// Agent lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Idle and eligible for assignment
    Active,

    /// Holding a task (`current_task_id` is set)
    Busy,

    /// Taken out of service; no operation produces this today
    Removed,
}

impl AgentStatus {
    /// Idle agents are the only ones eligible for new work
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Task lifecycle state
///
/// Transitions only move forward: queued -> running -> completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A named, capacity- and memory-bounded pool of agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swarm {
    /// Unique identifier
    pub id: SwarmId,

    /// Unique human-chosen name
    pub name: String,

    /// Maximum concurrent agents
    pub max_agents: usize,

    /// Coordination strategy
    pub strategy: CoordinationStrategy,

    /// Memory budget in MB
    pub memory_limit_mb: f64,

    /// Lifecycle state
    pub status: SwarmStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Agents currently in the pool
    pub active_agents: usize,

    /// Tasks submitted but not yet terminal
    pub queued_tasks: u64,

    /// Tasks that finished successfully
    pub completed_tasks: u64,

    /// Memory accounted to spawned agents, in MB
    pub total_memory_used_mb: f64,
}

impl Swarm {
    /// Memory still available for new agents
    pub fn available_memory_mb(&self) -> f64 {
        (self.memory_limit_mb - self.total_memory_used_mb).max(0.0)
    }

    /// Memory utilization as a percentage of the budget
    pub fn memory_utilization_percent(&self) -> f64 {
        if self.memory_limit_mb <= 0.0 {
            return 0.0;
        }
        self.total_memory_used_mb / self.memory_limit_mb * 100.0
    }

    /// Whether another agent fits under the agent-count bound
    pub fn has_agent_capacity(&self) -> bool {
        self.active_agents < self.max_agents
    }

    /// Whether the given memory cost fits under the budget
    pub fn fits_memory(&self, cost_mb: f64) -> bool {
        self.total_memory_used_mb + cost_mb <= self.memory_limit_mb
    }
}

/// A worker unit with a capability set, belonging to exactly one swarm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier
    pub id: AgentId,

    /// Human-readable name
    pub name: String,

    /// Agent type from the capability catalog
    pub agent_type: AgentType,

    /// Owning swarm; an agent never migrates
    pub swarm_id: SwarmId,

    /// Scheduling priority
    pub priority: Priority,

    /// Capability tags used for task eligibility
    pub capabilities: HashSet<String>,

    /// Lifecycle state
    pub status: AgentStatus,

    /// When the agent was spawned
    pub spawned_at: DateTime<Utc>,

    /// Last time the agent reported activity
    pub last_heartbeat: DateTime<Utc>,

    /// Memory accounted to this agent, in MB
    pub memory_usage_mb: f64,

    /// Task currently held, if any
    pub current_task_id: Option<TaskId>,

    /// Successful completions so far
    pub tasks_completed: u64,
}

impl Agent {
    /// Idle and able to take new work
    pub fn is_idle(&self) -> bool {
        self.status.is_available() && self.current_task_id.is_none()
    }

    /// Completions per MB of accounted memory; 0 when no memory is accounted
    pub fn efficiency(&self) -> f64 {
        if self.memory_usage_mb == 0.0 {
            return 0.0;
        }
        self.tasks_completed as f64 / self.memory_usage_mb
    }

    /// Whether this agent's capability set covers every required tag
    pub fn can_handle(&self, required: &[String]) -> bool {
        required.iter().all(|cap| self.capabilities.contains(cap))
    }

    /// Mark the agent as holding the given task
    pub fn begin_task(&mut self, task_id: TaskId, now: DateTime<Utc>) {
        self.current_task_id = Some(task_id);
        self.status = AgentStatus::Busy;
        self.last_heartbeat = now;
    }

    /// Release the agent from its current task
    pub fn finish_task(&mut self, success: bool, now: DateTime<Utc>) {
        self.current_task_id = None;
        self.status = AgentStatus::Active;
        self.last_heartbeat = now;
        if success {
            self.tasks_completed += 1;
        }
    }
}

/// A unit of requested work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// What the task should do
    pub definition: String,

    /// Owning swarm
    pub swarm_id: SwarmId,

    /// Scheduling priority
    pub priority: Priority,

    /// Lifecycle state
    pub status: TaskStatus,

    /// Whether the task was split across multiple agents
    pub parallel: bool,

    /// Advisory execution ceiling; enforced as a forced failure
    pub max_execution_minutes: f64,

    /// Capability tags an agent must carry to be eligible
    pub required_capabilities: Vec<String>,

    /// Assigned agents, in selection order
    pub assigned_agent_ids: Vec<AgentId>,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,

    /// Modeled duration in minutes, after multipliers
    pub estimated_minutes: f64,

    /// Projected completion time at submission
    pub estimated_completion: DateTime<Utc>,

    /// When execution began
    pub started_at: Option<DateTime<Utc>>,

    /// When the task reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,

    /// Why the task failed, when it did
    pub failure_reason: Option<String>,
}

impl Task {
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Seconds spent between submission and start, if started
    pub fn queue_wait_seconds(&self) -> Option<f64> {
        self.started_at
            .map(|started| (started - self.created_at).num_milliseconds() as f64 / 1000.0)
    }
}

/// Request to create a swarm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSwarmRequest {
    /// Unique swarm name
    pub name: String,

    /// Maximum concurrent agents, 1-100
    pub max_agents: usize,

    /// Coordination strategy
    pub strategy: CoordinationStrategy,

    /// Memory budget in MB, 512-8192
    pub memory_limit_mb: f64,
}

impl CreateSwarmRequest {
    /// Create a request with the standard defaults (5 agents, centralized,
    /// 2048 MB)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_agents: 5,
            strategy: CoordinationStrategy::Centralized,
            memory_limit_mb: 2048.0,
        }
    }

    pub fn with_max_agents(mut self, max_agents: usize) -> Self {
        self.max_agents = max_agents;
        self
    }

    pub fn with_strategy(mut self, strategy: CoordinationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_memory_limit_mb(mut self, limit: f64) -> Self {
        self.memory_limit_mb = limit;
        self
    }
}

/// Request to spawn an agent into a swarm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Agent type
    pub agent_type: AgentType,

    /// Optional name; generated from the type when omitted
    pub name: Option<String>,

    /// Optional capability tags; catalog defaults for the type when omitted
    pub capabilities: Option<Vec<String>>,

    /// Scheduling priority
    pub priority: Priority,
}

impl SpawnRequest {
    pub fn new(agent_type: AgentType) -> Self {
        Self {
            agent_type,
            name: None,
            capabilities: None,
            priority: Priority::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Request to submit a task to a swarm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// What the task should do
    pub definition: String,

    /// Scheduling priority
    pub priority: Priority,

    /// Split the work across multiple agents when possible
    pub parallel: bool,

    /// Execution ceiling in minutes
    pub max_execution_minutes: f64,

    /// Capability tags an agent must carry
    pub required_capabilities: Vec<String>,
}

impl TaskRequest {
    /// Create a request with the standard defaults (normal priority, serial,
    /// 60 minute ceiling, no capability requirements)
    pub fn new(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            priority: Priority::default(),
            parallel: false,
            max_execution_minutes: 60.0,
            required_capabilities: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_max_execution_minutes(mut self, minutes: f64) -> Self {
        self.max_execution_minutes = minutes;
        self
    }

    pub fn with_required_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.required_capabilities = capabilities;
        self
    }
}
