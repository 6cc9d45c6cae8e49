//! Swarm monitoring and derived statistics
//!
//! Computes health, memory, and throughput views on demand from the state
//! the other components own. Everything here is a snapshot aggregation:
//! one lock acquisition per swarm, no mutation.

use super::store::SwarmStore;
use super::types::{AgentId, AgentStatus, Priority, Swarm, TaskId, TaskStatus};
use crate::strategy::Clock;
use crate::Result;
use chrono::Duration as ChronoDuration;
use serde::Serialize;
use std::sync::Arc;

/// Health label derived from the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Unhealthy,
}

impl HealthStatus {
    /// Label for a 0-100 composite score
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Healthy
        } else if score >= 60.0 {
            Self::Warning
        } else {
            Self::Unhealthy
        }
    }
}

/// Composite health view for one swarm
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Mean of the three component percentages, 0-100
    pub score: f64,

    /// Label derived from the score
    pub status: HealthStatus,

    /// Idle agents over total agents, as a percentage
    pub agent_health: f64,

    /// Memory headroom as a percentage of the budget
    pub memory_health: f64,

    /// Non-failed over finished tasks, as a percentage
    pub task_health: f64,
}

/// Per-agent entry in a detailed memory report
#[derive(Debug, Clone, Serialize)]
pub struct AgentMemoryUsage {
    pub agent_id: AgentId,
    pub name: String,
    pub memory_mb: f64,
}

/// Memory accounting view for one swarm
#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    pub swarm_name: String,

    /// Budget in MB
    pub memory_limit_mb: f64,

    /// Exact sum of current agent memory usage
    pub used_memory_mb: f64,

    /// Remaining budget
    pub available_memory_mb: f64,

    /// Used over budget, as a percentage
    pub utilization_percent: f64,

    /// Per-agent breakdown, present when detailed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<AgentMemoryUsage>>,

    /// Standard deviation of per-agent usage, present when detailed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragmentation_mb: Option<f64>,
}

/// Throughput and latency statistics over the recent window
#[derive(Debug, Clone, Serialize)]
pub struct SwarmMetrics {
    /// Tasks completed in the last hour, per minute
    pub throughput_per_minute: f64,

    /// Tasks started in the last hour, per minute
    pub processing_rate_per_minute: f64,

    /// Mean seconds between submission and start, over started tasks
    pub avg_queue_seconds: f64,
}

/// One agent's row in the agent-status section
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatusEntry {
    pub agent_id: AgentId,
    pub name: String,
    pub status: AgentStatus,
    pub current_task_id: Option<TaskId>,
    pub tasks_completed: u64,
}

/// One task's row in the task-queue section
#[derive(Debug, Clone, Serialize)]
pub struct TaskQueueEntry {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assigned_agents: usize,
}

/// Task-queue section: counts by state plus per-task rows
#[derive(Debug, Clone, Serialize)]
pub struct TaskQueueReport {
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub entries: Vec<TaskQueueEntry>,
}

/// Which optional sections a status report should include
#[derive(Debug, Clone, Copy, Default)]
pub struct MonitorOptions {
    pub include_metrics: bool,
    pub include_agents: bool,
    pub include_tasks: bool,
}

impl MonitorOptions {
    pub fn all() -> Self {
        Self {
            include_metrics: true,
            include_agents: true,
            include_tasks: true,
        }
    }
}

/// Composite status view for one swarm
#[derive(Debug, Clone, Serialize)]
pub struct SwarmStatusReport {
    pub swarm: Swarm,
    pub health: HealthReport,

    /// Memory used over budget, as a percentage
    pub memory_utilization_percent: f64,

    /// Agents in the pool over the agent bound, as a percentage
    pub agent_utilization_percent: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SwarmMetrics>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<AgentStatusEntry>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<TaskQueueReport>,
}

/// Computes derived views over the shared store
pub struct SwarmMonitor {
    store: Arc<SwarmStore>,
    clock: Arc<dyn Clock>,
}

impl SwarmMonitor {
    pub(crate) fn new(store: Arc<SwarmStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Memory accounting for the referenced swarm
    ///
    /// `used_memory_mb` is the exact sum of agent usage, recomputed from the
    /// agents themselves rather than read from the counter.
    pub fn memory_usage(&self, swarm_ref: &str, detailed: bool) -> Result<MemoryReport> {
        let cell = self.store.resolve(swarm_ref)?;
        let state = cell.lock().unwrap();

        let agents = state.agents_in_order();
        let used: f64 = agents.iter().map(|a| a.memory_usage_mb).sum();
        let limit = state.swarm.memory_limit_mb;

        let (breakdown, fragmentation) = if detailed {
            let rows = agents
                .iter()
                .map(|a| AgentMemoryUsage {
                    agent_id: a.id.clone(),
                    name: a.name.clone(),
                    memory_mb: a.memory_usage_mb,
                })
                .collect();
            let usages: Vec<f64> = agents.iter().map(|a| a.memory_usage_mb).collect();
            (Some(rows), Some(std_deviation(&usages)))
        } else {
            (None, None)
        };

        Ok(MemoryReport {
            swarm_name: state.swarm.name.clone(),
            memory_limit_mb: limit,
            used_memory_mb: used,
            available_memory_mb: (limit - used).max(0.0),
            utilization_percent: if limit > 0.0 { used / limit * 100.0 } else { 0.0 },
            agents: breakdown,
            fragmentation_mb: fragmentation,
        })
    }

    /// Composite status for the referenced swarm
    pub fn status(&self, swarm_ref: &str, options: MonitorOptions) -> Result<SwarmStatusReport> {
        let cell = self.store.resolve(swarm_ref)?;
        let state = cell.lock().unwrap();

        let agents = state.agents_in_order();
        let tasks: Vec<_> = state.tasks.values().cloned().collect();
        let swarm = state.swarm.clone();
        drop(state);

        let agent_health = if agents.is_empty() {
            100.0
        } else {
            let idle = agents.iter().filter(|a| a.status.is_available()).count();
            idle as f64 / agents.len() as f64 * 100.0
        };

        let memory_health = if swarm.memory_limit_mb > 0.0 {
            ((1.0 - swarm.total_memory_used_mb / swarm.memory_limit_mb) * 100.0).clamp(0.0, 100.0)
        } else {
            100.0
        };

        let finished = tasks.iter().filter(|t| t.is_finished()).count();
        let task_health = if finished == 0 {
            100.0
        } else {
            let non_failed = tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .count();
            non_failed as f64 / finished as f64 * 100.0
        };

        let score = (agent_health + memory_health + task_health) / 3.0;
        let health = HealthReport {
            score,
            status: HealthStatus::from_score(score),
            agent_health,
            memory_health,
            task_health,
        };

        let metrics = options.include_metrics.then(|| {
            let now = self.clock.now();
            let window = now - ChronoDuration::hours(1);

            let completed_recently = tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .filter(|t| t.completed_at.map(|at| at > window).unwrap_or(false))
                .count();
            let started_recently = tasks
                .iter()
                .filter(|t| t.started_at.map(|at| at > window).unwrap_or(false))
                .count();

            let waits: Vec<f64> = tasks.iter().filter_map(|t| t.queue_wait_seconds()).collect();
            let avg_queue_seconds = if waits.is_empty() {
                0.0
            } else {
                waits.iter().sum::<f64>() / waits.len() as f64
            };

            SwarmMetrics {
                throughput_per_minute: completed_recently as f64 / 60.0,
                processing_rate_per_minute: started_recently as f64 / 60.0,
                avg_queue_seconds,
            }
        });

        let agent_rows = options.include_agents.then(|| {
            agents
                .iter()
                .map(|a| AgentStatusEntry {
                    agent_id: a.id.clone(),
                    name: a.name.clone(),
                    status: a.status,
                    current_task_id: a.current_task_id.clone(),
                    tasks_completed: a.tasks_completed,
                })
                .collect()
        });

        let task_rows = options.include_tasks.then(|| {
            let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
            TaskQueueReport {
                queued: count(TaskStatus::Queued),
                running: count(TaskStatus::Running),
                completed: count(TaskStatus::Completed),
                failed: count(TaskStatus::Failed),
                entries: tasks
                    .iter()
                    .map(|t| TaskQueueEntry {
                        task_id: t.id.clone(),
                        status: t.status,
                        priority: t.priority,
                        assigned_agents: t.assigned_agent_ids.len(),
                    })
                    .collect(),
            }
        });

        Ok(SwarmStatusReport {
            memory_utilization_percent: swarm.memory_utilization_percent(),
            agent_utilization_percent: if swarm.max_agents > 0 {
                swarm.active_agents as f64 / swarm.max_agents as f64 * 100.0
            } else {
                0.0
            },
            swarm,
            health,
            metrics,
            agents: agent_rows,
            tasks: task_rows,
        })
    }
}

/// Population standard deviation; 0 for fewer than two samples
fn std_deviation(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let variance = samples
        .iter()
        .map(|s| (s - mean).powi(2))
        .sum::<f64>()
        / samples.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AgentType;
    use crate::strategy::{ManualClock, MidpointCostEstimator, SystemClock};
    use crate::swarm::events::EventBus;
    use crate::swarm::pool::AgentPool;
    use crate::swarm::types::{CoordinationStrategy, SpawnRequest, Swarm, SwarmStatus};
    use chrono::Utc;

    fn setup(memory_limit_mb: f64) -> (SwarmMonitor, AgentPool, Arc<SwarmStore>) {
        let store = Arc::new(SwarmStore::new());
        let swarm = Swarm {
            id: store.next_swarm_id(),
            name: "farm".to_string(),
            max_agents: 10,
            strategy: CoordinationStrategy::Centralized,
            memory_limit_mb,
            status: SwarmStatus::Initialized,
            created_at: Utc::now(),
            active_agents: 0,
            queued_tasks: 0,
            completed_tasks: 0,
            total_memory_used_mb: 0.0,
        };
        store.insert_swarm(swarm).unwrap();

        let monitor = SwarmMonitor::new(Arc::clone(&store), Arc::new(ManualClock::default()));
        let pool = AgentPool::new(
            Arc::clone(&store),
            Arc::new(SystemClock),
            Arc::new(MidpointCostEstimator),
            EventBus::new(),
        );
        (monitor, pool, store)
    }

    #[test]
    fn test_empty_swarm_is_perfectly_healthy() {
        let (monitor, _pool, _store) = setup(2048.0);
        let report = monitor.status("farm", MonitorOptions::default()).unwrap();

        assert_eq!(report.health.score, 100.0);
        assert_eq!(report.health.status, HealthStatus::Healthy);
        assert_eq!(report.health.agent_health, 100.0);
        assert_eq!(report.health.memory_health, 100.0);
        assert_eq!(report.health.task_health, 100.0);
        assert!(report.metrics.is_none());
        assert!(report.agents.is_none());
        assert!(report.tasks.is_none());
    }

    #[test]
    fn test_memory_report_is_exact_sum() {
        let (monitor, pool, _store) = setup(2048.0);
        pool.spawn("farm", SpawnRequest::new(AgentType::Worker)).unwrap();
        pool.spawn("farm", SpawnRequest::new(AgentType::Coordinator)).unwrap();
        pool.spawn("farm", SpawnRequest::new(AgentType::Specialist)).unwrap();

        let report = monitor.memory_usage("farm", false).unwrap();
        assert_eq!(report.used_memory_mb, 192.0 + 384.0 + 300.0);
        assert_eq!(report.available_memory_mb, 2048.0 - 876.0);
        assert!(report.agents.is_none());
        assert!(report.fragmentation_mb.is_none());

        let detailed = monitor.memory_usage("farm", true).unwrap();
        let rows = detailed.agents.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].memory_mb, 192.0);

        // Population std dev of {192, 384, 300} = sqrt(6176)
        let fragmentation = detailed.fragmentation_mb.unwrap();
        assert!((fragmentation - 6176.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_health_degrades_with_memory_pressure() {
        let (monitor, pool, _store) = setup(512.0);
        pool.spawn("farm", SpawnRequest::new(AgentType::Worker)).unwrap();
        pool.spawn("farm", SpawnRequest::new(AgentType::Worker)).unwrap();

        let report = monitor.status("farm", MonitorOptions::default()).unwrap();
        // 384 of 512 MB used: memory health 25, agents all idle: 100, no
        // finished tasks: 100 -> score 75
        assert_eq!(report.health.memory_health, 25.0);
        assert_eq!(report.health.score, 75.0);
        assert_eq!(report.health.status, HealthStatus::Warning);
    }

    #[test]
    fn test_status_label_bands() {
        assert_eq!(HealthStatus::from_score(100.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_score(80.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_score(79.9), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(60.0), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(59.9), HealthStatus::Unhealthy);
        assert_eq!(HealthStatus::from_score(0.0), HealthStatus::Unhealthy);
    }

    #[test]
    fn test_optional_sections() {
        let (monitor, pool, _store) = setup(2048.0);
        pool.spawn("farm", SpawnRequest::new(AgentType::Worker)).unwrap();

        let report = monitor.status("farm", MonitorOptions::all()).unwrap();
        assert!(report.metrics.is_some());
        let agents = report.agents.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].status, AgentStatus::Active);
        let tasks = report.tasks.unwrap();
        assert_eq!(tasks.queued + tasks.running + tasks.completed + tasks.failed, 0);
    }

    #[test]
    fn test_agent_utilization() {
        let (monitor, pool, _store) = setup(4096.0);
        for _ in 0..5 {
            pool.spawn("farm", SpawnRequest::new(AgentType::Worker)).unwrap();
        }

        let report = monitor.status("farm", MonitorOptions::default()).unwrap();
        assert_eq!(report.agent_utilization_percent, 50.0);
    }

    #[test]
    fn test_std_deviation() {
        assert_eq!(std_deviation(&[]), 0.0);
        assert_eq!(std_deviation(&[192.0]), 0.0);
        assert_eq!(std_deviation(&[192.0, 192.0]), 0.0);
        assert_eq!(std_deviation(&[2.0, 4.0]), 1.0);
    }
}
