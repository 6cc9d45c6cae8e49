//! Task scheduler
//!
//! Accepts task submissions, selects assignees by capability and efficiency,
//! and drives each task to a terminal state on a supervised background job.
//! Submission returns the queued task immediately; execution is a modeled
//! outcome behind the injected duration/outcome strategies.

use super::events::{EngineEvent, EventBus};
use super::store::{SwarmCell, SwarmStore};
use super::types::{Task, TaskId, TaskRequest, TaskStatus};
use crate::config::EngineConfig;
use crate::strategy::{Clock, DurationEstimator, OutcomePolicy, TaskOutcome};
use crate::{metrics, ApiaryError, Result};
use chrono::Duration as ChronoDuration;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Duration multiplier applied when a task is parallelized
const PARALLEL_SPEEDUP: f64 = 0.6;

/// Schedules tasks onto idle agents and supervises their completion
pub struct TaskScheduler {
    store: Arc<SwarmStore>,
    clock: Arc<dyn Clock>,
    duration: Arc<dyn DurationEstimator>,
    outcome: Arc<dyn OutcomePolicy>,
    events: EventBus,
    config: EngineConfig,
    jobs: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskScheduler {
    pub(crate) fn new(
        store: Arc<SwarmStore>,
        clock: Arc<dyn Clock>,
        duration: Arc<dyn DurationEstimator>,
        outcome: Arc<dyn OutcomePolicy>,
        events: EventBus,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            clock,
            duration,
            outcome,
            events,
            config,
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Submit a task to the referenced swarm
    ///
    /// Selection: idle agents whose capability set covers every required tag,
    /// ranked by completions-per-MB (ties broken toward lighter agents).
    /// Parallel tasks take half the eligible pool, at least one. Fails with
    /// not-found when no agent qualifies; no task record is created then.
    ///
    /// Must be called from within a tokio runtime; the completion job is
    /// spawned onto it.
    pub fn submit(&self, swarm_ref: &str, request: TaskRequest) -> Result<Task> {
        let cell = self.store.resolve(swarm_ref)?;

        let (task, swarm_name) = {
            let mut state = cell.lock().unwrap();

            let mut eligible: Vec<_> = state
                .agents_in_order()
                .into_iter()
                .filter(|agent| agent.is_idle() && agent.can_handle(&request.required_capabilities))
                .collect();

            if eligible.is_empty() {
                let reason = format!(
                    "No idle agents in swarm '{}' satisfy capabilities {:?}",
                    state.swarm.name, request.required_capabilities
                );
                drop(state);
                warn!(swarm = swarm_ref, "{}", reason);
                metrics::record_rejection("no_eligible");
                return Err(ApiaryError::NotFound(reason));
            }

            let assignee_count = if request.parallel {
                (eligible.len() / 2).max(1)
            } else {
                1
            }
            .min(eligible.len());

            eligible.sort_by(|a, b| {
                b.efficiency()
                    .partial_cmp(&a.efficiency())
                    .unwrap_or(Ordering::Equal)
                    .then(
                        a.memory_usage_mb
                            .partial_cmp(&b.memory_usage_mb)
                            .unwrap_or(Ordering::Equal),
                    )
            });

            let assigned: Vec<_> = eligible
                .into_iter()
                .take(assignee_count)
                .map(|agent| agent.id)
                .collect();

            let base_minutes = self.duration.base_minutes(&request.definition);
            let parallel_factor = if request.parallel { PARALLEL_SPEEDUP } else { 1.0 };
            let estimated_minutes =
                base_minutes * request.priority.duration_multiplier() * parallel_factor;

            let now = self.clock.now();
            let task = Task {
                id: self.store.next_task_id(),
                definition: request.definition,
                swarm_id: state.swarm.id.clone(),
                priority: request.priority,
                status: TaskStatus::Queued,
                parallel: request.parallel,
                max_execution_minutes: request.max_execution_minutes,
                required_capabilities: request.required_capabilities,
                assigned_agent_ids: assigned.clone(),
                created_at: now,
                estimated_minutes,
                estimated_completion: now + minutes_to_duration(estimated_minutes),
                started_at: None,
                completed_at: None,
                failure_reason: None,
            };

            for agent_id in &assigned {
                if let Some(agent) = state.agents.get_mut(agent_id) {
                    agent.begin_task(task.id.clone(), now);
                }
            }

            state.swarm.queued_tasks += 1;
            state.tasks.insert(task.id.clone(), task.clone());

            (task, state.swarm.name.clone())
        };

        info!(
            swarm = %swarm_name,
            task = %task.id,
            assigned = task.assigned_agent_ids.len(),
            estimated_minutes = task.estimated_minutes,
            parallel = task.parallel,
            "Queued task"
        );
        self.events.emit(EngineEvent::TaskQueued {
            swarm_id: task.swarm_id.clone(),
            task_id: task.id.clone(),
            assigned: task.assigned_agent_ids.len(),
        });

        self.supervise(Arc::clone(&cell), task.clone());

        Ok(task)
    }

    /// Look up a task by id within a swarm
    pub fn task(&self, swarm_ref: &str, task_id: &TaskId) -> Result<Task> {
        let cell = self.store.resolve(swarm_ref)?;
        let state = cell.lock().unwrap();
        state
            .tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| ApiaryError::NotFound(format!("Task '{}' not found", task_id)))
    }

    /// Wait for every supervised completion job spawned so far
    ///
    /// With a manual clock this drains the queue without wall-clock sleeping,
    /// which is how tests observe terminal states deterministically.
    pub async fn await_completions(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut jobs = self.jobs.lock().unwrap();
                jobs.drain(..).collect()
            };
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                let _ = handle.await;
            }
        }
    }

    /// Spawn the supervised job that drives one task to a terminal state
    fn supervise(&self, cell: SwarmCell, task: Task) {
        let clock = Arc::clone(&self.clock);
        let outcome = Arc::clone(&self.outcome);
        let events = self.events.clone();
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            run_to_completion(cell, task, clock, outcome, events, config).await;
        });

        self.jobs.lock().unwrap().push(handle);
    }
}

/// Convert simulated minutes to a chrono duration
fn minutes_to_duration(minutes: f64) -> ChronoDuration {
    ChronoDuration::milliseconds((minutes * 60_000.0) as i64)
}

/// Drive a queued task through running to a terminal state
///
/// Both transitions are guarded by status checks under the swarm lock, so a
/// duplicate or racing job settles into a no-op. When the execution ceiling
/// is shorter than the estimate, the job fires a forced failure at the
/// ceiling instead of completing.
async fn run_to_completion(
    cell: SwarmCell,
    task: Task,
    clock: Arc<dyn Clock>,
    outcome: Arc<dyn OutcomePolicy>,
    events: EventBus,
    config: EngineConfig,
) {
    let task_id = task.id.clone();
    let swarm_id = task.swarm_id.clone();

    {
        let mut state = cell.lock().unwrap();
        let Some(stored) = state.tasks.get_mut(&task_id) else {
            return;
        };
        if stored.status != TaskStatus::Queued {
            return;
        }
        stored.status = TaskStatus::Running;
        stored.started_at = Some(clock.now());
    }

    debug!(task = %task_id, "Task running");
    events.emit(EngineEvent::TaskStarted {
        swarm_id: swarm_id.clone(),
        task_id: task_id.clone(),
    });

    let timed_out = task.estimated_minutes > task.max_execution_minutes;
    let wait_minutes = task.estimated_minutes.min(task.max_execution_minutes);
    clock.sleep(config.scaled(wait_minutes)).await;

    let verdict = if timed_out {
        TaskOutcome::Failure
    } else {
        outcome.next_outcome()
    };
    let success = verdict == TaskOutcome::Success;

    {
        let mut state = cell.lock().unwrap();
        let now = clock.now();

        let Some(stored) = state.tasks.get_mut(&task_id) else {
            return;
        };
        if stored.status != TaskStatus::Running {
            return;
        }

        stored.status = if success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        stored.completed_at = Some(now);
        if timed_out {
            stored.failure_reason = Some(format!(
                "Exceeded execution ceiling of {} minutes",
                task.max_execution_minutes
            ));
        } else if !success {
            stored.failure_reason = Some("Execution failed".to_string());
        }

        let assigned = stored.assigned_agent_ids.clone();
        for agent_id in &assigned {
            if let Some(agent) = state.agents.get_mut(agent_id) {
                agent.finish_task(success, now);
            }
        }

        state.swarm.queued_tasks = state.swarm.queued_tasks.saturating_sub(1);
        if success {
            state.swarm.completed_tasks += 1;
        }
    }

    if success {
        info!(task = %task_id, "Task completed");
        metrics::record_task_finished("completed");
    } else if timed_out {
        warn!(task = %task_id, "Task failed: execution ceiling exceeded");
        metrics::record_task_finished("failed");
    } else {
        warn!(task = %task_id, "Task failed");
        metrics::record_task_finished("failed");
    }
    events.emit(EngineEvent::TaskFinished {
        swarm_id,
        task_id,
        success,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AgentType;
    use crate::strategy::{
        AlwaysSucceed, EveryNthFails, FixedDurationEstimator, ManualClock, MidpointCostEstimator,
    };
    use crate::swarm::pool::AgentPool;
    use crate::swarm::types::{CoordinationStrategy, Priority, SpawnRequest, Swarm, SwarmStatus};
    use chrono::Utc;

    struct Fixture {
        scheduler: TaskScheduler,
        pool: AgentPool,
        store: Arc<SwarmStore>,
    }

    fn fixture(outcome: Arc<dyn OutcomePolicy>) -> Fixture {
        let store = Arc::new(SwarmStore::new());
        let clock = Arc::new(ManualClock::default());
        let events = EventBus::new();
        let config = EngineConfig::default();

        let pool = AgentPool::new(
            Arc::clone(&store),
            clock.clone() as Arc<dyn Clock>,
            Arc::new(MidpointCostEstimator),
            events.clone(),
        );
        let scheduler = TaskScheduler::new(
            Arc::clone(&store),
            clock as Arc<dyn Clock>,
            Arc::new(FixedDurationEstimator::default()),
            outcome,
            events,
            config,
        );

        Fixture {
            scheduler,
            pool,
            store,
        }
    }

    fn insert_swarm(store: &SwarmStore, name: &str, max_agents: usize) {
        let swarm = Swarm {
            id: store.next_swarm_id(),
            name: name.to_string(),
            max_agents,
            strategy: CoordinationStrategy::Centralized,
            memory_limit_mb: 8192.0,
            status: SwarmStatus::Initialized,
            created_at: Utc::now(),
            active_agents: 0,
            queued_tasks: 0,
            completed_tasks: 0,
            total_memory_used_mb: 0.0,
        };
        store.insert_swarm(swarm).unwrap();
    }

    #[tokio::test]
    async fn test_no_eligible_agents_creates_no_task() {
        let fx = fixture(Arc::new(AlwaysSucceed));
        insert_swarm(&fx.store, "farm", 5);
        fx.pool
            .spawn("farm", SpawnRequest::new(AgentType::Worker))
            .unwrap();

        let err = fx
            .scheduler
            .submit(
                "farm",
                TaskRequest::new("train model").with_required_capabilities(vec!["gpu".to_string()]),
            )
            .unwrap_err();
        assert!(matches!(err, ApiaryError::NotFound(_)));

        let cell = fx.store.resolve("farm").unwrap();
        let state = cell.lock().unwrap();
        assert!(state.tasks.is_empty());
        assert_eq!(state.swarm.queued_tasks, 0);
    }

    #[tokio::test]
    async fn test_parallel_assigns_half_of_eligible() {
        let fx = fixture(Arc::new(AlwaysSucceed));
        insert_swarm(&fx.store, "farm", 8);
        for _ in 0..4 {
            fx.pool
                .spawn("farm", SpawnRequest::new(AgentType::Worker))
                .unwrap();
        }

        let parallel = fx
            .scheduler
            .submit("farm", TaskRequest::new("index repo").with_parallel(true))
            .unwrap();
        assert_eq!(parallel.assigned_agent_ids.len(), 2);

        fx.scheduler.await_completions().await;

        let serial = fx
            .scheduler
            .submit("farm", TaskRequest::new("lint repo"))
            .unwrap();
        assert_eq!(serial.assigned_agent_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_parallel_single_agent_still_assigns_one() {
        let fx = fixture(Arc::new(AlwaysSucceed));
        insert_swarm(&fx.store, "farm", 5);
        fx.pool
            .spawn("farm", SpawnRequest::new(AgentType::Worker))
            .unwrap();

        let task = fx
            .scheduler
            .submit("farm", TaskRequest::new("solo").with_parallel(true))
            .unwrap();
        assert_eq!(task.assigned_agent_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_ranking_prefers_efficient_then_lighter_agents() {
        let fx = fixture(Arc::new(AlwaysSucceed));
        insert_swarm(&fx.store, "farm", 5);
        let worker = fx
            .pool
            .spawn("farm", SpawnRequest::new(AgentType::Worker))
            .unwrap();
        let specialist = fx
            .pool
            .spawn("farm", SpawnRequest::new(AgentType::Specialist))
            .unwrap();

        // Give the specialist a completion so its efficiency is nonzero
        {
            let cell = fx.store.resolve("farm").unwrap();
            let mut state = cell.lock().unwrap();
            state.agents.get_mut(&specialist.id).unwrap().tasks_completed = 4;
        }

        let task = fx.scheduler.submit("farm", TaskRequest::new("job")).unwrap();
        assert_eq!(task.assigned_agent_ids, vec![specialist.id.clone()]);
        fx.scheduler.await_completions().await;

        // With equal efficiency (both zero after reset below), the lighter
        // worker (192 MB) wins over the specialist (300 MB)
        {
            let cell = fx.store.resolve("farm").unwrap();
            let mut state = cell.lock().unwrap();
            state.agents.get_mut(&specialist.id).unwrap().tasks_completed = 0;
            for agent in state.agents.values_mut() {
                agent.tasks_completed = 0;
            }
        }
        let task = fx.scheduler.submit("farm", TaskRequest::new("job2")).unwrap();
        assert_eq!(task.assigned_agent_ids, vec![worker.id]);
    }

    #[tokio::test]
    async fn test_duration_multipliers() {
        let fx = fixture(Arc::new(AlwaysSucceed));
        insert_swarm(&fx.store, "farm", 8);
        for _ in 0..4 {
            fx.pool
                .spawn("farm", SpawnRequest::new(AgentType::Worker))
                .unwrap();
        }

        // Base 15 minutes, urgent halves it
        let urgent = fx
            .scheduler
            .submit(
                "farm",
                TaskRequest::new("hotfix").with_priority(Priority::Urgent),
            )
            .unwrap();
        assert_eq!(urgent.estimated_minutes, 7.5);

        // Low priority stretches it
        let low = fx
            .scheduler
            .submit("farm", TaskRequest::new("cleanup").with_priority(Priority::Low))
            .unwrap();
        assert_eq!(low.estimated_minutes, 22.5);

        fx.scheduler.await_completions().await;

        // Parallelization shaves 40% on top of priority
        let parallel = fx
            .scheduler
            .submit("farm", TaskRequest::new("fanout").with_parallel(true))
            .unwrap();
        assert_eq!(parallel.estimated_minutes, 9.0);
    }

    #[tokio::test]
    async fn test_completion_releases_agents() {
        let fx = fixture(Arc::new(AlwaysSucceed));
        insert_swarm(&fx.store, "farm", 5);
        fx.pool
            .spawn("farm", SpawnRequest::new(AgentType::Worker))
            .unwrap();

        let task = fx.scheduler.submit("farm", TaskRequest::new("job")).unwrap();
        assert_eq!(task.status, TaskStatus::Queued);

        // Assigned agent is busy and pointed at the task
        {
            let cell = fx.store.resolve("farm").unwrap();
            let state = cell.lock().unwrap();
            let agent = &state.agents[&task.assigned_agent_ids[0]];
            assert_eq!(agent.current_task_id, Some(task.id.clone()));
        }

        fx.scheduler.await_completions().await;

        let finished = fx.scheduler.task("farm", &task.id).unwrap();
        assert_eq!(finished.status, TaskStatus::Completed);
        assert!(finished.started_at.is_some());
        assert!(finished.completed_at.is_some());

        let cell = fx.store.resolve("farm").unwrap();
        let state = cell.lock().unwrap();
        for agent_id in &finished.assigned_agent_ids {
            let agent = &state.agents[agent_id];
            assert!(agent.current_task_id.is_none());
            assert_eq!(agent.tasks_completed, 1);
        }
        assert_eq!(state.swarm.queued_tasks, 0);
        assert_eq!(state.swarm.completed_tasks, 1);
    }

    #[tokio::test]
    async fn test_modeled_failure_releases_agents_without_credit() {
        // Every outcome fails
        let fx = fixture(Arc::new(EveryNthFails::new(1)));
        insert_swarm(&fx.store, "farm", 5);
        fx.pool
            .spawn("farm", SpawnRequest::new(AgentType::Worker))
            .unwrap();

        let task = fx.scheduler.submit("farm", TaskRequest::new("doomed")).unwrap();
        fx.scheduler.await_completions().await;

        let finished = fx.scheduler.task("farm", &task.id).unwrap();
        assert_eq!(finished.status, TaskStatus::Failed);
        assert!(finished.failure_reason.is_some());

        let cell = fx.store.resolve("farm").unwrap();
        let state = cell.lock().unwrap();
        let agent = &state.agents[&finished.assigned_agent_ids[0]];
        assert!(agent.current_task_id.is_none());
        assert_eq!(agent.tasks_completed, 0);
        assert_eq!(state.swarm.queued_tasks, 0);
        assert_eq!(state.swarm.completed_tasks, 0);
    }

    #[tokio::test]
    async fn test_execution_ceiling_forces_failure() {
        let fx = fixture(Arc::new(AlwaysSucceed));
        insert_swarm(&fx.store, "farm", 5);
        fx.pool
            .spawn("farm", SpawnRequest::new(AgentType::Worker))
            .unwrap();

        // Estimate is 15 minutes; ceiling of 5 cuts it short
        let task = fx
            .scheduler
            .submit(
                "farm",
                TaskRequest::new("slow job").with_max_execution_minutes(5.0),
            )
            .unwrap();
        fx.scheduler.await_completions().await;

        let finished = fx.scheduler.task("farm", &task.id).unwrap();
        assert_eq!(finished.status, TaskStatus::Failed);
        assert!(finished
            .failure_reason
            .as_deref()
            .unwrap()
            .contains("ceiling"));
    }

    #[tokio::test]
    async fn test_busy_agents_are_not_eligible() {
        let fx = fixture(Arc::new(AlwaysSucceed));
        insert_swarm(&fx.store, "farm", 5);
        fx.pool
            .spawn("farm", SpawnRequest::new(AgentType::Worker))
            .unwrap();

        // First submission takes the only agent
        fx.scheduler.submit("farm", TaskRequest::new("first")).unwrap();

        // Second submission finds nobody idle
        let err = fx
            .scheduler
            .submit("farm", TaskRequest::new("second"))
            .unwrap_err();
        assert!(matches!(err, ApiaryError::NotFound(_)));

        fx.scheduler.await_completions().await;

        // After completion the agent is free again
        fx.scheduler.submit("farm", TaskRequest::new("third")).unwrap();
        fx.scheduler.await_completions().await;
    }
}
