//! Engine lifecycle events
//!
//! Every state change the engine makes is mirrored as an event so hosts can
//! attach a telemetry sink (or a TUI) without the engine knowing about it.
//! Listeners run synchronously on the emitting thread; keep them cheap.

use super::types::{AgentId, SwarmId, TaskId};
use std::sync::{Arc, RwLock};

/// Type alias for the listener collection
type Listeners = Arc<RwLock<Vec<Box<dyn Fn(&EngineEvent) + Send + Sync>>>>;

/// Events emitted by the orchestration engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Swarm created
    SwarmCreated { swarm_id: SwarmId, name: String },

    /// Agent spawned into a swarm
    AgentSpawned {
        swarm_id: SwarmId,
        agent_id: AgentId,
        memory_mb: f64,
    },

    /// Spawn rejected by a capacity or memory bound
    SpawnRejected { swarm_id: SwarmId, reason: String },

    /// Task created and assigned
    TaskQueued {
        swarm_id: SwarmId,
        task_id: TaskId,
        assigned: usize,
    },

    /// Task began executing
    TaskStarted { swarm_id: SwarmId, task_id: TaskId },

    /// Task reached a terminal state
    TaskFinished {
        swarm_id: SwarmId,
        task_id: TaskId,
        success: bool,
    },
}

/// Fan-out point for engine events
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Listeners,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for all subsequent events
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write().unwrap();
        listeners.push(Box::new(listener));
    }

    /// Deliver an event to every registered listener
    pub fn emit(&self, event: EngineEvent) {
        let listeners = self.listeners.read().unwrap();
        for listener in listeners.iter() {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_listeners_receive_events() {
        let bus = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = Arc::clone(&seen);
        bus.add_listener(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(EngineEvent::SwarmCreated {
            swarm_id: SwarmId::new("swarm-1"),
            name: "build-farm".to_string(),
        });
        bus.emit(EngineEvent::TaskStarted {
            swarm_id: SwarmId::new("swarm-1"),
            task_id: TaskId::new("task-1"),
        });

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_multiple_listeners() {
        let bus = EventBus::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));

        let a_clone = Arc::clone(&a);
        bus.add_listener(move |_| {
            a_clone.fetch_add(1, Ordering::SeqCst);
        });
        let b_clone = Arc::clone(&b);
        bus.add_listener(move |event| {
            if matches!(event, EngineEvent::TaskFinished { success: true, .. }) {
                b_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        bus.emit(EngineEvent::TaskFinished {
            swarm_id: SwarmId::new("swarm-1"),
            task_id: TaskId::new("task-1"),
            success: true,
        });
        bus.emit(EngineEvent::TaskFinished {
            swarm_id: SwarmId::new("swarm-1"),
            task_id: TaskId::new("task-2"),
            success: false,
        });

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }
}
