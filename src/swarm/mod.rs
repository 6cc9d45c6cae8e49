//! Swarm orchestration core
//!
//! The four cooperating components of the engine plus the state they share:
//!
//! - **Registry**: creates and resolves swarms, owns configuration bounds
//! - **Agent Pool**: spawns agents under capacity and memory constraints
//! - **Task Scheduler**: assigns tasks by capability and efficiency, drives
//!   asynchronous completion on supervised jobs
//! - **Monitor**: derives health, memory, and throughput views on demand
//!
//! All four operate on one [`store::SwarmStore`]; every mutation of a
//! swarm's counters happens inside that swarm's exclusive section.
//!
//! # Example
//!
//! ```ignore
//! use apiary::{SwarmEngine, CreateSwarmRequest, SpawnRequest, TaskRequest, AgentType};
//!
//! let engine = SwarmEngine::new();
//!
//! let swarm = engine.registry().create_swarm(
//!     CreateSwarmRequest::new("build-farm").with_max_agents(8),
//! )?;
//!
//! engine.pool().spawn("build-farm", SpawnRequest::new(AgentType::Worker))?;
//!
//! let task = engine.scheduler().submit(
//!     "build-farm",
//!     TaskRequest::new("index the repository").with_parallel(true),
//! )?;
//!
//! let status = engine.monitor().status("build-farm", Default::default())?;
//! println!("health: {:.0}", status.health.score);
//! ```

pub mod events;
pub mod monitor;
pub mod pool;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod types;

pub use events::{EngineEvent, EventBus};
pub use monitor::{
    HealthReport, HealthStatus, MemoryReport, MonitorOptions, SwarmMetrics, SwarmMonitor,
    SwarmStatusReport,
};
pub use pool::AgentPool;
pub use registry::SwarmRegistry;
pub use scheduler::TaskScheduler;
pub use store::SwarmStore;
pub use types::{
    Agent, AgentId, AgentStatus, CoordinationStrategy, CreateSwarmRequest, Priority, SpawnRequest,
    Swarm, SwarmId, SwarmStatus, Task, TaskId, TaskRequest, TaskStatus,
};
