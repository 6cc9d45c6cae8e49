//! Apiary - In-Memory Swarm Orchestration Engine
//!
//! Apiary manages bounded pools of worker agents inside named swarms. It
//! assigns incoming tasks to agents by capability and load, accounts for a
//! per-swarm memory budget, and derives health and throughput statistics on
//! demand. State is process-resident; task execution is a modeled outcome
//! behind injectable strategies, not a real job runtime.
//!
//! # Architecture
//!
//! - **catalog**: agent types, default capabilities, memory-cost ranges
//! - **strategy**: injectable cost/duration/outcome/clock seams
//! - **swarm**: the core components (registry, pool, scheduler, monitor)
//!   and the shared store they coordinate through
//! - **engine**: wires everything into one embeddable handle
//! - **ops**: the five-operation boundary with the uniform result envelope
//! - **error**: the closed failure taxonomy
//! - **logging** / **metrics**: tracing setup and Prometheus collectors

// Core modules
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod strategy;
pub mod swarm;

// Boundary and observability
pub mod logging;
pub mod metrics;
pub mod ops;

// Re-exports
pub use catalog::AgentType;
pub use config::EngineConfig;
pub use engine::{SwarmEngine, SwarmEngineBuilder};
pub use error::{ApiaryError, Result};
pub use swarm::{
    Agent, AgentId, AgentStatus, CoordinationStrategy, CreateSwarmRequest, Priority, SpawnRequest,
    Swarm, SwarmId, SwarmStatus, Task, TaskId, TaskRequest, TaskStatus,
};
