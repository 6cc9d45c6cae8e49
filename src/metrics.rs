//! Prometheus metrics for the orchestration engine
//!
//! Counters and gauges for monitoring engine behavior in production. These
//! are process-wide aggregates; per-swarm statistics come from the monitor
//! component instead.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_int_counter, CounterVec, Encoder, GaugeVec,
    IntCounter, TextEncoder,
};

lazy_static! {
    /// Counter: swarms created
    pub static ref SWARMS_CREATED: IntCounter = register_int_counter!(
        "apiary_swarms_created_total",
        "Total swarms created"
    )
    .expect("Failed to create swarms_created metric");

    /// Counter: agents spawned by type
    pub static ref AGENTS_SPAWNED: CounterVec = register_counter_vec!(
        "apiary_agents_spawned_total",
        "Total agents spawned by agent type",
        &["agent_type"]
    )
    .expect("Failed to create agents_spawned metric");

    /// Counter: tasks reaching a terminal state, by outcome
    pub static ref TASKS_FINISHED: CounterVec = register_counter_vec!(
        "apiary_tasks_finished_total",
        "Total tasks finished by outcome",
        &["outcome"]
    )
    .expect("Failed to create tasks_finished metric");

    /// Counter: spawn/submit rejections by kind (agent_limit, memory, no_eligible)
    pub static ref REJECTIONS: CounterVec = register_counter_vec!(
        "apiary_rejections_total",
        "Total rejected requests by kind",
        &["kind"]
    )
    .expect("Failed to create rejections metric");

    /// Counter: boundary operations by name and result
    pub static ref OPERATIONS: CounterVec = register_counter_vec!(
        "apiary_operations_total",
        "Total boundary operations by name and result",
        &["operation", "status"]
    )
    .expect("Failed to create operations metric");

    /// Gauge: memory currently accounted to each swarm (MB)
    pub static ref SWARM_MEMORY_MB: GaugeVec = register_gauge_vec!(
        "apiary_swarm_memory_mb",
        "Memory currently accounted to a swarm in MB",
        &["swarm"]
    )
    .expect("Failed to create swarm_memory metric");
}

/// Record a created swarm
pub fn record_swarm_created() {
    SWARMS_CREATED.inc();
}

/// Record a spawned agent
pub fn record_agent_spawned(agent_type: &str) {
    AGENTS_SPAWNED.with_label_values(&[agent_type]).inc();
}

/// Record a finished task ("completed" or "failed")
pub fn record_task_finished(outcome: &str) {
    TASKS_FINISHED.with_label_values(&[outcome]).inc();
}

/// Record a rejected request
pub fn record_rejection(kind: &str) {
    REJECTIONS.with_label_values(&[kind]).inc();
}

/// Record a boundary operation result
pub fn record_operation(operation: &str, success: bool) {
    let status = if success { "ok" } else { "error" };
    OPERATIONS.with_label_values(&[operation, status]).inc();
}

/// Set the accounted memory for a swarm
pub fn set_swarm_memory(swarm: &str, mb: f64) {
    SWARM_MEMORY_MB.with_label_values(&[swarm]).set(mb);
}

/// Encode all metrics as Prometheus text format
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
