//! Logging configuration using tracing
//!
//! Provides structured logging to stderr with support for the RUST_LOG
//! environment variable. The engine itself only emits tracing events; hosts
//! embedding the engine may install their own subscriber instead.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Sets up structured logging with:
/// - Filtering via RUST_LOG environment variable (defaults to "warn")
/// - Formatted output to stderr with module targets and thread ids
///
/// # Example RUST_LOG values
/// - `RUST_LOG=info` - Show info and above
/// - `RUST_LOG=apiary=debug` - Debug level for the engine only
/// - `RUST_LOG=apiary::swarm::scheduler=trace` - Trace task scheduling
///
/// # Errors
/// Returns an error if a subscriber has already been installed
pub fn init() -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .pretty(),
        )
        .try_init()
        .map_err(|e| {
            crate::ApiaryError::State(format!("Failed to initialize tracing: {}", e))
        })?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_helper() {
        // Can be called repeatedly without panicking
        init_test();
        init_test();
    }

    #[test]
    fn test_logging_macros() {
        init_test();

        tracing::debug!("debug message");
        tracing::info!(swarm = "build-farm", agents = 3, "structured fields");
        tracing::warn!("warning message");
    }
}
