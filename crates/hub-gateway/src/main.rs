//! Broadcast hub server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p hub-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use hub_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // The environment picks the log format, so configuration loads first.
    let config = AppConfig::from_env();
    let env = config.as_ref().map(|c| c.app.env).unwrap_or_default();

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        address = %config.gateway.address(),
        store = if config.redis.is_some() { "redis" } else { "memory" },
        "Configuration loaded"
    );

    if let Err(e) = hub_gateway::run(config).await {
        error!(error = %e, code = e.error_code(), "Gateway failed");
        std::process::exit(1);
    }
}
