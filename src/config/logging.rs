use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crate name as it appears in log targets
const CRATE_TARGET: &str = "fitness_tracker";

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(level: &str) -> String {
    format!("{CRATE_TARGET}={level},tower_http={level},sqlx=warn")
}

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(level)))
        .map_err(|e| anyhow!("Invalid log filter: {}", e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
