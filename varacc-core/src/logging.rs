//! Tracing subscriber bootstrap shared by the binaries

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::VarAccError;

/// Environment variable that overrides the configured filter
pub const LOG_ENV_VAR: &str = "VARACC_LOG";

/// Build the filter: `VARACC_LOG` first, then the configured level
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), VarAccError> {
    let filter = build_filter(config);
    let result = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    };
    result.map_err(|e| VarAccError::Configuration(format!("Failed to initialize logging: {}", e)))
}
