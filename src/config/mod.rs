//! Tries to create an `AppConfig` from config files and the environment.
//! Gets initialized with `OnceLock` so it only needs to get initialized once.

mod error;
mod types;

use std::sync::OnceLock;
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use types::{AppConfig, DbConfig, Environment, NetConfig, SslRequire};

/// Allocates a static `OnceLock` containing `AppConfig`.
/// This ensures configuration only gets initialized the first time we call this function.
/// Every other caller gets a &'static ref to AppConfig.
/// Panics if anything goes wrong.
pub fn get_or_init_config() -> &'static AppConfig {
    static CONFIG_INIT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG_INIT.get_or_init(|| {
        info!(
            "{:<20} - Initializing the configuration",
            "get_or_init_config"
        );
        try_init_config().unwrap_or_else(|er| panic!("Fatal Error: Building config: {er}"))
    })
}

fn try_init_config() -> ConfigResult<AppConfig> {
    let config_dir = std::env::current_dir()?.join("config");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()?;

    let mut config = AppConfig::load(&config_dir, environment)?;

    // Setup DbConfig for production
    if matches!(environment, Environment::Production) {
        match std::env::var("DATABASE_URL") {
            Ok(production_db) => {
                info!("{:<20} - DATABASE_URL: found", "get_or_init_config");
                config.db_config = DbConfig::try_from(production_db.as_str())?;
            }
            Err(_) => info!(
                "{:<20} - DATABASE_URL: missing, using the configured db_config",
                "get_or_init_config"
            ),
        }
    }

    Ok(config)
}
