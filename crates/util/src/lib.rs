pub mod config;

use std::env;

pub use config::{AppConfig, ConfigError, Environment};

pub const ENV_APP_ENV: &str = "APP_ENV";
pub const ENV_PROFILE: &str = "DBGINIT_PROFILE";
pub const ENV_FAILURE_POLICY: &str = "DBGINIT_FAILURE_POLICY";
pub const ENV_WORKING_DIR: &str = "DBGINIT_WORKING_DIR";
pub const ENV_HOST_TRIPLE: &str = "DBGINIT_HOST_TRIPLE";
pub const ENV_LOG_CHANNELS: &str = "DBGINIT_LOG_CHANNELS";
pub const ENV_METRICS: &str = "DBGINIT_METRICS";

/// Loads environment variables from `.env` when available.
///
/// Missing files are ignored so the function is safe in production builds
/// where dotenv files are not deployed.
pub fn load_env_file() {
    let _ = dotenvy::dotenv();
}

/// Returns the trimmed value of `name`, treating unset and blank values alike.
pub fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses a boolean flag. Unset means `false`.
pub fn env_flag(name: &str) -> Result<bool, String> {
    match env_value(name).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(other.to_string()),
    }
}
