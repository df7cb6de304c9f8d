use std::{fmt, path::PathBuf};

use dbginit_core::facility::{LogChannelSpec, LogSpecError};
use dbginit_core::{CommonOptions, ConsumerProfile, FailurePolicy, ParseEnumError};

use super::{
    env_flag, env_value, ENV_APP_ENV, ENV_FAILURE_POLICY, ENV_HOST_TRIPLE, ENV_LOG_CHANNELS,
    ENV_METRICS, ENV_PROFILE, ENV_WORKING_DIR,
};

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub profile: ConsumerProfile,
    pub failure_policy: FailurePolicy,
    pub common: CommonOptions,
    pub metrics_enabled: bool,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_name =
            env_value(ENV_APP_ENV).unwrap_or_else(|| "development".to_string());
        let environment = Environment::from_str(&env_name)?;

        let profile = match env_value(ENV_PROFILE) {
            Some(value) => value.parse().map_err(ConfigError::Profile)?,
            None => ConsumerProfile::default(),
        };
        let failure_policy = match env_value(ENV_FAILURE_POLICY) {
            Some(value) => value.parse().map_err(ConfigError::FailurePolicy)?,
            None => FailurePolicy::default(),
        };
        let log_channels = match env_value(ENV_LOG_CHANNELS) {
            Some(value) => LogChannelSpec::parse_list(&value).map_err(ConfigError::LogChannels)?,
            None => Vec::new(),
        };
        let metrics_enabled = env_flag(ENV_METRICS).map_err(ConfigError::MetricsFlag)?;

        Ok(Self {
            environment,
            profile,
            failure_policy,
            common: CommonOptions {
                working_dir: env_value(ENV_WORKING_DIR).map(PathBuf::from),
                host_triple: env_value(ENV_HOST_TRIPLE),
                log_channels,
            },
            metrics_enabled,
        })
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    Profile(ParseEnumError),
    FailurePolicy(ParseEnumError),
    LogChannels(LogSpecError),
    MetricsFlag(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::Profile(err) => write!(f, "invalid {ENV_PROFILE} value: {err}"),
            Self::FailurePolicy(err) => write!(f, "invalid {ENV_FAILURE_POLICY} value: {err}"),
            Self::LogChannels(err) => write!(f, "invalid {ENV_LOG_CHANNELS} value: {err}"),
            Self::MetricsFlag(value) => {
                write!(f, "{ENV_METRICS} must be a boolean flag (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
