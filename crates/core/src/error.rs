use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Tier;

/// Failure of a single sub-step inside a process-wide facility.
#[derive(Debug, Error)]
pub enum FacilityError {
    #[error("{0} is already active")]
    AlreadyActive(&'static str),
    #[error("{0} is not active")]
    Inactive(&'static str),
    #[error("cannot use working directory '{}': {source}", .path.display())]
    WorkingDirectory { path: PathBuf, source: io::Error },
    #[error("working directory '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("invalid host triple '{0}': expected arch-vendor-os[-env]")]
    InvalidTriple(String),
    #[error("log channel '{0}' is already registered")]
    DuplicateChannel(String),
    #[error("unknown log channel '{0}'")]
    UnknownChannel(String),
    #[error("unknown category '{category}' for log channel '{channel}'")]
    UnknownCategory { channel: String, category: String },
    #[error("plugin '{0}' is already registered")]
    DuplicatePlugin(&'static str),
    #[error("no disassembler available for architecture '{0}'")]
    UnsupportedArchitecture(String),
}

const UNSPECIFIED_CAUSE: &str = "unspecified failure";

/// The single error kind produced by `Initializer::initialize`.
///
/// Whatever sub-step failed, the whole tier is reported as failed; the cause
/// names the step and the facility error is kept as the source.
#[derive(Debug, Error)]
#[error("{tier} tier initialization failed: {cause}")]
pub struct InitializationError {
    tier: Tier,
    cause: String,
    #[source]
    source: Option<FacilityError>,
}

impl InitializationError {
    pub(crate) fn new<S: Into<String>>(tier: Tier, cause: S) -> Self {
        let cause = cause.into();
        let cause = if cause.trim().is_empty() {
            UNSPECIFIED_CAUSE.to_string()
        } else {
            cause
        };
        Self {
            tier,
            cause,
            source: None,
        }
    }

    /// Wraps a facility failure raised while running `step`.
    pub fn step(tier: Tier, step: &str, source: FacilityError) -> Self {
        Self {
            tier,
            cause: format!("step '{step}': {source}"),
            source: Some(source),
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Human-readable description of what failed. Never empty.
    pub fn cause(&self) -> &str {
        &self.cause
    }

    pub fn facility_error(&self) -> Option<&FacilityError> {
        self.source.as_ref()
    }
}
