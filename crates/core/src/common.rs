//! Common tier: state shared by debug servers and debug clients.
//!
//! Brings up only what a size-constrained debug server needs: the file
//! system, the log channel registry with the core and remote-protocol
//! channels, and host information.

use std::path::PathBuf;

use crate::context::{activate_slot, clear_slot, SystemContext};
use crate::error::{FacilityError, InitializationError};
use crate::facility::log::{
    GDB_REMOTE_CATEGORIES, GDB_REMOTE_CHANNEL, SYSTEM_CATEGORIES, SYSTEM_CHANNEL,
};
use crate::facility::{FileSystem, HostInfo, LogChannelSpec, LogRegistry};
use crate::lifecycle::{Initializer, Step, StepLedger};
use crate::types::{LifecycleState, Tier};

/// Construction input for the Common tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonOptions {
    /// Working directory for the file system; the process's current
    /// directory when unset.
    pub working_dir: Option<PathBuf>,
    /// Host triple override, validated during initialization.
    pub host_triple: Option<String>,
    /// Log channels to enable once every channel is registered.
    pub log_channels: Vec<LogChannelSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommonStep {
    FileSystem,
    LogRegistry,
    HostInfo,
    RemoteLog,
    EnableLogs,
}

impl Step for CommonStep {
    fn name(self) -> &'static str {
        match self {
            Self::FileSystem => "file-system",
            Self::LogRegistry => "log-registry",
            Self::HostInfo => "host-info",
            Self::RemoteLog => "remote-log",
            Self::EnableLogs => "log-enable",
        }
    }
}

const STEPS: &[CommonStep] = &[
    CommonStep::FileSystem,
    CommonStep::LogRegistry,
    CommonStep::HostInfo,
    CommonStep::RemoteLog,
    CommonStep::EnableLogs,
];

/// Initializer for the Common tier.
#[derive(Debug)]
pub struct CommonInitializer {
    options: CommonOptions,
    ledger: StepLedger<CommonStep>,
}

impl CommonInitializer {
    pub fn new(options: CommonOptions) -> Self {
        Self {
            options,
            ledger: StepLedger::new(Tier::Common),
        }
    }
}

impl Default for CommonInitializer {
    fn default() -> Self {
        Self::new(CommonOptions::default())
    }
}

fn apply(
    options: &CommonOptions,
    step: CommonStep,
    context: &mut SystemContext,
) -> Result<(), FacilityError> {
    match step {
        CommonStep::FileSystem => activate_slot(context.file_system_slot(), FileSystem::NAME, || {
            FileSystem::activate(options.working_dir.as_deref())
        }),
        CommonStep::LogRegistry => activate_slot(context.logs_slot(), LogRegistry::NAME, || {
            let mut registry = LogRegistry::new();
            registry.register_channel(SYSTEM_CHANNEL, SYSTEM_CATEGORIES)?;
            Ok(registry)
        }),
        CommonStep::HostInfo => activate_slot(context.host_slot(), HostInfo::NAME, || {
            HostInfo::resolve(options.host_triple.as_deref())
        }),
        CommonStep::RemoteLog => context
            .logs_slot()
            .as_mut()
            .ok_or(FacilityError::Inactive(LogRegistry::NAME))?
            .register_channel(GDB_REMOTE_CHANNEL, GDB_REMOTE_CATEGORIES),
        CommonStep::EnableLogs => {
            let registry = context
                .logs_slot()
                .as_mut()
                .ok_or(FacilityError::Inactive(LogRegistry::NAME))?;
            for spec in &options.log_channels {
                registry.enable(spec)?;
            }
            registry.log(SYSTEM_CHANNEL, "init", "log channels enabled");
            Ok(())
        }
    }
}

fn revert(step: CommonStep, context: &mut SystemContext) {
    match step {
        CommonStep::FileSystem => clear_slot(context.file_system_slot(), FileSystem::NAME),
        CommonStep::LogRegistry => clear_slot(context.logs_slot(), LogRegistry::NAME),
        CommonStep::HostInfo => clear_slot(context.host_slot(), HostInfo::NAME),
        CommonStep::RemoteLog => {
            let removed = context
                .logs_slot()
                .as_mut()
                .map(|registry| registry.unregister_channel(GDB_REMOTE_CHANNEL))
                .unwrap_or(false);
            if !removed {
                tracing::warn!(
                    stage = "teardown",
                    channel = GDB_REMOTE_CHANNEL,
                    "log channel was not registered"
                );
            }
        }
        CommonStep::EnableLogs => {
            if let Some(registry) = context.logs_slot().as_mut() {
                registry.disable_all();
            }
        }
    }
}

impl Initializer for CommonInitializer {
    fn tier(&self) -> Tier {
        Tier::Common
    }

    fn state(&self) -> LifecycleState {
        self.ledger.state()
    }

    fn initialize(&mut self, context: &mut SystemContext) -> Result<(), InitializationError> {
        let options = &self.options;
        self.ledger.run(STEPS, |step| apply(options, step, context))
    }

    fn terminate(&mut self, context: &mut SystemContext) {
        self.ledger.unwind(|step| revert(step, context));
    }
}
