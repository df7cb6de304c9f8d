use std::path::PathBuf;

use serde::Serialize;

use crate::error::FacilityError;
use crate::facility::{ChannelSnapshot, FileSystem, HostInfo, LogRegistry};
#[cfg(feature = "full")]
use crate::facility::PluginRegistry;

/// Owner of every process-wide facility.
///
/// A context is created by the lifetime manager and lent mutably to each
/// initializer in turn, so activation and teardown are serialized without
/// locks. Slots start empty; a pristine context has nothing active.
#[derive(Debug, Default)]
pub struct SystemContext {
    file_system: Option<FileSystem>,
    logs: Option<LogRegistry>,
    host: Option<HostInfo>,
    #[cfg(feature = "full")]
    plugins: Option<PluginRegistry>,
}

impl SystemContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_system(&self) -> Option<&FileSystem> {
        self.file_system.as_ref()
    }

    pub fn logs(&self) -> Option<&LogRegistry> {
        self.logs.as_ref()
    }

    pub fn host(&self) -> Option<&HostInfo> {
        self.host.as_ref()
    }

    #[cfg(feature = "full")]
    pub fn plugins(&self) -> Option<&PluginRegistry> {
        self.plugins.as_ref()
    }

    pub(crate) fn file_system_slot(&mut self) -> &mut Option<FileSystem> {
        &mut self.file_system
    }

    pub(crate) fn logs_slot(&mut self) -> &mut Option<LogRegistry> {
        &mut self.logs
    }

    pub(crate) fn host_slot(&mut self) -> &mut Option<HostInfo> {
        &mut self.host
    }

    #[cfg(feature = "full")]
    pub(crate) fn plugins_slot(&mut self) -> &mut Option<PluginRegistry> {
        &mut self.plugins
    }

    /// Returns `true` when no facility is active.
    pub fn is_pristine(&self) -> bool {
        self.snapshot() == ContextSnapshot::default()
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            working_dir: self
                .file_system
                .as_ref()
                .map(|fs| fs.working_dir().to_path_buf()),
            log_channels: self.logs.as_ref().map(LogRegistry::snapshot),
            host_triple: self.host.as_ref().map(|host| host.triple().to_string()),
            #[cfg(feature = "full")]
            plugins: self.plugins.as_ref().map(PluginRegistry::snapshot),
        }
    }
}

/// Observable process-wide state, used for status output and round-trip checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextSnapshot {
    pub working_dir: Option<PathBuf>,
    pub log_channels: Option<Vec<ChannelSnapshot>>,
    pub host_triple: Option<String>,
    #[cfg(feature = "full")]
    pub plugins: Option<Vec<String>>,
}

/// Activates `slot` with the value produced by `activate`. A slot that is
/// already active is never overwritten.
pub(crate) fn activate_slot<T, F>(
    slot: &mut Option<T>,
    name: &'static str,
    activate: F,
) -> Result<(), FacilityError>
where
    F: FnOnce() -> Result<T, FacilityError>,
{
    if slot.is_some() {
        return Err(FacilityError::AlreadyActive(name));
    }
    *slot = Some(activate()?);
    Ok(())
}

/// Clears `slot`, logging when there was nothing to tear down.
pub(crate) fn clear_slot<T>(slot: &mut Option<T>, name: &'static str) {
    if slot.take().is_none() {
        tracing::warn!(stage = "teardown", facility = name, "facility was already inactive");
    }
}
