//! Process-wide subsystems brought up and torn down by the tiers.
//!
//! Each facility is a plain value stored in a [`SystemContext`] slot. Only the
//! tier that owns a slot activates or clears it.
//!
//! [`SystemContext`]: crate::context::SystemContext

pub mod file_system;
pub mod host;
pub mod log;
#[cfg(feature = "full")]
pub mod plugin;

pub use file_system::FileSystem;
pub use host::{HostInfo, HostTriple};
pub use log::{ChannelSnapshot, LogChannel, LogChannelSpec, LogRegistry, LogSpecError};
#[cfg(feature = "full")]
pub use plugin::{PluginKind, PluginRegistry};
