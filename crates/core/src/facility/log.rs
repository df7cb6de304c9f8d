use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::error::FacilityError;

/// Core debugger channel registered together with the registry itself.
pub const SYSTEM_CHANNEL: &str = "system";
pub const SYSTEM_CATEGORIES: &[&str] = &["fs", "host", "init"];

/// Channel used by the remote debugging protocol.
pub const GDB_REMOTE_CHANNEL: &str = "gdb-remote";
pub const GDB_REMOTE_CATEGORIES: &[&str] =
    &["async", "breakpoints", "memory", "packets", "process", "thread"];

/// A named log channel with a fixed set of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogChannel {
    categories: &'static [&'static str],
    enabled: BTreeSet<&'static str>,
}

impl LogChannel {
    fn new(categories: &'static [&'static str]) -> Self {
        Self {
            categories,
            enabled: BTreeSet::new(),
        }
    }

    pub fn is_enabled(&self, category: &str) -> bool {
        self.enabled.contains(category)
    }

    pub fn is_silent(&self) -> bool {
        self.enabled.is_empty()
    }
}

/// Registry of the debugger's log channels.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogRegistry {
    channels: BTreeMap<&'static str, LogChannel>,
}

impl LogRegistry {
    pub(crate) const NAME: &'static str = "log registry";

    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register_channel(
        &mut self,
        name: &'static str,
        categories: &'static [&'static str],
    ) -> Result<(), FacilityError> {
        if self.channels.contains_key(name) {
            return Err(FacilityError::DuplicateChannel(name.to_string()));
        }
        self.channels.insert(name, LogChannel::new(categories));
        Ok(())
    }

    /// Removes a channel. Returns `false` when it was not registered.
    pub(crate) fn unregister_channel(&mut self, name: &str) -> bool {
        self.channels.remove(name).is_some()
    }

    /// Enables the categories named by `spec`. Nothing is enabled unless every
    /// requested category exists.
    pub(crate) fn enable(&mut self, spec: &LogChannelSpec) -> Result<(), FacilityError> {
        let channel = self
            .channels
            .get_mut(spec.channel.as_str())
            .ok_or_else(|| FacilityError::UnknownChannel(spec.channel.clone()))?;

        let mut selected = Vec::with_capacity(spec.categories.len());
        for requested in &spec.categories {
            let category = channel
                .categories
                .iter()
                .copied()
                .find(|known| *known == requested.as_str())
                .ok_or_else(|| FacilityError::UnknownCategory {
                    channel: spec.channel.clone(),
                    category: requested.clone(),
                })?;
            selected.push(category);
        }

        if spec.categories.is_empty() {
            channel.enabled.extend(channel.categories.iter().copied());
        } else {
            channel.enabled.extend(selected);
        }
        Ok(())
    }

    pub(crate) fn disable_all(&mut self) {
        for channel in self.channels.values_mut() {
            channel.enabled.clear();
        }
    }

    pub fn channel(&self, name: &str) -> Option<&LogChannel> {
        self.channels.get(name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.channels.keys().copied()
    }

    pub fn is_enabled(&self, channel: &str, category: &str) -> bool {
        self.channel(channel)
            .map(|channel| channel.is_enabled(category))
            .unwrap_or(false)
    }

    /// Emits `message` through `tracing` when the category is enabled.
    pub fn log(&self, channel: &str, category: &str, message: &str) {
        if self.is_enabled(channel, category) {
            tracing::debug!(stage = "log", channel, category, "{message}");
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<ChannelSnapshot> {
        self.channels
            .iter()
            .map(|(name, channel)| ChannelSnapshot {
                name: name.to_string(),
                enabled: channel.enabled.iter().map(|c| c.to_string()).collect(),
            })
            .collect()
    }
}

/// Observable state of one registered channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSnapshot {
    pub name: String,
    pub enabled: Vec<String>,
}

/// Request to enable a channel, written as `channel[:category,category]`.
///
/// An empty category list enables every category of the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogChannelSpec {
    pub channel: String,
    pub categories: Vec<String>,
}

impl LogChannelSpec {
    pub fn all(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            categories: Vec::new(),
        }
    }

    /// Parses a `;`-separated list of channel specs. Blank entries are skipped.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, LogSpecError> {
        value
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.parse::<Self>())
            .collect()
    }
}

impl FromStr for LogChannelSpec {
    type Err = LogSpecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (channel, categories) = match value.split_once(':') {
            Some((channel, categories)) => (channel.trim(), Some(categories)),
            None => (value.trim(), None),
        };
        if channel.is_empty() {
            return Err(LogSpecError(value.to_string()));
        }

        let categories = match categories {
            Some(list) => {
                let parsed: Vec<String> = list
                    .split(',')
                    .map(str::trim)
                    .filter(|category| !category.is_empty())
                    .map(str::to_string)
                    .collect();
                if parsed.is_empty() {
                    return Err(LogSpecError(value.to_string()));
                }
                parsed
            }
            None => Vec::new(),
        };

        Ok(Self {
            channel: channel.to_string(),
            categories,
        })
    }
}

impl fmt::Display for LogChannelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.categories.is_empty() {
            f.write_str(&self.channel)
        } else {
            write!(f, "{}:{}", self.channel, self.categories.join(","))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed log channel spec '{0}': expected channel[:category,...]")]
pub struct LogSpecError(pub String);
