use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::FacilityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    Platform,
    Disassembler,
    ScriptInterpreter,
}

impl PluginKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Disassembler => "disassembler",
            Self::ScriptInterpreter => "script_interpreter",
        }
    }
}

/// Statically known plugins registered by the client tier, grouped by kind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PluginRegistry {
    plugins: BTreeMap<PluginKind, Vec<&'static str>>,
}

impl PluginRegistry {
    pub(crate) const NAME: &'static str = "plugin registry";

    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(
        &mut self,
        kind: PluginKind,
        name: &'static str,
    ) -> Result<(), FacilityError> {
        let entries = self.plugins.entry(kind).or_default();
        if entries.contains(&name) {
            return Err(FacilityError::DuplicatePlugin(name));
        }
        entries.push(name);
        Ok(())
    }

    /// Drops every plugin of `kind`, returning how many were removed.
    pub(crate) fn unregister_kind(&mut self, kind: PluginKind) -> usize {
        self.plugins.remove(&kind).map(|v| v.len()).unwrap_or(0)
    }

    pub fn plugins(&self, kind: PluginKind) -> &[&'static str] {
        self.plugins.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.values().all(Vec::is_empty)
    }

    pub(crate) fn snapshot(&self) -> Vec<String> {
        self.plugins
            .iter()
            .flat_map(|(kind, names)| {
                names
                    .iter()
                    .map(move |name| format!("{}/{}", kind.as_str(), name))
            })
            .collect()
    }
}
