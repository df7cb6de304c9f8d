//! Full tier: client-only plugins layered on the Common tier.

use crate::context::{activate_slot, clear_slot, SystemContext};
use crate::error::{FacilityError, InitializationError};
use crate::facility::{FileSystem, HostInfo, HostTriple, PluginKind, PluginRegistry};
use crate::lifecycle::{Initializer, Step, StepLedger};
use crate::types::{LifecycleState, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FullStep {
    Prerequisites,
    PluginRegistry,
    Platforms,
    Disassemblers,
    ScriptInterpreter,
}

impl Step for FullStep {
    fn name(self) -> &'static str {
        match self {
            Self::Prerequisites => "prerequisites",
            Self::PluginRegistry => "plugin-registry",
            Self::Platforms => "platforms",
            Self::Disassemblers => "disassemblers",
            Self::ScriptInterpreter => "script-interpreter",
        }
    }
}

const STEPS: &[FullStep] = &[
    FullStep::Prerequisites,
    FullStep::PluginRegistry,
    FullStep::Platforms,
    FullStep::Disassemblers,
    FullStep::ScriptInterpreter,
];

const REMOTE_PLATFORM: &str = "remote-gdb-server";
const SCRIPT_INTERPRETER: &str = "script-none";

/// Initializer for the Full tier. Expects the Common tier to be up.
#[derive(Debug)]
pub struct FullInitializer {
    ledger: StepLedger<FullStep>,
}

impl FullInitializer {
    pub fn new() -> Self {
        Self {
            ledger: StepLedger::new(Tier::Full),
        }
    }
}

impl Default for FullInitializer {
    fn default() -> Self {
        Self::new()
    }
}

fn host_platform(triple: &HostTriple) -> &'static str {
    match triple.os.as_str() {
        "linux" => "platform-linux",
        "macos" | "darwin" | "ios" => "platform-darwin",
        "windows" => "platform-windows",
        "freebsd" | "netbsd" | "openbsd" => "platform-bsd",
        _ => "platform-generic",
    }
}

fn host_disassembler(triple: &HostTriple) -> Result<&'static str, FacilityError> {
    match triple.arch.as_str() {
        "x86_64" | "x86" | "i386" | "i686" => Ok("disassembler-x86"),
        "aarch64" | "arm64" | "arm" | "armv7" => Ok("disassembler-arm"),
        "riscv32" | "riscv64" => Ok("disassembler-riscv"),
        other => Err(FacilityError::UnsupportedArchitecture(other.to_string())),
    }
}

fn registry(context: &mut SystemContext) -> Result<&mut PluginRegistry, FacilityError> {
    context
        .plugins_slot()
        .as_mut()
        .ok_or(FacilityError::Inactive(PluginRegistry::NAME))
}

fn host_triple(context: &SystemContext) -> Result<HostTriple, FacilityError> {
    context
        .host()
        .map(|host| host.triple().clone())
        .ok_or(FacilityError::Inactive(HostInfo::NAME))
}

fn apply(step: FullStep, context: &mut SystemContext) -> Result<(), FacilityError> {
    match step {
        FullStep::Prerequisites => {
            if context.file_system().is_none() {
                return Err(FacilityError::Inactive(FileSystem::NAME));
            }
            host_triple(context).map(|_| ())
        }
        FullStep::PluginRegistry => {
            activate_slot(context.plugins_slot(), PluginRegistry::NAME, || {
                Ok(PluginRegistry::new())
            })
        }
        FullStep::Platforms => {
            let platform = host_platform(&host_triple(context)?);
            let registry = registry(context)?;
            registry.register(PluginKind::Platform, platform)?;
            registry.register(PluginKind::Platform, REMOTE_PLATFORM)
        }
        FullStep::Disassemblers => {
            let disassembler = host_disassembler(&host_triple(context)?)?;
            registry(context)?.register(PluginKind::Disassembler, disassembler)
        }
        FullStep::ScriptInterpreter => {
            registry(context)?.register(PluginKind::ScriptInterpreter, SCRIPT_INTERPRETER)
        }
    }
}

fn unregister(context: &mut SystemContext, kind: PluginKind) {
    let removed = context
        .plugins_slot()
        .as_mut()
        .map(|registry| registry.unregister_kind(kind))
        .unwrap_or(0);
    if removed == 0 {
        tracing::warn!(stage = "teardown", kind = kind.as_str(), "no plugins to unregister");
    }
}

fn revert(step: FullStep, context: &mut SystemContext) {
    match step {
        FullStep::Prerequisites => {}
        FullStep::PluginRegistry => {
            if context.plugins().is_some_and(|registry| !registry.is_empty()) {
                tracing::warn!(
                    stage = "teardown",
                    snapshot = ?context.snapshot().plugins,
                    "plugin registry dropped with plugins still registered"
                );
            }
            clear_slot(context.plugins_slot(), PluginRegistry::NAME)
        }
        FullStep::Platforms => unregister(context, PluginKind::Platform),
        FullStep::Disassemblers => unregister(context, PluginKind::Disassembler),
        FullStep::ScriptInterpreter => unregister(context, PluginKind::ScriptInterpreter),
    }
}

impl Initializer for FullInitializer {
    fn tier(&self) -> Tier {
        Tier::Full
    }

    fn state(&self) -> LifecycleState {
        self.ledger.state()
    }

    fn initialize(&mut self, context: &mut SystemContext) -> Result<(), InitializationError> {
        self.ledger.run(STEPS, |step| apply(step, context))
    }

    fn terminate(&mut self, context: &mut SystemContext) {
        self.ledger.unwind(|step| revert(step, context));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CommonInitializer, CommonOptions};

    fn common_with_triple(triple: &str) -> CommonInitializer {
        CommonInitializer::new(CommonOptions {
            host_triple: Some(triple.to_string()),
            ..CommonOptions::default()
        })
    }

    #[test]
    fn registers_host_plugins_after_common() {
        let mut context = SystemContext::new();
        let mut common = common_with_triple("x86_64-unknown-linux-gnu");
        let mut full = FullInitializer::new();

        common.initialize(&mut context).unwrap();
        full.initialize(&mut context).expect("full tier starts");

        let plugins = context.plugins().expect("plugin registry active");
        assert_eq!(
            plugins.plugins(PluginKind::Platform),
            &["platform-linux", REMOTE_PLATFORM]
        );
        assert_eq!(
            plugins.plugins(PluginKind::Disassembler),
            &["disassembler-x86"]
        );
        assert_eq!(
            plugins.plugins(PluginKind::ScriptInterpreter),
            &[SCRIPT_INTERPRETER]
        );

        full.terminate(&mut context);
        assert!(context.plugins().is_none());
        assert!(context.host().is_some());

        common.terminate(&mut context);
        assert!(context.is_pristine());
    }

    #[test]
    fn fails_without_common_tier() {
        let mut context = SystemContext::new();
        let mut full = FullInitializer::new();

        let err = full.initialize(&mut context).unwrap_err();
        assert_eq!(err.tier(), Tier::Full);
        assert!(err.cause().contains("prerequisites"));
        assert!(context.is_pristine());

        full.terminate(&mut context);
        full.terminate(&mut context);
        assert!(context.is_pristine());
    }

    #[test]
    fn unsupported_architecture_unwinds_only_completed_steps() {
        let mut context = SystemContext::new();
        let mut common = common_with_triple("mips64-unknown-linux");
        let mut full = FullInitializer::new();

        common.initialize(&mut context).unwrap();
        let err = full.initialize(&mut context).unwrap_err();
        assert!(matches!(
            err.facility_error(),
            Some(FacilityError::UnsupportedArchitecture(arch)) if arch == "mips64"
        ));
        assert_eq!(
            full.ledger.completed(),
            &[
                FullStep::Prerequisites,
                FullStep::PluginRegistry,
                FullStep::Platforms
            ]
        );
        assert_eq!(
            context
                .plugins()
                .map(|plugins| plugins.plugins(PluginKind::Disassembler).len()),
            Some(0)
        );

        full.terminate(&mut context);
        assert!(context.plugins().is_none());
        common.terminate(&mut context);
        assert!(context.is_pristine());
    }

    #[test]
    fn maps_hosts_to_plugins() {
        let darwin: HostTriple = "aarch64-apple-darwin".parse().unwrap();
        assert_eq!(host_platform(&darwin), "platform-darwin");
        assert_eq!(host_disassembler(&darwin).unwrap(), "disassembler-arm");

        let haiku: HostTriple = "riscv64-unknown-haiku".parse().unwrap();
        assert_eq!(host_platform(&haiku), "platform-generic");
        assert_eq!(host_disassembler(&haiku).unwrap(), "disassembler-riscv");
    }
}
