use serde::Serialize;

use dbginit_core::{
    ContextSnapshot, InitializationError, LifecycleState, LifetimeManager, StartupReport, Tier,
};
use dbginit_util::AppConfig;

#[derive(Debug, Serialize)]
struct TierStatus {
    tier: Tier,
    state: LifecycleState,
}

/// Status document printed once startup has finished.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    profile: &'static str,
    policy: &'static str,
    started: bool,
    degraded: bool,
    tiers: Vec<TierStatus>,
    errors: Vec<String>,
    context: ContextSnapshot,
}

impl StatusReport {
    pub fn new(config: &AppConfig, manager: &LifetimeManager, startup: &StartupReport) -> Self {
        let errors: Vec<String> = startup.failures.iter().map(ToString::to_string).collect();
        Self::build(config, manager, !errors.is_empty(), errors)
    }

    pub fn failed(
        config: &AppConfig,
        manager: &LifetimeManager,
        error: &InitializationError,
    ) -> Self {
        let mut report = Self::build(config, manager, false, vec![error.to_string()]);
        report.started = false;
        report
    }

    fn build(
        config: &AppConfig,
        manager: &LifetimeManager,
        degraded: bool,
        errors: Vec<String>,
    ) -> Self {
        Self {
            profile: config.profile.as_str(),
            policy: manager.policy().as_str(),
            started: true,
            degraded,
            tiers: manager
                .states()
                .into_iter()
                .map(|(tier, state)| TierStatus { tier, state })
                .collect(),
            errors,
            context: manager.context().snapshot(),
        }
    }

    pub fn render(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
