//! Lifetime manager: drives a set of initializers through startup and shutdown.
//!
//! # Ordering
//! ```text
//! initialize: tiers[0], tiers[1], ... tiers[n-1]
//! terminate:  tiers[n-1], ... tiers[1], tiers[0]   (every constructed tier)
//! ```
//!
//! Startup failures follow the configured [`FailurePolicy`]. Shutdown always
//! visits every constructed tier, including ones that failed or never ran.

use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::context::SystemContext;
use crate::error::InitializationError;
use crate::lifecycle::{Initializer, SystemInitializer};
use crate::types::{FailurePolicy, LifecycleState, Tier};

/// Outcome of a successful (possibly degraded) startup.
#[derive(Debug, Default)]
pub struct StartupReport {
    /// Tiers that are fully initialized, in initialization order.
    pub initialized: Vec<Tier>,
    /// Tiers that failed under [`FailurePolicy::Continue`].
    pub failures: Vec<InitializationError>,
}

impl StartupReport {
    /// Returns `true` when at least one tier failed and startup carried on.
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Owner of the process-wide [`SystemContext`] and of every initializer.
#[derive(Debug)]
pub struct LifetimeManager {
    context: SystemContext,
    initializers: Vec<SystemInitializer>,
    policy: FailurePolicy,
    initialized: bool,
}

impl LifetimeManager {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            context: SystemContext::new(),
            initializers: Vec::new(),
            policy,
            initialized: false,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn context(&self) -> &SystemContext {
        &self.context
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current state of every managed tier, in initialization order.
    pub fn states(&self) -> Vec<(Tier, LifecycleState)> {
        self.initializers
            .iter()
            .map(|initializer| (initializer.tier(), initializer.state()))
            .collect()
    }

    /// Takes ownership of `initializers` and initializes them in order.
    ///
    /// Calling this while already initialized leaves everything untouched and
    /// reports the tiers that are currently up. Whatever the outcome, the
    /// manager counts as initialized afterwards and [`terminate`] must run.
    ///
    /// [`terminate`]: LifetimeManager::terminate
    pub fn initialize(
        &mut self,
        initializers: Vec<SystemInitializer>,
    ) -> Result<StartupReport, InitializationError> {
        if self.initialized {
            tracing::debug!(stage = "startup", "lifetime manager already initialized");
            return Ok(StartupReport {
                initialized: self.initialized_tiers(),
                failures: Vec::new(),
            });
        }

        self.initialized = true;
        self.initializers = initializers;

        let mut report = StartupReport::default();
        for initializer in &mut self.initializers {
            let tier = initializer.tier();
            let started = Instant::now();
            let outcome = initializer.initialize(&mut self.context);
            histogram!("initializer_duration_seconds", "tier" => tier.as_str())
                .record(started.elapsed().as_secs_f64());

            match outcome {
                Ok(()) => {
                    counter!("initializer_runs_total", "tier" => tier.as_str(), "result" => "ok")
                        .increment(1);
                    info!(stage = "startup", tier = tier.as_str(), "tier initialized");
                    report.initialized.push(tier);
                }
                Err(err) => {
                    counter!("initializer_runs_total", "tier" => tier.as_str(), "result" => "error")
                        .increment(1);
                    match self.policy {
                        FailurePolicy::Abort => {
                            warn!(stage = "startup", tier = tier.as_str(), error = %err, "aborting startup");
                            return Err(err);
                        }
                        FailurePolicy::Continue => {
                            warn!(stage = "startup", tier = tier.as_str(), error = %err, "continuing in degraded mode");
                            report.failures.push(err);
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    /// Terminates every constructed tier in reverse order and releases them.
    ///
    /// Returns the tiers in the order they were terminated; empty when the
    /// manager is not initialized.
    pub fn terminate(&mut self) -> Vec<Tier> {
        if !self.initialized {
            return Vec::new();
        }

        let mut visited = Vec::with_capacity(self.initializers.len());
        for initializer in self.initializers.iter_mut().rev() {
            let tier = initializer.tier();
            let state = initializer.state();
            initializer.terminate(&mut self.context);
            counter!("initializer_terminations_total", "tier" => tier.as_str()).increment(1);
            if state.is_terminable() {
                info!(stage = "shutdown", tier = tier.as_str(), from = state.as_str(), "tier terminated");
            } else {
                tracing::debug!(stage = "shutdown", tier = tier.as_str(), from = state.as_str(), "tier had nothing to terminate");
            }
            visited.push(tier);
        }

        self.initializers.clear();
        self.initialized = false;

        if !self.context.is_pristine() {
            warn!(stage = "shutdown", snapshot = ?self.context.snapshot(), "process state left behind after shutdown");
        }
        visited
    }

    fn initialized_tiers(&self) -> Vec<Tier> {
        self.initializers
            .iter()
            .filter(|initializer| initializer.state() == LifecycleState::Initialized)
            .map(Initializer::tier)
            .collect()
    }
}

impl Default for LifetimeManager {
    fn default() -> Self {
        Self::new(FailurePolicy::default())
    }
}

impl Drop for LifetimeManager {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CommonInitializer, CommonOptions};
    use crate::facility::LogChannelSpec;
    use crate::types::ConsumerProfile;

    fn options(dir: &std::path::Path) -> CommonOptions {
        CommonOptions {
            working_dir: Some(dir.to_path_buf()),
            host_triple: Some("x86_64-unknown-linux-gnu".into()),
            log_channels: vec![LogChannelSpec::all("gdb-remote")],
        }
    }

    #[test]
    fn terminate_without_initialize_is_a_noop() {
        let mut manager = LifetimeManager::default();
        assert!(manager.terminate().is_empty());
        assert!(manager.terminate().is_empty());
        assert!(!manager.is_initialized());
        assert!(manager.context().is_pristine());
    }

    #[test]
    fn server_profile_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = LifetimeManager::new(FailurePolicy::Abort);

        let report = manager
            .initialize(SystemInitializer::for_profile(
                ConsumerProfile::Server,
                &options(dir.path()),
            ))
            .expect("server startup");
        assert_eq!(report.initialized, vec![Tier::Common]);
        assert!(!report.is_degraded());
        assert!(manager.context().logs().is_some());

        assert_eq!(manager.terminate(), vec![Tier::Common]);
        assert!(manager.context().is_pristine());
        assert!(manager.states().is_empty());
        assert!(manager.terminate().is_empty());
    }

    #[test]
    fn repeated_cycles_leave_the_context_pristine() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = LifetimeManager::default();
        let pristine = manager.context().snapshot();

        let mut first_snapshot = None;
        for _ in 0..3 {
            manager
                .initialize(SystemInitializer::for_profile(
                    ConsumerProfile::default(),
                    &options(dir.path()),
                ))
                .expect("startup");
            let snapshot = manager.context().snapshot();
            if let Some(first) = &first_snapshot {
                assert_eq!(&snapshot, first);
            }
            first_snapshot = Some(snapshot);

            manager.terminate();
            assert_eq!(manager.context().snapshot(), pristine);
        }
    }

    #[test]
    fn second_initialize_is_a_successful_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = LifetimeManager::default();
        manager
            .initialize(SystemInitializer::for_profile(
                ConsumerProfile::Server,
                &options(dir.path()),
            ))
            .unwrap();
        let before = manager.context().snapshot();

        let report = manager
            .initialize(vec![SystemInitializer::Common(CommonInitializer::new(
                CommonOptions {
                    host_triple: Some("bogus".into()),
                    ..CommonOptions::default()
                },
            ))])
            .expect("already initialized");
        assert_eq!(report.initialized, vec![Tier::Common]);
        assert_eq!(manager.context().snapshot(), before);
        assert_eq!(manager.states().len(), 1);
    }

    #[test]
    fn abort_policy_reports_the_error_and_still_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = LifetimeManager::new(FailurePolicy::Abort);
        let bad = CommonOptions {
            host_triple: Some("bogus".into()),
            ..options(dir.path())
        };

        let err = manager
            .initialize(SystemInitializer::for_profile(ConsumerProfile::Server, &bad))
            .expect_err("startup fails");
        assert_eq!(err.tier(), Tier::Common);
        assert!(!err.cause().is_empty());
        assert!(manager.is_initialized());
        assert!(!manager.context().is_pristine());

        manager.terminate();
        assert!(manager.context().is_pristine());
        assert!(!manager.is_initialized());
    }

    #[test]
    fn drop_terminates_every_tier() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = LifetimeManager::default();
        manager
            .initialize(SystemInitializer::for_profile(
                ConsumerProfile::Server,
                &options(dir.path()),
            ))
            .unwrap();
        drop(manager);
    }

    #[cfg(feature = "full")]
    mod full {
        use super::*;

        #[test]
        fn client_profile_initializes_and_terminates_in_order() {
            let dir = tempfile::tempdir().unwrap();
            let mut manager = LifetimeManager::default();

            let report = manager
                .initialize(SystemInitializer::for_profile(
                    ConsumerProfile::Client,
                    &options(dir.path()),
                ))
                .expect("client startup");
            assert_eq!(report.initialized, vec![Tier::Common, Tier::Full]);
            assert!(manager.context().plugins().is_some());

            assert_eq!(manager.terminate(), vec![Tier::Full, Tier::Common]);
            assert!(manager.context().is_pristine());
        }

        #[test]
        fn abort_skips_tiers_after_the_failure() {
            let dir = tempfile::tempdir().unwrap();
            let mut manager = LifetimeManager::new(FailurePolicy::Abort);
            let bad = CommonOptions {
                working_dir: Some(dir.path().join("missing")),
                ..options(dir.path())
            };

            manager
                .initialize(SystemInitializer::for_profile(ConsumerProfile::Client, &bad))
                .unwrap_err();
            assert_eq!(
                manager.states(),
                vec![
                    (Tier::Common, LifecycleState::Failed),
                    (Tier::Full, LifecycleState::Constructed),
                ]
            );

            assert_eq!(manager.terminate(), vec![Tier::Full, Tier::Common]);
            assert!(manager.context().is_pristine());
        }

        #[test]
        fn continue_policy_runs_degraded() {
            let dir = tempfile::tempdir().unwrap();
            let mut manager = LifetimeManager::new(FailurePolicy::Continue);
            let exotic = CommonOptions {
                host_triple: Some("sparc64-sun-solaris".into()),
                ..options(dir.path())
            };

            let report = manager
                .initialize(SystemInitializer::for_profile(
                    ConsumerProfile::Client,
                    &exotic,
                ))
                .expect("continue policy never fails startup");
            assert!(report.is_degraded());
            assert_eq!(report.initialized, vec![Tier::Common]);
            assert_eq!(report.failures.len(), 1);
            assert_eq!(report.failures[0].tier(), Tier::Full);
            assert!(manager.context().host().is_some());

            manager.terminate();
            assert!(manager.context().is_pristine());
        }
    }
}
