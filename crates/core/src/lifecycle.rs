//! The two-phase setup/teardown contract shared by every tier.
//!
//! # Contract
//! ```text
//! initialize: Constructed -> Initialized | Failed     (error as value)
//! terminate:  Constructed | Initialized | Failed -> Terminated   (never fails)
//!             Terminated -> Terminated                 (no-op)
//! ```
//!
//! A tier is a fixed, ordered list of sub-steps. Completed steps are recorded
//! in a [`StepLedger`]; termination reverts exactly those, last first, so a
//! partially failed `initialize` is always safe to terminate.

use std::fmt;

use crate::common::{CommonInitializer, CommonOptions};
use crate::context::SystemContext;
use crate::error::{FacilityError, InitializationError};
#[cfg(feature = "full")]
use crate::full::FullInitializer;
use crate::types::{ConsumerProfile, LifecycleState, Tier};

/// A unit of process-wide setup and teardown.
///
/// Implementations own disjoint facilities of the [`SystemContext`] and may
/// rely on tiers earlier in the initialization order having run, but never
/// enforce that order themselves.
pub trait Initializer {
    fn tier(&self) -> Tier;

    fn state(&self) -> LifecycleState;

    /// Brings up every facility owned by this tier.
    ///
    /// Only valid once, from [`LifecycleState::Constructed`]. On failure the
    /// facilities that did come up stay recorded so [`Initializer::terminate`]
    /// can release them.
    fn initialize(&mut self, context: &mut SystemContext) -> Result<(), InitializationError>;

    /// Reverts whatever `initialize` managed to do, in reverse order.
    ///
    /// Safe to call before `initialize`, after a failed `initialize`, and any
    /// number of times afterwards.
    fn terminate(&mut self, context: &mut SystemContext);
}

/// A named sub-step of a tier.
pub(crate) trait Step: Copy + fmt::Debug {
    fn name(self) -> &'static str;
}

/// Lifecycle state plus the list of sub-steps that completed.
#[derive(Debug)]
pub(crate) struct StepLedger<S> {
    tier: Tier,
    state: LifecycleState,
    completed: Vec<S>,
}

impl<S: Step> StepLedger<S> {
    pub(crate) fn new(tier: Tier) -> Self {
        Self {
            tier,
            state: LifecycleState::Constructed,
            completed: Vec::new(),
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn completed(&self) -> &[S] {
        &self.completed
    }

    /// Applies `steps` in order, stopping at the first failure.
    pub(crate) fn run<F>(&mut self, steps: &[S], mut apply: F) -> Result<(), InitializationError>
    where
        F: FnMut(S) -> Result<(), FacilityError>,
    {
        if self.state != LifecycleState::Constructed {
            return Err(InitializationError::new(
                self.tier,
                format!("initialize called while {}", self.state.as_str()),
            ));
        }

        for &step in steps {
            if let Err(err) = apply(step) {
                self.state = LifecycleState::Failed;
                tracing::warn!(
                    stage = "init",
                    tier = self.tier.as_str(),
                    step = step.name(),
                    completed = self.completed.len(),
                    error = %err,
                    "initialization step failed"
                );
                return Err(InitializationError::step(self.tier, step.name(), err));
            }
            self.completed.push(step);
            tracing::debug!(
                stage = "init",
                tier = self.tier.as_str(),
                step = step.name(),
                "step completed"
            );
        }

        self.state = LifecycleState::Initialized;
        Ok(())
    }

    /// Reverts completed steps, last first, then enters `Terminated`.
    pub(crate) fn unwind<F>(&mut self, mut revert: F)
    where
        F: FnMut(S),
    {
        if self.state == LifecycleState::Terminated {
            tracing::debug!(stage = "teardown", tier = self.tier.as_str(), "already terminated");
            return;
        }

        while let Some(step) = self.completed.pop() {
            revert(step);
            tracing::debug!(
                stage = "teardown",
                tier = self.tier.as_str(),
                step = step.name(),
                "step reverted"
            );
        }
        self.state = LifecycleState::Terminated;
    }
}

/// Every initializer variant linked into this build.
#[derive(Debug)]
pub enum SystemInitializer {
    Common(CommonInitializer),
    #[cfg(feature = "full")]
    Full(FullInitializer),
}

impl SystemInitializer {
    /// Constructs the initializer for `tier`. No initialization work happens here.
    pub fn for_tier(tier: Tier, options: &CommonOptions) -> Self {
        match tier {
            Tier::Common => Self::Common(CommonInitializer::new(options.clone())),
            #[cfg(feature = "full")]
            Tier::Full => Self::Full(FullInitializer::new()),
        }
    }

    /// Constructs one initializer per tier of `profile`, in initialization order.
    pub fn for_profile(profile: ConsumerProfile, options: &CommonOptions) -> Vec<Self> {
        profile
            .tiers()
            .iter()
            .map(|&tier| Self::for_tier(tier, options))
            .collect()
    }
}

impl Initializer for SystemInitializer {
    fn tier(&self) -> Tier {
        match self {
            Self::Common(inner) => inner.tier(),
            #[cfg(feature = "full")]
            Self::Full(inner) => inner.tier(),
        }
    }

    fn state(&self) -> LifecycleState {
        match self {
            Self::Common(inner) => inner.state(),
            #[cfg(feature = "full")]
            Self::Full(inner) => inner.state(),
        }
    }

    fn initialize(&mut self, context: &mut SystemContext) -> Result<(), InitializationError> {
        match self {
            Self::Common(inner) => inner.initialize(context),
            #[cfg(feature = "full")]
            Self::Full(inner) => inner.initialize(context),
        }
    }

    fn terminate(&mut self, context: &mut SystemContext) {
        match self {
            Self::Common(inner) => inner.terminate(context),
            #[cfg(feature = "full")]
            Self::Full(inner) => inner.terminate(context),
        }
    }
}
